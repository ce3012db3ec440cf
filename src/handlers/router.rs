//! Router configuration - centralized route definitions

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;
use super::{health, messages, sessions};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // HEALTH
        // =================================================================
        .route("/health", get(health::health))
        // =================================================================
        // MESSAGE ROUTING
        // =================================================================
        .route("/api/submit", post(messages::submit))
        // =================================================================
        // SESSION LIFECYCLE
        // =================================================================
        .route("/api/sessions", post(sessions::start_session))
        .route("/api/sessions", get(sessions::list_sessions))
        .route("/api/sessions/{session_id}/end", post(sessions::end_session))
        .route(
            "/api/sessions/{session_id}/stats",
            get(sessions::get_session_stats),
        )
        .route(
            "/api/sessions/{session_id}",
            delete(sessions::delete_session),
        )
        // =================================================================
        // CONTEXT
        // =================================================================
        .route(
            "/api/sessions/{session_id}/summary",
            get(messages::get_summary),
        )
        .route(
            "/api/sessions/{session_id}/clear",
            post(messages::clear_context),
        )
        .route(
            "/api/sessions/{session_id}/export",
            get(messages::export_context),
        )
        .route(
            "/api/sessions/{session_id}/import",
            post(messages::import_context),
        )
        .with_state(state)
}
