//! Session lifecycle handlers

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::errors::{Result, ValidationErrorExt};
use crate::memory::{SessionId, SessionStats, SessionSummary};
use crate::validation;

fn parse_session_id(raw: &str) -> Result<SessionId> {
    validation::validate_session_id(raw).map_validation_err("session_id")?;
    Ok(SessionId(raw.to_string()))
}

/// Response for starting a session
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub success: bool,
    pub session_id: SessionId,
}

/// Response for listing sessions
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub success: bool,
    pub sessions: Vec<SessionSummary>,
    pub count: usize,
}

/// Response for ending a session
#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub success: bool,
    pub session_id: String,
}

/// Response for session statistics
#[derive(Debug, Serialize)]
pub struct SessionStatsResponse {
    pub success: bool,
    pub stats: SessionStats,
}

/// Response for deleting a session
#[derive(Debug, Serialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
    pub session_id: String,
}

/// POST /api/sessions - Start a new session
pub async fn start_session(State(state): State<AppState>) -> Json<StartSessionResponse> {
    let session_id = state.start_session();

    Json(StartSessionResponse {
        success: true,
        session_id,
    })
}

/// GET /api/sessions - List all sessions, most recently active first
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
    let sessions = state.list_sessions();
    let count = sessions.len();

    Json(ListSessionsResponse {
        success: true,
        sessions,
        count,
    })
}

/// POST /api/sessions/{session_id}/end - Freeze a session
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<EndSessionResponse>> {
    let id = parse_session_id(&session_id)?;
    state.end_session(&id)?;

    Ok(Json(EndSessionResponse {
        success: true,
        session_id,
    }))
}

/// GET /api/sessions/{session_id}/stats - Per-session statistics
pub async fn get_session_stats(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatsResponse>> {
    let id = parse_session_id(&session_id)?;
    let stats = state.stats(&id)?;

    Ok(Json(SessionStatsResponse {
        success: true,
        stats,
    }))
}

/// DELETE /api/sessions/{session_id} - Destroy a session and its durable record
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>> {
    let id = parse_session_id(&session_id)?;
    state.delete_session(&id)?;

    Ok(Json(DeleteSessionResponse {
        success: true,
        session_id,
    }))
}
