//! Message routing and context handlers
//!
//! `submit` is called once per inbound message, after the external intent
//! classifier has already decided the tier. This layer never classifies.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::state::{AppState, ImportInfo};
use crate::errors::{Result, ValidationErrorExt};
use crate::keywords::KeywordEntry;
use crate::memory::{ContextSummary, ContextTier, Role, SessionId, Snapshot};
use crate::validation;

fn parse_session_id(raw: &str) -> Result<SessionId> {
    validation::validate_session_id(raw).map_validation_err("session_id")?;
    Ok(SessionId(raw.to_string()))
}

/// Request for submitting one classified message
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Target session; omitted = default session (unless strict mode)
    #[serde(default)]
    pub session_id: Option<String>,

    pub role: Role,
    pub text: String,

    /// Tier decided by the external classifier
    pub tier: ContextTier,
}

/// Response for a submitted message
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub session_id: SessionId,
    pub tier: ContextTier,

    /// Keywords cached for Core/Evolving entries (empty for Turn)
    pub keywords: Vec<KeywordEntry>,
}

/// Response carrying a context summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub session_id: String,
    pub summary: ContextSummary,
}

/// Response for clearing a session's context
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub session_id: String,
}

/// Response for importing a snapshot
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub session_id: String,
    pub applied: ImportInfo,
}

/// POST /api/submit - Route one classified message into its session
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>> {
    let session_id = match &req.session_id {
        Some(raw) => Some(parse_session_id(raw)?),
        None => None,
    };

    let outcome = state.submit(session_id.as_ref(), req.role, &req.text, req.tier)?;

    Ok(Json(SubmitResponse {
        success: true,
        session_id: outcome.session_id,
        tier: outcome.tier,
        keywords: outcome.keywords,
    }))
}

/// GET /api/sessions/{session_id}/summary - Deterministic context summary
pub async fn get_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SummaryResponse>> {
    let id = parse_session_id(&session_id)?;
    let summary = state.summary(&id)?;

    Ok(Json(SummaryResponse {
        success: true,
        session_id,
        summary,
    }))
}

/// POST /api/sessions/{session_id}/clear - Empty all tiers and the corpus
pub async fn clear_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ClearResponse>> {
    let id = parse_session_id(&session_id)?;
    state.clear(&id)?;

    Ok(Json(ClearResponse {
        success: true,
        session_id,
    }))
}

/// GET /api/sessions/{session_id}/export - Full-state snapshot
pub async fn export_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Snapshot>> {
    let id = parse_session_id(&session_id)?;
    let snapshot = state.export_context(&id)?;

    Ok(Json(snapshot))
}

/// POST /api/sessions/{session_id}/import - Replace state from a snapshot
pub async fn import_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(snapshot): Json<Snapshot>,
) -> Result<Json<ImportResponse>> {
    let id = parse_session_id(&session_id)?;
    let applied = state.import_context(&id, snapshot)?;

    Ok(Json(ImportResponse {
        success: true,
        session_id,
        applied,
    }))
}
