//! Coaching session handlers
//!
//! A session walks a user through discovery with the coach, then turns the
//! confirmed problem summary into a solution plan.

use crate::{
    types::{
        ConfirmRequest, ConfirmResponse, RespondRequest, Result, SessionReply,
        StartSessionRequest,
    },
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

/// Start a coaching session
///
/// Opens a new session for the problem statement and returns the coach's
/// first question together with the session id to use in later calls.
#[utoipa::path(
    post,
    path = "/api/v1/workflow/start",
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Session started", body = SessionReply),
        (status = 400, description = "Empty problem statement"),
        (status = 500, description = "Model failure")
    ),
    tag = "workflow"
)]
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<Json<SessionReply>> {
    let reply = state.sessions.start_session(&payload.problem).await?;
    info!(session_id = %reply.session_id, "Session started");
    Ok(Json(reply))
}

/// Answer the coach's latest question
#[utoipa::path(
    post,
    path = "/api/v1/workflow/respond",
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Coach replied", body = SessionReply),
        (status = 400, description = "Turn limit reached"),
        (status = 404, description = "Session not found")
    ),
    tag = "workflow"
)]
pub async fn respond(
    State(state): State<AppState>,
    Json(payload): Json<RespondRequest>,
) -> Result<Json<SessionReply>> {
    let reply = state
        .sessions
        .continue_session(&payload.session_id, payload.response.trim())
        .await?;
    Ok(Json(reply))
}

/// Confirm the problem summary and generate a solution plan
#[utoipa::path(
    post,
    path = "/api/v1/workflow/confirm",
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Plan generated", body = ConfirmResponse),
        (status = 400, description = "No problem summary yet"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Plan failed validation")
    ),
    tag = "workflow"
)]
pub async fn confirm(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>> {
    let response = state
        .sessions
        .confirm_problem_summary(&payload.session_id)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/workflow/status/{session_id}",
    responses((status = 200, description = "Session status", body = Object)),
    params(("session_id" = String, Path, description = "Session id")),
    tag = "workflow"
)]
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    Json(state.sessions.session_status(&session_id).await)
}

#[utoipa::path(
    get,
    path = "/api/v1/workflow/analyze/{session_id}",
    responses(
        (status = 200, description = "Interaction summary", body = Object),
        (status = 404, description = "Session not found")
    ),
    params(("session_id" = String, Path, description = "Session id")),
    tag = "workflow"
)]
pub async fn analyze_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>> {
    Ok(Json(state.sessions.analyze_session(&session_id)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/workflow/sessions/{session_id}",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 404, description = "Session not found")
    ),
    params(("session_id" = String, Path, description = "Session id")),
    tag = "workflow"
)]
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode> {
    state.sessions.clear_session(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
