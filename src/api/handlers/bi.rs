use crate::{
    agents::analyst::ANALYST_NAME,
    types::{AnalysisRequest, AnalysisResponse, ReplyStatus, Result},
    AppState,
};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// Ask the business-intelligence analyst to interpret a dataset
#[utoipa::path(
    post,
    path = "/api/v1/bi/analyze",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Analysis produced", body = AnalysisResponse),
        (status = 500, description = "Model failure")
    ),
    tag = "business-intelligence"
)]
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>> {
    let analyst = state.agents.analyst().await?;
    let analysis = analyst
        .analyze_data(&payload.data, &payload.analysis_type)
        .await?;
    Ok(Json(AnalysisResponse {
        status: ReplyStatus::Success,
        analysis,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/bi/health",
    responses((status = 200, description = "Analyst is available", body = Object)),
    tag = "business-intelligence"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "agent": ANALYST_NAME }))
}
