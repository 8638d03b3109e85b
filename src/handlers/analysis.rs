use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;

use crate::AppState;
use crate::models::{AnalysisReport, AnalyzeRequest, QuerySpec};
use crate::utils::{ApiError, ApiResult};

/// Benchmark, explain and diagnose one query
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis report", body = AnalysisReport),
        (status = 400, description = "Malformed body, blank query or repeat count outside 1..=500", body = ErrorBody),
        (status = 422, description = "The query or its EXPLAIN failed", body = ErrorBody),
        (status = 502, description = "Cannot connect to the database server", body = ErrorBody)
    ),
    tag = "Analysis"
)]
pub async fn analyze_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisReport>> {
    let Json(request) = payload.map_err(|e| ApiError::validation_error(e.body_text()))?;
    let spec = QuerySpec::new(request.query, request.repeat_count, request.database)?;
    let report = state.analysis_service.analyze(spec).await?;
    Ok(Json(report))
}
