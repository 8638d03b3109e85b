use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::models::DiagnosticsSnapshot;
use crate::utils::ApiResult;

/// Read-only snapshot of the server's statistics tables
#[utoipa::path(
    get,
    path = "/api/diagnostics/snapshot",
    responses(
        (status = 200, description = "Diagnostics snapshot; `available` is false when the statistics schema is unreachable", body = DiagnosticsSnapshot),
        (status = 404, description = "Snapshot disabled by configuration", body = ErrorBody)
    ),
    tag = "Diagnostics"
)]
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DiagnosticsSnapshot>> {
    let snapshot = state.snapshot_service.capture().await?;
    Ok(Json(snapshot))
}
