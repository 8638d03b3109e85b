use axum::{Json, extract::State};
use std::sync::Arc;

use crate::AppState;
use crate::utils::ApiResult;

/// List user databases, hiding the server's system schemas
#[utoipa::path(
    get,
    path = "/api/databases",
    responses(
        (status = 200, description = "List of databases", body = Vec<String>),
        (status = 502, description = "Cannot connect to the database server", body = ErrorBody)
    ),
    tag = "Analysis"
)]
pub async fn list_databases(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    let databases = state.catalog_service.list_databases().await?;
    Ok(Json(databases))
}
