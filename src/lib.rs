//! querylens Library
//!
//! SQL query performance analysis for MySQL: benchmark a query, inspect its plan and trace,
//! correlate server statistics and turn all of it into findings.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use services::{
    AnalysisService, CatalogService, Connector, DiagnosticsSnapshotService, MySQLClient,
    RuleEngine,
};

/// Application shared state
///
/// Every service holds the same connector; connections themselves are opened per
/// sub-operation and never shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub analysis_service: Arc<AnalysisService>,
    pub snapshot_service: Arc<DiagnosticsSnapshotService>,
    pub catalog_service: Arc<CatalogService>,
}

impl AppState {
    pub fn new(config: &Config, connector: Arc<dyn Connector>) -> Self {
        let schema = config.mysql.statistics_schema.clone();
        Self {
            analysis_service: Arc::new(AnalysisService::new(
                Arc::clone(&connector),
                schema.clone(),
                config.rules.clone(),
            )),
            snapshot_service: Arc::new(DiagnosticsSnapshotService::new(
                Arc::clone(&connector),
                schema,
                config.diagnostics.snapshot_enabled,
            )),
            catalog_service: Arc::new(CatalogService::new(connector)),
        }
    }
}

/// API and health routes, without documentation or HTTP layers
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/databases", get(handlers::databases::list_databases))
        .route("/api/analyze", post(handlers::analysis::analyze_query))
        .route("/api/diagnostics/snapshot", get(handlers::diagnostics::get_snapshot))
        .with_state(state);

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check));

    Router::new().merge(api_routes).merge(health_routes)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ready_check() -> &'static str {
    "READY"
}
