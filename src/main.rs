use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use querylens::config::Config;
use querylens::services::MySQLClient;
use querylens::utils::error::ErrorBody;
use querylens::{AppState, build_router, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::databases::list_databases,
        handlers::analysis::analyze_query,
        handlers::diagnostics::get_snapshot,
    ),
    components(
        schemas(
            models::AnalyzeRequest,
            models::AnalysisReport,
            models::TimingSummary,
            models::TimingSample,
            models::TimingSeries,
            models::TimingPoint,
            models::DataTable,
            models::Plan,
            models::PlanRow,
            models::Trace,
            models::TraceRow,
            models::StatDigestRecord,
            models::Finding,
            models::Severity,
            models::Notice,
            models::NoticeLevel,
            models::ColumnHelp,
            models::DiagnosticsSnapshot,
            models::SnapshotSection,
            models::SourceDescription,
            ErrorBody,
        )
    ),
    tags(
        (name = "Analysis", description = "Query benchmarking, plans and findings"),
        (name = "Diagnostics", description = "Server statistics snapshot"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first
    let config = Config::load()?;

    // Initialize logging
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);

    let registry = tracing_subscriber::registry().with(log_filter);

    // Keeps the non-blocking file writer flushing until shutdown
    let mut _log_guard = None;
    if let Some((log_dir, file_prefix)) = config.logging.file_location() {
        // No subscriber yet, so this failure is returned rather than logged
        std::fs::create_dir_all(&log_dir).map_err(|e| {
            format!("Cannot create log directory {}: {}", log_dir.display(), e)
        })?;

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        _log_guard = Some(guard);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    tracing::info!("querylens starting up");
    tracing::info!(
        "Target MySQL server {}:{} as {} (statistics schema: {})",
        config.mysql.host,
        config.mysql.port,
        config.mysql.user,
        config.mysql.statistics_schema
    );
    if !config.diagnostics.snapshot_enabled {
        tracing::warn!("Diagnostics snapshot disabled by configuration");
    }

    let mysql_client = Arc::new(MySQLClient::new(config.mysql.clone()));
    let app_state = Arc::new(AppState::new(&config, mysql_client));

    let app = build_router(app_state)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API documentation available at http://{}/api-docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
