pub mod analysis_service;
pub mod benchmark_runner;
pub mod catalog_service;
pub mod diagnostics_snapshot;
pub mod mysql_client;
pub mod plan_inspector;
pub mod rule_engine;
pub mod stats_correlator;

pub use analysis_service::AnalysisService;
pub use benchmark_runner::BenchmarkRunner;
pub use catalog_service::CatalogService;
pub use diagnostics_snapshot::DiagnosticsSnapshotService;
pub use mysql_client::{Connector, MySQLClient, MySQLSession, Session};
pub use plan_inspector::{Inspection, PlanInspector};
pub use rule_engine::{DiagnosticRule, RuleContext, RuleEngine, RuleThresholds};
pub use stats_correlator::StatsCorrelator;
