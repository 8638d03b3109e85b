// Diagnostics Snapshot Service
// Purpose: Read-only overview of the server's statistics tables, for display only

use crate::models::{DiagnosticsSnapshot, Notice, SnapshotSection, SourceDescription};
use crate::services::mysql_client::{Connector, Session};
use crate::utils::error::AnalysisError;
use chrono::Utc;
use std::sync::Arc;

pub const SNAPSHOT_UNAVAILABLE_NOTICE: &str =
    "Could not read diagnostics from the statistics schema";

struct SnapshotQuery {
    title: &'static str,
    source: &'static str,
    sql: &'static str,
}

const SNAPSHOT_QUERIES: [SnapshotQuery; 6] = [
    SnapshotQuery {
        title: "Top statements by total wait",
        source: "events_statements_summary_by_digest",
        sql: "SELECT DIGEST_TEXT, COUNT_STAR, \
              SUM_TIMER_WAIT / 1e12 AS total_sec, \
              AVG_TIMER_WAIT / 1e12 AS avg_sec, \
              MAX_TIMER_WAIT / 1e12 AS max_sec, \
              FIRST_SEEN, LAST_SEEN \
              FROM events_statements_summary_by_digest \
              ORDER BY total_sec DESC LIMIT 10",
    },
    SnapshotQuery {
        title: "Currently executing statements",
        source: "events_statements_current",
        sql: "SELECT * FROM events_statements_current LIMIT 10",
    },
    SnapshotQuery {
        title: "I/O waits by instance",
        source: "events_waits_summary_by_instance",
        sql: "SELECT * FROM events_waits_summary_by_instance \
              ORDER BY SUM_TIMER_WAIT DESC LIMIT 10",
    },
    SnapshotQuery {
        title: "Table I/O waits",
        source: "table_io_waits_summary_by_table",
        sql: "SELECT * FROM table_io_waits_summary_by_table \
              ORDER BY SUM_TIMER_WAIT DESC LIMIT 10",
    },
    SnapshotQuery {
        title: "Index I/O waits",
        source: "table_io_waits_summary_by_index_usage",
        sql: "SELECT * FROM table_io_waits_summary_by_index_usage \
              ORDER BY SUM_TIMER_WAIT DESC LIMIT 10",
    },
    SnapshotQuery {
        title: "Thread activity",
        source: "threads",
        sql: "SELECT * FROM threads LIMIT 10",
    },
];

const SOURCE_DESCRIPTIONS: [(&str, &str); 6] = [
    ("events_statements_summary_by_digest", "Aggregated statistics per normalized statement"),
    ("events_statements_current", "Statements executing right now"),
    ("events_waits_summary_by_instance", "Waits on I/O and synchronization instances"),
    ("table_io_waits_summary_by_table", "I/O wait times per table"),
    ("table_io_waits_summary_by_index_usage", "How indexes are actually used"),
    ("threads", "Activity of the threads serving connections"),
];

const GUIDANCE: [&str; 4] = [
    "Top statements: a digest with more than 5 s of total wait or more than 500 executions \
     deserves a closer look (indexes, caching).",
    "I/O waits: high values in events_waits_summary_by_instance suggest the storage engine is \
     saturated; check disk IOPS and logs.",
    "Index usage: a low COUNT_STAR with a high SUM_TIMER_WAIT in \
     table_io_waits_summary_by_index_usage points to an unused or poorly chosen index.",
    "Threads: a high PROCESSLIST_TIME can mean stuck or slow statements; inspect long-running \
     and blocked queries.",
];

pub struct DiagnosticsSnapshotService {
    connector: Arc<dyn Connector>,
    statistics_schema: String,
    enabled: bool,
}

impl DiagnosticsSnapshotService {
    pub fn new(
        connector: Arc<dyn Connector>,
        statistics_schema: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self { connector, statistics_schema: statistics_schema.into(), enabled }
    }

    /// Run the fixed introspection queries on one connection
    ///
    /// A failing query only fails its own section. When the statistics schema cannot be
    /// reached at all the snapshot comes back unavailable with a warning.
    pub async fn capture(&self) -> Result<DiagnosticsSnapshot, AnalysisError> {
        if !self.enabled {
            return Err(AnalysisError::SnapshotDisabled);
        }

        let mut snapshot = DiagnosticsSnapshot {
            captured_at: Utc::now(),
            available: false,
            sections: Vec::with_capacity(SNAPSHOT_QUERIES.len()),
            notices: Vec::new(),
            sources: SOURCE_DESCRIPTIONS
                .iter()
                .map(|(source, description)| SourceDescription {
                    source: source.to_string(),
                    description: description.to_string(),
                })
                .collect(),
            guidance: GUIDANCE.iter().map(|g| g.to_string()).collect(),
        };

        let mut session = match self.connector.open(Some(self.statistics_schema.as_str())).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Diagnostics snapshot unavailable: {}", e);
                snapshot.notices.push(Notice::warning(SNAPSHOT_UNAVAILABLE_NOTICE));
                return Ok(snapshot);
            },
        };

        for query in &SNAPSHOT_QUERIES {
            snapshot.sections.push(capture_section(session.as_mut(), query).await);
        }
        session.close().await;

        snapshot.available = true;
        let failed = snapshot.sections.iter().filter(|s| s.error.is_some()).count();
        tracing::info!(
            "Captured diagnostics snapshot: {} sections, {} failed",
            snapshot.sections.len(),
            failed
        );
        Ok(snapshot)
    }
}

async fn capture_section(session: &mut dyn Session, query: &SnapshotQuery) -> SnapshotSection {
    let (table, error) = match session.query(query.sql).await {
        Ok(table) => (Some(table), None),
        Err(e) => {
            tracing::warn!("Snapshot query on {} failed: {}", query.source, e);
            (None, Some(e.to_string()))
        },
    };
    SnapshotSection {
        title: query.title.to_string(),
        source: query.source.to_string(),
        table,
        error,
    }
}
