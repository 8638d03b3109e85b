// Server Statistics Correlator
// Purpose: Find the server-wide digest record matching the analysed query

use crate::models::{QuerySpec, ResultSet, StatDigestRecord};
use crate::services::mysql_client::Connector;
use crate::utils::error::AnalysisError;
use std::sync::Arc;

/// Characters of query text used as the digest search key
pub const SEARCH_KEY_LENGTH: usize = 30;

/// Escape character for the digest pattern; unaffected by `NO_BACKSLASH_ESCAPES`
const LIKE_ESCAPE: char = '!';

/// Timer columns are in picoseconds
const DIGEST_LOOKUP_SQL: &str = "SELECT DIGEST_TEXT, COUNT_STAR, \
     AVG_TIMER_WAIT / 1e12 AS avg_time_sec, \
     SUM_TIMER_WAIT / 1e12 AS total_time_sec, \
     MAX_TIMER_WAIT / 1e12 AS max_time_sec \
     FROM events_statements_summary_by_digest \
     WHERE DIGEST_TEXT LIKE ? ESCAPE '!' \
     ORDER BY total_time_sec DESC \
     LIMIT 1";

pub struct StatsCorrelator {
    connector: Arc<dyn Connector>,
    statistics_schema: String,
}

impl StatsCorrelator {
    pub fn new(connector: Arc<dyn Connector>, statistics_schema: impl Into<String>) -> Self {
        Self { connector, statistics_schema: statistics_schema.into() }
    }

    /// Best-effort lookup on a dedicated connection
    ///
    /// Never fails: an unreachable or disabled statistics store and a missing match all
    /// return `None`.
    pub async fn correlate(&self, spec: &QuerySpec) -> Option<StatDigestRecord> {
        match self.lookup(spec).await {
            Ok(record) => {
                if record.is_none() {
                    tracing::debug!("No digest matches the query");
                }
                record
            },
            Err(e) => {
                tracing::debug!("Statistics lookup skipped: {}", e);
                None
            },
        }
    }

    async fn lookup(&self, spec: &QuerySpec) -> Result<Option<StatDigestRecord>, AnalysisError> {
        let mut session = self
            .connector
            .open(Some(self.statistics_schema.as_str()))
            .await
            .map_err(AnalysisError::StatisticsUnavailable)?;

        let pattern = like_pattern(&search_key(spec.query()));
        let outcome = session.query_with_params(DIGEST_LOOKUP_SQL, vec![pattern]).await;
        session.close().await;

        let table = outcome.map_err(AnalysisError::StatisticsUnavailable)?;
        Ok(parse_digest_record(&table))
    }
}

/// Leading characters of the query text, counted in characters rather than bytes
pub fn search_key(query: &str) -> String {
    query.trim_start().chars().take(SEARCH_KEY_LENGTH).collect()
}

/// Substring pattern for LIKE with the key's own wildcards escaped by `!`
pub fn like_pattern(key: &str) -> String {
    let mut pattern = String::with_capacity(key.len() + 2);
    pattern.push('%');
    for c in key.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn parse_digest_record(table: &ResultSet) -> Option<StatDigestRecord> {
    let row = table.rows.first()?;
    let cell = |name: &str| table.column_index(name).and_then(|i| row.get(i));
    let number = |name: &str| cell(name).and_then(|v| v.trim().parse::<f64>().ok());

    let record = StatDigestRecord {
        // DIGEST_TEXT is NULL for statements the server could not normalize
        digest_text: cell("DIGEST_TEXT").filter(|v| *v != "NULL").cloned().unwrap_or_default(),
        count_star: cell("COUNT_STAR")?.trim().parse().ok()?,
        avg_time_secs: number("avg_time_sec")?,
        total_time_secs: number("total_time_sec")?,
        max_time_secs: number("max_time_sec")?,
    };
    Some(record)
}
