//! Analysis data model
//!
//! Everything here is built fresh for one analysis request and dropped once the
//! report has been rendered.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::StringExt;
use crate::utils::error::AnalysisError;

/// Upper bound on benchmark repetitions per request
pub const MAX_REPEAT_COUNT: u32 = 500;

/// A query submitted for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    query: String,
    repeat_count: u32,
    database: Option<String>,
}

impl QuerySpec {
    pub fn new(
        query: impl Into<String>,
        repeat_count: i64,
        database: Option<String>,
    ) -> Result<Self, AnalysisError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest("query text is empty".to_string()));
        }
        let repeat_count = u32::try_from(repeat_count)
            .ok()
            .filter(|n| (1..=MAX_REPEAT_COUNT).contains(n))
            .ok_or_else(|| {
                AnalysisError::InvalidRequest(format!(
                    "repeat_count must be between 1 and {}, got {}",
                    MAX_REPEAT_COUNT, repeat_count
                ))
            })?;
        let database = database.clean();
        Ok(Self { query, repeat_count, database })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Query text suitable for embedding after `EXPLAIN` / `ANALYZE`
    pub fn statement_body(&self) -> &str {
        let trimmed = self.query.trim();
        trimmed.strip_suffix(';').map(str::trim_end).unwrap_or(trimmed)
    }
}

/// Tabular data as returned by the server, every cell rendered as a string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Raw driver result; same shape as a display table
pub type ResultSet = DataTable;

impl DataTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column, compared case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Per-run wall-clock durations in seconds, in execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimingSample {
    durations: Vec<f64>,
}

/// One point of the timing chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimingPoint {
    pub run: u32,
    pub seconds: f64,
}

impl TimingSample {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { durations: Vec::with_capacity(capacity) }
    }

    pub fn from_durations(durations: Vec<f64>) -> Self {
        Self { durations }
    }

    /// Append a run, rounded to microseconds
    pub fn record(&mut self, seconds: f64) {
        self.durations.push(round_micros(seconds.max(0.0)));
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.durations.is_empty() {
            return None;
        }
        Some(self.durations.iter().sum::<f64>() / self.durations.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.durations.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.durations.iter().copied().reduce(f64::max)
    }

    /// Chart points, runs numbered from 1
    pub fn series(&self) -> Vec<TimingPoint> {
        self.durations
            .iter()
            .enumerate()
            .map(|(i, &seconds)| TimingPoint { run: i as u32 + 1, seconds })
            .collect()
    }
}

pub fn round_micros(seconds: f64) -> f64 {
    (seconds * 1_000_000.0).round() / 1_000_000.0
}

/// One row of `EXPLAIN` output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlanRow {
    pub id: Option<String>,
    pub select_type: Option<String>,
    pub table: Option<String>,
    /// Join/access type (`ALL`, `ref`, `eq_ref`, `const`, `index`, `range`, ...)
    pub access_type: Option<String>,
    /// Estimated rows to examine
    pub rows: Option<u64>,
    pub extra: Option<String>,
}

// Positions used by the traditional EXPLAIN layout when a column name is missing
const ACCESS_TYPE_POSITION: usize = 3;

impl PlanRow {
    /// Build a row by column name; `type` falls back to position 3 and `Extra` to the last column
    pub fn from_row(columns: &[String], row: &[String]) -> Self {
        let cell = |name: &str| -> Option<String> {
            columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name))
                .and_then(|i| row.get(i))
                .and_then(|v| non_null(v))
        };

        let access_type = if has_column(columns, "type") {
            cell("type")
        } else {
            row.get(ACCESS_TYPE_POSITION).and_then(|v| non_null(v))
        };
        let extra = if has_column(columns, "extra") {
            cell("extra")
        } else {
            row.last().and_then(|v| non_null(v))
        };

        Self {
            id: cell("id"),
            select_type: cell("select_type"),
            table: cell("table"),
            access_type,
            rows: cell("rows").and_then(|v| v.parse().ok()),
            extra,
        }
    }

    pub fn is_full_scan(&self) -> bool {
        self.access_type.as_deref() == Some("ALL")
    }

    pub fn extra_contains(&self, marker: &str) -> bool {
        self.extra.as_deref().is_some_and(|e| e.contains(marker))
    }
}

/// Estimated plan: raw table plus parsed rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Plan {
    pub table: DataTable,
    pub rows: Vec<PlanRow>,
}

impl From<DataTable> for Plan {
    fn from(table: DataTable) -> Self {
        let rows = table.rows.iter().map(|r| PlanRow::from_row(&table.columns, r)).collect();
        Self { table, rows }
    }
}

/// One row of `ANALYZE` output: the plan columns plus measured values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TraceRow {
    #[serde(flatten)]
    pub plan: PlanRow,
    /// `r_rows`
    pub actual_rows: Option<f64>,
    /// `r_filtered`
    pub actual_filtered: Option<f64>,
    /// `r_total_time_ms`
    pub actual_time_ms: Option<f64>,
}

impl TraceRow {
    pub fn from_row(columns: &[String], row: &[String]) -> Self {
        let number = |name: &str| -> Option<f64> {
            columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name))
                .and_then(|i| row.get(i))
                .and_then(|v| v.trim().parse().ok())
        };
        Self {
            plan: PlanRow::from_row(columns, row),
            actual_rows: number("r_rows"),
            actual_filtered: number("r_filtered"),
            actual_time_ms: number("r_total_time_ms"),
        }
    }
}

/// Actual-execution trace: raw table plus parsed rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Trace {
    pub table: DataTable,
    pub rows: Vec<TraceRow>,
}

impl From<DataTable> for Trace {
    fn from(table: DataTable) -> Self {
        let rows = table.rows.iter().map(|r| TraceRow::from_row(&table.columns, r)).collect();
        Self { table, rows }
    }
}

/// Aggregated server-side statistics for one statement digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatDigestRecord {
    pub digest_text: String,
    pub count_star: u64,
    pub avg_time_secs: f64,
    pub total_time_secs: f64,
    pub max_time_secs: f64,
}

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// A rendered diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
}

/// Everything the pipeline produces for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResult {
    pub timings: TimingSample,
    pub plan: Plan,
    pub trace: Option<Trace>,
    pub statistics: Option<StatDigestRecord>,
    pub findings: Vec<Finding>,
}

fn has_column(columns: &[String], name: &str) -> bool {
    columns.iter().any(|c| c.eq_ignore_ascii_case(name))
}

fn non_null(value: &str) -> Option<String> {
    if value == "NULL" || value.is_empty() { None } else { Some(value.to_string()) }
}
