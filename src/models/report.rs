use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::analysis::{
    DataTable, Finding, Plan, StatDigestRecord, TimingPoint, TimingSample, Trace,
};

/// Analysis request body
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    pub query: String,
    /// Taken as a wide integer so out-of-range values reach validation
    #[serde(default = "default_repeat_count")]
    pub repeat_count: i64,
    /// Target database; the connection has no default schema when omitted
    #[serde(default)]
    pub database: Option<String>,
}

fn default_repeat_count() -> i64 {
    1
}

/// Level of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }
}

/// Series plotted as "execution time per run"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimingSeries {
    pub label: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<TimingPoint>,
}

impl From<&TimingSample> for TimingSeries {
    fn from(sample: &TimingSample) -> Self {
        Self {
            label: "Query execution time per run".to_string(),
            x_label: "Run".to_string(),
            y_label: "Time (s)".to_string(),
            points: sample.series(),
        }
    }
}

/// Aggregate timing figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimingSummary {
    pub runs: usize,
    pub mean_secs: f64,
    pub min_secs: f64,
    pub max_secs: f64,
    pub samples: TimingSample,
}

/// Short description of an EXPLAIN column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnHelp {
    pub column: String,
    pub description: String,
}

/// Rendered analysis: the pipeline result plus everything needed for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub generated_at: DateTime<Utc>,
    pub query: String,
    pub database: Option<String>,
    pub timing: TimingSummary,
    pub series: TimingSeries,
    /// Result of one extra, un-timed execution
    pub result: DataTable,
    pub plan: Plan,
    pub trace: Option<Trace>,
    pub statistics: Option<StatDigestRecord>,
    pub findings: Vec<Finding>,
    pub notices: Vec<Notice>,
    pub plan_legend: Vec<ColumnHelp>,
}

/// Legend shown next to the EXPLAIN table
pub fn plan_legend() -> Vec<ColumnHelp> {
    [
        ("id", "Identifier of the SELECT within the plan; higher ids run later"),
        ("select_type", "Kind of SELECT (SIMPLE, PRIMARY, SUBQUERY, ...)"),
        ("table", "Table the row refers to"),
        (
            "type",
            "Access/join type (ALL, index, range, ref, eq_ref, const); more selective is better",
        ),
        ("rows", "Estimated rows the server has to examine; fewer is faster"),
        ("Extra", "Additional notes such as Using where, Using filesort, Using temporary"),
    ]
    .into_iter()
    .map(|(column, description)| ColumnHelp {
        column: column.to_string(),
        description: description.to_string(),
    })
    .collect()
}
