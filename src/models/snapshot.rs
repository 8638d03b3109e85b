use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::analysis::DataTable;
use super::report::Notice;

/// One titled introspection table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotSection {
    pub title: String,
    /// Statistics table the section reads from
    pub source: String,
    pub table: Option<DataTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only view over the server's statistics store
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsSnapshot {
    pub captured_at: DateTime<Utc>,
    pub available: bool,
    pub sections: Vec<SnapshotSection>,
    pub notices: Vec<Notice>,
    /// Source table -> what it shows
    pub sources: Vec<SourceDescription>,
    pub guidance: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SourceDescription {
    pub source: String,
    pub description: String,
}
