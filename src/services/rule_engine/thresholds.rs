//! Thresholds for the statistics rules
//!
//! Loaded from the `[rules]` config section; unset keys keep the defaults below.

use serde::Deserialize;

pub const DEFAULT_FREQUENT_EXECUTION_COUNT: u64 = 500;
pub const DEFAULT_SLOW_AVERAGE_SECS: f64 = 0.5;
pub const DEFAULT_HEAVY_TOTAL_SECS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// D001 fires when the digest ran more often than this
    pub frequent_execution_count: u64,
    /// D002 fires when the average wait exceeds this many seconds
    pub slow_average_secs: f64,
    /// D003 fires when the cumulative wait exceeds this many seconds
    pub heavy_total_secs: f64,
    /// D005 marker: a column or identifier worth flagging when it shows up in hot digests
    pub hot_field: Option<String>,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            frequent_execution_count: DEFAULT_FREQUENT_EXECUTION_COUNT,
            slow_average_secs: DEFAULT_SLOW_AVERAGE_SECS,
            heavy_total_secs: DEFAULT_HEAVY_TOTAL_SECS,
            hot_field: None,
        }
    }
}

impl RuleThresholds {
    /// Hot-field marker, ignoring blank values
    pub fn hot_field(&self) -> Option<&str> {
        self.hot_field.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}
