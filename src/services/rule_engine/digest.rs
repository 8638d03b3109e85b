//! Statistics rules (D001-D005)
//!
//! Evaluated against the correlated digest record; none fires without one.

use super::*;

/// D001: Frequently executed
/// Condition: COUNT_STAR > frequent_execution_count
pub struct D001FrequentExecution;

impl DiagnosticRule for D001FrequentExecution {
    fn id(&self) -> &str {
        "D001"
    }
    fn name(&self) -> &str {
        "Frequently executed"
    }
    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        let stats = context.statistics?;
        if stats.count_star <= context.thresholds.frequent_execution_count {
            return None;
        }
        Some(self.finding(format!(
            "The query was executed {} times; it may be used too often",
            stats.count_star
        )))
    }
}

/// D002: Slow on average
/// Condition: average wait > slow_average_secs
pub struct D002SlowAverage;

impl DiagnosticRule for D002SlowAverage {
    fn id(&self) -> &str {
        "D002"
    }
    fn name(&self) -> &str {
        "Slow average execution"
    }
    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        let stats = context.statistics?;
        if stats.avg_time_secs <= context.thresholds.slow_average_secs {
            return None;
        }
        Some(self.finding(format!(
            "Average execution time is {:.3} s; the query is worth optimizing",
            stats.avg_time_secs
        )))
    }
}

/// D003: Heaviest statements
/// Condition: total wait > heavy_total_secs
pub struct D003HeavyTotal;

impl DiagnosticRule for D003HeavyTotal {
    fn id(&self) -> &str {
        "D003"
    }
    fn name(&self) -> &str {
        "High cumulative time"
    }
    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        let stats = context.statistics?;
        let limit = context.thresholds.heavy_total_secs;
        if stats.total_time_secs <= limit {
            return None;
        }
        Some(self.finding(format!(
            "Total execution time exceeds {} s; the query is among the heaviest on the server",
            limit
        )))
    }
}

/// D004: Join in digest
/// Condition: digest text contains JOIN, any case
pub struct D004JoinDigest;

impl DiagnosticRule for D004JoinDigest {
    fn id(&self) -> &str {
        "D004"
    }
    fn name(&self) -> &str {
        "Join"
    }
    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        let stats = context.statistics?;
        stats.digest_text.to_uppercase().contains("JOIN").then(|| {
            self.finding(
                "The query contains a JOIN; check that the join columns are indexed".to_string(),
            )
        })
    }
}

/// D005: Hot field
/// Condition: digest text contains the configured marker (case-sensitive)
pub struct D005HotField;

impl DiagnosticRule for D005HotField {
    fn id(&self) -> &str {
        "D005"
    }
    fn name(&self) -> &str {
        "Hot field"
    }
    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        let stats = context.statistics?;
        let marker = context.thresholds.hot_field()?;
        if !stats.digest_text.contains(marker) {
            return None;
        }
        Some(self.finding(format!(
            "Queries on `{}` dominate the workload; consider an index or a refactor",
            marker
        )))
    }
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![
        Box::new(D001FrequentExecution),
        Box::new(D002SlowAverage),
        Box::new(D003HeavyTotal),
        Box::new(D004JoinDigest),
        Box::new(D005HotField),
    ]
}
