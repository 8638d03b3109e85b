//! Plan rules (P001-P003)
//!
//! Evaluated against the estimated plan rows.

use super::*;

/// P001: Full table scan
/// Condition: any row with access type `ALL`
/// When a trace is available the message also carries the rows actually read.
pub struct P001FullTableScan;

impl DiagnosticRule for P001FullTableScan {
    fn id(&self) -> &str {
        "P001"
    }
    fn name(&self) -> &str {
        "Full table scan"
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        let scanned: Vec<&str> = context
            .plan
            .iter()
            .filter(|row| row.is_full_scan())
            .map(|row| row.table.as_deref().unwrap_or("?"))
            .collect();
        if scanned.is_empty() {
            return None;
        }

        let described: Vec<String> = scanned
            .iter()
            .map(|table| match actual_rows_read(context.trace, table) {
                Some(rows) => format!("{}: {:.0} rows read", table, rows),
                None => table.to_string(),
            })
            .collect();

        Some(self.finding(format!(
            "The query performs a full table scan ({}); consider adding an index",
            described.join(", ")
        )))
    }
}

/// P002: Filesort
/// Condition: any row whose Extra contains `Using filesort`
pub struct P002Filesort;

impl DiagnosticRule for P002Filesort {
    fn id(&self) -> &str {
        "P002"
    }
    fn name(&self) -> &str {
        "Filesort"
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        context
            .plan
            .iter()
            .any(|row| row.extra_contains("Using filesort"))
            .then(|| {
                self.finding(
                    "In-memory sort (Using filesort) may hurt performance".to_string(),
                )
            })
    }
}

/// P003: Temporary table
/// Condition: any row whose Extra contains `Using temporary`
pub struct P003TemporaryTable;

impl DiagnosticRule for P003TemporaryTable {
    fn id(&self) -> &str {
        "P003"
    }
    fn name(&self) -> &str {
        "Temporary table"
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Finding> {
        context
            .plan
            .iter()
            .any(|row| row.extra_contains("Using temporary"))
            .then(|| {
                self.finding(
                    "Temporary table creation (Using temporary) may slow the query down"
                        .to_string(),
                )
            })
    }
}

fn actual_rows_read(trace: Option<&[TraceRow]>, table: &str) -> Option<f64> {
    trace?
        .iter()
        .find(|row| row.plan.is_full_scan() && row.plan.table.as_deref() == Some(table))
        .and_then(|row| row.actual_rows)
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(P001FullTableScan), Box::new(P002Filesort), Box::new(P003TemporaryTable)]
}
