//! Diagnostic rule engine
//!
//! Plan rules (P001-P003) look at the estimated plan, digest rules (D001-D005) at the
//! correlated server statistics. Evaluation is pure: no I/O, no shared state, and the
//! output order is the rule order.

pub mod digest;
pub mod plan;
pub mod thresholds;

pub use thresholds::RuleThresholds;

use crate::models::{Finding, PlanRow, Severity, StatDigestRecord, TraceRow};

/// Inputs a rule may look at
pub struct RuleContext<'a> {
    pub plan: &'a [PlanRow],
    /// Actual-execution rows; absent when the server could not produce a trace
    pub trace: Option<&'a [TraceRow]>,
    pub statistics: Option<&'a StatDigestRecord>,
    pub thresholds: &'a RuleThresholds,
}

/// Diagnostic rule trait
pub trait DiagnosticRule: Send + Sync {
    /// Rule ID (e.g., "P001", "D004")
    fn id(&self) -> &str;

    /// Rule name
    fn name(&self) -> &str;

    fn severity(&self) -> Severity;

    /// Evaluate the rule and return a finding if triggered
    fn evaluate(&self, context: &RuleContext) -> Option<Finding>;

    fn finding(&self, message: String) -> Finding {
        Finding { rule_id: self.id().to_string(), severity: self.severity(), message }
    }
}

/// All rules in evaluation order
pub fn get_all_rules() -> Vec<Box<dyn DiagnosticRule>> {
    let mut rules: Vec<Box<dyn DiagnosticRule>> = Vec::new();

    // Plan rules (P001-P003)
    rules.extend(plan::get_rules());

    // Statistics rules (D001-D005)
    rules.extend(digest::get_rules());

    rules
}

/// Rule engine for query diagnostics
pub struct RuleEngine {
    thresholds: RuleThresholds,
    rules: Vec<Box<dyn DiagnosticRule>>,
}

impl RuleEngine {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds, rules: get_all_rules() }
    }

    /// Run every rule once, in order; each emits at most one finding
    pub fn diagnose(
        &self,
        plan: &[PlanRow],
        trace: Option<&[TraceRow]>,
        statistics: Option<&StatDigestRecord>,
    ) -> Vec<Finding> {
        let context = RuleContext { plan, trace, statistics, thresholds: &self.thresholds };

        let findings: Vec<Finding> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let finding = rule.evaluate(&context)?;
                tracing::debug!("Rule {} ({}) fired", rule.id(), rule.name());
                Some(finding)
            })
            .collect();

        tracing::debug!(
            "Rule engine produced {} findings ({} plan rows, statistics: {})",
            findings.len(),
            plan.len(),
            statistics.is_some()
        );
        findings
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(RuleThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_row(access_type: &str, extra: Option<&str>) -> PlanRow {
        PlanRow {
            id: Some("1".into()),
            select_type: Some("SIMPLE".into()),
            table: Some("orders".into()),
            access_type: Some(access_type.into()),
            rows: Some(1000),
            extra: extra.map(str::to_string),
        }
    }

    fn stats(count_star: u64, avg: f64, total: f64, digest: &str) -> StatDigestRecord {
        StatDigestRecord {
            digest_text: digest.to_string(),
            count_star,
            avg_time_secs: avg,
            total_time_secs: total,
            max_time_secs: avg,
        }
    }

    fn ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule_id.as_str()).collect()
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let rules = get_all_rules();
        let ids: Vec<&str> = rules.iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["P001", "P002", "P003", "D001", "D002", "D003", "D004", "D005"]);
    }

    #[test]
    fn test_rule_names_are_distinct() {
        let rules = get_all_rules();
        let mut names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
        assert!(names.iter().all(|n| !n.trim().is_empty()));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_full_scan_fires_only_for_all() {
        let engine = RuleEngine::default();

        let findings = engine.diagnose(&[plan_row("ALL", None)], None, None);
        assert_eq!(ids(&findings), ["P001"]);
        assert_eq!(findings[0].severity, Severity::Warning);

        let findings = engine.diagnose(&[plan_row("ref", None)], None, None);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_extra_markers() {
        let engine = RuleEngine::default();
        let plan = [
            plan_row("ref", Some("Using where; Using filesort")),
            plan_row("eq_ref", Some("Using temporary")),
        ];
        let findings = engine.diagnose(&plan, None, None);
        assert_eq!(ids(&findings), ["P002", "P003"]);
    }

    #[test]
    fn test_digest_rules_need_statistics() {
        let engine = RuleEngine::new(RuleThresholds {
            hot_field: Some("customer_id".into()),
            ..Default::default()
        });
        let findings = engine.diagnose(&[plan_row("const", None)], None, None);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_frequent_join_scenario() {
        let engine = RuleEngine::default();
        let record = stats(600, 0.1, 1.0, "SELECT * FROM `orders` JOIN `customers` USING (`id`)");
        let findings = engine.diagnose(&[], None, Some(&record));

        assert_eq!(ids(&findings), ["D001", "D004"]);
        assert!(findings.iter().all(|f| f.severity == Severity::Info));
        assert!(findings[0].message.contains("600"));
    }

    #[test]
    fn test_slow_and_heavy_digest() {
        let engine = RuleEngine::default();
        let record = stats(10, 0.75, 7.5, "select `id` from `orders`");
        let findings = engine.diagnose(&[], None, Some(&record));
        assert_eq!(ids(&findings), ["D002", "D003"]);
        assert!(findings[0].message.contains("0.750"));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let engine = RuleEngine::default();
        let record = stats(500, 0.5, 5.0, "SELECT 1");
        assert!(engine.diagnose(&[], None, Some(&record)).is_empty());
    }

    #[test]
    fn test_join_match_ignores_case() {
        let engine = RuleEngine::default();
        let record = stats(1, 0.0, 0.0, "select * from a left join b on a.id = b.id");
        assert_eq!(ids(&engine.diagnose(&[], None, Some(&record))), ["D004"]);
    }

    #[test]
    fn test_hot_field_marker() {
        let record = stats(1, 0.0, 0.0, "SELECT `common_name` FROM `species`");

        let disabled = RuleEngine::default();
        assert!(disabled.diagnose(&[], None, Some(&record)).is_empty());

        let enabled = RuleEngine::new(RuleThresholds {
            hot_field: Some("common_name".into()),
            ..Default::default()
        });
        let findings = enabled.diagnose(&[], None, Some(&record));
        assert_eq!(ids(&findings), ["D005"]);
        assert!(findings[0].message.contains("common_name"));
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = RuleEngine::new(RuleThresholds {
            frequent_execution_count: 10,
            slow_average_secs: 0.05,
            heavy_total_secs: 1.0,
            hot_field: None,
        });
        let record = stats(11, 0.1, 1.1, "SELECT 1");
        assert_eq!(ids(&engine.diagnose(&[], None, Some(&record))), ["D001", "D002", "D003"]);
    }

    #[test]
    fn test_diagnose_is_deterministic() {
        let engine = RuleEngine::default();
        let plan = [plan_row("ALL", Some("Using temporary; Using filesort"))];
        let record = stats(900, 1.2, 80.0, "SELECT ... JOIN ...");

        let first = engine.diagnose(&plan, None, Some(&record));
        let second = engine.diagnose(&plan, None, Some(&record));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(ids(&first), ["P001", "P002", "P003", "D001", "D002", "D003", "D004"]);
    }

    #[test]
    fn test_each_rule_fires_at_most_once() {
        let engine = RuleEngine::default();
        let plan = [plan_row("ALL", None), plan_row("ALL", None), plan_row("ALL", None)];
        assert_eq!(engine.diagnose(&plan, None, None).len(), 1);
    }
}
