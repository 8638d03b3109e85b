use crate::models::{
    DataTable, DiagnosticsSnapshot, Finding, Notice, Plan, Severity, SnapshotSection, TraceRow,
};
use chrono::Utc;
use serde_json::json;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_finding_serialization() {
    let finding = Finding {
        rule_id: "P001".to_string(),
        severity: Severity::Warning,
        message: "full scan".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&finding).unwrap(),
        json!({ "rule_id": "P001", "severity": "warning", "message": "full scan" })
    );
}

#[test]
fn test_trace_row_flattens_plan_columns() {
    let columns = strings(&["id", "table", "type", "rows", "r_rows", "Extra"]);
    let row = strings(&["1", "orders", "ALL", "10", "9", "Using where"]);
    let value = serde_json::to_value(TraceRow::from_row(&columns, &row)).unwrap();

    assert_eq!(value["table"], "orders");
    assert_eq!(value["access_type"], "ALL");
    assert_eq!(value["actual_rows"], 9.0);
    assert!(value.get("plan").is_none());
}

#[test]
fn test_plan_keeps_raw_table() {
    let table = DataTable::new(
        strings(&["id", "type", "Extra"]),
        vec![strings(&["1", "ALL", "Using temporary; Using filesort"])],
    );
    let plan = Plan::from(table.clone());
    assert_eq!(plan.table, table);
    assert!(plan.rows[0].extra_contains("Using temporary"));
    assert!(plan.rows[0].extra_contains("Using filesort"));
}

#[test]
fn test_snapshot_section_omits_missing_error() {
    let ok = SnapshotSection {
        title: "Thread activity".to_string(),
        source: "threads".to_string(),
        table: Some(DataTable::default()),
        error: None,
    };
    let value = serde_json::to_value(&ok).unwrap();
    assert!(value.get("error").is_none());

    let failed = SnapshotSection { table: None, error: Some("denied".to_string()), ..ok };
    let value = serde_json::to_value(&failed).unwrap();
    assert_eq!(value["error"], "denied");
    assert!(value["table"].is_null());
}

#[test]
fn test_snapshot_round_trips() {
    let snapshot = DiagnosticsSnapshot {
        captured_at: Utc::now(),
        available: false,
        sections: Vec::new(),
        notices: vec![Notice::warning("unavailable")],
        sources: Vec::new(),
        guidance: Vec::new(),
    };
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: DiagnosticsSnapshot = serde_json::from_str(&json).unwrap();
    assert!(!back.available);
    assert_eq!(back.notices, snapshot.notices);
    assert_eq!(back.captured_at, snapshot.captured_at);
}
