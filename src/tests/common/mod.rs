// Common test utilities and helpers

use crate::models::{DataTable, ResultSet};
use crate::services::mysql_client::{Connector, Session};
use crate::utils::error::DatabaseError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reply: an optional delay, then rows or an error
#[derive(Clone)]
pub struct Step {
    pub delay: Option<Duration>,
    pub outcome: Result<ResultSet, DatabaseError>,
}

impl Step {
    pub fn rows(set: ResultSet) -> Self {
        Self { delay: None, outcome: Ok(set) }
    }

    pub fn fail(err: DatabaseError) -> Self {
        Self { delay: None, outcome: Err(err) }
    }

    pub fn after(millis: u64, set: ResultSet) -> Self {
        Self { delay: Some(Duration::from_millis(millis)), outcome: Ok(set) }
    }
}

struct Handler {
    prefix: String,
    /// Played in order; the last step repeats once the queue runs dry
    steps: VecDeque<Step>,
}

#[derive(Default)]
struct Inner {
    handlers: Mutex<Vec<Handler>>,
    statements: Mutex<Vec<String>>,
    params: Mutex<Vec<Vec<String>>>,
    databases: Mutex<Vec<Option<String>>>,
    refused: Mutex<Vec<Option<String>>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Connector that answers statements from a script and records what it saw
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    inner: Arc<Inner>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every statement starting with `prefix` with `set`
    pub fn on(self, prefix: &str, set: ResultSet) -> Self {
        self.on_steps(prefix, vec![Step::rows(set)])
    }

    pub fn fail_on(self, prefix: &str, err: DatabaseError) -> Self {
        self.on_steps(prefix, vec![Step::fail(err)])
    }

    pub fn on_steps(self, prefix: &str, steps: Vec<Step>) -> Self {
        self.inner
            .handlers
            .lock()
            .unwrap()
            .push(Handler { prefix: prefix.to_string(), steps: steps.into() });
        self
    }

    /// Refuse connections whose default schema is `database`
    pub fn refuse(self, database: Option<&str>) -> Self {
        self.inner.refused.lock().unwrap().push(database.map(str::to_string));
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.inner.statements.lock().unwrap().clone()
    }

    pub fn params(&self) -> Vec<Vec<String>> {
        self.inner.params.lock().unwrap().clone()
    }

    pub fn databases(&self) -> Vec<Option<String>> {
        self.inner.databases.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn count_statements(&self, prefix: &str) -> usize {
        self.statements().iter().filter(|s| s.starts_with(prefix)).count()
    }

    pub fn into_connector(self) -> Arc<dyn Connector> {
        Arc::new(self)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self, database: Option<&str>) -> Result<Box<dyn Session>, DatabaseError> {
        let database = database.map(str::to_string);
        if self.inner.refused.lock().unwrap().contains(&database) {
            return Err(DatabaseError::with_code(2003, "Can't connect to MySQL server"));
        }
        self.inner.databases.lock().unwrap().push(database);
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession { inner: self.inner.clone() }))
    }
}

struct ScriptedSession {
    inner: Arc<Inner>,
}

impl ScriptedSession {
    fn next_step(&self, sql: &str) -> Step {
        let mut handlers = self.inner.handlers.lock().unwrap();
        let Some(handler) = handlers.iter_mut().find(|h| sql.trim_start().starts_with(&h.prefix))
        else {
            return Step::rows(DataTable::default());
        };
        if handler.steps.len() > 1 {
            handler.steps.pop_front().unwrap()
        } else {
            handler.steps.front().cloned().unwrap_or_else(|| Step::rows(DataTable::default()))
        }
    }

    async fn play(&self, sql: &str) -> Result<ResultSet, DatabaseError> {
        self.inner.statements.lock().unwrap().push(sql.to_string());
        let step = self.next_step(sql);
        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }
        step.outcome
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DatabaseError> {
        self.play(sql).await
    }

    async fn query_with_params(
        &mut self,
        sql: &str,
        params: Vec<String>,
    ) -> Result<ResultSet, DatabaseError> {
        self.inner.params.lock().unwrap().push(params);
        self.play(sql).await
    }

    async fn close(self: Box<Self>) {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn table(columns: &[&str], rows: &[&[&str]]) -> DataTable {
    DataTable::new(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter().map(|r| r.iter().map(|v| v.to_string()).collect()).collect(),
    )
}

/// Traditional EXPLAIN output with one row per (table, type, Extra)
pub fn explain_table(rows: &[(&str, &str, &str)]) -> DataTable {
    let columns = [
        "id",
        "select_type",
        "table",
        "partitions",
        "type",
        "possible_keys",
        "key",
        "key_len",
        "ref",
        "rows",
        "filtered",
        "Extra",
    ];
    let rows: Vec<Vec<&str>> = rows
        .iter()
        .map(|(table, access, extra)| {
            vec![
                "1", "SIMPLE", table, "NULL", access, "NULL", "NULL", "NULL", "NULL", "100",
                "100.00", extra,
            ]
        })
        .collect();
    let refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    table(&columns, &refs)
}

/// Digest summary row as returned by the statistics lookup
pub fn digest_table(digest: &str, count: u64, avg: f64, total: f64, max: f64) -> DataTable {
    DataTable::new(
        ["DIGEST_TEXT", "COUNT_STAR", "avg_time_sec", "total_time_sec", "max_time_sec"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        vec![vec![
            digest.to_string(),
            count.to_string(),
            avg.to_string(),
            total.to_string(),
            max.to_string(),
        ]],
    )
}
