use crate::config::MySQLConfig;
use crate::models::ResultSet;
use crate::utils::error::DatabaseError;
use async_trait::async_trait;
use mysql_async::{Conn, OptsBuilder, Params, SslOpts, Value, prelude::Queryable};

/// Opens connections to the database server
///
/// The analysis services only see this trait, so they can run against scripted sessions in
/// tests.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection, optionally with a default schema
    async fn open(&self, database: Option<&str>) -> Result<Box<dyn Session>, DatabaseError>;
}

/// A single open connection
#[async_trait]
pub trait Session: Send {
    /// Run a statement and fetch every row
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DatabaseError>;

    /// Run a prepared statement with positional parameters and fetch every row
    async fn query_with_params(
        &mut self,
        sql: &str,
        params: Vec<String>,
    ) -> Result<ResultSet, DatabaseError>;

    /// Release the connection
    async fn close(self: Box<Self>);
}

/// Connection factory for one MySQL server
#[derive(Clone)]
pub struct MySQLClient {
    config: MySQLConfig,
}

/// MySQLSession wraps one dedicated connection, opened for a single sub-operation
pub struct MySQLSession {
    conn: Conn,
}

impl MySQLClient {
    pub fn new(config: MySQLConfig) -> Self {
        Self { config }
    }

    fn opts(&self, database: Option<&str>) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(self.config.host.clone())
            .tcp_port(self.config.port)
            .user(Some(self.config.user.clone()))
            .pass(Some(self.config.password.clone()).filter(|p| !p.is_empty()))
            .db_name(database.map(str::to_string))
            .prefer_socket(false)
            .ssl_opts(None::<SslOpts>)
            .tcp_keepalive(Some(30_000_u32))
            .tcp_nodelay(true)
    }
}

#[async_trait]
impl Connector for MySQLClient {
    async fn open(&self, database: Option<&str>) -> Result<Box<dyn Session>, DatabaseError> {
        let conn = Conn::new(self.opts(database)).await.map_err(|e| {
            tracing::error!(
                "Failed to connect to {}:{} (database: {}): {}",
                self.config.host,
                self.config.port,
                database.unwrap_or("<none>"),
                e
            );
            DatabaseError::from(e)
        })?;
        tracing::debug!(
            "Opened connection to {}:{} (database: {})",
            self.config.host,
            self.config.port,
            database.unwrap_or("<none>")
        );
        Ok(Box::new(MySQLSession { conn }))
    }
}

#[async_trait]
impl Session for MySQLSession {
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DatabaseError> {
        let result = self.conn.query_iter(sql).await.map_err(|e| {
            tracing::debug!("MySQL query execution failed: {}", e);
            DatabaseError::from(e)
        })?;
        // Column names survive even when the statement returns no rows
        let columns: Vec<String> = result
            .columns()
            .map(|cols| cols.iter().map(|c| c.name_str().to_string()).collect())
            .unwrap_or_default();
        let rows: Vec<mysql_async::Row> = result.collect_and_drop().await.map_err(|e| {
            tracing::debug!("MySQL result fetch failed: {}", e);
            DatabaseError::from(e)
        })?;
        tracing::trace!("Query returned {} rows", rows.len());

        let mut set = process_query_result(rows);
        if set.columns.is_empty() {
            set.columns = columns;
        }
        Ok(set)
    }

    async fn query_with_params(
        &mut self,
        sql: &str,
        params: Vec<String>,
    ) -> Result<ResultSet, DatabaseError> {
        let params = Params::Positional(params.into_iter().map(Value::from).collect());
        let rows: Vec<mysql_async::Row> = self.conn.exec(sql, params).await.map_err(|e| {
            tracing::debug!("MySQL prepared statement failed: {}", e);
            DatabaseError::from(e)
        })?;
        Ok(process_query_result(rows))
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.conn.disconnect().await {
            tracing::warn!("Failed to close connection cleanly: {}", e);
        }
    }
}

fn process_query_result(rows: Vec<mysql_async::Row>) -> ResultSet {
    let Some(first) = rows.first() else {
        return ResultSet::default();
    };

    let columns: Vec<String> =
        first.columns_ref().iter().map(|col| col.name_str().to_string()).collect();
    let col_count = columns.len();

    let result_rows = rows
        .iter()
        .map(|row| {
            (0..col_count)
                .map(|idx| row.as_ref(idx).map(value_to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    ResultSet::new(columns, result_rows)
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::NULL => "NULL".to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, hour, minute, second, _micro) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        ),
        Value::Time(neg, days, hours, minutes, seconds, _micro) => {
            let total_hours = days * 24 + (*hours as u32);
            let sign = if *neg { "-" } else { "" };
            format!("{}{}:{:02}:{:02}", sign, total_hours, minutes, seconds)
        },
    }
}
