// Catalog Service
// Purpose: List the databases a query can be analysed against

use crate::services::mysql_client::Connector;
use crate::utils::error::AnalysisError;
use std::sync::Arc;

/// Server schemas that never hold user data
const SYSTEM_DATABASES: [&str; 3] = ["information_schema", "mysql", "sys"];

pub struct CatalogService {
    connector: Arc<dyn Connector>,
}

impl CatalogService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// User databases in server order
    pub async fn list_databases(&self) -> Result<Vec<String>, AnalysisError> {
        let mut session = self.connector.open(None).await.map_err(AnalysisError::Connection)?;
        let outcome = session.query("SHOW DATABASES").await;
        session.close().await;

        let table = outcome.map_err(AnalysisError::Execution)?;
        let databases: Vec<String> = table
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter(|name| !SYSTEM_DATABASES.contains(&name.as_str()))
            .collect();

        tracing::debug!("Found {} user databases", databases.len());
        Ok(databases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{ScriptedConnector, table};
    use crate::utils::error::DatabaseError;

    #[tokio::test]
    async fn test_system_databases_are_hidden() {
        let connector = ScriptedConnector::new().on(
            "SHOW DATABASES",
            table(
                &["Database"],
                &[&["information_schema"], &["shop"], &["mysql"], &["analytics"], &["sys"],
                  &["performance_schema"]],
            ),
        );
        let service = CatalogService::new(connector.clone().into_connector());

        let databases = service.list_databases().await.unwrap();

        assert_eq!(databases, ["shop", "analytics", "performance_schema"]);
        assert_eq!(connector.databases(), vec![None]);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let connector = ScriptedConnector::new().refuse(None);
        let service = CatalogService::new(connector.into_connector());

        let err = service.list_databases().await.unwrap_err();
        assert!(matches!(err, AnalysisError::Connection(_)));
    }

    #[tokio::test]
    async fn test_query_failure_closes_connection() {
        let connector = ScriptedConnector::new()
            .fail_on("SHOW DATABASES", DatabaseError::with_code(1227, "Access denied"));
        let service = CatalogService::new(connector.clone().into_connector());

        assert!(matches!(service.list_databases().await, Err(AnalysisError::Execution(_))));
        assert_eq!(connector.closed(), 1);
    }
}
