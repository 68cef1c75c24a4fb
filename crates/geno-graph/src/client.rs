//! Neo4j connection management and the shared graph client.

use geno_core::{CatalogError, Neo4jSettings, StoreError};
use neo4rs::{ConfigBuilder, Graph, Query};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Constraint catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl From<GraphError> for StoreError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Connection(msg) => StoreError::Connection(msg),
            GraphError::Query(e) => StoreError::Execution(e.to_string()),
            other => StoreError::Response(other.to_string()),
        }
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Default database for queries that do not name one.
    pub database: String,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
            max_connections: 16,
            fetch_size: 256,
        }
    }
}

impl GraphConfig {
    /// Build from the `[neo4j]` settings. `server` is host:port and gets the
    /// routing `neo4j://` scheme unless it already carries one.
    pub fn from_settings(settings: &Neo4jSettings, database: &str) -> Self {
        let uri = if settings.server.contains("://") {
            settings.server.clone()
        } else {
            format!("neo4j://{}", settings.server)
        };
        Self {
            uri,
            user: settings.user.clone(),
            password: settings.password.clone(),
            database: database.to_string(),
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Get a reference to the underlying neo4rs Graph for direct operations.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Execute a write-only query against `database`.
    pub async fn run_on(&self, database: &str, query: Query) -> Result<(), GraphError> {
        self.graph.run_on(database, query).await?;
        Ok(())
    }

    /// Execute a read query against `database` and collect all rows.
    pub async fn query_rows_on(
        &self,
        database: &str,
        query: Query,
    ) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute_on(database, query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_settings_adds_scheme() {
        let settings = Neo4jSettings {
            server: "db.local:7687".to_string(),
            user: "importer".to_string(),
            password: "pw".to_string(),
            ..Default::default()
        };
        let config = GraphConfig::from_settings(&settings, "people");
        assert_eq!(config.uri, "neo4j://db.local:7687");
        assert_eq!(config.database, "people");
        assert_eq!(config.max_connections, 16);

        let settings = Neo4jSettings {
            server: "bolt://db.local:7687".to_string(),
            ..settings
        };
        assert_eq!(
            GraphConfig::from_settings(&settings, "people").uri,
            "bolt://db.local:7687"
        );
    }

    #[test]
    fn graph_errors_map_to_store_errors() {
        let err: StoreError = GraphError::Connection("refused".to_string()).into();
        assert!(matches!(err, StoreError::Connection(msg) if msg == "refused"));

        let err: StoreError = GraphError::Catalog(CatalogError::MultiLabelConstraintUnsupported {
            labels: vec!["A".to_string(), "B".to_string()],
        })
        .into();
        assert!(matches!(err, StoreError::Response(_)));
    }
}
