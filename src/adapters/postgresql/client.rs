//! PostgreSQL connection pool
//!
//! Wraps a `deadpool-postgres` pool. TLS is negotiated through
//! `postgres-native-tls` unless `ssl_mode` is `disable`, and every checked-out
//! connection carries the configured statement timeout.

use crate::config::DatabaseConfig;
use crate::domain::{FormbridgeError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Schema migration applied by [`PostgresClient::run_migrations`]
const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// Pooled PostgreSQL client
pub struct PostgresClient {
    pool: Pool,
    statement_timeout_ms: u64,
    safe_dsn: String,
}

impl PostgresClient {
    /// Build the pool; no connection is opened until first use
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an unparsable connection string and
    /// a `Connection` error if the TLS connector or pool cannot be built.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let dsn = config.connection_string.expose_secret();
        let mut pg_config: tokio_postgres::Config = dsn.as_ref().parse().map_err(|e| {
            FormbridgeError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
        })?;
        pg_config.connect_timeout(Duration::from_secs(config.connection_timeout_seconds));

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            mode => {
                pg_config.ssl_mode(if mode == "require" {
                    SslMode::Require
                } else {
                    SslMode::Prefer
                });
                let connector = native_tls::TlsConnector::builder().build().map_err(|e| {
                    FormbridgeError::Connection(format!("Failed to build TLS connector: {e}"))
                })?;
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
            }
        };

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                FormbridgeError::Connection(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self {
            pool,
            statement_timeout_ms: config.statement_timeout_seconds * 1000,
            safe_dsn: dsn.redacted(),
        })
    }

    /// Check out a connection with the statement timeout applied
    ///
    /// # Errors
    ///
    /// Returns a `Connection` error if the pool cannot supply a connection.
    pub async fn connection(&self) -> Result<Object> {
        let client = self.pool.get().await.map_err(|e| {
            FormbridgeError::Connection(format!("Failed to get connection from pool: {e}"))
        })?;

        client
            .batch_execute(&format!(
                "SET statement_timeout = {}",
                self.statement_timeout_ms
            ))
            .await
            .map_err(|e| {
                FormbridgeError::Connection(format!("Failed to set statement timeout: {e}"))
            })?;

        Ok(client)
    }

    /// Run `SELECT 1` on a pooled connection
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| FormbridgeError::Connection(format!("Connection test failed: {e}")))?;

        tracing::info!(database = %self.safe_dsn, "PostgreSQL connection test successful");
        Ok(())
    }

    /// Create the queue, export and reference tables if missing
    pub async fn run_migrations(&self) -> Result<()> {
        let client = self.connection().await?;
        client
            .batch_execute(INITIAL_SCHEMA)
            .await
            .map_err(|e| FormbridgeError::Database(format!("Failed to execute migration: {e}")))?;

        tracing::info!("PostgreSQL schema initialized");
        Ok(())
    }

    pub async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.connection().await?;
        client
            .query(sql, params)
            .await
            .map_err(|e| FormbridgeError::Database(format!("Query failed: {e}")))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.connection().await?;
        client
            .execute(sql, params)
            .await
            .map_err(|e| FormbridgeError::Database(format!("Statement execution failed: {e}")))
    }

    /// Connection string with credentials removed, for logs
    pub fn connection_string_safe(&self) -> &str {
        &self.safe_dsn
    }

    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn config(dsn: &str, ssl_mode: &str) -> DatabaseConfig {
        DatabaseConfig {
            connection_string: secret_string(dsn.to_string()),
            max_connections: 4,
            connection_timeout_seconds: 5,
            statement_timeout_seconds: 60,
            ssl_mode: ssl_mode.to_string(),
            workflow_schema: "bpm".to_string(),
        }
    }

    #[tokio::test]
    async fn test_pool_builds_without_connecting() {
        let client =
            PostgresClient::new(&config("postgresql://fb:pw@localhost:5432/erp", "disable"))
                .unwrap();
        assert_eq!(client.connection_string_safe(), "postgresql://***@localhost:5432/erp");
        assert_eq!(client.pool_status().max_size, 4);
        assert_eq!(client.statement_timeout_ms, 60_000);
    }

    #[test]
    fn test_invalid_connection_string() {
        let result = PostgresClient::new(&config("postgresql://fb:pw@host:notaport/erp", "disable"));
        assert!(matches!(result, Err(FormbridgeError::Configuration(_))));
    }
}
