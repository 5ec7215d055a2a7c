//! Storage construction from configuration

use crate::adapters::postgresql::{PostgresClient, PostgresStore, PostgresTables};
use crate::config::FormbridgeConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Build the PostgreSQL store described by `config`
///
/// The pool connects lazily; call
/// [`DatabaseClient::test_connection`](super::DatabaseClient::test_connection)
/// to fail fast.
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the pool cannot
/// be built.
pub fn create_store(config: &FormbridgeConfig) -> Result<Arc<PostgresStore>> {
    tracing::info!(
        ssl_mode = %config.database.ssl_mode,
        max_connections = config.database.max_connections,
        "Creating PostgreSQL store"
    );

    let client = PostgresClient::new(&config.database)?;
    tracing::debug!(database = %client.connection_string_safe(), "Connection pool ready");

    Ok(Arc::new(PostgresStore::new(
        Arc::new(client),
        tables(config),
    )))
}

/// Table names of the configured deployment
pub fn tables(config: &FormbridgeConfig) -> PostgresTables {
    PostgresTables {
        queue: config.pipeline.queue_table.clone(),
        export: config.pipeline.export_table.clone(),
        workflow_schema: config.database.workflow_schema.clone(),
        reference_schema: config.pipeline.reference_table_schema.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_tables_follow_config() {
        let config = parse_config(
            r#"
[database]
connection_string = "postgresql://fb:pw@localhost/erp"
workflow_schema = "workflow"

[pipeline]
export_table = "erp.export_lines"
reference_table_schema = "sapds"
"#,
        )
        .unwrap();

        let tables = tables(&config);
        assert_eq!(tables.export, "erp.export_lines");
        assert_eq!(tables.queue, "fourpl_datatrans_queue");
        assert_eq!(tables.workflow_schema, "workflow");
        assert_eq!(tables.reference_schema.as_deref(), Some("sapds"));
    }
}
