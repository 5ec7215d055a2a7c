//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Formbridge configuration file.

use crate::config::{load_config, FormbridgeConfig};
use crate::core::reference::SchemaRegistry;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates every section; the reference descriptors are
    /// checked on top.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Err(e) = SchemaRegistry::build(config.pipeline.reference_table_schema.as_deref()) {
            println!("❌ Reference table descriptors are invalid");
            println!("   Error: {e}");
            return Ok(2);
        }

        println!("✅ Configuration is valid");
        println!();
        print_summary(&config);
        Ok(0)
    }
}

fn print_summary(config: &FormbridgeConfig) {
    use secrecy::ExposeSecret;

    println!("Configuration Summary:");
    println!("  Environment: {:?}", config.environment);
    println!("  Log Level: {}", config.application.log_level);
    println!("  Dry Run: {}", config.application.dry_run);
    println!(
        "  Database: {}",
        config.database.connection_string.expose_secret().redacted()
    );
    println!("  Max Connections: {}", config.database.max_connections);
    println!("  Workflow Schema: {}", config.database.workflow_schema);
    println!("  Queue Table: {}", config.pipeline.queue_table);
    println!("  Export Table: {}", config.pipeline.export_table);
    println!("  Merge Strategy: {:?}", config.pipeline.merge_strategy);
    println!("  Reference Root: {}", config.reference.root.display());
    for (scenario, dir) in config.xml_export.directories() {
        println!("  {scenario} Directory: {}", dir.display());
    }
    if !config.jobs.aliases.is_empty() {
        println!("  Job Aliases: {}", config.jobs.aliases.len());
    }
    println!();
}
