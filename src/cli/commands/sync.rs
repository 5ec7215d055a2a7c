//! Sync command implementation
//!
//! Runs one synchronization: intake, transformation and the staged load of
//! export lines.

use super::{open_context, outcome_code};
use crate::adapters::database::DatabaseClient;
use clap::Args;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Transform only - nothing is enqueued, persisted or marked processed
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run result as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(dry_run = self.dry_run, "Starting sync command");

        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let orchestrator = match ctx.orchestrator(self.dry_run) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        if let Err(e) = ctx.store.test_connection().await {
            tracing::error!(error = %e, "Database connection failed");
            eprintln!("❌ Failed to connect to database: {e}");
            return Ok(e.exit_code());
        }

        if self.dry_run || ctx.config.application.dry_run {
            println!("🔍 DRY RUN MODE - No data will be written to the database");
            println!();
        }

        let result = orchestrator.run().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("📊 Sync Summary:");
            println!("  Enqueued: {}", result.enqueued);
            println!("  Lines Produced: {}", result.lines_produced);
            println!("  Lines Persisted: {}", result.processed_count);
            println!("  Requisitions: {}", result.requisition_ids.len());
            if !result.errors.is_empty() {
                println!();
                println!("  ⚠️  Errors:");
                for error in &result.errors {
                    println!("    - {error}");
                }
            }
            println!();
            println!("{}", result.message);
        }

        Ok(outcome_code(result.success))
    }
}
