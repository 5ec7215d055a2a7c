//! Sweep-staging command implementation

use super::{open_context, outcome_code};
use chrono::Local;
use clap::Args;

/// Arguments for the sweep-staging command
#[derive(Args, Debug)]
pub struct SweepArgs {}

impl SweepArgs {
    /// Execute the sweep-staging command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Sweeping orphaned staging tables");

        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let targets = match ctx.sweep_targets() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let report = match ctx
            .sweeper()
            .sweep(&targets, Local::now().naive_local())
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Staging sweep failed");
                eprintln!("❌ Staging sweep failed: {e}");
                return Ok(e.exit_code());
            }
        };

        println!("🧹 Staging Sweep:");
        println!("  Examined: {}", report.examined);
        println!("  Dropped: {}", report.dropped.len());
        for table in &report.dropped {
            println!("    - {table}");
        }
        println!("  Kept: {}", report.kept.len());
        for (table, error) in &report.failed {
            println!("  ⚠️  {table}: {error}");
        }

        Ok(outcome_code(report.failed.is_empty()))
    }
}
