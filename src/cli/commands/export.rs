//! Export command implementation
//!
//! Writes pending export lines to the per-scenario XML directories and marks
//! them exported.

use super::{open_context, outcome_code};
use clap::Args;

/// Arguments for the export-xml command
#[derive(Args, Debug)]
pub struct ExportArgs {}

impl ExportArgs {
    /// Execute the export-xml command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting XML export");

        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        println!("🚀 Starting export...");
        let summary = ctx.exporter().execute_export().await;
        summary.log_summary();

        println!();
        println!("📊 Export Summary:");
        for outcome in &summary.scenarios {
            println!("  {}: {} files", outcome.scenario, outcome.files.len());
        }
        println!("  Marked Exported: {}", summary.marked_exported);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

        let errors = summary.error_messages();
        if !errors.is_empty() {
            println!();
            println!("  ⚠️  Errors:");
            for error in &errors {
                println!("    - {error}");
            }
        }

        Ok(outcome_code(summary.is_successful()))
    }
}
