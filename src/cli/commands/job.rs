//! Run-job command implementation
//!
//! Dispatches a job by its stable key or a configured legacy alias.

use super::{open_context, outcome_code, EXIT_CONFIG};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the run-job command
#[derive(Args, Debug)]
pub struct JobArgs {
    /// Job key (bpm-upload, master-data) or a configured alias
    pub name: String,
}

impl JobArgs {
    /// Execute the run-job command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(job = %self.name, "Starting job");

        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let registry = match ctx.job_registry(shutdown_signal) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        if let Err(e) = registry.resolve(&self.name) {
            eprintln!("❌ {e}");
            eprintln!("   Available jobs: {}", registry.keys().join(", "));
            return Ok(EXIT_CONFIG);
        }

        let report = match registry.run(&self.name).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Job failed");
                eprintln!("❌ Job failed: {e}");
                return Ok(e.exit_code());
            }
        };

        println!("📋 Job {}: {}", report.key, report.message);
        println!("{}", serde_json::to_string_pretty(&report.details)?);
        Ok(outcome_code(report.success))
    }
}
