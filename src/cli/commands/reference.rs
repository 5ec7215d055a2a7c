//! Load-reference command implementation
//!
//! Loads the reference-data XML files waiting in the configured source
//! directories into the master tables.

use super::{open_context, outcome_code};
use crate::core::reference::{FileProcessingResult, ReferenceKind};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the load-reference command
#[derive(Args, Debug)]
pub struct ReferenceArgs {
    /// Process only one kind (customer, material, price or sales)
    #[arg(long)]
    pub kind: Option<ReferenceKind>,
}

impl ReferenceArgs {
    /// Execute the load-reference command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(kind = ?self.kind, "Starting reference data load");

        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let processor = match ctx.reference_processor(shutdown_signal) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let results = match self.kind {
            Some(kind) => vec![processor.process_kind(kind).await],
            None => processor.process_all().await,
        };

        print_results(&results);
        Ok(outcome_code(results.iter().all(FileProcessingResult::is_success)))
    }
}

fn print_results(results: &[FileProcessingResult]) {
    println!("📊 Reference Data Summary:");
    for result in results {
        println!(
            "  {}: {} files, {} succeeded, {} failed{}",
            result.kind,
            result.total_count,
            result.success_count,
            result.fail_count,
            if result.interrupted { " (interrupted)" } else { "" }
        );
        for file in result.file_results.iter().filter(|f| !f.success) {
            println!(
                "    - {}: {}",
                file.file_name,
                file.error_message.as_deref().unwrap_or("failed")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ReferenceArgs,
    }

    #[test]
    fn test_kind_parses_case_insensitively() {
        let parsed = Harness::parse_from(["test", "--kind", "PRICE"]);
        assert_eq!(parsed.args.kind, Some(ReferenceKind::Price));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(Harness::try_parse_from(["test", "--kind", "vendor"]).is_err());
    }
}
