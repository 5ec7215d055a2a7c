//! Status command implementation
//!
//! Shows intake queue counts per diagram and the export lines still waiting
//! for an XML file.

use super::open_context;
use crate::adapters::database::{ExportStore, QueueCounts, QueueStore};
use crate::domain::{ExportLineItem, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

/// Snapshot of queue and export state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub queue: Vec<QueueCounts>,
    pub pending_exports: usize,
    /// Pending lines per receiving party
    pub pending_by_party: BTreeMap<String, usize>,
}

impl StatusReport {
    /// Collect the report from a store
    pub async fn collect<S>(store: &S) -> Result<Self>
    where
        S: QueueStore + ExportStore + ?Sized,
    {
        let queue = store.queue_counts().await?;
        let pending = store.pending_exports(None).await?;
        Ok(Self::from_parts(queue, &pending))
    }

    fn from_parts(queue: Vec<QueueCounts>, pending: &[ExportLineItem]) -> Self {
        let mut pending_by_party = BTreeMap::new();
        for line in pending {
            *pending_by_party
                .entry(line.receiving_party.clone())
                .or_insert(0) += 1;
        }
        Self {
            queue,
            pending_exports: pending.len(),
            pending_by_party,
        }
    }
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking pipeline status");

        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let report = match StatusReport::collect(ctx.store.as_ref()).await {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Failed to read pipeline status");
                println!("   Error: {e}");
                return Ok(e.exit_code());
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(0);
        }

        println!("📊 Pipeline Status");
        println!();
        if report.queue.is_empty() {
            println!("Intake queue is empty.");
        } else {
            println!("{:<40} {:<10} {:<10}", "Diagram", "Pending", "Processed");
            println!("{}", "-".repeat(60));
            for counts in &report.queue {
                println!(
                    "{:<40} {:<10} {:<10}",
                    counts.diagram_id, counts.pending, counts.processed
                );
            }
        }

        println!();
        println!("Pending export lines: {}", report.pending_exports);
        for (party, count) in &report.pending_by_party {
            println!("  ReceivingParty {party}: {count}");
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::export::scenario::fixtures::line;

    #[tokio::test]
    async fn test_status_counts_pending_lines_per_party() {
        let store = MemoryStore::new();
        let mut arich = line("BPM-1", "0001", 2, 1);
        arich.receiving_party = "L".to_string();
        let mut zl = line("BPM-2", "0002", 3, 1);
        zl.receiving_party = "B".to_string();
        let mut zl_second = zl.clone();
        zl_second.form_item = "000002".to_string();
        store.seed_exports(vec![arich, zl, zl_second]);

        let report = StatusReport::collect(&store).await.unwrap();
        assert_eq!(report.pending_exports, 3);
        assert_eq!(report.pending_by_party["B"], 2);
        assert_eq!(report.pending_by_party["L"], 1);
        assert!(report.queue.iter().all(|c| c.pending == 0 && c.processed == 0));
    }
}
