//! Removal of orphaned staging tables
//!
//! A staged load drops its staging table when it finishes. A run that is
//! killed mid-load leaves the table behind; the sweep drops any staging table
//! of a known target that is older than the configured age.

use super::loader::{STAGING_INFIX, STAGING_TIMESTAMP_FORMAT};
use crate::adapters::database::TableStore;
use crate::domain::Result;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Staging tables found
    pub examined: usize,
    pub dropped: Vec<String>,
    /// Tables too young to drop
    pub kept: Vec<String>,
    /// Tables whose drop failed, with the error
    pub failed: Vec<(String, String)>,
}

/// Creation time encoded in a staging table name
///
/// Returns `None` for names that are not `{table}_Staging_{yyyyMMddHHmmss}`.
pub fn parse_staging_timestamp(name: &str) -> Option<NaiveDateTime> {
    let (_, suffix) = name.rsplit_once(STAGING_INFIX)?;
    if suffix.len() != 14 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(suffix, STAGING_TIMESTAMP_FORMAT).ok()
}

pub struct StagingSweeper {
    store: Arc<dyn TableStore>,
    max_age: Duration,
}

impl StagingSweeper {
    pub fn new(store: Arc<dyn TableStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    /// Drop staging tables of `targets` created before `now - max_age`
    ///
    /// # Errors
    ///
    /// Returns an error if the table listing fails. Failed drops are reported
    /// in the result.
    pub async fn sweep(&self, targets: &[String], now: NaiveDateTime) -> Result<SweepReport> {
        let cutoff = now - self.max_age;
        let mut report = SweepReport::default();

        for target in targets {
            let prefix = format!("{target}{STAGING_INFIX}");
            for table in self.store.list_tables(&prefix).await? {
                let Some(created) = parse_staging_timestamp(&table) else {
                    continue;
                };
                report.examined += 1;

                if created >= cutoff {
                    report.kept.push(table);
                    continue;
                }

                match self.store.drop_table(&table).await {
                    Ok(()) => {
                        tracing::info!(table = %table, created = %created, "Dropped orphaned staging table");
                        report.dropped.push(table);
                    }
                    Err(e) => {
                        tracing::warn!(table = %table, error = %e, "Failed to drop staging table");
                        report.failed.push((table, e.to_string()));
                    }
                }
            }
        }

        Ok(report)
    }
}
