//! XML export coordinator
//!
//! Writes pending export lines as XML files, one file per form and scenario,
//! and stamps the lines as exported once every scenario has been written.

use crate::adapters::database::traits::ExportStore;
use crate::adapters::files;
use crate::core::export::scenario::ExportScenario;
use crate::core::export::summary::{ExportSummary, ScenarioOutcome};
use crate::domain::{ExportLineItem, FormbridgeError, Result};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// XML export coordinator
pub struct ExportCoordinator {
    store: Arc<dyn ExportStore>,
    directories: BTreeMap<ExportScenario, PathBuf>,
}

impl ExportCoordinator {
    /// Create a coordinator writing each scenario into its own directory
    pub fn new(store: Arc<dyn ExportStore>, directories: BTreeMap<ExportScenario, PathBuf>) -> Self {
        Self { store, directories }
    }

    /// Execute the export with the current local time
    pub async fn execute_export(&self) -> ExportSummary {
        self.execute_export_at(Local::now().naive_local()).await
    }

    /// Execute the export
    ///
    /// Scenarios run in order and are isolated from each other. Lines are
    /// marked as exported only when every scenario succeeded and at least one
    /// file was written.
    pub async fn execute_export_at(&self, now: NaiveDateTime) -> ExportSummary {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new();

        tracing::info!("Starting XML export");

        for scenario in ExportScenario::ALL {
            let mut outcome = ScenarioOutcome::new(scenario);
            if let Err(e) = self.export_scenario(scenario, now, &mut outcome).await {
                tracing::error!(scenario = %scenario, error = %e, "Scenario export failed");
                outcome.error = Some(e.to_string());
            }
            summary.scenarios.push(outcome);
        }

        if summary.is_successful() && summary.file_count() > 0 {
            match self.store.mark_exported(now).await {
                Ok(count) => {
                    tracing::info!(count, "Marked export lines as exported");
                    summary.marked_exported = count;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to mark export lines");
                    summary.add_error(format!("Failed to mark lines as exported: {e}"));
                }
            }
        }

        summary.with_duration(start_time.elapsed())
    }

    async fn export_scenario(
        &self,
        scenario: ExportScenario,
        now: NaiveDateTime,
        outcome: &mut ScenarioOutcome,
    ) -> Result<()> {
        let lines = self.store.pending_exports(scenario.receiving_party()).await?;
        outcome.rows = lines.len();

        if lines.is_empty() {
            tracing::info!(scenario = %scenario, "No pending lines for scenario");
            return Ok(());
        }

        let dir = self.directories.get(&scenario).ok_or_else(|| {
            FormbridgeError::Configuration(format!("No output directory for scenario {scenario}"))
        })?;
        files::ensure_dir(dir).await?;

        for (form_no, group) in group_by_form(&lines) {
            let path = dir.join(scenario.file_name(form_no, now));
            let records: Vec<_> = group.iter().map(|line| scenario.record(line)).collect();

            let target = path.clone();
            tokio::task::spawn_blocking(move || files::write_records(&target, &records))
                .await
                .map_err(|e| FormbridgeError::Other(format!("XML writer task failed: {e}")))??;

            tracing::info!(
                scenario = %scenario,
                file = %path.display(),
                lines = group.len(),
                "Wrote export file"
            );
            outcome.files.push(path);
        }

        Ok(())
    }
}

/// Lines grouped by form number, each group in its original order
fn group_by_form(lines: &[ExportLineItem]) -> BTreeMap<&str, Vec<&ExportLineItem>> {
    let mut groups: BTreeMap<&str, Vec<&ExportLineItem>> = BTreeMap::new();
    for line in lines {
        groups.entry(line.form_no.as_str()).or_default().push(line);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::export::scenario::fixtures::{at, line};
    use tempfile::TempDir;

    fn directories(root: &TempDir) -> BTreeMap<ExportScenario, PathBuf> {
        ExportScenario::ALL
            .iter()
            .map(|s| (*s, root.path().join(s.name())))
            .collect()
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed_exports(vec![
            line("REQ-1", "TWC12512000001", 2, 1),
            line("REQ-1", "TWC12512000001", 2, 2),
            line("REQ-2", "TWC12512000002", 3, 1),
        ]);
        store
    }

    #[tokio::test]
    async fn test_export_writes_one_file_per_form_and_scenario() {
        let root = TempDir::new().unwrap();
        let store = seeded_store();
        let coordinator = ExportCoordinator::new(store.clone(), directories(&root));

        let summary = coordinator.execute_export_at(at()).await;

        assert!(summary.is_successful(), "{:?}", summary.error_messages());
        assert_eq!(summary.file_count(), 4);
        assert_eq!(summary.marked_exported, 3);
        assert_eq!(store.exported_count(), 3);

        let sap = root
            .path()
            .join("ToSAP")
            .join("BPM_Export_ToSAP_2512000001_20251205083000.xml");
        let text = std::fs::read_to_string(sap).unwrap();
        assert_eq!(text.matches("<Record>").count(), 2);
        assert!(text.contains("<CostCenter>TW02_72100</CostCenter>"));

        let arich = root.path().join("ToARICH");
        let files = std::fs::read_dir(&arich).unwrap().count();
        assert_eq!(files, 1);
        let text = std::fs::read_to_string(
            arich.join("BPM_Export_ToARICH_2512000001_20251205083000.xml"),
        )
        .unwrap();
        assert!(!text.contains("CostCenter"));

        assert!(root
            .path()
            .join("ToZL")
            .join("BPM_Export_ToZL_2512000002_20251205083000.xml")
            .exists());
    }

    #[tokio::test]
    async fn test_second_run_finds_nothing_pending() {
        let root = TempDir::new().unwrap();
        let store = seeded_store();
        let coordinator = ExportCoordinator::new(store.clone(), directories(&root));

        coordinator.execute_export_at(at()).await;
        let summary = coordinator.execute_export_at(at()).await;

        assert!(summary.is_successful());
        assert_eq!(summary.file_count(), 0);
        assert_eq!(summary.marked_exported, 0);
    }

    #[tokio::test]
    async fn test_missing_directory_blocks_marking() {
        let root = TempDir::new().unwrap();
        let store = seeded_store();
        let mut dirs = directories(&root);
        dirs.remove(&ExportScenario::ToZl);
        let coordinator = ExportCoordinator::new(store.clone(), dirs);

        let summary = coordinator.execute_export_at(at()).await;

        assert!(!summary.is_successful());
        assert_eq!(summary.file_count(), 3);
        assert_eq!(summary.marked_exported, 0);
        assert_eq!(store.exported_count(), 0);
        assert!(summary.error_messages()[0].starts_with("[ToZL]"));
    }
}
