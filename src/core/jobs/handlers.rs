//! Typed job handlers

use super::{BPM_UPLOAD, MASTER_DATA};
use crate::core::export::ExportCoordinator;
use crate::core::reference::ReferenceDataProcessor;
use crate::core::sync::SyncOrchestrator;
use crate::domain::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one job execution
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub key: String,
    pub success: bool,
    pub message: String,
    /// Step results as JSON
    pub details: serde_json::Value,
}

/// A unit of work the registry can dispatch
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Stable key of the job
    fn key(&self) -> &'static str;

    /// Run the job to completion
    ///
    /// Step failures are reported in the [`JobReport`]; an `Err` means the
    /// job could not run at all.
    async fn run(&self) -> Result<JobReport>;
}

/// Sync pipeline followed by the XML export
pub struct BpmUploadJob {
    orchestrator: Arc<SyncOrchestrator>,
    exporter: Arc<ExportCoordinator>,
}

impl BpmUploadJob {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, exporter: Arc<ExportCoordinator>) -> Self {
        Self {
            orchestrator,
            exporter,
        }
    }
}

#[async_trait]
impl JobHandler for BpmUploadJob {
    fn key(&self) -> &'static str {
        BPM_UPLOAD
    }

    async fn run(&self) -> Result<JobReport> {
        let sync = self.orchestrator.run().await;

        // A dry run writes nothing, so there is nothing new to export.
        if sync.dry_run {
            return Ok(JobReport {
                key: BPM_UPLOAD.to_string(),
                success: sync.success,
                message: sync.message.clone(),
                details: serde_json::json!({ "sync": sync }),
            });
        }

        let export = self.exporter.execute_export().await;
        export.log_summary();

        let success = sync.success && export.is_successful();
        let message = format!(
            "{}; exported {} files, marked {} lines",
            sync.message,
            export.file_count(),
            export.marked_exported
        );

        Ok(JobReport {
            key: BPM_UPLOAD.to_string(),
            success,
            message,
            details: serde_json::json!({ "sync": sync, "export": export }),
        })
    }
}

/// Reference-data processing for every configured kind
pub struct MasterDataJob {
    processor: Arc<ReferenceDataProcessor>,
}

impl MasterDataJob {
    pub fn new(processor: Arc<ReferenceDataProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl JobHandler for MasterDataJob {
    fn key(&self) -> &'static str {
        MASTER_DATA
    }

    async fn run(&self) -> Result<JobReport> {
        let results = self.processor.process_all().await;

        let files: usize = results.iter().map(|r| r.total_count).sum();
        let failed: usize = results.iter().map(|r| r.fail_count).sum();
        let success = results.iter().all(|r| r.is_success());

        Ok(JobReport {
            key: MASTER_DATA.to_string(),
            success,
            message: format!("Processed {files} reference files, {failed} failed"),
            details: serde_json::to_value(&results)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::load::{MergeStrategy, StagedBulkLoader};
    use crate::core::reference::{KindDirectories, ReferenceKind, SchemaRegistry};
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use tokio::sync::watch;

    #[tokio::test]
    async fn test_master_data_job_with_no_files() {
        let temp = TempDir::new().unwrap();
        let mut directories = BTreeMap::new();
        directories.insert(
            ReferenceKind::Customer,
            KindDirectories {
                source: temp.path().join("In"),
                success: temp.path().join("Success"),
                fail: temp.path().join("Fail"),
            },
        );

        let store = Arc::new(MemoryStore::new());
        let loader = Arc::new(StagedBulkLoader::new(store, MergeStrategy::Merge));
        let registry = Arc::new(SchemaRegistry::build(None).unwrap());
        let (_tx, rx) = watch::channel(false);
        let processor = ReferenceDataProcessor::new(loader, registry, directories, rx);

        let report = MasterDataJob::new(Arc::new(processor)).run().await.unwrap();

        assert_eq!(report.key, MASTER_DATA);
        assert!(report.success);
        assert_eq!(report.message, "Processed 0 reference files, 0 failed");
    }
}
