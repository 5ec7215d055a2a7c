//! Reference-data file processing
//!
//! For every kind, each XML file in the source directory is parsed, mapped
//! and loaded through the staged loader. Files whose rows all reached the
//! target move to the success directory. Anything else moves to the fail
//! directory, next to an error report when rows were rejected.

use super::mapper::RecordMapper;
use super::registry::SchemaRegistry;
use super::report::write_report;
use super::schemas::ReferenceKind;
use crate::adapters::files;
use crate::core::load::{StagedBulkLoader, UpsertBatchResult};
use crate::domain::{FormbridgeError, Result};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Directories of one reference kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDirectories {
    pub source: PathBuf,
    pub success: PathBuf,
    pub fail: PathBuf,
}

/// Outcome of one file
#[derive(Debug, Clone, Serialize)]
pub struct SingleFileResult {
    pub file_name: String,
    pub success: bool,
    pub records: usize,
    pub error_message: Option<String>,
    pub destination: Option<PathBuf>,
    pub error_report: Option<PathBuf>,
    pub load: Option<UpsertBatchResult>,
}

impl SingleFileResult {
    fn new(file_name: String) -> Self {
        Self {
            file_name,
            success: false,
            records: 0,
            error_message: None,
            destination: None,
            error_report: None,
            load: None,
        }
    }
}

/// Outcome of one kind
#[derive(Debug, Clone, Serialize)]
pub struct FileProcessingResult {
    pub kind: ReferenceKind,
    pub total_count: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub file_results: Vec<SingleFileResult>,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    /// Stopped early on shutdown
    pub interrupted: bool,
}

impl FileProcessingResult {
    fn new(kind: ReferenceKind) -> Self {
        let now = Local::now().naive_local();
        Self {
            kind,
            total_count: 0,
            success_count: 0,
            fail_count: 0,
            file_results: Vec::new(),
            started_at: now,
            finished_at: now,
            interrupted: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.fail_count == 0 && !self.interrupted
    }
}

pub struct ReferenceDataProcessor {
    loader: Arc<StagedBulkLoader>,
    registry: Arc<SchemaRegistry>,
    directories: BTreeMap<ReferenceKind, KindDirectories>,
    shutdown_signal: watch::Receiver<bool>,
}

impl ReferenceDataProcessor {
    pub fn new(
        loader: Arc<StagedBulkLoader>,
        registry: Arc<SchemaRegistry>,
        directories: BTreeMap<ReferenceKind, KindDirectories>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        Self {
            loader,
            registry,
            directories,
            shutdown_signal,
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_signal.borrow()
    }

    /// Process every configured kind in order
    pub async fn process_all(&self) -> Vec<FileProcessingResult> {
        let mut results = Vec::new();
        for kind in ReferenceKind::ALL {
            if self.shutdown_requested() {
                tracing::warn!("Shutdown requested, skipping remaining reference kinds");
                break;
            }
            if self.directories.contains_key(&kind) {
                results.push(self.process_kind(kind).await);
            }
        }
        results
    }

    /// Process all files waiting in the source directory of `kind`
    pub async fn process_kind(&self, kind: ReferenceKind) -> FileProcessingResult {
        let mut result = FileProcessingResult::new(kind);

        let Some(dirs) = self.directories.get(&kind) else {
            tracing::warn!(kind = %kind, "No directories configured");
            return result;
        };

        let files = match self.prepare(dirs).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(kind = %kind, source = %dirs.source.display(), error = %e, "Source directory unavailable");
                result.finished_at = Local::now().naive_local();
                return result;
            }
        };

        result.total_count = files.len();
        tracing::info!(kind = %kind, files = files.len(), "Processing reference files");

        for path in files {
            if self.shutdown_requested() {
                tracing::warn!(kind = %kind, "Shutdown requested, leaving remaining files in place");
                result.interrupted = true;
                break;
            }

            let file_result = self.process_file(kind, &path).await;
            if file_result.success {
                result.success_count += 1;
            } else {
                result.fail_count += 1;
            }
            result.file_results.push(file_result);
        }

        result.finished_at = Local::now().naive_local();
        tracing::info!(
            kind = %kind,
            total = result.total_count,
            succeeded = result.success_count,
            failed = result.fail_count,
            "Reference kind processed"
        );
        result
    }

    async fn prepare(&self, dirs: &KindDirectories) -> Result<Vec<PathBuf>> {
        files::ensure_dir(&dirs.success).await?;
        files::ensure_dir(&dirs.fail).await?;
        files::list_files(&dirs.source).await
    }

    /// Process one file and move it to the success or fail directory
    pub async fn process_file(&self, kind: ReferenceKind, path: &Path) -> SingleFileResult {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut result = SingleFileResult::new(file_name);

        let Some(dirs) = self.directories.get(&kind) else {
            result.error_message = Some(format!("no directories configured for {kind}"));
            return result;
        };

        match self.load_file(kind, path, &mut result).await {
            Ok(load) => {
                let failed = load.failed_count > 0;
                if failed {
                    let now = Local::now().naive_local();
                    match write_report(&dirs.fail, kind.name(), path, &load, now).await {
                        Ok(report) => result.error_report = Some(report),
                        Err(e) => {
                            tracing::warn!(file = %result.file_name, error = %e, "Failed to write error report");
                        }
                    }
                    result.error_message = load.error_summary.clone();
                }
                result.success = !failed;
                result.load = Some(load);
            }
            Err(e) => {
                tracing::error!(kind = %kind, file = %result.file_name, error = %e, "Reference file failed");
                result.error_message = Some(e.to_string());
            }
        }

        let dest_dir = if result.success { &dirs.success } else { &dirs.fail };
        match files::move_into(path, dest_dir).await {
            Ok(dest) => result.destination = Some(dest),
            Err(e) => {
                tracing::error!(file = %result.file_name, error = %e, "Failed to move processed file");
                result.success = false;
                result.error_message.get_or_insert_with(|| e.to_string());
            }
        }

        if result.success {
            tracing::info!(kind = %kind, file = %result.file_name, records = result.records, "Reference file loaded");
        } else {
            tracing::warn!(kind = %kind, file = %result.file_name, "Reference file moved to fail directory");
        }
        result
    }

    async fn load_file(
        &self,
        kind: ReferenceKind,
        path: &Path,
        result: &mut SingleFileResult,
    ) -> Result<UpsertBatchResult> {
        let schema = self
            .registry
            .get(kind)
            .ok_or_else(|| FormbridgeError::Configuration(format!("no descriptor for {kind}")))?;

        let owned = path.to_path_buf();
        let root = schema.root_element;
        let records = tokio::task::spawn_blocking(move || files::read_records(&owned, root))
            .await
            .map_err(|e| FormbridgeError::Other(format!("XML reader task failed: {e}")))??;

        result.records = records.len();
        if records.is_empty() {
            tracing::warn!(file = %result.file_name, element = root, "File has no records");
            return Ok(UpsertBatchResult::new(0));
        }

        let rows = RecordMapper::new(schema, Local::now().naive_local()).map_all(&records);
        Ok(self.loader.load_and_merge(schema, &rows).await)
    }
}
