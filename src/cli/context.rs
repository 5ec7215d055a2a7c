//! Component wiring shared by the commands
//!
//! Every command builds its pipeline pieces from the loaded configuration
//! and one store. The store is generic so the same wiring runs against the
//! PostgreSQL adapter in production and [`MemoryStore`](crate::adapters::memory::MemoryStore)
//! in tests.

use crate::adapters::database::{create_store, ExportStore, QueueStore, SourceProvider, TableStore};
use crate::adapters::postgresql::PostgresStore;
use crate::config::FormbridgeConfig;
use crate::core::export::ExportCoordinator;
use crate::core::intake::IntakeQueueManager;
use crate::core::jobs::{BpmUploadJob, JobRegistry, MasterDataJob};
use crate::core::load::{StagedBulkLoader, StagingSweeper};
use crate::core::reference::{ReferenceDataProcessor, SchemaRegistry};
use crate::core::sync::SyncOrchestrator;
use crate::core::transform::RuleEngine;
use crate::domain::{export_schema, FormbridgeError, Result};
use std::sync::Arc;
use tokio::sync::watch;

/// Storage capabilities the pipeline needs from one backend
pub trait PipelineStore: TableStore + QueueStore + SourceProvider + ExportStore + 'static {}

impl<T> PipelineStore for T where T: TableStore + QueueStore + SourceProvider + ExportStore + 'static {}

pub struct AppContext<S: PipelineStore> {
    pub config: FormbridgeConfig,
    pub store: Arc<S>,
}

impl AppContext<PostgresStore> {
    /// Build the PostgreSQL store from `config`
    ///
    /// # Errors
    ///
    /// Returns the store construction error.
    pub fn connect(config: FormbridgeConfig) -> Result<Self> {
        let store = create_store(&config)?;
        Ok(Self::new(config, store))
    }
}

impl<S: PipelineStore> AppContext<S> {
    pub fn new(config: FormbridgeConfig, store: Arc<S>) -> Self {
        Self { config, store }
    }

    fn loader(&self) -> Arc<StagedBulkLoader> {
        Arc::new(StagedBulkLoader::new(
            self.store.clone(),
            self.config.pipeline.merge_strategy,
        ))
    }

    /// Sync orchestrator; `dry_run` is combined with the configured flag
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an invalid intake window.
    pub fn orchestrator(&self, dry_run: bool) -> Result<SyncOrchestrator> {
        let window = self
            .config
            .intake
            .window_settings()
            .map_err(FormbridgeError::Configuration)?;
        let intake = IntakeQueueManager::new(self.store.clone(), window);
        let engine = RuleEngine::new(self.config.pipeline.transform_options());

        Ok(SyncOrchestrator::new(
            intake,
            self.store.clone(),
            self.loader(),
            engine,
            export_schema(self.config.pipeline.export_table.clone()),
        )
        .with_dry_run(dry_run || self.config.application.dry_run))
    }

    pub fn exporter(&self) -> ExportCoordinator {
        ExportCoordinator::new(self.store.clone(), self.config.xml_export.directories())
    }

    /// Reference processor over the configured directories
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if a descriptor is inconsistent.
    pub fn reference_processor(
        &self,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<ReferenceDataProcessor> {
        let registry = SchemaRegistry::build(self.config.pipeline.reference_table_schema.as_deref())?;
        Ok(ReferenceDataProcessor::new(
            self.loader(),
            Arc::new(registry),
            self.config.reference.directories(),
            shutdown_signal,
        ))
    }

    /// Registry with both jobs and the configured aliases
    pub fn job_registry(&self, shutdown_signal: watch::Receiver<bool>) -> Result<JobRegistry> {
        let mut registry = JobRegistry::new(self.config.jobs.aliases.clone())?;
        registry.register(Arc::new(BpmUploadJob::new(
            Arc::new(self.orchestrator(false)?),
            Arc::new(self.exporter()),
        )));
        registry.register(Arc::new(MasterDataJob::new(Arc::new(
            self.reference_processor(shutdown_signal)?,
        ))));
        Ok(registry)
    }

    pub fn sweeper(&self) -> StagingSweeper {
        let hours = i64::try_from(self.config.pipeline.staging_max_age_hours).unwrap_or(i64::MAX);
        StagingSweeper::new(self.store.clone(), chrono::Duration::hours(hours))
    }

    /// Targets whose staging tables the sweep inspects
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if a reference descriptor is inconsistent.
    pub fn sweep_targets(&self) -> Result<Vec<String>> {
        let registry = SchemaRegistry::build(self.config.pipeline.reference_table_schema.as_deref())?;
        let mut targets = vec![self.config.pipeline.export_table.clone()];
        targets.extend(registry.tables());
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::config::parse_config;
    use crate::core::jobs::{BPM_UPLOAD, MASTER_DATA};

    fn context(extra: &str) -> AppContext<MemoryStore> {
        let text = format!(
            "[database]\nconnection_string = \"postgresql://fb:pw@localhost/erp\"\n{extra}"
        );
        AppContext::new(parse_config(&text).unwrap(), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_job_registry_has_both_jobs() {
        let ctx = context("[jobs.aliases]\nMasterDataJob = \"master-data\"\n");
        let (_tx, rx) = watch::channel(false);
        let registry = ctx.job_registry(rx).unwrap();
        assert_eq!(registry.keys(), vec![BPM_UPLOAD, MASTER_DATA]);
        assert_eq!(registry.resolve("MasterDataJob").unwrap(), MASTER_DATA);
    }

    #[test]
    fn test_sweep_targets_include_export_and_reference_tables() {
        let ctx = context("[pipeline]\nreference_table_schema = \"sapds\"\n");
        let targets = ctx.sweep_targets().unwrap();
        assert_eq!(targets[0], "fourpl_datatrans_export");
        assert!(targets.contains(&"sapds.Sales_CustomerMaster".to_string()));
        assert_eq!(targets.len(), 5);
    }
}
