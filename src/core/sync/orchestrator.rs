//! One synchronization run: intake, transform, persist, mark processed

use super::result::PipelineResult;
use crate::adapters::database::SourceProvider;
use crate::core::intake::IntakeQueueManager;
use crate::core::load::StagedBulkLoader;
use crate::core::transform::{RuleEngine, VariantOutput};
use crate::domain::{DomainVariant, ExportLineItem, Result, StageRow, TableSchema};
use crate::{log_error_with_context, log_step_complete, log_step_start};
use chrono::{Local, NaiveDateTime};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Drives the batch pipeline
///
/// Every step is isolated: a failure is recorded in the result and the run
/// moves on to the next step that can still do useful work.
pub struct SyncOrchestrator {
    intake: IntakeQueueManager,
    source: Arc<dyn SourceProvider>,
    loader: Arc<StagedBulkLoader>,
    engine: RuleEngine,
    export_schema: TableSchema,
    dry_run: bool,
}

impl SyncOrchestrator {
    pub fn new(
        intake: IntakeQueueManager,
        source: Arc<dyn SourceProvider>,
        loader: Arc<StagedBulkLoader>,
        engine: RuleEngine,
        export_schema: TableSchema,
    ) -> Self {
        Self {
            intake,
            source,
            loader,
            engine,
            export_schema,
            dry_run: false,
        }
    }

    /// Transform only: nothing is enqueued, persisted or marked
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> PipelineResult {
        self.run_at(Local::now().naive_local()).await
    }

    pub async fn run_at(&self, now: NaiveDateTime) -> PipelineResult {
        let started = Instant::now();
        let mut result = PipelineResult {
            dry_run: self.dry_run,
            ..PipelineResult::default()
        };

        if self.dry_run {
            tracing::info!("Dry run: skipping intake");
        } else {
            log_step_start!("intake");
            match self.intake.discover_and_enqueue_at(now).await {
                Ok(count) => result.enqueued = count,
                Err(e) => {
                    log_error_with_context!(&e, "Failed to enqueue new requisitions");
                    result
                        .errors
                        .push(format!("[Queue] Failed to enqueue new requisitions: {e}"));
                }
            }
        }

        let mut lines = Vec::new();
        for variant in DomainVariant::ALL {
            let diagram = variant.diagram_id();
            log_step_start!(diagram);
            match self.transform_variant(variant, now).await {
                Ok(output) => {
                    result
                        .errors
                        .extend(output.errors.iter().map(|e| format!("[{diagram}] {e}")));
                    lines.extend(output.lines);
                }
                Err(e) => {
                    log_error_with_context!(&e, diagram);
                    result
                        .errors
                        .push(format!("[{diagram}] Failed to fetch source rows: {e}"));
                }
            }
        }
        result.lines_produced = lines.len();

        if lines.is_empty() {
            tracing::info!("No export lines to persist");
        } else if self.dry_run {
            result.requisition_ids = distinct_requisitions(lines.iter());
            tracing::info!(lines = lines.len(), "Dry run: skipping persistence");
        } else {
            log_step_start!("persist");
            self.persist(&lines, &mut result).await;

            if result.processed_count > 0 {
                if let Err(e) = self.intake.mark_processed().await {
                    log_error_with_context!(&e, "Failed to mark queue entries processed");
                    result
                        .errors
                        .push(format!("[Queue] Failed to mark processed: {e}"));
                }
            }
        }

        let result = result.finish();
        log_step_complete!("sync", result.processed_count, started.elapsed());
        if !result.success {
            tracing::warn!(errors = result.errors.len(), "Sync finished with errors");
        }
        result
    }

    async fn transform_variant(
        &self,
        variant: DomainVariant,
        now: NaiveDateTime,
    ) -> Result<VariantOutput> {
        let output = match variant {
            DomainVariant::Order => {
                let batch = self.source.fetch_order_batch().await?;
                self.engine.transform_orders(&batch, now)
            }
            DomainVariant::Sample => {
                let rows = self.source.fetch_sample_details().await?;
                self.engine.transform_samples(&rows, now)
            }
            DomainVariant::Return => {
                let rows = self.source.fetch_return_details().await?;
                self.engine.transform_returns(&rows, now)
            }
        };
        tracing::info!(
            diagram = variant.diagram_id(),
            requisitions = output.requisitions,
            lines = output.lines.len(),
            errors = output.errors.len(),
            "Variant transformed"
        );
        Ok(output)
    }

    /// Staged load into the export table, with a direct row-by-row insert
    /// when the staged load aborts
    async fn persist(&self, lines: &[ExportLineItem], result: &mut PipelineResult) {
        let load = self.loader.load_and_merge(&self.export_schema, lines).await;

        if load.aborted {
            tracing::warn!(
                error = load.error_summary.as_deref().unwrap_or_default(),
                "Staged load aborted, inserting export lines directly"
            );
            self.insert_directly(lines, result).await;
            return;
        }

        let failed: HashSet<&str> = load
            .failed_items
            .iter()
            .map(|item| item.primary_key.as_str())
            .collect();
        for item in &load.failed_items {
            result
                .errors
                .push(format!("[Export] {}: {}", item.primary_key, item.error_message));
        }

        result.processed_count = load.success_count as u64;
        result.requisition_ids =
            distinct_requisitions(lines.iter().filter(|l| !failed.contains(l.key().as_str())));
    }

    async fn insert_directly(&self, lines: &[ExportLineItem], result: &mut PipelineResult) {
        let store = self.loader.store();
        let columns = self.export_schema.columns();
        let mut persisted = Vec::new();

        for line in lines {
            match store
                .insert_row(&self.export_schema.table, &columns, &line.column_values())
                .await
            {
                Ok(()) => persisted.push(line),
                Err(e) => result
                    .errors
                    .push(format!("[Export] {}: {e}", line.describe())),
            }
        }

        result.processed_count = persisted.len() as u64;
        result.requisition_ids = distinct_requisitions(persisted.into_iter());
    }
}

fn distinct_requisitions<'a>(lines: impl Iterator<Item = &'a ExportLineItem>) -> Vec<String> {
    lines
        .map(|l| l.requisition_id.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
