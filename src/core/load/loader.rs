//! Staged bulk upsert
//!
//! `load_and_merge` writes rows into a throw-away staging table that mirrors
//! the target, then merges staging into the target in one statement:
//!
//! 1. create `{table}_Staging_{yyyyMMddHHmmss}`
//! 2. bulk-insert every row atomically
//! 3. if the bulk insert fails, truncate staging and insert row by row,
//!    recording each rejected row as a [`FailedItem`](super::FailedItem)
//! 4. merge staging into the target on the key columns
//! 5. drop staging, best effort

use super::merge::{MergePlan, MergeStrategy};
use super::result::UpsertBatchResult;
use crate::adapters::database::TableStore;
use crate::domain::{ColumnValue, Result, StageRow, TableSchema};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

/// Infix between a target table name and the staging timestamp
pub const STAGING_INFIX: &str = "_Staging_";

/// Timestamp format of staging table names
pub const STAGING_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Staging table name for `table` created at `at`
pub fn staging_table_name(table: &str, at: NaiveDateTime) -> String {
    format!(
        "{table}{STAGING_INFIX}{}",
        at.format(STAGING_TIMESTAMP_FORMAT)
    )
}

/// Fault-isolating bulk upsert over any [`TableStore`]
pub struct StagedBulkLoader {
    store: Arc<dyn TableStore>,
    strategy: MergeStrategy,
}

impl StagedBulkLoader {
    pub fn new(store: Arc<dyn TableStore>, strategy: MergeStrategy) -> Self {
        Self { store, strategy }
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Store the loader writes through
    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Stage `rows` and merge them into `schema.table`
    ///
    /// Never returns an error: every failure is reported in the result.
    pub async fn load_and_merge<R: StageRow>(
        &self,
        schema: &TableSchema,
        rows: &[R],
    ) -> UpsertBatchResult {
        let mut result = UpsertBatchResult::new(rows.len());
        if rows.is_empty() {
            tracing::debug!(table = %schema.table, "Nothing to load");
            return result;
        }

        let staging = staging_table_name(&schema.table, Local::now().naive_local());
        tracing::debug!(table = %schema.table, staging = %staging, rows = rows.len(), "Staging rows");

        if let Err(e) = self
            .store
            .create_staging_table(&schema.table, &staging)
            .await
        {
            tracing::error!(staging = %staging, error = %e, "Failed to create staging table");
            result.abort(e.to_string());
            return result;
        }

        if let Err(e) = self.stage_and_merge(schema, &staging, rows, &mut result).await {
            tracing::error!(table = %schema.table, error = %e, "Staged load aborted");
            result.abort(e.to_string());
        }

        if let Err(e) = self.store.drop_table(&staging).await {
            tracing::warn!(staging = %staging, error = %e, "Failed to drop staging table");
        }

        tracing::info!(
            table = %schema.table,
            total = result.total_count,
            staged = result.success_count,
            failed = result.failed_count,
            merged = result.merged_count,
            "Staged load finished"
        );
        result
    }

    async fn stage_and_merge<R: StageRow>(
        &self,
        schema: &TableSchema,
        staging: &str,
        rows: &[R],
        result: &mut UpsertBatchResult,
    ) -> Result<()> {
        let columns = schema.columns();
        let values: Vec<Vec<ColumnValue>> = rows.iter().map(StageRow::column_values).collect();

        match self.store.bulk_insert(staging, &columns, &values).await {
            Ok(_) => result.success_count = rows.len(),
            Err(bulk_err) => {
                tracing::warn!(
                    staging = %staging,
                    error = %bulk_err,
                    "Bulk insert failed, falling back to row-by-row insert"
                );
                self.store.truncate_table(staging).await?;

                for (row, row_values) in rows.iter().zip(&values) {
                    match self.store.insert_row(staging, &columns, row_values).await {
                        Ok(()) => result.success_count += 1,
                        Err(e) => {
                            let key = key_string(schema, row_values);
                            tracing::debug!(key = %key, error = %e, "Row rejected");
                            result.add_failure(key, e.to_string(), snapshot(row));
                        }
                    }
                }
                result.error_summary = Some(result.fallback_summary());

                if result.success_count == 0 {
                    return Ok(());
                }
            }
        }

        let plan = MergePlan::from_schema(schema, staging, self.strategy);
        result.merged_count = self.store.merge(&plan).await?;
        Ok(())
    }
}

/// Key column values of a row joined with `|`
pub fn key_string(schema: &TableSchema, values: &[ColumnValue]) -> String {
    schema
        .primary_key
        .iter()
        .filter_map(|k| schema.index_of(k))
        .filter_map(|i| values.get(i))
        .map(ColumnValue::render)
        .collect::<Vec<_>>()
        .join("|")
}

fn snapshot<R: StageRow>(row: &R) -> String {
    serde_json::to_string(row).unwrap_or_else(|e| format!("<unserializable row: {e}>"))
}
