//! Database abstraction traits
//!
//! This module defines the storage capabilities the pipeline consumes. The
//! PostgreSQL adapter implements all of them; tests substitute in-memory
//! implementations.

use crate::core::intake::DiscoveryWindow;
use crate::core::load::MergePlan;
use crate::domain::{
    ColumnValue, ExportLineItem, OrderBatch, QueueCandidate, QueueEntry, Result, ReturnDetail,
    SampleDetail,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Connection-level operations
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Test the database connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Create the pipeline's own tables if they don't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    async fn ensure_schema(&self) -> Result<()>;
}

/// Generic table capability used by the staged loader
///
/// Every call acquires and releases its own connection.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create `staging` with the columns, defaults and check constraints of `target`
    async fn create_staging_table(&self, target: &str, staging: &str) -> Result<()>;

    /// Insert all rows in one atomic operation
    ///
    /// # Errors
    ///
    /// Returns an error and leaves `table` unchanged if any row is rejected.
    async fn bulk_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<ColumnValue>],
    ) -> Result<u64>;

    /// Insert a single row
    async fn insert_row(&self, table: &str, columns: &[&str], row: &[ColumnValue]) -> Result<()>;

    async fn truncate_table(&self, table: &str) -> Result<()>;

    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Merge staging into the target and return the rows inserted or updated
    async fn merge(&self, plan: &MergePlan) -> Result<u64>;

    /// Names of tables starting with `prefix`
    async fn list_tables(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Intake queue persistence
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Approved requisitions of the given diagrams inside the window that
    /// have no queue entry yet
    async fn find_unqueued(
        &self,
        window: &DiscoveryWindow,
        diagram_ids: &[&str],
    ) -> Result<Vec<QueueCandidate>>;

    /// Insert entries, ignoring requisitions that are already queued
    ///
    /// Returns the number of rows actually inserted.
    async fn insert_entries(&self, entries: &[QueueEntry]) -> Result<u64>;

    /// Stamp every unprocessed entry with `processed_at`
    async fn mark_processed(&self, processed_at: NaiveDateTime) -> Result<u64>;

    /// Pending and processed counts per diagram
    async fn queue_counts(&self) -> Result<Vec<QueueCounts>>;
}

/// Read-only access to the workflow store
///
/// Every fetch is restricted to requisitions with an unprocessed queue entry.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_order_batch(&self) -> Result<OrderBatch>;

    async fn fetch_sample_details(&self) -> Result<Vec<SampleDetail>>;

    async fn fetch_return_details(&self) -> Result<Vec<ReturnDetail>>;
}

/// Export table access for file generation
#[async_trait]
pub trait ExportStore: Send + Sync {
    /// Lines not yet written to a file, optionally for one receiving party
    async fn pending_exports(&self, receiving_party: Option<&str>) -> Result<Vec<ExportLineItem>>;

    /// Stamp every pending line as exported
    async fn mark_exported(&self, exported_at: NaiveDateTime) -> Result<u64>;
}

/// Queue statistics for one diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub diagram_id: String,
    pub pending: u64,
    pub processed: u64,
}
