//! Staged bulk loading into target tables
//!
//! Shared by reference-data synchronization and export persistence. See
//! [`StagedBulkLoader::load_and_merge`] for the algorithm.

pub mod loader;
pub mod merge;
pub mod result;
pub mod sweep;

pub use loader::{key_string, staging_table_name, StagedBulkLoader, STAGING_INFIX};
pub use merge::{quote_ident, quote_qualified, MergePlan, MergeStrategy};
pub use result::{FailedItem, UpsertBatchResult};
pub use sweep::{parse_staging_timestamp, StagingSweeper, SweepReport};
