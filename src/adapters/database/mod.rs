//! Database abstraction layer
//!
//! The pipeline depends only on the traits in [`traits`]. The PostgreSQL
//! adapter implements them for production; [`crate::adapters::memory`]
//! implements them for tests.

pub mod factory;
pub mod traits;

pub use factory::create_store;
pub use traits::{
    DatabaseClient, ExportStore, QueueCounts, QueueStore, SourceProvider, TableStore,
};
