//! Batch synchronization pipeline
//!
//! [`SyncOrchestrator`] runs intake, the three rule sets and the staged load
//! into the export table, and reports everything in a [`PipelineResult`].

pub mod orchestrator;
pub mod result;

pub use orchestrator::SyncOrchestrator;
pub use result::PipelineResult;
