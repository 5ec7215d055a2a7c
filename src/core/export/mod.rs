//! XML export of persisted export lines
//!
//! This module provides:
//! - Export scenarios and their file layout ([`ExportScenario`])
//! - Export coordination across scenarios ([`ExportCoordinator`])
//! - Summary and reporting ([`ExportSummary`])

pub mod coordinator;
pub mod scenario;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use scenario::ExportScenario;
pub use summary::{ExportSummary, ScenarioOutcome};
