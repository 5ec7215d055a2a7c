//! Core business logic for Formbridge
//!
//! # Modules
//!
//! - [`intake`] - discovery of approved requisitions into the intake queue
//! - [`transform`] - order, sample and return rule sets producing export lines
//! - [`load`] - staged bulk upsert with row-level fault isolation
//! - [`sync`] - the batch pipeline tying intake, transform and load together
//! - [`export`] - XML export of persisted lines per receiving scenario
//! - [`reference`] - reference-data file processing
//! - [`jobs`] - job registry with stable keys
//!
//! # Pipeline
//!
//! 1. **Intake**: enqueue requisitions approved inside the window
//! 2. **Fetch**: read order, sample and return rows for pending entries
//! 3. **Transform**: apply the rule set of each variant
//! 4. **Load**: stage and merge the lines into the export table
//! 5. **Mark**: flag queue entries as processed
//! 6. **Export**: write XML files per scenario and mark lines exported

pub mod export;
pub mod intake;
pub mod jobs;
pub mod load;
pub mod reference;
pub mod sync;
pub mod transform;
