//! Job dispatch
//!
//! Jobs are addressed by stable keys ([`BPM_UPLOAD`], [`MASTER_DATA`]).
//! Legacy scheduler names can be mapped onto those keys through
//! `[jobs.aliases]`; resolving an alias logs a deprecation warning.

pub mod handlers;
pub mod registry;

pub use handlers::{BpmUploadJob, JobHandler, JobReport, MasterDataJob};
pub use registry::JobRegistry;

/// Sync run followed by the XML export
pub const BPM_UPLOAD: &str = "bpm-upload";

/// Reference-data file processing
pub const MASTER_DATA: &str = "master-data";

/// Every stable job key
pub const JOB_KEYS: [&str; 2] = [BPM_UPLOAD, MASTER_DATA];
