//! External system integrations for Formbridge
//!
//! - [`database`] - storage traits and store construction
//! - [`postgresql`] - PostgreSQL implementation of the storage traits
//! - [`memory`] - in-memory implementation used by tests
//! - [`files`] - directory handling and XML reading/writing
//!
//! Adapters isolate external dependencies so the core modules can be tested
//! against the in-memory store.

pub mod database;
pub mod files;
pub mod memory;
pub mod postgresql;
