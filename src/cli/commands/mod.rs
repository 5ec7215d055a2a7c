//! CLI command implementations
//!
//! Each command returns its process exit code: 0 success, 1 partial
//! failure, 2 configuration error, 4 connection error, 5 fatal error.

pub mod export;
pub mod init;
pub mod job;
pub mod reference;
pub mod status;
pub mod sweep;
pub mod sync;
pub mod validate;

use crate::adapters::postgresql::PostgresStore;
use crate::cli::context::AppContext;
use crate::config::load_config;

/// Exit code of a run whose steps partly failed
pub const EXIT_PARTIAL: i32 = 1;

/// Exit code of a command that could not start
pub const EXIT_CONFIG: i32 = 2;

/// Load the configuration and build the store, or return the exit code
pub(crate) fn open_context(config_path: &str) -> Result<AppContext<PostgresStore>, i32> {
    let config = load_config(config_path).map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        eprintln!("❌ Failed to load configuration: {e}");
        e.exit_code()
    })?;

    AppContext::connect(config).map_err(|e| {
        tracing::error!(error = %e, "Failed to create database store");
        eprintln!("❌ Failed to initialize database: {e}");
        e.exit_code()
    })
}

/// 0 on success, 1 otherwise
pub(crate) fn outcome_code(success: bool) -> i32 {
    if success {
        0
    } else {
        EXIT_PARTIAL
    }
}
