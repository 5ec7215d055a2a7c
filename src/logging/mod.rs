//! Logging and observability
//!
//! Structured logging through `tracing`: a human-readable console layer plus
//! an optional JSON file layer with daily or hourly rotation.
//!
//! ```no_run
//! use formbridge::config::LoggingConfig;
//! use formbridge::logging::init_logging;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(table = "fourpl_datatrans_export", "Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline step
///
/// ```no_run
/// use formbridge::log_step_start;
///
/// log_step_start!("transform");
/// ```
#[macro_export]
macro_rules! log_step_start {
    ($step:expr) => {
        tracing::info!(step = $step, "Step started");
    };
}

/// Log the completion of a pipeline step with its item count and elapsed time
///
/// ```no_run
/// use formbridge::log_step_complete;
/// use std::time::Duration;
///
/// log_step_complete!("load", 42, Duration::from_millis(850));
/// ```
#[macro_export]
macro_rules! log_step_complete {
    ($step:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            step = $step,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Step completed"
        );
    };
}

/// Log an error with context
///
/// ```no_run
/// use formbridge::log_error_with_context;
/// use formbridge::domain::FormbridgeError;
///
/// let error = FormbridgeError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
