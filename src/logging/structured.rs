//! Subscriber installation
//!
//! Console output is always on. When `local_enabled` is set, JSON lines are
//! also written to `{local_path}/formbridge.log.*` with the configured
//! rotation. Both layers share one filter: `RUST_LOG` when set, otherwise
//! `formbridge={level}`.

use crate::config::LoggingConfig;
use crate::domain::{FormbridgeError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Log file name prefix
const LOG_FILE_PREFIX: &str = "formbridge.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer alive; dropping it flushes buffered lines
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Directory receiving JSON log files, if file logging is on
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns a `Configuration` error for an unknown level, an uncreatable log
/// directory or a subscriber that is already installed.
pub fn init_logging(log_level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(log_level)?;
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("formbridge={level}")))
    };

    let mut layers: Vec<BoxedLayer> = vec![console_layer(filter())];
    let mut guard = LoggingGuard {
        _file_guard: None,
        log_dir: None,
    };

    if config.local_enabled {
        let (layer, file_guard) = file_layer(config, filter())?;
        layers.push(layer);
        guard._file_guard = Some(file_guard);
        guard.log_dir = Some(PathBuf::from(&config.local_path));
    }

    tracing_subscriber::registry().with(layers).try_init().map_err(|e| {
        FormbridgeError::Configuration(format!("Failed to install log subscriber: {e}"))
    })?;

    tracing::info!(
        level = %level,
        log_dir = ?guard.log_dir,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(guard)
}

fn console_layer(filter: EnvFilter) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(filter)
        .boxed()
}

fn file_layer(config: &LoggingConfig, filter: EnvFilter) -> Result<(BoxedLayer, WorkerGuard)> {
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        FormbridgeError::Configuration(format!(
            "Failed to create log directory {}: {e}",
            config.local_path
        ))
    })?;

    let appender = RollingFileAppender::new(
        rotation(&config.local_rotation),
        &config.local_path,
        LOG_FILE_PREFIX,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .with_filter(filter)
        .boxed();

    Ok((layer, guard))
}

fn rotation(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        _ => Rotation::DAILY,
    }
}

fn parse_log_level(name: &str) -> Result<Level> {
    Level::from_str(name.trim()).map_err(|_| {
        FormbridgeError::Configuration(format!(
            "Invalid log level '{name}', expected one of: trace, debug, info, warn, error"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("trace", Level::TRACE)]
    #[test_case("debug", Level::DEBUG)]
    #[test_case("INFO", Level::INFO)]
    #[test_case("Warn", Level::WARN)]
    #[test_case(" error ", Level::ERROR)]
    fn test_parse_log_level_valid(input: &str, expected: Level) {
        assert_eq!(parse_log_level(input).unwrap(), expected);
    }

    #[test_case("verbose")]
    #[test_case("")]
    fn test_parse_log_level_invalid(input: &str) {
        assert!(parse_log_level(input).is_err());
    }

    #[test]
    fn test_rotation_defaults_to_daily() {
        assert_eq!(rotation("hourly"), Rotation::HOURLY);
        assert_eq!(rotation("daily"), Rotation::DAILY);
        assert_eq!(rotation("weekly"), Rotation::DAILY);
    }
}
