//! Domain error types
//!
//! This module defines the error hierarchy for Formbridge.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Formbridge error type
///
/// This is the primary error type used throughout the application.
/// Pipeline steps catch these at their isolation boundary and turn them
/// into messages on the run result instead of propagating them.
#[derive(Debug, Error)]
pub enum FormbridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database-related errors (generic)
    #[error("Database error: {0}")]
    Database(String),

    /// Staged load errors (staging table, merge, cleanup)
    #[error("Load error: {0}")]
    Load(String),

    /// Rule evaluation errors for a single source record
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// XML read or write errors
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Job resolution or execution errors
    #[error("Job error: {0}")]
    Job(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl FormbridgeError {
    /// Process exit code for a command that failed with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FormbridgeError::Configuration(_) => 2,
            FormbridgeError::Connection(_) => 4,
            _ => 5,
        }
    }
}

/// Errors raised while expanding a source record into export lines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Decimal arithmetic overflowed
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),

    /// Request type has no rule set
    #[error("unsupported request type {0}")]
    UnsupportedRequestType(i32),

    /// Source row is missing a value the rules need
    #[error("missing value for {0}")]
    MissingValue(&'static str),
}

// Conversion from std::io::Error
impl From<std::io::Error> for FormbridgeError {
    fn from(err: std::io::Error) -> Self {
        FormbridgeError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for FormbridgeError {
    fn from(err: serde_json::Error) -> Self {
        FormbridgeError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FormbridgeError {
    fn from(err: toml::de::Error) -> Self {
        FormbridgeError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<quick_xml::Error> for FormbridgeError {
    fn from(err: quick_xml::Error) -> Self {
        FormbridgeError::Xml(err.to_string())
    }
}

impl From<tokio_postgres::Error> for FormbridgeError {
    fn from(err: tokio_postgres::Error) -> Self {
        FormbridgeError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formbridge_error_display() {
        let err = FormbridgeError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(FormbridgeError::Configuration("x".into()).exit_code(), 2);
        assert_eq!(FormbridgeError::Connection("x".into()).exit_code(), 4);
        assert_eq!(FormbridgeError::Load("x".into()).exit_code(), 5);
    }

    #[test]
    fn test_transform_error_conversion() {
        let err: FormbridgeError = TransformError::UnsupportedRequestType(9).into();
        assert!(matches!(err, FormbridgeError::Transform(_)));
        assert_eq!(err.to_string(), "Transform error: unsupported request type 9");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: FormbridgeError = io_err.into();
        assert!(matches!(err, FormbridgeError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: FormbridgeError = json_err.into();
        assert!(matches!(err, FormbridgeError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: FormbridgeError = toml_err.into();
        assert!(matches!(err, FormbridgeError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_formbridge_error_implements_std_error() {
        let err = FormbridgeError::Load("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
