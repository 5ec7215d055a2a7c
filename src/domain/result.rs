//! Crate-wide result alias

use super::errors::FormbridgeError;

/// Result of a Formbridge operation
///
/// ```
/// use formbridge::domain::{FormbridgeError, Result};
///
/// fn require_table(name: &str) -> Result<&str> {
///     if name.trim().is_empty() {
///         return Err(FormbridgeError::Validation("export table name is empty".into()));
///     }
///     Ok(name)
/// }
///
/// assert!(require_table("fourpl_datatrans_export").is_ok());
/// assert!(require_table(" ").is_err());
/// ```
pub type Result<T> = std::result::Result<T, FormbridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn read_missing() -> Result<String> {
        Ok(std::fs::read_to_string("/nonexistent/formbridge/input.xml")?)
    }

    fn parse_row() -> Result<serde_json::Value> {
        Ok(serde_json::from_str("{\"FormNo\": ")?)
    }

    #[test]
    fn test_question_mark_converts_io_errors() {
        assert!(matches!(read_missing(), Err(FormbridgeError::Io(_))));
    }

    #[test]
    fn test_question_mark_converts_json_errors() {
        assert!(matches!(parse_row(), Err(FormbridgeError::Serialization(_))));
    }
}
