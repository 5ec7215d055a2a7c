//! Outcome of one synchronization run

use serde::Serialize;

/// Structured result of [`SyncOrchestrator::run`](super::SyncOrchestrator::run)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    /// No step reported an error
    pub success: bool,
    /// Export lines persisted
    pub processed_count: u64,
    /// Distinct requisitions with at least one persisted line
    pub requisition_ids: Vec<String>,
    /// Error messages, prefixed by the step that produced them
    pub errors: Vec<String>,
    pub message: String,
    /// Requisitions newly enqueued by this run
    pub enqueued: u64,
    /// Lines produced by the transformation
    pub lines_produced: usize,
    pub dry_run: bool,
}

impl PipelineResult {
    /// Fills `success` and `message` from the collected counts and errors
    pub(crate) fn finish(mut self) -> Self {
        self.success = self.errors.is_empty();
        self.message = if self.dry_run {
            format!(
                "Dry run produced {} lines from {} requisitions",
                self.lines_produced,
                self.requisition_ids.len()
            )
        } else if self.errors.is_empty() {
            format!("Processed {} lines", self.processed_count)
        } else {
            format!(
                "Processed {} lines with {} errors",
                self.processed_count,
                self.errors.len()
            )
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_without_errors() {
        let result = PipelineResult {
            processed_count: 5,
            ..PipelineResult::default()
        }
        .finish();
        assert!(result.success);
        assert_eq!(result.message, "Processed 5 lines");
    }

    #[test]
    fn test_finish_with_errors() {
        let result = PipelineResult {
            processed_count: 2,
            errors: vec!["[Queue] down".to_string()],
            ..PipelineResult::default()
        }
        .finish();
        assert!(!result.success);
        assert_eq!(result.message, "Processed 2 lines with 1 errors");
    }
}
