//! Outcome of a staged load

use serde::Serialize;

/// A row that could not be staged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    /// Key column values joined with `|`, or `UNKNOWN`
    pub primary_key: String,
    pub error_message: String,
    /// JSON snapshot of the rejected row
    pub raw_data: String,
}

/// Result of one `load_and_merge` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertBatchResult {
    pub total_count: usize,
    /// Rows that reached staging
    pub success_count: usize,
    pub failed_count: usize,
    /// Rows inserted or changed by the merge
    pub merged_count: u64,
    pub failed_items: Vec<FailedItem>,
    pub error_summary: Option<String>,
    /// Staging or merge failed; nothing was merged
    pub aborted: bool,
}

impl UpsertBatchResult {
    pub fn new(total_count: usize) -> Self {
        Self {
            total_count,
            ..Self::default()
        }
    }

    /// Every row reached the target
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed_count == 0
    }

    pub fn add_failure(&mut self, primary_key: String, error_message: String, raw_data: String) {
        self.failed_items.push(FailedItem {
            primary_key,
            error_message,
            raw_data,
        });
        self.failed_count = self.failed_items.len();
    }

    /// Record a fatal failure of the whole load
    ///
    /// The summary becomes `message`. If no row-level failure was recorded, a
    /// single `UNKNOWN` item stands in for the batch.
    pub fn abort(&mut self, message: String) {
        if self.failed_items.is_empty() {
            self.add_failure(
                "UNKNOWN".to_string(),
                message.clone(),
                format!("{} rows", self.total_count),
            );
        }
        self.merged_count = 0;
        self.error_summary = Some(message);
        self.aborted = true;
    }

    /// Summary written after a row-by-row fallback
    pub fn fallback_summary(&self) -> String {
        format!(
            "completed, success {}, failed {}",
            self.success_count, self.failed_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_is_success() {
        let result = UpsertBatchResult::new(3);
        assert_eq!(result.total_count, 3);
        assert!(result.is_success());
    }

    #[test]
    fn test_add_failure_counts() {
        let mut result = UpsertBatchResult::new(2);
        result.success_count = 1;
        result.add_failure("A|1".into(), "bad".into(), "{}".into());
        assert_eq!(result.failed_count, 1);
        assert!(!result.is_success());
        assert_eq!(result.fallback_summary(), "completed, success 1, failed 1");
    }

    #[test]
    fn test_abort_adds_unknown_item() {
        let mut result = UpsertBatchResult::new(5);
        result.success_count = 5;
        result.abort("merge failed".into());

        assert!(result.aborted);
        assert!(!result.is_success());
        assert_eq!(result.merged_count, 0);
        assert_eq!(result.failed_items.len(), 1);
        assert_eq!(result.failed_items[0].primary_key, "UNKNOWN");
        assert_eq!(result.failed_items[0].raw_data, "5 rows");
        assert_eq!(result.error_summary.as_deref(), Some("merge failed"));
    }

    #[test]
    fn test_abort_keeps_row_failures() {
        let mut result = UpsertBatchResult::new(2);
        result.add_failure("K".into(), "bad".into(), "{}".into());
        result.abort("staging lost".into());
        assert_eq!(result.failed_items.len(), 1);
        assert_eq!(result.failed_items[0].primary_key, "K");
    }
}
