//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting XML export results.

use super::scenario::ExportScenario;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: ExportScenario,

    /// Pending lines selected for the scenario
    pub rows: usize,

    /// Files written, in write order
    pub files: Vec<PathBuf>,

    /// Set when the scenario stopped early
    pub error: Option<String>,
}

impl ScenarioOutcome {
    pub fn new(scenario: ExportScenario) -> Self {
        Self {
            scenario,
            rows: 0,
            files: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of an export run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub scenarios: Vec<ScenarioOutcome>,

    /// Lines stamped as exported; zero when nothing was marked
    pub marked_exported: u64,

    /// Errors outside a single scenario
    pub errors: Vec<String>,

    /// Duration of the export
    #[serde(skip)]
    pub duration: Duration,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_error(&mut self, message: String) {
        self.errors.push(message);
    }

    /// Every file written across scenarios
    pub fn files(&self) -> Vec<&PathBuf> {
        self.scenarios.iter().flat_map(|s| s.files.iter()).collect()
    }

    pub fn file_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.files.len()).sum()
    }

    /// All scenarios succeeded and no other error occurred
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && self.scenarios.iter().all(ScenarioOutcome::is_success)
    }

    /// Scenario and run errors as display lines
    pub fn error_messages(&self) -> Vec<String> {
        self.scenarios
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| format!("[{}] {e}", s.scenario)))
            .chain(self.errors.iter().cloned())
            .collect()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            files = self.file_count(),
            marked_exported = self.marked_exported,
            duration_ms = self.duration.as_millis() as u64,
            "XML export completed"
        );

        for outcome in &self.scenarios {
            tracing::debug!(
                scenario = %outcome.scenario,
                rows = outcome.rows,
                files = outcome.files.len(),
                "Scenario result"
            );
        }

        let errors = self.error_messages();
        if !errors.is_empty() {
            tracing::warn!(error_count = errors.len(), "XML export completed with errors");
            for error in &errors {
                tracing::warn!(message = %error, "XML export error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_is_successful() {
        let summary = ExportSummary::new();
        assert!(summary.is_successful());
        assert_eq!(summary.file_count(), 0);
    }

    #[test]
    fn test_scenario_error_fails_summary() {
        let mut summary = ExportSummary::new();
        let mut sap = ScenarioOutcome::new(ExportScenario::ToSap);
        sap.files.push(PathBuf::from("a.xml"));
        let mut zl = ScenarioOutcome::new(ExportScenario::ToZl);
        zl.error = Some("disk full".to_string());
        summary.scenarios = vec![sap, zl];

        assert!(!summary.is_successful());
        assert_eq!(summary.file_count(), 1);
        assert_eq!(summary.error_messages(), vec!["[ToZL] disk full".to_string()]);
    }
}
