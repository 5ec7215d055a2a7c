//! Registry of stable job keys to handlers

use super::handlers::{JobHandler, JobReport};
use super::JOB_KEYS;
use crate::domain::{FormbridgeError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct JobRegistry {
    handlers: BTreeMap<&'static str, Arc<dyn JobHandler>>,
    aliases: BTreeMap<String, String>,
}

impl JobRegistry {
    /// Create an empty registry with the configured legacy aliases
    ///
    /// # Errors
    ///
    /// Returns a `Job` error when an alias targets an unknown key.
    pub fn new(aliases: BTreeMap<String, String>) -> Result<Self> {
        for (alias, key) in &aliases {
            if !JOB_KEYS.contains(&key.as_str()) {
                return Err(FormbridgeError::Job(format!(
                    "Alias '{alias}' targets unknown job '{key}'"
                )));
            }
        }
        Ok(Self {
            handlers: BTreeMap::new(),
            aliases,
        })
    }

    /// Register a handler under its own key, replacing any earlier one
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.key(), handler);
    }

    /// Registered keys in order
    pub fn keys(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Resolve a key or legacy alias to a stable key
    pub fn resolve(&self, name: &str) -> Result<&'static str> {
        if let Some(key) = JOB_KEYS.iter().find(|k| **k == name) {
            return Ok(key);
        }

        let target = self
            .aliases
            .get(name)
            .ok_or_else(|| FormbridgeError::Job(format!("Unknown job '{name}'")))?;
        let key = JOB_KEYS
            .iter()
            .find(|k| **k == target.as_str())
            .ok_or_else(|| FormbridgeError::Job(format!("Unknown job '{target}'")))?;

        tracing::warn!(
            alias = name,
            job = key,
            "Job name is deprecated, use the stable key instead"
        );
        Ok(key)
    }

    /// Resolve `name` and run its handler
    pub async fn run(&self, name: &str) -> Result<JobReport> {
        let key = self.resolve(name)?;
        let handler = self
            .handlers
            .get(key)
            .ok_or_else(|| FormbridgeError::Job(format!("Job '{key}' is not registered")))?;

        tracing::info!(job = key, "Running job");
        let report = handler.run().await?;
        tracing::info!(
            job = key,
            success = report.success,
            message = %report.message,
            "Job finished"
        );
        Ok(report)
    }
}
