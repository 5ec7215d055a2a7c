//! Exactly-once intake of approved requisitions

use super::window::DiscoveryWindow;
use crate::adapters::database::QueueStore;
use crate::domain::{DomainVariant, QueueEntry, Result};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

/// Configured window bounds, resolved on every discovery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowSettings {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub lookback_days: Option<u32>,
}

impl WindowSettings {
    pub fn resolve(&self, now: NaiveDateTime) -> Result<DiscoveryWindow> {
        DiscoveryWindow::resolve(self.start, self.end, self.lookback_days, now)
    }
}

/// Discovers approved requisitions and records them in the intake queue
pub struct IntakeQueueManager {
    store: Arc<dyn QueueStore>,
    window: WindowSettings,
}

impl IntakeQueueManager {
    pub fn new(store: Arc<dyn QueueStore>, window: WindowSettings) -> Self {
        Self { store, window }
    }

    /// Enqueue every approved requisition in the window not queued yet
    ///
    /// Returns the number of entries actually inserted. Requisitions queued
    /// concurrently by another run are ignored by the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is invalid or the store fails.
    pub async fn discover_and_enqueue(&self) -> Result<u64> {
        self.discover_and_enqueue_at(Local::now().naive_local()).await
    }

    pub async fn discover_and_enqueue_at(&self, now: NaiveDateTime) -> Result<u64> {
        let window = self.window.resolve(now)?;
        let diagrams = DomainVariant::ALL.map(DomainVariant::diagram_id);

        let candidates = self.store.find_unqueued(&window, &diagrams).await?;
        if candidates.is_empty() {
            tracing::debug!(window = %window, "No new requisitions");
            return Ok(0);
        }

        let found = candidates.len();
        let entries: Vec<QueueEntry> = candidates
            .into_iter()
            .map(|c| QueueEntry::enqueue(c, now))
            .collect();
        let inserted = self.store.insert_entries(&entries).await?;

        tracing::info!(
            window = %window,
            found = found,
            inserted = inserted,
            "Requisitions enqueued"
        );
        Ok(inserted)
    }

    /// Stamp every unprocessed entry as processed
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn mark_processed(&self) -> Result<u64> {
        let affected = self
            .store
            .mark_processed(Local::now().naive_local())
            .await?;
        tracing::info!(affected = affected, "Queue entries marked processed");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{QueueCandidate, RequisitionId};
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn candidate(id: &str, diagram: DomainVariant) -> QueueCandidate {
        QueueCandidate {
            requisition_id: RequisitionId::new(id).unwrap(),
            diagram_id: diagram.diagram_id().to_string(),
            serial_id: format!("SER-{id}-0000000"),
        }
    }

    #[tokio::test]
    async fn test_enqueue_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let started = now() - Duration::days(1);
        store.add_approved(candidate("R1", DomainVariant::Order), started, started);
        store.add_approved(candidate("R2", DomainVariant::Sample), started, started);

        let manager = IntakeQueueManager::new(store.clone(), WindowSettings::default());

        assert_eq!(manager.discover_and_enqueue_at(now()).await.unwrap(), 2);
        assert_eq!(manager.discover_and_enqueue_at(now()).await.unwrap(), 0);
        assert_eq!(store.queue_entries().len(), 2);
    }

    #[tokio::test]
    async fn test_window_excludes_old_requisitions() {
        let store = Arc::new(MemoryStore::new());
        let old = now() - Duration::days(30);
        let recent = now() - Duration::hours(2);
        store.add_approved(candidate("OLD", DomainVariant::Return), old, old);
        store.add_approved(candidate("NEW", DomainVariant::Return), recent, recent);

        let settings = WindowSettings {
            lookback_days: Some(7),
            ..WindowSettings::default()
        };
        let manager = IntakeQueueManager::new(store.clone(), settings);

        assert_eq!(manager.discover_and_enqueue_at(now()).await.unwrap(), 1);
        let entries = store.queue_entries();
        assert_eq!(entries[0].requisition_id.as_str(), "NEW");
        assert_eq!(entries[0].export_count, 0);
        assert!(entries[0].processed_at.is_none());
    }

    #[tokio::test]
    async fn test_mark_processed_stamps_pending_entries() {
        let store = Arc::new(MemoryStore::new());
        let started = now() - Duration::days(1);
        store.add_approved(candidate("R1", DomainVariant::Order), started, started);
        let manager = IntakeQueueManager::new(store.clone(), WindowSettings::default());
        manager.discover_and_enqueue_at(now()).await.unwrap();

        assert_eq!(manager.mark_processed().await.unwrap(), 1);
        assert_eq!(manager.mark_processed().await.unwrap(), 0);
        assert!(store.queue_entries()[0].is_processed());
    }
}
