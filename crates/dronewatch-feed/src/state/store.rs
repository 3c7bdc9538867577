//! Entity store shared between the feed and the render loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use dronewatch_core::{
    BatchOutcome, ConnectivityState, EntityStore, Statistics, StoreSnapshot, TrackerRules,
};
use serde_json::Value;

use crate::clock;
use crate::source::UpdateObserver;

/// Entity store behind a single mutex.
///
/// Each batch is applied under one lock acquisition. Readers copy what they
/// need with [`SharedStore::snapshot`] and release the lock before rendering.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<EntityStore>>,
}

impl SharedStore {
    pub fn new(store: EntityStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with_rules(rules: TrackerRules) -> Self {
        Self::new(EntityStore::new(rules))
    }

    fn lock(&self) -> MutexGuard<'_, EntityStore> {
        // A panicking reader cannot leave the store half-written; keep serving it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a batch stamped with [`clock::now`].
    pub fn apply_batch(&self, batch: &Value) -> BatchOutcome {
        self.lock().apply_batch_at(batch, clock::now())
    }

    /// Run a read-only closure against the store while holding the lock.
    pub fn read<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
        f(&*self.lock())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    pub fn statistics(&self) -> Statistics {
        self.lock().statistics()
    }

    pub fn select(&self, id: &str) {
        self.lock().select(id);
    }

    pub fn clear_selection(&self) {
        self.lock().clear_selection();
    }

    /// Marker click handler.
    pub fn toggle_selection(&self, id: &str) {
        self.lock().toggle_selection(id);
    }

    pub fn set_connectivity(&self, state: ConnectivityState) {
        self.lock().set_connectivity(state);
    }

    pub fn prune_stale(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<String> {
        self.lock().prune_stale(now, max_age)
    }
}

impl UpdateObserver for SharedStore {
    fn on_update(&self, batch: &Value) {
        let outcome = self.apply_batch(batch);
        if outcome.dropped > 0 {
            tracing::warn!(
                "Applied batch: {} accepted, {} dropped without id",
                outcome.accepted,
                outcome.dropped
            );
        } else {
            tracing::debug!(
                "Applied batch: {} accepted ({} new)",
                outcome.accepted,
                outcome.created
            );
        }
    }

    fn on_connectivity_change(&self, state: ConnectivityState) {
        self.set_connectivity(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn observer_applies_batches_and_connectivity() {
        let store = SharedStore::with_rules(TrackerRules::default());
        store.on_update(&json!([{"id": "d1", "registration": "B1"}]));
        store.on_connectivity_change(ConnectivityState::Connected);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.entities.len(), 1);
        assert_eq!(snapshot.connectivity, ConnectivityState::Connected);
        assert!(snapshot.last_batch_at.is_some());
    }

    #[test]
    fn clones_share_state() {
        let store = SharedStore::with_rules(TrackerRules::default());
        let other = store.clone();
        other.toggle_selection("d1");
        assert_eq!(store.read(|s| s.selected().map(str::to_string)), Some("d1".to_string()));
    }
}
