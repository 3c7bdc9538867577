//! Update source boundary.
//!
//! Producers of telemetry batches (the simulator, or any other transport)
//! publish through an [`UpdateHub`]. Consumers register an [`UpdateObserver`]
//! and keep the returned [`Subscription`]; dropping it unsubscribes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use dashmap::DashMap;
use dronewatch_core::ConnectivityState;
use serde_json::Value;

/// Receiver of raw batches and connectivity transitions.
pub trait UpdateObserver: Send + Sync {
    fn on_update(&self, batch: &Value);

    fn on_connectivity_change(&self, _state: ConnectivityState) {}
}

/// Fan-out point between update sources and observers.
pub struct UpdateHub {
    observers: DashMap<u64, Arc<dyn UpdateObserver>>,
    next_id: AtomicU64,
    connectivity: Mutex<ConnectivityState>,
    batches_published: AtomicU64,
}

impl UpdateHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            observers: DashMap::new(),
            next_id: AtomicU64::new(1),
            connectivity: Mutex::new(ConnectivityState::Disconnected),
            batches_published: AtomicU64::new(0),
        })
    }

    /// Register an observer. It stays registered until the handle is dropped.
    pub fn subscribe(self: &Arc<Self>, observer: Arc<dyn UpdateObserver>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.insert(id, observer);
        tracing::debug!("Observer {} subscribed", id);
        Subscription {
            hub: Arc::downgrade(self),
            id,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliver a batch to every observer, one after another.
    /// Returns the number of observers reached.
    pub fn publish_batch(&self, batch: &Value) -> usize {
        // Clone out of the map so observers may unsubscribe from inside a callback
        let observers = self.current_observers();
        for observer in &observers {
            observer.on_update(batch);
        }
        self.batches_published.fetch_add(1, Ordering::SeqCst);
        observers.len()
    }

    /// Record a connectivity state, notifying observers only on an actual change.
    pub fn set_connectivity(&self, state: ConnectivityState) -> bool {
        {
            let mut current = self
                .connectivity
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *current == state {
                return false;
            }
            *current = state;
        }

        tracing::info!("Update source {}", state.label());
        for observer in self.current_observers() {
            observer.on_connectivity_change(state);
        }
        true
    }

    pub fn connectivity(&self) -> ConnectivityState {
        *self
            .connectivity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn batches_published(&self) -> u64 {
        self.batches_published.load(Ordering::SeqCst)
    }

    fn current_observers(&self) -> Vec<Arc<dyn UpdateObserver>> {
        self.observers.iter().map(|r| r.value().clone()).collect()
    }
}

/// Handle returned by [`UpdateHub::subscribe`].
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    hub: Weak<UpdateHub>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.observers.remove(&self.id);
            tracing::debug!("Observer {} unsubscribed", self.id);
        }
    }
}
