//! Authoritative in-memory state for tracked drones.
//!
//! The store is a plain single-writer structure: callers that share it across
//! tasks wrap it in one mutex and hold the lock for the duration of each
//! [`EntityStore::apply_batch`] call.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::classify::{Classifier, PrefixClassifier};
use crate::models::{ConnectivityState, Entity, EntityUpdate, PathSample, Statistics};
use crate::normalizer::{normalize, reports_in};
use crate::path::FlightPath;
use crate::rules::TrackerRules;

/// Result of applying one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Reports that updated or created an entity
    pub accepted: usize,
    /// Reports dropped for lack of a resolvable id
    pub dropped: usize,
    /// Entities seen for the first time
    pub created: usize,
}

/// Point-in-time copy of the store, taken so the lock can be released before rendering.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub entities: Vec<Entity>,
    pub selected: Option<String>,
    pub connectivity: ConnectivityState,
    pub last_batch_at: Option<DateTime<Utc>>,
    pub revision: u64,
}

impl StoreSnapshot {
    /// The selected entity, when the selection refers to a tracked drone.
    pub fn selected_entity(&self) -> Option<&Entity> {
        let id = self.selected.as_deref()?;
        self.entities.iter().find(|e| e.id == id)
    }
}

pub struct EntityStore {
    entities: HashMap<String, Entity>,
    paths: HashMap<String, FlightPath>,
    selected: Option<String>,
    connectivity: ConnectivityState,
    last_batch_at: Option<DateTime<Utc>>,
    revision: u64,
    rules: TrackerRules,
    classifier: Box<dyn Classifier>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(TrackerRules::default())
    }
}

impl EntityStore {
    /// Create a store classifying with the rules' authorized prefix.
    pub fn new(rules: TrackerRules) -> Self {
        let classifier = PrefixClassifier::new(rules.authorized_prefix.clone());
        Self::with_classifier(rules, Box::new(classifier))
    }

    /// Create a store with a custom classification strategy.
    pub fn with_classifier(rules: TrackerRules, classifier: Box<dyn Classifier>) -> Self {
        Self {
            entities: HashMap::new(),
            paths: HashMap::new(),
            selected: None,
            connectivity: ConnectivityState::default(),
            last_batch_at: None,
            revision: 0,
            rules,
            classifier,
        }
    }

    /// Apply a raw batch stamped with the current time.
    pub fn apply_batch(&mut self, batch: &Value) -> BatchOutcome {
        self.apply_batch_at(batch, Utc::now())
    }

    /// Apply a raw batch received at `now`.
    ///
    /// `now` stands in for missing report timestamps and stamps each entity's
    /// receipt time. Reports without a resolvable id are skipped; the rest of
    /// the batch is still applied. Runs in time proportional to the batch size.
    pub fn apply_batch_at(&mut self, batch: &Value, now: DateTime<Utc>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for report in reports_in(batch) {
            match normalize(report, now) {
                Ok(update) => {
                    if self.apply_update(&update, now) {
                        outcome.created += 1;
                    }
                    outcome.accepted += 1;
                }
                Err(e) => {
                    tracing::debug!("Dropping report: {}", e);
                    outcome.dropped += 1;
                }
            }
        }

        self.last_batch_at = Some(now);
        self.revision += 1;
        outcome
    }

    /// Upsert one normalized update. Returns true when the entity is new.
    fn apply_update(&mut self, update: &EntityUpdate, now: DateTime<Utc>) -> bool {
        let category = self.classifier.classify(update.registration.as_ref());
        let mut created = false;

        let entity = self
            .entities
            .entry(update.id.clone())
            .and_modify(|entity| entity.update(update, category, now))
            .or_insert_with(|| {
                created = true;
                Entity::from_update(update, category, now)
            });

        let capacity = self.rules.path_capacity;
        self.paths
            .entry(entity.id.clone())
            .or_insert_with(|| FlightPath::with_capacity(capacity))
            .push(PathSample {
                position: update.position,
                timestamp: entity.last_seen_at,
            });

        created
    }

    /// Select a drone. The id is not validated against tracked drones.
    pub fn select(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.selected.as_deref() != Some(id.as_str()) {
            self.selected = Some(id);
            self.revision += 1;
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.revision += 1;
        }
    }

    /// Marker click: clicking the selected drone clears, anything else selects it.
    pub fn toggle_selection(&mut self, id: &str) {
        if self.selected.as_deref() == Some(id) {
            self.clear_selection();
        } else {
            self.select(id);
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Record the source's connection state.
    pub fn set_connectivity(&mut self, state: ConnectivityState) {
        if self.connectivity != state {
            self.connectivity = state;
            self.revision += 1;
        }
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity
    }

    pub fn last_batch_at(&self) -> Option<DateTime<Utc>> {
        self.last_batch_at
    }

    /// Monotonic counter bumped on every observable change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    pub fn by_id(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Path samples for a drone, oldest first. Empty when unknown.
    pub fn path_of(&self, id: &str) -> Vec<PathSample> {
        self.paths.get(id).map(FlightPath::to_vec).unwrap_or_default()
    }

    pub fn unsafe_count(&self) -> usize {
        self.entities
            .values()
            .filter(|e| e.category == crate::models::Category::Unsafe)
            .count()
    }

    /// Aggregate statistics; all zero for an empty store.
    pub fn statistics(&self) -> Statistics {
        compute_statistics(self.entities.values(), &self.rules)
    }

    /// Evict drones with no report received within `max_age` of `now`,
    /// returning their ids. Report timestamps play no part, so a source with
    /// a lagging clock keeps its drones.
    pub fn prune_stale(&mut self, now: DateTime<Utc>, max_age: Duration) -> Vec<String> {
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return Vec::new();
        };
        let stale: Vec<String> = self
            .entities
            .values()
            .filter(|e| e.received_at < cutoff)
            .map(|e| e.id.clone())
            .collect();

        for id in &stale {
            self.entities.remove(id);
            self.paths.remove(id);
        }
        if !stale.is_empty() {
            self.revision += 1;
        }
        stale
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            entities: self.entities.values().cloned().collect(),
            selected: self.selected.clone(),
            connectivity: self.connectivity,
            last_batch_at: self.last_batch_at,
            revision: self.revision,
        }
    }
}

/// Aggregate over any set of entities. Never produces NaN or infinities.
pub fn compute_statistics<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    rules: &TrackerRules,
) -> Statistics {
    let mut stats = Statistics::default();
    let mut altitude_sum = 0.0;
    let mut battery_sum = 0.0;
    let mut max_altitude = f64::NEG_INFINITY;
    let mut min_altitude = f64::INFINITY;

    for entity in entities {
        stats.total_drones += 1;
        match entity.category {
            crate::models::Category::Safe => stats.safe_count += 1,
            crate::models::Category::Unsafe => stats.unsafe_count += 1,
        }
        if rules.is_flying(&entity.status_label) {
            stats.flying_count += 1;
        }
        altitude_sum += entity.position.altitude;
        battery_sum += entity.battery_pct;
        max_altitude = max_altitude.max(entity.position.altitude);
        min_altitude = min_altitude.min(entity.position.altitude);
    }

    if stats.total_drones > 0 {
        let count = stats.total_drones as f64;
        stats.average_altitude = altitude_sum / count;
        stats.average_battery_pct = battery_sum / count;
        stats.max_altitude = max_altitude;
        stats.min_altitude = min_altitude;
    }
    stats
}
