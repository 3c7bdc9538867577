//! Reconciliation of tracked drones against a map marker layer.
//!
//! [`VisualizationSync`] remembers what it last told the layer and emits only
//! the difference on each pass: new markers are placed, changed markers are
//! re-placed in place, unchanged markers are left alone and markers for
//! vanished drones are removed. At most one popup is open, bound to the
//! selected drone.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::models::Entity;
use crate::rules::TrackerRules;
use crate::viewport::{LatLng, Viewport};

/// Marker placement directive for one drone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: String,
    pub lng: f64,
    pub lat: f64,
    pub style_color: String,
    /// Selected drone gets a border/glow on top of its category color
    pub emphasized: bool,
    /// Drones in a flying status pulse regardless of category
    pub pulsing: bool,
}

/// Popup contents for the selected drone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub id: String,
    pub name: String,
    pub status_label: String,
    pub battery_pct: f64,
    /// Altitude rounded to the nearest meter
    pub altitude: i64,
}

/// The map widget boundary.
pub trait MarkerLayer {
    /// Create or move a marker.
    fn place(&mut self, placement: &Placement);
    fn remove(&mut self, id: &str);
    /// Open (or refresh) the popup for a marker.
    fn open_popup(&mut self, popup: &Popup);
    fn close_popup(&mut self, id: &str);
    fn set_view(&mut self, center: LatLng);
}

/// Counts of directives emitted by one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

pub struct VisualizationSync {
    rules: TrackerRules,
    markers: HashMap<String, Placement>,
    popup: Option<Popup>,
    centered_on: Option<String>,
    viewport: Viewport,
}

impl VisualizationSync {
    pub fn new(rules: TrackerRules, initial_center: LatLng) -> Self {
        Self {
            rules,
            markers: HashMap::new(),
            popup: None,
            centered_on: None,
            viewport: Viewport::new(initial_center),
        }
    }

    pub fn placement_for(&self, entity: &Entity, selected: Option<&str>) -> Placement {
        Placement {
            id: entity.id.clone(),
            lng: entity.position.longitude,
            lat: entity.position.latitude,
            style_color: entity.category.color().to_string(),
            emphasized: selected == Some(entity.id.as_str()),
            pulsing: self.rules.is_flying(&entity.status_label),
        }
    }

    /// Bring the layer in line with `entities` and the current selection.
    pub fn reconcile<L: MarkerLayer + ?Sized>(
        &mut self,
        entities: &[Entity],
        selected: Option<&str>,
        now: Instant,
        layer: &mut L,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        let mut next = HashMap::with_capacity(entities.len());
        let mut selected_entity = None;

        for entity in entities {
            if selected == Some(entity.id.as_str()) {
                selected_entity = Some(entity);
            }
            let placement = self.placement_for(entity, selected);
            match self.markers.get(&entity.id) {
                None => {
                    layer.place(&placement);
                    report.created += 1;
                }
                Some(prev) if *prev != placement => {
                    layer.place(&placement);
                    report.updated += 1;
                }
                Some(_) => report.unchanged += 1,
            }
            next.insert(entity.id.clone(), placement);
        }

        self.sync_popup(selected_entity, layer);

        for id in self.markers.keys() {
            if !next.contains_key(id) {
                layer.remove(id);
                report.removed += 1;
            }
        }
        self.markers = next;

        self.sync_viewport(selected, selected_entity, now);

        report
    }

    fn sync_popup<L: MarkerLayer + ?Sized>(&mut self, selected: Option<&Entity>, layer: &mut L) {
        let desired = selected.map(|entity| Popup {
            id: entity.id.clone(),
            name: entity.display_name.clone(),
            status_label: entity.status_label.clone(),
            battery_pct: entity.battery_pct,
            altitude: entity.position.altitude.round() as i64,
        });

        if self.popup == desired {
            return;
        }
        // Close before opening so two popups never coexist
        if let Some(open) = &self.popup {
            if desired.as_ref().map(|p| &p.id) != Some(&open.id) {
                layer.close_popup(&open.id);
            }
        }
        if let Some(popup) = &desired {
            layer.open_popup(popup);
        }
        self.popup = desired;
    }

    fn sync_viewport(&mut self, selected: Option<&str>, entity: Option<&Entity>, now: Instant) {
        match (selected, entity) {
            (None, _) => self.centered_on = None,
            (Some(id), Some(entity)) if self.centered_on.as_deref() != Some(id) => {
                let target = LatLng::new(entity.position.latitude, entity.position.longitude);
                let duration = Duration::from_millis(self.rules.recenter_ms);
                self.viewport.recenter(target, now, duration);
                self.centered_on = Some(id.to_string());
            }
            // Selected drone absent: wait for it to appear
            _ => {}
        }
    }

    /// Step the viewport transition, pushing the new center to the layer.
    /// Returns true while a transition is running.
    pub fn animate<L: MarkerLayer + ?Sized>(&mut self, now: Instant, layer: &mut L) -> bool {
        match self.viewport.step(now) {
            Some(center) => {
                layer.set_view(center);
                self.viewport.is_animating()
            }
            None => false,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.viewport.is_animating()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, id: &str) -> Option<&Placement> {
        self.markers.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Default)]
    struct RecordingLayer {
        markers: HashMap<String, Placement>,
        open_popups: HashSet<String>,
        places: usize,
        removes: usize,
        views: Vec<LatLng>,
    }

    impl MarkerLayer for RecordingLayer {
        fn place(&mut self, placement: &Placement) {
            self.places += 1;
            self.markers.insert(placement.id.clone(), placement.clone());
        }
        fn remove(&mut self, id: &str) {
            self.removes += 1;
            self.markers.remove(id);
        }
        fn open_popup(&mut self, popup: &Popup) {
            self.open_popups.insert(popup.id.clone());
        }
        fn close_popup(&mut self, id: &str) {
            self.open_popups.remove(id);
        }
        fn set_view(&mut self, center: LatLng) {
            self.views.push(center);
        }
    }

    fn store_with(reports: serde_json::Value) -> EntityStore {
        let mut store = EntityStore::default();
        store.apply_batch_at(&reports, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        store
    }

    fn two_drones() -> EntityStore {
        store_with(json!([
            {"id": "a", "position": {"lat": 1.0, "lng": 1.0, "altitude": 10.4}, "registration": "B1", "status": "Flying", "name": "Alpha"},
            {"id": "b", "position": {"lat": 2.0, "lng": 2.0, "altitude": 20.6}, "registration": "Z1", "status": "Landed", "name": "Bravo"},
        ]))
    }

    fn sync() -> VisualizationSync {
        VisualizationSync::new(TrackerRules::default(), LatLng::new(0.0, 0.0))
    }

    #[test]
    fn unchanged_entities_are_not_replaced() {
        let store = two_drones();
        let snapshot = store.snapshot();
        let mut sync = sync();
        let mut layer = RecordingLayer::default();
        let now = Instant::now();

        let first = sync.reconcile(&snapshot.entities, None, now, &mut layer);
        assert_eq!(first.created, 2);
        let second = sync.reconcile(&snapshot.entities, None, now, &mut layer);
        assert_eq!(second, SyncReport { created: 0, updated: 0, unchanged: 2, removed: 0 });
        assert_eq!(layer.places, 2);
    }

    #[test]
    fn moved_entities_update_and_vanished_ones_are_removed() {
        let mut sync = sync();
        let mut layer = RecordingLayer::default();
        let now = Instant::now();
        sync.reconcile(&two_drones().snapshot().entities, None, now, &mut layer);

        let moved = store_with(json!([
            {"id": "a", "position": {"lat": 1.5, "lng": 1.0, "altitude": 10.4}, "registration": "B1", "status": "Flying", "name": "Alpha"},
        ]));
        let report = sync.reconcile(&moved.snapshot().entities, None, now, &mut layer);
        assert_eq!(report, SyncReport { created: 0, updated: 1, unchanged: 0, removed: 1 });
        assert_eq!(layer.markers.len(), 1);
        assert_eq!(layer.markers["a"].lat, 1.5);
        assert_eq!(sync.marker_count(), 1);
    }

    #[test]
    fn visual_encoding_follows_category_status_and_selection() {
        let store = two_drones();
        let mut sync = sync();
        let mut layer = RecordingLayer::default();
        sync.reconcile(&store.snapshot().entities, Some("b"), Instant::now(), &mut layer);

        let a = &layer.markers["a"];
        assert_eq!(a.style_color, "#22c55e");
        assert!(a.pulsing);
        assert!(!a.emphasized);

        let b = &layer.markers["b"];
        assert_eq!(b.style_color, "#ef4444");
        assert!(!b.pulsing);
        assert!(b.emphasized);
    }

    #[test]
    fn only_one_popup_is_ever_open() {
        let store = two_drones();
        let entities = store.snapshot().entities;
        let mut sync = sync();
        let mut layer = RecordingLayer::default();
        let now = Instant::now();

        sync.reconcile(&entities, Some("a"), now, &mut layer);
        assert_eq!(layer.open_popups, HashSet::from(["a".to_string()]));

        sync.reconcile(&entities, Some("b"), now, &mut layer);
        assert_eq!(layer.open_popups, HashSet::from(["b".to_string()]));
        let popup = sync.popup().unwrap();
        assert_eq!(popup.name, "Bravo");
        assert_eq!(popup.altitude, 21);

        sync.reconcile(&entities, None, now, &mut layer);
        assert!(layer.open_popups.is_empty());
        assert!(sync.popup().is_none());
    }

    #[test]
    fn popup_closes_when_selected_entity_vanishes() {
        let mut sync = sync();
        let mut layer = RecordingLayer::default();
        let now = Instant::now();
        sync.reconcile(&two_drones().snapshot().entities, Some("b"), now, &mut layer);

        let only_a = store_with(json!([{"id": "a", "position": {"lat": 1.0, "lng": 1.0}}]));
        sync.reconcile(&only_a.snapshot().entities, Some("b"), now, &mut layer);
        assert!(layer.open_popups.is_empty());
        assert!(!layer.markers.contains_key("b"));
    }

    #[test]
    fn selection_recenters_and_rapid_reselection_overrides() {
        let store = two_drones();
        let entities = store.snapshot().entities;
        let mut sync = sync();
        let mut layer = RecordingLayer::default();
        let start = Instant::now();

        sync.reconcile(&entities, Some("a"), start, &mut layer);
        assert!(sync.is_animating());
        assert_eq!(sync.viewport().target(), LatLng::new(1.0, 1.0));

        let soon = start + Duration::from_millis(100);
        sync.animate(soon, &mut layer);
        sync.reconcile(&entities, Some("b"), soon, &mut layer);
        assert_eq!(sync.viewport().target(), LatLng::new(2.0, 2.0));

        let done = soon + Duration::from_millis(TrackerRules::default().recenter_ms);
        assert!(!sync.animate(done, &mut layer));
        assert_eq!(layer.views.last(), Some(&LatLng::new(2.0, 2.0)));
    }

    #[test]
    fn selecting_absent_entity_does_not_recenter() {
        let store = two_drones();
        let mut sync = sync();
        let mut layer = RecordingLayer::default();
        sync.reconcile(&store.snapshot().entities, Some("ghost"), Instant::now(), &mut layer);
        assert!(!sync.is_animating());
        assert!(layer.open_popups.is_empty());
    }
}
