//! Headless marker layer that reports directives through tracing.

use std::collections::HashSet;

use dronewatch_core::{LatLng, MarkerLayer, Placement, Popup};

/// Stand-in for a map widget when running without a UI.
#[derive(Debug, Default)]
pub struct TracingLayer {
    markers: HashSet<String>,
}

impl MarkerLayer for TracingLayer {
    fn place(&mut self, placement: &Placement) {
        tracing::trace!(
            "place {} at ({:.5}, {:.5}) color={} emphasized={} pulsing={}",
            placement.id,
            placement.lat,
            placement.lng,
            placement.style_color,
            placement.emphasized,
            placement.pulsing
        );
        if self.markers.insert(placement.id.clone()) {
            tracing::debug!("marker {} added ({} on map)", placement.id, self.markers.len());
        }
    }

    fn remove(&mut self, id: &str) {
        self.markers.remove(id);
        tracing::debug!("marker {} removed ({} on map)", id, self.markers.len());
    }

    fn open_popup(&mut self, popup: &Popup) {
        tracing::info!(
            "popup {}: {} [{}] battery {:.0}% altitude {}m",
            popup.id,
            popup.name,
            popup.status_label,
            popup.battery_pct,
            popup.altitude
        );
    }

    fn close_popup(&mut self, id: &str) {
        tracing::debug!("close popup {}", id);
    }

    fn set_view(&mut self, center: LatLng) {
        tracing::trace!("view center ({:.5}, {:.5})", center.lat, center.lng);
    }
}
