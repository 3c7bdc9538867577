//! Core data models for the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic position of a drone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters (0 when the report omits it)
    pub altitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// Risk classification derived from a registration code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Registration carries the authorized prefix
    Safe,
    /// Anything else, including missing or malformed codes
    Unsafe,
}

impl Category {
    /// Marker color used by the map layer.
    pub fn color(self) -> &'static str {
        match self {
            Category::Safe => "#22c55e",
            Category::Unsafe => "#ef4444",
        }
    }
}

/// Canonical update produced by the normalizer for one raw report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub id: String,
    pub display_name: String,
    pub status_label: String,
    /// Raw registration field, classified by the store
    pub registration: Option<serde_json::Value>,
    pub position: Position,
    pub heading: f64,
    pub speed: f64,
    pub battery_pct: f64,
    pub signal_pct: f64,
    pub observed_at: DateTime<Utc>,
}

/// Current state of a tracked drone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub display_name: String,
    pub status_label: String,
    pub registration: Option<String>,
    pub category: Category,
    pub position: Position,
    pub heading: f64,
    pub speed: f64,
    pub battery_pct: f64,
    pub signal_pct: f64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Local time the latest report was applied; staleness is judged on this
    pub received_at: DateTime<Utc>,
    pub flight_duration_ms: i64,
}

impl Entity {
    /// Create a new entity from its first update, received at `received_at`.
    pub fn from_update(
        update: &EntityUpdate,
        category: Category,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: update.id.clone(),
            display_name: update.display_name.clone(),
            status_label: update.status_label.clone(),
            registration: registration_text(update.registration.as_ref()),
            category,
            position: update.position,
            heading: update.heading,
            speed: update.speed,
            battery_pct: update.battery_pct,
            signal_pct: update.signal_pct,
            first_seen_at: update.observed_at,
            last_seen_at: update.observed_at,
            received_at,
            flight_duration_ms: 0,
        }
    }

    /// Replace every reported field with the new update.
    ///
    /// `first_seen_at` is immutable and `last_seen_at` never moves backwards,
    /// so the flight duration is non-decreasing.
    pub fn update(
        &mut self,
        update: &EntityUpdate,
        category: Category,
        received_at: DateTime<Utc>,
    ) {
        self.display_name = update.display_name.clone();
        self.status_label = update.status_label.clone();
        self.registration = registration_text(update.registration.as_ref());
        self.category = category;
        self.position = update.position;
        self.heading = update.heading;
        self.speed = update.speed;
        self.battery_pct = update.battery_pct;
        self.signal_pct = update.signal_pct;
        if update.observed_at > self.last_seen_at {
            self.last_seen_at = update.observed_at;
        }
        self.received_at = received_at;
        self.flight_duration_ms = (self.last_seen_at - self.first_seen_at)
            .num_milliseconds()
            .max(0);
    }
}

fn registration_text(raw: Option<&serde_json::Value>) -> Option<String> {
    match raw? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// One recorded point of a flight path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    pub position: Position,
    pub timestamp: DateTime<Utc>,
}

/// Connection state of the update source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityState {
    Connected,
    Connecting,
    #[default]
    Disconnected,
    Error,
    /// Fallback for unrecognized raw states
    Unknown,
}

impl ConnectivityState {
    /// Map a raw state name onto a known state, never failing.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "connected" | "open" => ConnectivityState::Connected,
            "connecting" | "reconnecting" => ConnectivityState::Connecting,
            "disconnected" | "closed" => ConnectivityState::Disconnected,
            "error" => ConnectivityState::Error,
            _ => ConnectivityState::Unknown,
        }
    }

    /// Human readable indicator label.
    pub fn label(self) -> &'static str {
        match self {
            ConnectivityState::Connected => "Connected",
            ConnectivityState::Connecting => "Connecting…",
            ConnectivityState::Disconnected => "Disconnected",
            ConnectivityState::Error => "Connection error",
            ConnectivityState::Unknown => "Unknown",
        }
    }

    /// Indicator glyph.
    pub fn icon(self) -> &'static str {
        match self {
            ConnectivityState::Connected => "●",
            ConnectivityState::Connecting => "◌",
            ConnectivityState::Disconnected => "○",
            ConnectivityState::Error => "✕",
            ConnectivityState::Unknown => "?",
        }
    }
}

/// Aggregate statistics over the current entity set.
///
/// Every field is zero when no drones are tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_drones: usize,
    pub safe_count: usize,
    pub unsafe_count: usize,
    pub flying_count: usize,
    pub average_altitude: f64,
    pub max_altitude: f64,
    pub min_altitude: f64,
    pub average_battery_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn update_at(secs: i64) -> EntityUpdate {
        EntityUpdate {
            id: "d1".into(),
            display_name: "Drone".into(),
            status_label: "Flying".into(),
            registration: Some(serde_json::json!("B01")),
            position: Position::new(1.0, 2.0, 10.0),
            heading: 0.0,
            speed: 0.0,
            battery_pct: 100.0,
            signal_pct: 100.0,
            observed_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn flight_duration_never_decreases() {
        let received = Utc.timestamp_opt(200, 0).unwrap();
        let mut entity = Entity::from_update(&update_at(100), Category::Safe, received);
        entity.update(&update_at(110), Category::Safe, received);
        assert_eq!(entity.flight_duration_ms, 10_000);

        // A late report must not rewind the clock
        entity.update(&update_at(105), Category::Safe, received);
        assert_eq!(entity.flight_duration_ms, 10_000);
        assert_eq!(entity.last_seen_at, Utc.timestamp_opt(110, 0).unwrap());
    }

    #[test]
    fn receipt_time_tracks_the_latest_report() {
        let mut entity =
            Entity::from_update(&update_at(100), Category::Safe, Utc.timestamp_opt(500, 0).unwrap());
        entity.update(&update_at(90), Category::Safe, Utc.timestamp_opt(510, 0).unwrap());
        assert_eq!(entity.received_at, Utc.timestamp_opt(510, 0).unwrap());
        assert_eq!(entity.last_seen_at, Utc.timestamp_opt(100, 0).unwrap());
    }

    #[test]
    fn unrecognized_connectivity_maps_to_unknown() {
        assert_eq!(ConnectivityState::parse("CONNECTED"), ConnectivityState::Connected);
        assert_eq!(ConnectivityState::parse("bogus"), ConnectivityState::Unknown);
        assert_eq!(ConnectivityState::parse(""), ConnectivityState::Unknown);
        assert_eq!(ConnectivityState::Unknown.label(), "Unknown");
    }

    #[test]
    fn non_string_registration_is_kept_as_text() {
        let mut update = update_at(0);
        update.registration = Some(serde_json::json!(42));
        let entity = Entity::from_update(&update, Category::Unsafe, Utc::now());
        assert_eq!(entity.registration.as_deref(), Some("42"));
    }
}
