//! Runtime configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dronewatch_core::TrackerRules;

use crate::sim::{FeedShape, SimulatorConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub drone_count: usize,
    pub batch_interval: Duration,
    pub feed_shape: FeedShape,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    pub stale_after_secs: u64,
    pub authorized_prefix: String,
    pub path_capacity: usize,
    pub frame_interval: Duration,
    pub recenter_ms: u64,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let rules = TrackerRules::default();
        Self {
            drone_count: 50,
            batch_interval: Duration::from_millis(1500),
            feed_shape: FeedShape::Array,
            // Irvine, CA
            center_lat: 33.6846,
            center_lon: -117.8265,
            radius_m: 3000.0,
            stale_after_secs: rules.stale_after_secs,
            authorized_prefix: rules.authorized_prefix,
            path_capacity: rules.path_capacity,
            frame_interval: Duration::from_millis(50),
            recenter_ms: rules.recenter_ms,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            drone_count: parse_var("DRONEWATCH_DRONES").unwrap_or(defaults.drone_count),
            batch_interval: parse_var("DRONEWATCH_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.batch_interval),
            feed_shape: env::var("DRONEWATCH_FEED_SHAPE")
                .ok()
                .and_then(|s| FeedShape::parse(&s))
                .unwrap_or(defaults.feed_shape),
            center_lat: parse_var("DRONEWATCH_CENTER_LAT").unwrap_or(defaults.center_lat),
            center_lon: parse_var("DRONEWATCH_CENTER_LON").unwrap_or(defaults.center_lon),
            radius_m: parse_var("DRONEWATCH_RADIUS_M").unwrap_or(defaults.radius_m),
            stale_after_secs: parse_var("DRONEWATCH_STALE_SECS")
                .unwrap_or(defaults.stale_after_secs),
            authorized_prefix: env::var("DRONEWATCH_AUTH_PREFIX")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.authorized_prefix),
            path_capacity: parse_var("DRONEWATCH_PATH_CAPACITY")
                .unwrap_or(defaults.path_capacity),
            frame_interval: parse_var("DRONEWATCH_FRAME_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_interval),
            recenter_ms: parse_var("DRONEWATCH_RECENTER_MS").unwrap_or(defaults.recenter_ms),
            seed: parse_var("DRONEWATCH_SEED"),
        }
    }

    /// Core rules derived from this configuration.
    pub fn rules(&self) -> TrackerRules {
        TrackerRules {
            authorized_prefix: self.authorized_prefix.clone(),
            path_capacity: self.path_capacity,
            stale_after_secs: self.stale_after_secs,
            recenter_ms: self.recenter_ms,
            ..TrackerRules::default()
        }
    }

    pub fn simulator(&self) -> SimulatorConfig {
        SimulatorConfig {
            drone_count: self.drone_count,
            interval: self.batch_interval,
            shape: self.feed_shape,
            center_lat: self.center_lat,
            center_lon: self.center_lon,
            radius_m: self.radius_m,
            authorized_prefix: self.authorized_prefix.clone(),
            seed: self.seed,
            ..SimulatorConfig::default()
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_carry_configured_values() {
        let config = Config {
            authorized_prefix: "FAA".into(),
            path_capacity: 10,
            stale_after_secs: 0,
            ..Config::default()
        };
        let rules = config.rules();
        assert_eq!(rules.authorized_prefix, "FAA");
        assert_eq!(rules.path_capacity, 10);
        assert!(rules.stale_after().is_none());
        assert!(rules.is_flying("flying"));
    }
}
