//! Local telemetry simulator.
//!
//! Generates a fleet of drones flying orbits and shuttle legs inside a
//! geographic envelope and publishes one batch per interval to an
//! [`UpdateHub`], in either report shape the normalizer understands.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dronewatch_core::ConnectivityState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::paths::{offset_by_bearing, Orbit, Shuttle, Trajectory};
use crate::source::UpdateHub;

/// Shape of the batches the simulator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    /// Array of flat report objects
    Array,
    /// GeoJSON feature collection
    Features,
}

impl FeedShape {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "array" | "objects" => Some(FeedShape::Array),
            "features" | "geojson" => Some(FeedShape::Features),
            _ => None,
        }
    }
}

/// Generation bounds for the simulated fleet.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub drone_count: usize,
    pub interval: Duration,
    pub shape: FeedShape,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    pub min_speed_mps: f64,
    pub max_speed_mps: f64,
    /// Share of drones given an authorized registration
    pub authorized_ratio: f64,
    pub authorized_prefix: String,
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            drone_count: 50,
            interval: Duration::from_millis(1500),
            shape: FeedShape::Array,
            center_lat: 33.6846,
            center_lon: -117.8265,
            radius_m: 3000.0,
            min_altitude_m: 20.0,
            max_altitude_m: 120.0,
            min_speed_mps: 4.0,
            max_speed_mps: 18.0,
            authorized_ratio: 0.7,
            authorized_prefix: "B".to_string(),
            seed: None,
        }
    }
}

struct SimDrone {
    serial: String,
    name: String,
    registration: Option<String>,
    trajectory: Box<dyn Trajectory>,
    initial_battery_pct: f64,
    drain_pct_per_s: f64,
}

pub struct Simulator {
    config: SimulatorConfig,
    drones: Vec<SimDrone>,
    rng: StdRng,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));
        let drones = (0..config.drone_count)
            .map(|i| spawn_drone(i, &config, &mut rng))
            .collect();

        Self { config, drones, rng }
    }

    /// Build the batch describing the fleet `elapsed_s` seconds into the run.
    pub fn batch_at(&mut self, elapsed_s: f64, now: DateTime<Utc>) -> Value {
        let shape = self.config.shape;
        let mut reports = Vec::with_capacity(self.drones.len());

        for drone in &self.drones {
            let (lat, lon, altitude_m) = drone.trajectory.position(elapsed_s);
            let heading = drone.trajectory.heading(elapsed_s);
            let speed = drone.trajectory.speed_mps();
            let battery =
                (drone.initial_battery_pct - drone.drain_pct_per_s * elapsed_s).max(0.0);
            let status = if battery < 15.0 { "Returning" } else { "Flying" };
            let signal: f64 = self.rng.random_range(55.0..100.0);

            let report = match shape {
                FeedShape::Array => json!({
                    "id": drone.serial,
                    "name": drone.name,
                    "status": status,
                    "registration": drone.registration,
                    "position": {"lat": lat, "lng": lon, "altitude": altitude_m},
                    "heading": heading,
                    "speed": speed,
                    "battery": battery.round(),
                    "signal": signal.round(),
                    "lastUpdate": now.to_rfc3339(),
                }),
                FeedShape::Features => json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [lon, lat, altitude_m]},
                    "properties": {
                        "serial": drone.serial,
                        "name": drone.name,
                        "status": status,
                        "registration": drone.registration,
                        "altitude": altitude_m,
                        "speed": speed,
                        "yaw": heading,
                        "battery": battery.round(),
                        "signal": signal.round(),
                        "timestamp": now.timestamp_millis(),
                    }
                }),
            };
            reports.push(report);
        }

        match shape {
            FeedShape::Array => Value::Array(reports),
            FeedShape::Features => json!({"type": "FeatureCollection", "features": reports}),
        }
    }

    /// Publish batches until shutdown.
    ///
    /// The first batch goes out as soon as the feed is connected; later ones
    /// follow at the configured interval. Each batch is fully delivered
    /// before the next tick is awaited.
    pub async fn run(mut self, hub: Arc<UpdateHub>, mut shutdown: broadcast::Receiver<()>) {
        hub.set_connectivity(ConnectivityState::Connecting);

        let started = Instant::now();
        let mut ticker = interval(self.config.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        hub.set_connectivity(ConnectivityState::Connected);
        tracing::info!(
            "Simulator streaming {} drones every {:?}",
            self.drones.len(),
            self.config.interval
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Simulator shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let elapsed = started.elapsed().as_secs_f64();
                    let batch = self.batch_at(elapsed, crate::clock::now());
                    hub.publish_batch(&batch);
                }
            }
        }

        hub.set_connectivity(ConnectivityState::Disconnected);
    }
}

fn spawn_drone(index: usize, config: &SimulatorConfig, rng: &mut StdRng) -> SimDrone {
    let serial = format!("DW-{:04}", index + 1);
    let altitude_m = random_between(rng, config.min_altitude_m, config.max_altitude_m);
    let speed_mps = random_between(rng, config.min_speed_mps, config.max_speed_mps);

    let (anchor_lat, anchor_lon) = offset_by_bearing(
        config.center_lat,
        config.center_lon,
        random_between(rng, 0.0, config.radius_m * 0.8),
        random_between(rng, 0.0, std::f64::consts::TAU),
    );

    let trajectory: Box<dyn Trajectory> = if rng.random_bool(0.5) {
        Box::new(Orbit::new(
            anchor_lat,
            anchor_lon,
            random_between(rng, 50.0, config.radius_m * 0.2),
            altitude_m,
            speed_mps,
            random_between(rng, 0.0, std::f64::consts::TAU),
            rng.random_bool(0.5),
        ))
    } else {
        let (end_lat, end_lon) = offset_by_bearing(
            anchor_lat,
            anchor_lon,
            random_between(rng, 200.0, config.radius_m * 0.5),
            random_between(rng, 0.0, std::f64::consts::TAU),
        );
        Box::new(Shuttle::new(
            anchor_lat, anchor_lon, end_lat, end_lon, altitude_m, speed_mps,
        ))
    };

    let registration = if rng.random_bool(0.05) {
        None
    } else if rng.random_bool(config.authorized_ratio.clamp(0.0, 1.0)) {
        Some(format!("{}{:04}", config.authorized_prefix, rng.random_range(0..10_000)))
    } else {
        let letter = ['G', 'K', 'R', 'X', 'Z'][rng.random_range(0..5)];
        Some(format!("{}{:04}", letter, rng.random_range(0..10_000)))
    };

    SimDrone {
        name: format!("Drone {}", index + 1),
        serial,
        registration,
        trajectory,
        initial_battery_pct: random_between(rng, 60.0, 100.0),
        drain_pct_per_s: random_between(rng, 0.01, 0.05),
    }
}

/// Uniform sample that tolerates an empty or inverted range.
fn random_between(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dronewatch_core::{normalize, reports_in, EntityStore};

    fn config(shape: FeedShape) -> SimulatorConfig {
        SimulatorConfig {
            drone_count: 12,
            shape,
            seed: Some(7),
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn array_batches_normalize_cleanly() {
        let mut sim = Simulator::new(config(FeedShape::Array));
        let batch = sim.batch_at(10.0, Utc::now());
        let reports = reports_in(&batch);
        assert_eq!(reports.len(), 12);
        assert!(reports.iter().all(|r| normalize(r, Utc::now()).is_ok()));
    }

    #[test]
    fn feature_batches_feed_the_store() {
        let mut sim = Simulator::new(config(FeedShape::Features));
        let mut store = EntityStore::default();
        let outcome = store.apply_batch(&sim.batch_at(0.0, Utc::now()));
        assert_eq!(outcome.accepted, 12);
        assert_eq!(outcome.dropped, 0);

        let stats = store.statistics();
        assert!(stats.min_altitude >= 20.0);
        assert!(stats.max_altitude <= 120.0);
    }

    #[test]
    fn positions_stay_near_the_envelope() {
        let mut sim = Simulator::new(config(FeedShape::Array));
        let batch = sim.batch_at(300.0, Utc::now());
        for report in reports_in(&batch) {
            let update = normalize(report, Utc::now()).unwrap();
            let distance = crate::sim::haversine_distance(
                33.6846,
                -117.8265,
                update.position.latitude,
                update.position.longitude,
            );
            // anchor (0.8r) plus leg (0.5r) is the furthest a drone can get
            assert!(distance < 3000.0 * 1.4, "drone {} strayed {}m", update.id, distance);
        }
    }

    #[test]
    fn same_seed_same_fleet() {
        let now = Utc::now();
        let a = Simulator::new(config(FeedShape::Array)).batch_at(5.0, now);
        let b = Simulator::new(config(FeedShape::Array)).batch_at(5.0, now);
        let ids = |v: &Value| -> Vec<String> {
            reports_in(v)
                .iter()
                .map(|r| r["registration"].to_string())
                .collect()
        };
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn feed_shape_parsing() {
        assert_eq!(FeedShape::parse("GeoJSON"), Some(FeedShape::Features));
        assert_eq!(FeedShape::parse("array"), Some(FeedShape::Array));
        assert_eq!(FeedShape::parse("csv"), None);
    }
}
