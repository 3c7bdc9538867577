//! DroneWatch feed - runs the simulator against a headless map layer.

use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dronewatch_feed::{Config, TracingLayer, Tracker};

const STATS_INTERVAL_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("dronewatch_feed=debug".parse()?))
        .init();

    tracing::info!("Starting DroneWatch feed...");

    let config = Config::from_env();
    tracing::debug!("{:?}", config);

    let mut tracker = Tracker::new(config);
    tracker.init(Box::new(TracingLayer::default()))?;

    let mut ticker = interval(Duration::from_secs(STATS_INTERVAL_SECS));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                let stats = tracker.store().statistics();
                let connectivity = tracker.store().read(|s| s.connectivity());
                tracing::info!(
                    "{} {} | {} drones ({} unsafe, {} flying) | alt avg {:.1}m min {:.1}m max {:.1}m",
                    connectivity.icon(),
                    connectivity.label(),
                    stats.total_drones,
                    stats.unsafe_count,
                    stats.flying_count,
                    stats.average_altitude,
                    stats.min_altitude,
                    stats.max_altitude
                );
            }
        }
    }

    tracker.dispose().await;
    Ok(())
}
