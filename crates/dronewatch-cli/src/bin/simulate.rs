//! Run the simulator against a headless layer and report statistics.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dronewatch_core::ListProjection;
use dronewatch_feed::sim::FeedShape;
use dronewatch_feed::{Config, TracingLayer, Tracker};

#[derive(Debug, Clone, ValueEnum)]
enum Shape {
    /// Array of report objects
    Array,
    /// GeoJSON feature collection
    Features,
}

/// Headless drone feed simulation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of simulated drones
    #[arg(long, default_value_t = 50)]
    drones: usize,

    /// Batch interval in milliseconds
    #[arg(long, default_value_t = 1500)]
    interval_ms: u64,

    /// Duration in seconds
    #[arg(long, default_value_t = 10)]
    duration: u64,

    /// Report shape emitted by the simulator
    #[arg(long, value_enum, default_value = "array")]
    shape: Shape,

    /// Center latitude (default: Irvine, CA)
    #[arg(long, default_value_t = 33.6846)]
    lat: f64,

    /// Center longitude (default: Irvine, CA)
    #[arg(long, default_value_t = -117.8265)]
    lon: f64,

    /// Select this drone once the feed is up
    #[arg(long)]
    select: Option<String>,

    /// RNG seed for a reproducible fleet
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("dronewatch_feed=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config {
        drone_count: args.drones,
        batch_interval: Duration::from_millis(args.interval_ms),
        feed_shape: match args.shape {
            Shape::Array => FeedShape::Array,
            Shape::Features => FeedShape::Features,
        },
        center_lat: args.lat,
        center_lon: args.lon,
        seed: args.seed,
        ..Config::from_env()
    };

    let mut tracker = Tracker::new(config);
    tracker.init(Box::new(TracingLayer::default()))?;

    if let Some(id) = &args.select {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tracker.store().select(id);
    }

    tokio::time::sleep(Duration::from_secs(args.duration)).await;
    tracker
        .dispose()
        .await
        .ok_or_else(|| anyhow!("render loop did not shut down cleanly"))?;

    let snapshot = tracker.store().snapshot();
    let stats = tracker.store().statistics();
    let top = ListProjection::window(0, 10).project(&snapshot.entities, snapshot.selected.as_deref());

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "connectivity": snapshot.connectivity,
            "batches": tracker.hub().batches_published(),
            "statistics": stats,
            "list": top,
        }))?
    );

    Ok(())
}
