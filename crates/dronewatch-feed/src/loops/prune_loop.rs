//! Eviction of drones that stopped reporting.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::clock;
use crate::state::SharedStore;

/// How often to sweep relative to the eviction age.
const SWEEPS_PER_TTL: u32 = 10;

/// Start the prune loop.
pub async fn run_prune_loop(
    store: SharedStore,
    max_age: chrono::Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let period = max_age
        .to_std()
        .map(|d| d / SWEEPS_PER_TTL)
        .unwrap_or(Duration::from_secs(1))
        .max(Duration::from_millis(100));
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!("Prune loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let evicted = store.prune_stale(clock::now(), max_age);
                if !evicted.is_empty() {
                    tracing::info!("Evicted {} stale drone(s): {:?}", evicted.len(), evicted);
                }
            }
        }
    }
}
