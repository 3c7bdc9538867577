//! Frame loop keeping the marker layer in sync with the store.
//!
//! Reconciles only when the store revision moved, and steps the viewport
//! transition every frame while one is running.

use std::time::Duration;

use dronewatch_core::{MarkerLayer, VisualizationSync};
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::state::SharedStore;

/// Layer handed to the render loop and returned when it stops.
pub type BoxedLayer = Box<dyn MarkerLayer + Send>;

/// Start the render loop. Returns the layer on shutdown.
pub async fn run_render_loop(
    store: SharedStore,
    mut sync: VisualizationSync,
    mut layer: BoxedLayer,
    frame_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> BoxedLayer {
    let mut ticker = interval(frame_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut rendered_revision = None;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!("Render loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let now = Instant::now().into_std();

                if rendered_revision != Some(store.revision()) {
                    // Copy out so the store lock is not held while drawing
                    let snapshot = store.snapshot();
                    let report = sync.reconcile(
                        &snapshot.entities,
                        snapshot.selected.as_deref(),
                        now,
                        layer.as_mut(),
                    );
                    rendered_revision = Some(snapshot.revision);

                    if report.created + report.updated + report.removed > 0 {
                        tracing::debug!(
                            "Rendered revision {}: {} created, {} updated, {} removed",
                            snapshot.revision,
                            report.created,
                            report.updated,
                            report.removed
                        );
                    }
                }

                if sync.is_animating() {
                    sync.animate(now, layer.as_mut());
                }
            }
        }
    }

    layer
}
