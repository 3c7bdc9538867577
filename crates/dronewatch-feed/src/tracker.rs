//! Application wiring with an explicit lifecycle.
//!
//! A [`Tracker`] owns the shared store and the update hub. [`Tracker::init`]
//! subscribes the store to the hub and spawns the simulator, render and prune
//! loops; [`Tracker::dispose`] stops them all and waits until they are gone,
//! so nothing keeps mutating the store afterwards.

use std::sync::Arc;

use dronewatch_core::{LatLng, VisualizationSync};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::loops::prune_loop::run_prune_loop;
use crate::loops::render_loop::{run_render_loop, BoxedLayer};
use crate::sim::Simulator;
use crate::source::{Subscription, UpdateHub};
use crate::state::SharedStore;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker is already running")]
    AlreadyRunning,
}

struct Running {
    shutdown: broadcast::Sender<()>,
    subscription: Subscription,
    feed: JoinHandle<()>,
    render: JoinHandle<BoxedLayer>,
    prune: Option<JoinHandle<()>>,
}

pub struct Tracker {
    config: Config,
    store: SharedStore,
    hub: Arc<UpdateHub>,
    running: Option<Running>,
}

impl Tracker {
    pub fn new(config: Config) -> Self {
        let store = SharedStore::with_rules(config.rules());
        Self::with_parts(config, store, UpdateHub::new())
    }

    /// Build around an existing store and hub.
    pub fn with_parts(config: Config, store: SharedStore, hub: Arc<UpdateHub>) -> Self {
        Self {
            config,
            store,
            hub,
            running: None,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn hub(&self) -> &Arc<UpdateHub> {
        &self.hub
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Marker click: toggles the selection.
    pub fn click(&self, id: &str) {
        self.store.toggle_selection(id);
    }

    /// Start streaming into the store and rendering onto `layer`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(&mut self, layer: BoxedLayer) -> Result<(), TrackerError> {
        if self.running.is_some() {
            return Err(TrackerError::AlreadyRunning);
        }

        let (shutdown, _) = broadcast::channel(1);
        let subscription = self.hub.subscribe(Arc::new(self.store.clone()));

        let rules = self.config.rules();
        let sync = VisualizationSync::new(
            rules.clone(),
            LatLng::new(self.config.center_lat, self.config.center_lon),
        );

        let render = tokio::spawn(run_render_loop(
            self.store.clone(),
            sync,
            layer,
            self.config.frame_interval,
            shutdown.subscribe(),
        ));

        let prune = rules.stale_after().map(|max_age| {
            tokio::spawn(run_prune_loop(
                self.store.clone(),
                max_age,
                shutdown.subscribe(),
            ))
        });

        let simulator = Simulator::new(self.config.simulator());
        let feed = tokio::spawn(simulator.run(self.hub.clone(), shutdown.subscribe()));

        tracing::info!("Tracker started");
        self.running = Some(Running {
            shutdown,
            subscription,
            feed,
            render,
            prune,
        });
        Ok(())
    }

    /// Stop every loop and detach from the hub. Returns the marker layer.
    pub async fn dispose(&mut self) -> Option<BoxedLayer> {
        let running = self.running.take()?;
        let _ = running.shutdown.send(());

        // Feed first, so its final DISCONNECTED transition reaches the store
        if let Err(e) = running.feed.await {
            tracing::error!("Feed task failed: {}", e);
        }
        running.subscription.unsubscribe();

        if let Some(prune) = running.prune {
            if let Err(e) = prune.await {
                tracing::error!("Prune task failed: {}", e);
            }
        }

        let layer = match running.render.await {
            Ok(layer) => Some(layer),
            Err(e) => {
                tracing::error!("Render task failed: {}", e);
                None
            }
        };

        tracing::info!("Tracker stopped");
        layer
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            // Not disposed: stop the loops without waiting for them
            let _ = running.shutdown.send(());
            running.feed.abort();
            running.render.abort();
            if let Some(prune) = running.prune {
                prune.abort();
            }
        }
    }
}
