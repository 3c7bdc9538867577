//! Runtime for the DroneWatch tracker: update source adapter, simulator,
//! render and eviction loops, and the lifecycle tying them together.

pub mod clock;
pub mod config;
pub mod layer;
pub mod loops;
pub mod sim;
pub mod source;
pub mod state;
pub mod tracker;

pub use config::Config;
pub use layer::TracingLayer;
pub use loops::render_loop::BoxedLayer;
pub use source::{Subscription, UpdateHub, UpdateObserver};
pub use state::SharedStore;
pub use tracker::{Tracker, TrackerError};
