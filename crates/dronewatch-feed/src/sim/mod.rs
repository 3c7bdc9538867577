//! Local simulator standing in for a live transport.

mod paths;
mod simulator;

pub use paths::{haversine_distance, offset_by_bearing, Orbit, Shuttle, Trajectory};
pub use simulator::{FeedShape, Simulator, SimulatorConfig};
