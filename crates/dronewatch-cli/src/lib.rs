//! DroneWatch CLI - command line tools for the tracker.
//!
//! This crate provides the binaries:
//! - replay: apply recorded batches and print the resulting model
//! - classify: classify registration codes
//! - simulate: run the simulator headless and report statistics

pub mod recording;

pub use recording::load_batches;
