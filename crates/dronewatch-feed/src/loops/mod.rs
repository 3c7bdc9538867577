//! Background loops driving the tracker.

pub mod prune_loop;
pub mod render_loop;
