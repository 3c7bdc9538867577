//! Wall-clock timestamps driven by the tokio clock.
//!
//! The wall time is sampled once and advanced with [`tokio::time::Instant`],
//! so receipt stamps and stale sweeps move together, including under paused
//! time in tests.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

static ANCHOR: OnceLock<(DateTime<Utc>, Instant)> = OnceLock::new();

/// Current time for stamping and aging store entries.
pub fn now() -> DateTime<Utc> {
    let (wall, anchor) = *ANCHOR.get_or_init(|| (Utc::now(), Instant::now()));
    // Paused runtimes each keep their own clock, which may sit behind the anchor
    let current = Instant::now();
    let offset = if current >= anchor {
        chrono::Duration::from_std(current - anchor)
    } else {
        chrono::Duration::from_std(anchor - current).map(|d| -d)
    };
    offset
        .ok()
        .and_then(|d| wall.checked_add_signed(d))
        .unwrap_or(wall)
}
