//! Tunable rules and defaults for the tracker.

use serde::{Deserialize, Serialize};

/// Registration prefix that marks an authorized drone.
pub const DEFAULT_AUTHORIZED_PREFIX: &str = "B";
/// Number of path samples retained per drone.
pub const DEFAULT_PATH_CAPACITY: usize = 100;

/// Fallbacks applied by the normalizer when a report omits a field.
pub const DEFAULT_DISPLAY_NAME: &str = "Unknown";
pub const DEFAULT_STATUS_LABEL: &str = "Unknown";
pub const DEFAULT_HEADING_DEG: f64 = 0.0;
pub const DEFAULT_SPEED_MPS: f64 = 0.0;
pub const DEFAULT_BATTERY_PCT: f64 = 100.0;
pub const DEFAULT_SIGNAL_PCT: f64 = 100.0;

/// Configuration for classification, history and staleness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerRules {
    /// Registration codes starting with this prefix are classified safe
    pub authorized_prefix: String,
    /// Maximum path samples kept per drone (oldest evicted first)
    pub path_capacity: usize,
    /// Drones silent for longer than this are evicted (0 disables eviction)
    pub stale_after_secs: u64,
    /// Status labels that get the pulsing marker affordance (case-insensitive)
    pub flying_statuses: Vec<String>,
    /// Duration of the viewport recenter transition in milliseconds
    pub recenter_ms: u64,
}

impl Default for TrackerRules {
    fn default() -> Self {
        Self {
            authorized_prefix: DEFAULT_AUTHORIZED_PREFIX.to_string(),
            path_capacity: DEFAULT_PATH_CAPACITY,
            stale_after_secs: 300,
            flying_statuses: vec!["flying".into(), "active".into()],
            recenter_ms: 800,
        }
    }
}

impl TrackerRules {
    /// Whether a status label denotes a drone in the air.
    pub fn is_flying(&self, status_label: &str) -> bool {
        let status = status_label.trim();
        self.flying_statuses
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status))
    }

    /// Eviction age, or `None` when eviction is disabled.
    ///
    /// Ages too large to represent never evict.
    pub fn stale_after(&self) -> Option<chrono::Duration> {
        if self.stale_after_secs == 0 {
            return None;
        }
        i64::try_from(self.stale_after_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }
}
