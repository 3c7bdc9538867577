//! Interruptible viewport recentering.
//!
//! A recenter is a bounded transition from the current center to a target.
//! Starting a new recenter while one is in flight replaces it, continuing
//! from wherever the viewport is at that instant. Transitions never queue.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn lerp(self, to: LatLng, t: f64) -> LatLng {
        LatLng {
            lat: self.lat + (to.lat - self.lat) * t,
            lng: self.lng + (to.lng - self.lng) * t,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: LatLng,
    to: LatLng,
    started_at: Instant,
    duration: Duration,
}

impl Transition {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn position(&self, now: Instant) -> LatLng {
        self.from.lerp(self.to, ease_in_out(self.progress(now)))
    }
}

/// Cubic ease-in-out on [0, 1].
fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    center: LatLng,
    transition: Option<Transition>,
}

impl Viewport {
    pub fn new(center: LatLng) -> Self {
        Self {
            center,
            transition: None,
        }
    }

    /// Center as of `now`, including any in-flight transition.
    pub fn center_at(&self, now: Instant) -> LatLng {
        match &self.transition {
            Some(t) => t.position(now),
            None => self.center,
        }
    }

    /// Final center once the current transition (if any) completes.
    pub fn target(&self) -> LatLng {
        self.transition.map(|t| t.to).unwrap_or(self.center)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Start moving toward `target`, replacing any transition in flight.
    pub fn recenter(&mut self, target: LatLng, now: Instant, duration: Duration) {
        let from = self.center_at(now);
        self.center = from;
        self.transition = Some(Transition {
            from,
            to: target,
            started_at: now,
            duration,
        });
    }

    /// Advance the transition. Returns the new center while animating.
    pub fn step(&mut self, now: Instant) -> Option<LatLng> {
        let transition = self.transition?;
        let position = transition.position(now);
        self.center = position;
        if transition.progress(now) >= 1.0 {
            self.center = transition.to;
            self.transition = None;
            return Some(transition.to);
        }
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_reaches_target_within_duration() {
        let start = Instant::now();
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0));
        viewport.recenter(LatLng::new(10.0, 20.0), start, Duration::from_millis(800));
        assert!(viewport.is_animating());

        let mid = viewport.step(start + Duration::from_millis(400)).unwrap();
        assert!(mid.lat > 0.0 && mid.lat < 10.0);

        let end = viewport.step(start + Duration::from_millis(800)).unwrap();
        assert_eq!(end, LatLng::new(10.0, 20.0));
        assert!(!viewport.is_animating());
        assert_eq!(viewport.step(start + Duration::from_secs(2)), None);
    }

    #[test]
    fn second_recenter_overrides_in_flight_transition() {
        let start = Instant::now();
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0));
        viewport.recenter(LatLng::new(10.0, 10.0), start, Duration::from_millis(800));

        let interrupted_at = start + Duration::from_millis(400);
        let where_we_were = viewport.center_at(interrupted_at);
        viewport.recenter(LatLng::new(-5.0, -5.0), interrupted_at, Duration::from_millis(800));

        // Continues from the interrupted position, heading to the new target only
        assert_eq!(viewport.center_at(interrupted_at), where_we_were);
        assert_eq!(viewport.target(), LatLng::new(-5.0, -5.0));
        let end = viewport.step(interrupted_at + Duration::from_millis(800)).unwrap();
        assert_eq!(end, LatLng::new(-5.0, -5.0));
        assert!(!viewport.is_animating());
    }

    #[test]
    fn zero_duration_jumps() {
        let now = Instant::now();
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0));
        viewport.recenter(LatLng::new(1.0, 1.0), now, Duration::ZERO);
        assert_eq!(viewport.step(now), Some(LatLng::new(1.0, 1.0)));
    }
}
