//! Bounded flight path history.

use std::collections::VecDeque;

use crate::models::PathSample;

/// Ring of the most recent path samples for one drone.
#[derive(Debug, Clone)]
pub struct FlightPath {
    samples: VecDeque<PathSample>,
    capacity: usize,
}

impl FlightPath {
    /// Create an empty path holding at most `capacity` samples (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, sample: PathSample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&PathSample> {
        self.samples.back()
    }

    /// Samples ordered oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PathSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<PathSample> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use chrono::{TimeZone, Utc};

    fn sample(i: i64) -> PathSample {
        PathSample {
            position: Position::new(i as f64, 0.0, 0.0),
            timestamp: Utc.timestamp_opt(i, 0).unwrap(),
        }
    }

    #[test]
    fn oldest_samples_are_evicted_first() {
        let mut path = FlightPath::with_capacity(3);
        for i in 0..5 {
            path.push(sample(i));
        }
        assert_eq!(path.len(), 3);
        let lats: Vec<f64> = path.iter().map(|s| s.position.latitude).collect();
        assert_eq!(lats, vec![2.0, 3.0, 4.0]);
        assert_eq!(path.latest().map(|s| s.position.latitude), Some(4.0));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut path = FlightPath::with_capacity(0);
        path.push(sample(1));
        path.push(sample(2));
        assert_eq!(path.capacity(), 1);
        assert_eq!(path.len(), 1);
    }
}
