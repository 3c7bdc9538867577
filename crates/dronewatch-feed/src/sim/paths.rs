//! Trajectories followed by simulated drones.

use std::f64::consts::PI;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// A closed-form flight trajectory.
pub trait Trajectory: Send + Sync {
    /// (lat, lon, altitude_m) at `t` seconds from start.
    fn position(&self, t: f64) -> (f64, f64, f64);

    /// Approximate heading at time t (degrees, 0 = North).
    fn heading(&self, t: f64) -> f64 {
        let dt = 0.1;
        let (lat1, lon1, _) = self.position(t);
        let (lat2, lon2, _) = self.position(t + dt);

        let dlat = lat2 - lat1;
        let dlon = lon2 - lon1;
        if dlat.abs() < 1e-10 && dlon.abs() < 1e-10 {
            return 0.0;
        }

        normalize_heading(dlon.atan2(dlat).to_degrees())
    }

    fn speed_mps(&self) -> f64;
}

/// Circular orbit around a center point.
pub struct Orbit {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    pub altitude_m: f64,
    pub speed_mps: f64,
    pub start_angle: f64,
    pub clockwise: bool,
    period: f64,
}

impl Orbit {
    pub fn new(
        center_lat: f64,
        center_lon: f64,
        radius_m: f64,
        altitude_m: f64,
        speed_mps: f64,
        start_angle: f64,
        clockwise: bool,
    ) -> Self {
        let circumference = 2.0 * PI * radius_m.max(1.0);
        let period = circumference / speed_mps.max(0.1);

        Self {
            center_lat,
            center_lon,
            radius_m,
            altitude_m,
            speed_mps,
            start_angle,
            clockwise,
            period,
        }
    }

    pub fn period(&self) -> f64 {
        self.period
    }
}

impl Trajectory for Orbit {
    fn position(&self, t: f64) -> (f64, f64, f64) {
        let mut angle_rad = self.start_angle + (2.0 * PI * t / self.period);
        if self.clockwise {
            angle_rad = -angle_rad;
        }

        let lat_offset = (self.radius_m / METERS_PER_DEG_LAT) * angle_rad.cos();
        let lon_offset = (self.radius_m
            / (METERS_PER_DEG_LAT * self.center_lat.to_radians().cos().abs().max(0.01)))
            * angle_rad.sin();

        (
            self.center_lat + lat_offset,
            self.center_lon + lon_offset,
            self.altitude_m,
        )
    }

    fn speed_mps(&self) -> f64 {
        self.speed_mps
    }
}

/// Straight leg flown back and forth between two points.
pub struct Shuttle {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub altitude_m: f64,
    pub speed_mps: f64,
    leg_duration: f64,
}

impl Shuttle {
    pub fn new(
        start_lat: f64,
        start_lon: f64,
        end_lat: f64,
        end_lon: f64,
        altitude_m: f64,
        speed_mps: f64,
    ) -> Self {
        let distance_m = haversine_distance(start_lat, start_lon, end_lat, end_lon);
        let leg_duration = if speed_mps > 0.0 {
            distance_m / speed_mps
        } else {
            0.0
        };

        Self {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            altitude_m,
            speed_mps,
            leg_duration,
        }
    }

    pub fn leg_duration(&self) -> f64 {
        self.leg_duration
    }

    /// Progress along the leg in [0, 1], reversing at each end.
    fn progress(&self, t: f64) -> f64 {
        if self.leg_duration <= 0.0 {
            return 0.0;
        }
        let cycle = (t / self.leg_duration).rem_euclid(2.0);
        if cycle <= 1.0 {
            cycle
        } else {
            2.0 - cycle
        }
    }
}

impl Trajectory for Shuttle {
    fn position(&self, t: f64) -> (f64, f64, f64) {
        let progress = self.progress(t);
        let lat = self.start_lat + progress * (self.end_lat - self.start_lat);
        let lon = self.start_lon + progress * (self.end_lon - self.start_lon);
        (lat, lon, self.altitude_m)
    }

    fn speed_mps(&self) -> f64 {
        self.speed_mps
    }
}

fn normalize_heading(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Great-circle distance in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Offset a position by distance and bearing (radians, 0 = north, π/2 = east).
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat2 =
        lat1.sin() * angular_distance.cos() + lat1.cos() * angular_distance.sin() * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * angular_distance.sin() * lat1.cos();
    let x = angular_distance.cos() - lat1.sin() * sin_lat2;
    let lon2 = (lon1 + y.atan2(x) + PI).rem_euclid(2.0 * PI) - PI;

    (lat2.to_degrees(), lon2.to_degrees())
}
