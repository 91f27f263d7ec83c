//! # Geographic Utilities
//!
//! Core geographic computation utilities for trail geometry.
//!
//! This module provides the fundamental geodesic operations used throughout
//! the trail-engine library. All functions are pure and stateless.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two coordinates |
//! | [`initial_bearing`] | Initial compass bearing from one coordinate to another |
//! | [`interpolate`] | Linear interpolation between two trail points |
//! | [`meters_to_degrees`] | Convert meters to approximate degrees at a latitude |
//!
//! ## Example
//!
//! ```rust
//! use trail_engine::{Coordinate, geo_utils};
//!
//! let chamonix = Coordinate::new(45.9237, 6.8694);
//! let zermatt = Coordinate::new(46.0207, 7.7491);
//!
//! let dist = geo_utils::haversine_distance(&chamonix, &zermatt);
//! println!("Chamonix to Zermatt: {:.0} km", dist / 1000.0);
//!
//! let bearing = geo_utils::initial_bearing(&chamonix, &zermatt);
//! assert!(bearing > 0.0 && bearing < 360.0);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! The haversine formula calculates great-circle distance between two points
//! on a sphere of radius 6,371 km. It is the standard method for GPS distance
//! calculation, accurate to within 0.3% for practical track data.
//!
//! ### Interpolation
//!
//! [`interpolate`] is a straight linear blend of latitude and longitude, not
//! a great-circle interpolation. Consecutive recorded samples are sub-kilometer
//! apart, where the difference is far below GPS noise.

use geo::{Distance, Haversine, Point};

use crate::{Coordinate, TrailPoint};

// =============================================================================
// Distance
// =============================================================================

/// Calculate the great-circle distance between two coordinates using the
/// Haversine formula.
///
/// Returns the distance in meters along the Earth's surface (spherical Earth,
/// radius 6,371 km). Symmetric in its arguments; returns 0 for equal points.
///
/// # Example
///
/// ```rust
/// use trail_engine::{Coordinate, geo_utils};
///
/// let london = Coordinate::new(51.5074, -0.1278);
/// let paris = Coordinate::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let p1 = Point::new(a.longitude, a.latitude);
    let p2 = Point::new(b.longitude, b.latitude);
    Haversine::distance(p1, p2)
}

// =============================================================================
// Bearing
// =============================================================================

/// Calculate the initial bearing in degrees from `a` toward `b`.
///
/// The bearing is a compass heading in `[0, 360)`: 0° is north, 90° east.
/// The direction is undefined between equal coordinates; this returns 0 for
/// that case rather than NaN.
///
/// # Example
///
/// ```rust
/// use trail_engine::{Coordinate, geo_utils};
///
/// let a = Coordinate::new(0.0, 0.0);
/// let due_north = Coordinate::new(1.0, 0.0);
/// let due_east = Coordinate::new(0.0, 1.0);
///
/// assert!((geo_utils::initial_bearing(&a, &due_north) - 0.0).abs() < 1e-9);
/// assert!((geo_utils::initial_bearing(&a, &due_east) - 90.0).abs() < 1e-9);
/// ```
pub fn initial_bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    if a.latitude == b.latitude && a.longitude == b.longitude {
        return 0.0;
    }

    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}

// =============================================================================
// Interpolation
// =============================================================================

/// Linearly interpolate between two trail points.
///
/// `t` is clamped to `[0, 1]`; `t = 0` yields `a`, `t = 1` yields `b`.
/// Latitude, longitude and cumulative distance are blended. Elevation is
/// blended when both points carry one; a single-sided elevation is carried
/// through unchanged so a gap in the source data doesn't zero the output.
///
/// # Example
///
/// ```rust
/// use trail_engine::{TrailPoint, geo_utils};
///
/// let a = TrailPoint::with_elevation(45.0, 6.0, 1000.0);
/// let b = TrailPoint::with_elevation(46.0, 7.0, 1200.0);
///
/// let mid = geo_utils::interpolate(&a, &b, 0.5);
/// assert_eq!(mid.latitude, 45.5);
/// assert_eq!(mid.longitude, 6.5);
/// assert_eq!(mid.elevation, Some(1100.0));
/// ```
pub fn interpolate(a: &TrailPoint, b: &TrailPoint, t: f64) -> TrailPoint {
    let t = t.clamp(0.0, 1.0);

    let elevation = match (a.elevation, b.elevation) {
        (Some(ea), Some(eb)) => Some(ea + (eb - ea) * t),
        (Some(e), None) | (None, Some(e)) => Some(e),
        (None, None) => None,
    };

    TrailPoint {
        latitude: a.latitude + (b.latitude - a.latitude) * t,
        longitude: a.longitude + (b.longitude - a.longitude) * t,
        elevation,
        cumulative_distance: a.cumulative_distance
            + (b.cumulative_distance - a.cumulative_distance) * t,
    }
}

// =============================================================================
// Unit Conversion
// =============================================================================

/// Convert meters to approximate degrees at a given latitude.
///
/// At the equator, 1 degree ≈ 111,320 meters; the longitude span shrinks with
/// `cos(latitude)`. Suitable for bounding-box searches where a square area is
/// acceptable.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = Coordinate::new(45.9237, 6.8694);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_symmetric() {
        let a = Coordinate::new(45.9237, 6.8694);
        let b = Coordinate::new(46.0207, 7.7491);
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);

        let north = initial_bearing(&origin, &Coordinate::new(1.0, 0.0));
        let east = initial_bearing(&origin, &Coordinate::new(0.0, 1.0));
        let south = initial_bearing(&origin, &Coordinate::new(-1.0, 0.0));
        let west = initial_bearing(&origin, &Coordinate::new(0.0, -1.0));

        assert!(approx_eq(north, 0.0, 1e-9));
        assert!(approx_eq(east, 90.0, 1e-9));
        assert!(approx_eq(south, 180.0, 1e-9));
        assert!(approx_eq(west, 270.0, 1e-9));
    }

    #[test]
    fn test_bearing_same_point_is_zero() {
        let p = Coordinate::new(45.9237, 6.8694);
        assert_eq!(initial_bearing(&p, &p), 0.0);
    }

    #[test]
    fn test_bearing_range() {
        let a = Coordinate::new(45.9237, 6.8694);
        let targets = [
            Coordinate::new(45.0, 6.0),
            Coordinate::new(46.5, 6.0),
            Coordinate::new(45.0, 7.5),
            Coordinate::new(46.5, 7.5),
        ];
        for t in &targets {
            let b = initial_bearing(&a, t);
            assert!((0.0..360.0).contains(&b), "bearing {} out of range", b);
        }
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = TrailPoint::with_elevation(45.0, 6.0, 1000.0);
        let b = TrailPoint::with_elevation(46.0, 7.0, 1200.0);

        let start = interpolate(&a, &b, 0.0);
        assert_eq!(start.latitude, a.latitude);
        assert_eq!(start.elevation, a.elevation);

        let end = interpolate(&a, &b, 1.0);
        assert_eq!(end.longitude, b.longitude);
        assert_eq!(end.elevation, b.elevation);
    }

    #[test]
    fn test_interpolate_clamps_t() {
        let a = TrailPoint::new(45.0, 6.0);
        let b = TrailPoint::new(46.0, 7.0);

        let below = interpolate(&a, &b, -0.5);
        assert_eq!(below.latitude, 45.0);

        let above = interpolate(&a, &b, 1.5);
        assert_eq!(above.latitude, 46.0);
    }

    #[test]
    fn test_interpolate_missing_elevation() {
        let a = TrailPoint::with_elevation(45.0, 6.0, 1000.0);
        let b = TrailPoint::new(46.0, 7.0);

        // One-sided elevation carries through rather than vanishing
        let mid = interpolate(&a, &b, 0.5);
        assert_eq!(mid.elevation, Some(1000.0));

        let c = TrailPoint::new(45.0, 6.0);
        assert_eq!(interpolate(&c, &b, 0.5).elevation, None);
    }

    #[test]
    fn test_interpolate_cumulative_distance() {
        let mut a = TrailPoint::new(45.0, 6.0);
        let mut b = TrailPoint::new(46.0, 7.0);
        a.cumulative_distance = 100.0;
        b.cumulative_distance = 300.0;

        let mid = interpolate(&a, &b, 0.5);
        assert_eq!(mid.cumulative_distance, 200.0);
    }

    #[test]
    fn test_meters_to_degrees() {
        // At equator, 111.32 km = 1 degree
        let deg = meters_to_degrees(111_320.0, 0.0);
        assert!(approx_eq(deg, 1.0, 0.01));

        // At higher latitude, same distance = more degrees
        let deg_45 = meters_to_degrees(111_320.0, 45.0);
        assert!(deg_45 > 1.0);
    }
}
