//! Trail normalization.
//!
//! Upstream route records arrive with inconsistent field naming (`lat`/`lng`,
//! `lat`/`lon`, `latitude`/`longitude`) and optional elevation. This module
//! converts an ordered list of such samples into the canonical
//! [`TrailPoint`](crate::TrailPoint) form every other component consumes,
//! computing cumulative arc-length along the way.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};
use crate::geo_utils::haversine_distance;
use crate::{Coordinate, TrailPoint};

/// A raw recorded sample, tolerant of the field spellings found in upstream
/// data. Deserializes from `lat`/`latitude`, `lng`/`lon`/`longitude` and
/// `elevation`/`ele`/`altitude`.
///
/// # Example
/// ```
/// use trail_engine::RawTrailPoint;
///
/// let p: RawTrailPoint = serde_json::from_str(
///     r#"{"latitude": 45.9237, "lon": 6.8694, "ele": 1035.0}"#,
/// ).unwrap();
/// assert_eq!(p.lat, 45.9237);
/// assert_eq!(p.elevation, Some(1035.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawTrailPoint {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "lon", alias = "longitude")]
    pub lng: f64,
    #[serde(default, alias = "ele", alias = "altitude")]
    pub elevation: Option<f64>,
}

impl RawTrailPoint {
    /// Create a raw point without elevation.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            elevation: None,
        }
    }

    /// Create a raw point with elevation.
    pub fn with_elevation(lat: f64, lng: f64, elevation: f64) -> Self {
        Self {
            lat,
            lng,
            elevation: Some(elevation),
        }
    }
}

/// Normalize raw samples into canonical trail points.
///
/// Cumulative distance is the running sum of haversine distances over
/// consecutive pairs, so it is monotonically non-decreasing. A single-point
/// trail is valid (a stationary marker) and carries distance 0.
///
/// # Errors
///
/// - [`TrailError::InvalidTrail`] when no points are supplied
/// - [`TrailError::OutOfRangeCoordinate`] when any sample has a non-finite or
///   out-of-range latitude/longitude
///
/// # Example
/// ```
/// use trail_engine::{normalize_trail, RawTrailPoint};
///
/// let raw = vec![
///     RawTrailPoint::new(45.9237, 6.8694),
///     RawTrailPoint::new(45.9250, 6.8710),
/// ];
/// let points = normalize_trail(&raw).unwrap();
/// assert_eq!(points[0].cumulative_distance, 0.0);
/// assert!(points[1].cumulative_distance > 0.0);
/// ```
pub fn normalize_trail(raw: &[RawTrailPoint]) -> Result<Vec<TrailPoint>> {
    if raw.is_empty() {
        return Err(TrailError::InvalidTrail {
            message: "no points supplied".to_string(),
        });
    }

    let mut points = Vec::with_capacity(raw.len());
    let mut cumulative = 0.0;
    let mut prev: Option<Coordinate> = None;

    for (index, sample) in raw.iter().enumerate() {
        let coord = Coordinate::new(sample.lat, sample.lng);
        if !coord.is_valid() {
            return Err(TrailError::OutOfRangeCoordinate {
                index,
                latitude: sample.lat,
                longitude: sample.lng,
            });
        }

        if let Some(prev_coord) = prev {
            cumulative += haversine_distance(&prev_coord, &coord);
        }

        // Non-finite elevation is a data-quality gap, not an error
        let elevation = sample.elevation.filter(|e| e.is_finite());

        points.push(TrailPoint {
            latitude: sample.lat,
            longitude: sample.lng,
            elevation,
            cumulative_distance: cumulative,
        });
        prev = Some(coord);
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> Vec<RawTrailPoint> {
        vec![
            RawTrailPoint::with_elevation(45.9237, 6.8694, 1035.0),
            RawTrailPoint::with_elevation(45.9250, 6.8710, 1060.0),
            RawTrailPoint::with_elevation(45.9262, 6.8731, 1082.0),
            RawTrailPoint::with_elevation(45.9275, 6.8749, 1121.0),
        ]
    }

    #[test]
    fn test_normalize_empty_fails() {
        let result = normalize_trail(&[]);
        assert!(matches!(result, Err(TrailError::InvalidTrail { .. })));
    }

    #[test]
    fn test_normalize_out_of_range_fails() {
        let raw = vec![
            RawTrailPoint::new(45.9237, 6.8694),
            RawTrailPoint::new(95.0, 6.8710),
        ];
        let result = normalize_trail(&raw);
        assert!(matches!(
            result,
            Err(TrailError::OutOfRangeCoordinate { index: 1, .. })
        ));
    }

    #[test]
    fn test_normalize_single_point() {
        let raw = vec![RawTrailPoint::new(45.9237, 6.8694)];
        let points = normalize_trail(&raw).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].cumulative_distance, 0.0);
    }

    #[test]
    fn test_cumulative_distance_monotonic() {
        let points = normalize_trail(&sample_raw()).unwrap();
        for w in points.windows(2) {
            assert!(w[1].cumulative_distance >= w[0].cumulative_distance);
        }
        assert!(points.last().unwrap().cumulative_distance > 0.0);
    }

    #[test]
    fn test_elevation_carried_through() {
        let points = normalize_trail(&sample_raw()).unwrap();
        assert_eq!(points[0].elevation, Some(1035.0));
        assert_eq!(points[3].elevation, Some(1121.0));
    }

    #[test]
    fn test_non_finite_elevation_dropped() {
        let raw = vec![
            RawTrailPoint::with_elevation(45.9237, 6.8694, f64::NAN),
            RawTrailPoint::new(45.9250, 6.8710),
        ];
        let points = normalize_trail(&raw).unwrap();
        assert_eq!(points[0].elevation, None);
    }

    #[test]
    fn test_field_name_aliases() {
        let json = r#"[
            {"lat": 45.9237, "lng": 6.8694},
            {"latitude": 45.9250, "longitude": 6.8710, "elevation": 1060.0},
            {"lat": 45.9262, "lon": 6.8731, "ele": 1082.0}
        ]"#;
        let raw: Vec<RawTrailPoint> = serde_json::from_str(json).unwrap();
        let points = normalize_trail(&raw).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].elevation, Some(1060.0));
        assert_eq!(points[2].elevation, Some(1082.0));
    }

    #[test]
    fn test_duplicate_points_keep_distance_flat() {
        let raw = vec![
            RawTrailPoint::new(45.9237, 6.8694),
            RawTrailPoint::new(45.9237, 6.8694),
            RawTrailPoint::new(45.9250, 6.8710),
        ];
        let points = normalize_trail(&raw).unwrap();
        assert_eq!(points[0].cumulative_distance, points[1].cumulative_distance);
        assert!(points[2].cumulative_distance > points[1].cumulative_distance);
    }
}
