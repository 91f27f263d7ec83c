//! Nearest-point-on-trail lookup.
//!
//! Maps an arbitrary clicked/tapped coordinate to the closest trail vertex
//! and its distance marker, for comment placement and distance display.
//!
//! This is a deliberate brute-force O(n) scan: trail point counts are
//! bounded (low thousands), so a spatial index would buy nothing at this
//! call rate. The external contract would be unchanged by one.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};
use crate::geo_utils::haversine_distance;
use crate::{Coordinate, TrailPoint};

/// The trail vertex closest to a queried coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestPointResult {
    /// Index of the vertex in the trail's point list
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
    /// The vertex's cumulative arc-length from the trail start, in kilometers
    pub distance_marker_km: f64,
}

/// Find the trail vertex closest to `click`.
///
/// Ties on distance resolve to the first index achieving the minimum, so
/// the result is stable under duplicate points.
///
/// # Errors
///
/// [`TrailError::EmptyTrail`] when `points` is empty.
///
/// # Example
/// ```
/// use trail_engine::{nearest_point, normalize_trail, Coordinate, RawTrailPoint};
///
/// let raw = vec![
///     RawTrailPoint::new(45.9237, 6.8694),
///     RawTrailPoint::new(45.9250, 6.8710),
/// ];
/// let points = normalize_trail(&raw).unwrap();
///
/// let hit = nearest_point(&points, &Coordinate::new(45.9249, 6.8709)).unwrap();
/// assert_eq!(hit.index, 1);
/// ```
pub fn nearest_point(points: &[TrailPoint], click: &Coordinate) -> Result<NearestPointResult> {
    if points.is_empty() {
        return Err(TrailError::EmptyTrail);
    }

    let mut best_index = 0;
    let mut best_distance = f64::INFINITY;

    for (i, p) in points.iter().enumerate() {
        let d = haversine_distance(click, &p.coord());
        if d < best_distance {
            best_distance = d;
            best_index = i;
        }
    }

    let best = &points[best_index];
    Ok(NearestPointResult {
        index: best_index,
        latitude: best.latitude,
        longitude: best.longitude,
        distance_marker_km: best.cumulative_distance / 1000.0,
    })
}
