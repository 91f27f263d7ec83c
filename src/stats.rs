//! Derived trail statistics.
//!
//! Consumes a canonical point list and produces the summary shown next to a
//! trail: total distance, elevation gain/loss, bounding box, a discrete
//! difficulty class and an estimated traversal duration.
//!
//! Upstream records sometimes carry authoritative pre-computed totals whose
//! source precision differs from the resampled arc-length. When present,
//! those take precedence over the recomputed values (see [`TrailTotals`]).

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};
use crate::{Bounds, TrailPoint};

/// Weight of distance (km) in the difficulty score.
const DISTANCE_WEIGHT: f64 = 0.3;
/// Weight of elevation gain (m) in the difficulty score.
const GAIN_WEIGHT: f64 = 0.001;
/// Scores below this are Easy.
const EASY_BELOW: f64 = 2.0;
/// Scores below this (and at least `EASY_BELOW`) are Moderate.
const MODERATE_BELOW: f64 = 5.0;

/// Flat-pace walking baseline in km/h for the duration estimate.
const FLAT_PACE_KMH: f64 = 4.0;
/// Extra hours per 100 m climbed (15 minutes).
const CLIMB_HOURS_PER_100M: f64 = 0.25;

/// Discrete difficulty classification.
///
/// Derived from a weighted distance/elevation score. This is a display
/// heuristic, not a physiological model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

impl Difficulty {
    /// Classify a difficulty score.
    ///
    /// Boundary scores land on the harder class: a score of exactly 2.0 is
    /// Moderate, exactly 5.0 is Hard.
    pub fn from_score(score: f64) -> Self {
        if score < EASY_BELOW {
            Difficulty::Easy
        } else if score < MODERATE_BELOW {
            Difficulty::Moderate
        } else {
            Difficulty::Hard
        }
    }
}

/// Authoritative totals supplied by the upstream data store.
///
/// Fields that are `Some` take precedence over the corresponding recomputed
/// value; `None` falls back to recomputation. A deployment that trusts raw
/// samples over upstream aggregates simply passes `TrailTotals::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrailTotals {
    /// Pre-computed total distance in kilometers
    pub distance_km: Option<f64>,
    /// Pre-computed total elevation gain in meters
    pub elevation_gain_m: Option<f64>,
    /// Pre-computed traversal duration in hours
    pub duration_hours: Option<f64>,
}

/// Summary statistics for a trail.
///
/// Derived from the point list; recomputed whenever the source list changes,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailStats {
    pub total_distance_km: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    /// Highest recorded elevation, when any point carries one
    pub max_elevation_m: Option<f64>,
    /// Lowest recorded elevation, when any point carries one
    pub min_elevation_m: Option<f64>,
    pub estimated_duration_hours: f64,
    pub difficulty: Difficulty,
    pub bounds: Bounds,
}

/// Compute summary statistics for a canonical point list.
///
/// Total distance is the last point's cumulative arc-length unless an
/// authoritative distance is supplied. Elevation gain/loss sums the
/// positive/negative deltas between consecutive points that both carry
/// elevation; pairs with a missing value are skipped rather than erroring.
/// A single-point trail yields distance 0 with no division by zero.
///
/// # Errors
///
/// [`TrailError::InvalidTrail`] when `points` is empty.
///
/// # Example
/// ```
/// use trail_engine::{compute_stats, normalize_trail, RawTrailPoint, TrailTotals};
///
/// let raw = vec![
///     RawTrailPoint::with_elevation(45.9237, 6.8694, 1035.0),
///     RawTrailPoint::with_elevation(45.9250, 6.8710, 1060.0),
/// ];
/// let points = normalize_trail(&raw).unwrap();
/// let stats = compute_stats(&points, &TrailTotals::default()).unwrap();
/// assert_eq!(stats.elevation_gain_m, 25.0);
/// ```
pub fn compute_stats(points: &[TrailPoint], totals: &TrailTotals) -> Result<TrailStats> {
    if points.is_empty() {
        return Err(TrailError::InvalidTrail {
            message: "cannot compute stats for an empty trail".to_string(),
        });
    }

    let bounds = Bounds::from_points(points).ok_or_else(|| TrailError::Internal {
        message: "bounds of a non-empty trail".to_string(),
    })?;

    let recomputed_km = points
        .last()
        .map(|p| p.cumulative_distance / 1000.0)
        .unwrap_or(0.0);
    let total_distance_km = totals.distance_km.unwrap_or(recomputed_km);

    let (recomputed_gain, elevation_loss_m) = elevation_gain_loss(points);
    let elevation_gain_m = totals.elevation_gain_m.unwrap_or(recomputed_gain);

    let mut max_elevation_m: Option<f64> = None;
    let mut min_elevation_m: Option<f64> = None;
    for e in points.iter().filter_map(|p| p.elevation) {
        max_elevation_m = Some(max_elevation_m.map_or(e, |m: f64| m.max(e)));
        min_elevation_m = Some(min_elevation_m.map_or(e, |m: f64| m.min(e)));
    }

    let score = total_distance_km * DISTANCE_WEIGHT + elevation_gain_m * GAIN_WEIGHT;
    let difficulty = Difficulty::from_score(score);

    let estimated_duration_hours = totals.duration_hours.unwrap_or_else(|| {
        total_distance_km / FLAT_PACE_KMH + elevation_gain_m / 100.0 * CLIMB_HOURS_PER_100M
    });

    Ok(TrailStats {
        total_distance_km,
        elevation_gain_m,
        elevation_loss_m,
        max_elevation_m,
        min_elevation_m,
        estimated_duration_hours,
        difficulty,
        bounds,
    })
}

/// Sum positive and negative elevation deltas over consecutive pairs.
///
/// Pairs where either point lacks elevation contribute nothing.
fn elevation_gain_loss(points: &[TrailPoint]) -> (f64, f64) {
    let mut gain = 0.0;
    let mut loss = 0.0;

    for w in points.windows(2) {
        if let (Some(e0), Some(e1)) = (w[0].elevation, w[1].elevation) {
            let delta = e1 - e0;
            if delta > 0.0 {
                gain += delta;
            } else {
                loss += -delta;
            }
        }
    }

    (gain, loss)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64, elevation: Option<f64>, cumulative: f64) -> TrailPoint {
        TrailPoint {
            latitude: lat,
            longitude: lng,
            elevation,
            cumulative_distance: cumulative,
        }
    }

    fn climb_trail() -> Vec<TrailPoint> {
        vec![
            point(45.92, 6.86, Some(1000.0), 0.0),
            point(45.93, 6.87, Some(1100.0), 2000.0),
            point(45.94, 6.88, Some(1050.0), 4000.0),
            point(45.95, 6.89, Some(1300.0), 6000.0),
        ]
    }

    #[test]
    fn test_empty_trail_fails() {
        let result = compute_stats(&[], &TrailTotals::default());
        assert!(matches!(result, Err(TrailError::InvalidTrail { .. })));
    }

    #[test]
    fn test_basic_stats() {
        let stats = compute_stats(&climb_trail(), &TrailTotals::default()).unwrap();
        assert_eq!(stats.total_distance_km, 6.0);
        assert_eq!(stats.elevation_gain_m, 350.0); // +100 +250
        assert_eq!(stats.elevation_loss_m, 50.0);
        assert_eq!(stats.max_elevation_m, Some(1300.0));
        assert_eq!(stats.min_elevation_m, Some(1000.0));
        assert_eq!(stats.bounds.min_lat, 45.92);
        assert_eq!(stats.bounds.max_lat, 45.95);
    }

    #[test]
    fn test_single_point_trail() {
        let points = vec![point(45.92, 6.86, Some(1000.0), 0.0)];
        let stats = compute_stats(&points, &TrailTotals::default()).unwrap();
        assert_eq!(stats.total_distance_km, 0.0);
        assert_eq!(stats.elevation_gain_m, 0.0);
        assert_eq!(stats.estimated_duration_hours, 0.0);
        assert_eq!(stats.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_elevation_gap_skipped_pairwise() {
        let points = vec![
            point(45.92, 6.86, Some(1000.0), 0.0),
            point(45.93, 6.87, None, 1000.0),
            point(45.94, 6.88, Some(1200.0), 2000.0),
        ];
        let stats = compute_stats(&points, &TrailTotals::default()).unwrap();
        // Both pairs straddle the gap; neither contributes
        assert_eq!(stats.elevation_gain_m, 0.0);
        assert_eq!(stats.elevation_loss_m, 0.0);
    }

    #[test]
    fn test_no_elevation_at_all() {
        let points = vec![
            point(45.92, 6.86, None, 0.0),
            point(45.93, 6.87, None, 1000.0),
        ];
        let stats = compute_stats(&points, &TrailTotals::default()).unwrap();
        assert_eq!(stats.max_elevation_m, None);
        assert_eq!(stats.min_elevation_m, None);
    }

    #[test]
    fn test_authoritative_distance_overrides() {
        // Recomputed arc-length is 4.97 km; upstream says 5.0
        let points = vec![
            point(45.92, 6.86, None, 0.0),
            point(45.93, 6.87, None, 4970.0),
        ];
        let totals = TrailTotals {
            distance_km: Some(5.0),
            ..TrailTotals::default()
        };
        let stats = compute_stats(&points, &totals).unwrap();
        assert_eq!(stats.total_distance_km, 5.0);
    }

    #[test]
    fn test_authoritative_duration_overrides() {
        let totals = TrailTotals {
            duration_hours: Some(3.5),
            ..TrailTotals::default()
        };
        let stats = compute_stats(&climb_trail(), &totals).unwrap();
        assert_eq!(stats.estimated_duration_hours, 3.5);
    }

    #[test]
    fn test_estimated_duration_formula() {
        // 6 km flat pace = 1.5 h, 350 m gain = 0.875 h
        let stats = compute_stats(&climb_trail(), &TrailTotals::default()).unwrap();
        assert!((stats.estimated_duration_hours - 2.375).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_weighting() {
        // 6 km, no gain: score 1.8
        let flat = vec![
            point(45.92, 6.86, None, 0.0),
            point(45.95, 6.89, None, 6000.0),
        ];
        let stats = compute_stats(&flat, &TrailTotals::default()).unwrap();
        assert_eq!(stats.difficulty, Difficulty::Easy);

        // Same distance with 2100 m gain: score 3.9
        let totals = TrailTotals {
            elevation_gain_m: Some(2100.0),
            ..TrailTotals::default()
        };
        let stats = compute_stats(&flat, &totals).unwrap();
        assert_eq!(stats.difficulty, Difficulty::Moderate);
    }

    #[test]
    fn test_difficulty_exact_boundaries() {
        assert_eq!(Difficulty::from_score(1.999), Difficulty::Easy);
        assert_eq!(Difficulty::from_score(2.0), Difficulty::Moderate);
        assert_eq!(Difficulty::from_score(4.999), Difficulty::Moderate);
        assert_eq!(Difficulty::from_score(5.0), Difficulty::Hard);
    }
}
