//! Windowed terrain ruggedness analysis.
//!
//! The flythrough camera adapts its framing to how rugged the terrain is
//! around the current position. Ruggedness is measured as the population
//! variance of elevation over a sliding window of samples centered on the
//! current point; its square root (roughness) drives the camera offsets.

use serde::{Deserialize, Serialize};

use crate::TrailPoint;

/// Average elevation above which terrain counts as high.
const HIGH_AVG_ELEVATION_M: f64 = 300.0;
/// Elevation range above which terrain counts as high.
const HIGH_RANGE_M: f64 = 100.0;
/// Elevation variance above which terrain counts as high.
const HIGH_VARIANCE: f64 = 2500.0;

/// Local elevation profile around a trail position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TerrainProfile {
    /// Mean elevation over the window in meters
    pub avg_elevation: f64,
    /// Population variance of elevation over the window
    pub elevation_variance: f64,
    /// Max minus min elevation over the window in meters
    pub elevation_range: f64,
    /// `sqrt(elevation_variance)`
    pub roughness: f64,
    pub is_high_terrain: bool,
}

/// Analyze the elevation profile in a window around `current_index`.
///
/// The window is `[current_index - window_radius, current_index +
/// window_radius]` clipped to the list bounds. Points without elevation are
/// skipped. An out-of-range index or a window with no elevation data yields
/// the all-zero profile with `is_high_terrain = false`; this never fails.
///
/// # Example
/// ```
/// use trail_engine::{analyze_window, TrailPoint};
///
/// let points: Vec<TrailPoint> = (0..10)
///     .map(|i| TrailPoint::with_elevation(45.9 + i as f64 * 0.001, 6.86, 1000.0 + i as f64 * 40.0))
///     .collect();
///
/// let profile = analyze_window(&points, 5, 3);
/// assert!(profile.avg_elevation > 0.0);
/// assert!(profile.is_high_terrain);
/// ```
pub fn analyze_window(
    points: &[TrailPoint],
    current_index: usize,
    window_radius: usize,
) -> TerrainProfile {
    if current_index >= points.len() {
        return TerrainProfile::default();
    }

    let lo = current_index.saturating_sub(window_radius);
    let hi = (current_index + window_radius).min(points.len() - 1);

    let elevations: Vec<f64> = points[lo..=hi].iter().filter_map(|p| p.elevation).collect();

    if elevations.is_empty() {
        return TerrainProfile::default();
    }

    let n = elevations.len() as f64;
    let avg_elevation = elevations.iter().sum::<f64>() / n;

    let elevation_variance = elevations
        .iter()
        .map(|e| {
            let d = e - avg_elevation;
            d * d
        })
        .sum::<f64>()
        / n;

    let max = elevations.iter().cloned().fold(f64::MIN, f64::max);
    let min = elevations.iter().cloned().fold(f64::MAX, f64::min);
    let elevation_range = max - min;

    let is_high_terrain = avg_elevation > HIGH_AVG_ELEVATION_M
        || elevation_range > HIGH_RANGE_M
        || elevation_variance > HIGH_VARIANCE;

    TerrainProfile {
        avg_elevation,
        elevation_variance,
        elevation_range,
        roughness: elevation_variance.sqrt(),
        is_high_terrain,
    }
}
