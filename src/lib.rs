//! # Trail Engine
//!
//! Trail geometry, marker clustering and flythrough camera animation for
//! recorded GPS routes.
//!
//! This library provides:
//! - Normalization of raw recorded samples into canonical trail geometry
//! - Derived trail statistics (distance, elevation, difficulty, duration)
//! - Proximity clustering of trail start markers for map display
//! - Nearest-point-on-trail lookup for click coordinates
//! - A time-driven flythrough animation engine producing per-tick camera frames
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch processing with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use trail_engine::{normalize_trail, compute_stats, RawTrailPoint, TrailTotals};
//!
//! // Raw samples as they come out of a recorded track
//! let raw = vec![
//!     RawTrailPoint::new(45.9237, 6.8694),
//!     RawTrailPoint::with_elevation(45.9250, 6.8710, 1100.0),
//!     RawTrailPoint::with_elevation(45.9262, 6.8731, 1134.0),
//! ];
//!
//! let points = normalize_trail(&raw).unwrap();
//! let stats = compute_stats(&points, &TrailTotals::default()).unwrap();
//!
//! println!(
//!     "{:.2} km, {:.0} m gained, difficulty {:?}",
//!     stats.total_distance_km, stats.elevation_gain_m, stats.difficulty
//! );
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrailError};

// Geographic utilities (distance, bearing, interpolation)
pub mod geo_utils;

// Raw sample normalization into canonical trail geometry
pub mod normalize;
pub use normalize::{normalize_trail, RawTrailPoint};

// Derived trail statistics
pub mod stats;
pub use stats::{compute_stats, Difficulty, TrailStats, TrailTotals};

// Windowed terrain ruggedness analysis
pub mod terrain;
pub use terrain::{analyze_window, TerrainProfile};

// Proximity clustering of trail start markers
pub mod clustering;
pub use clustering::{cluster_markers, Cluster, ClusterConfig, ClusterInput};

// Nearest-point-on-trail lookup
pub mod locate;
pub use locate::{nearest_point, NearestPointResult};

// Flythrough animation state machine
pub mod flight;
pub use flight::{
    AnimationState, CameraFrame, FlightConfig, FlightEngine, FlightFrame, ManualTickSource,
    TickSource,
};

// Stateful trail engine (singleton with all trail state)
pub mod engine;
pub use engine::{with_engine, EngineStats, TrailEngine, ENGINE};

// Algorithm toolbox - modular access to all algorithms
// Use trail_engine::algorithms::{...} for standalone algorithm access
pub mod algorithms;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use trail_engine::Coordinate;
/// let point = Coordinate::new(45.9237, 6.8694); // Chamonix
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the coordinate is within valid latitude/longitude bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A canonical trail point: coordinate, optional elevation, and cumulative
/// arc-length from the trail start.
///
/// Produced by [`normalize_trail`]; `cumulative_distance` is monotonically
/// non-decreasing along the point sequence and immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters, when the source sample carried one
    pub elevation: Option<f64>,
    /// Meters traveled along the trail from its start to this point
    pub cumulative_distance: f64,
}

impl TrailPoint {
    /// Create a trail point without elevation at distance 0.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            cumulative_distance: 0.0,
        }
    }

    /// Create a trail point with elevation at distance 0.
    pub fn with_elevation(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: Some(elevation),
            cumulative_distance: 0.0,
        }
    }

    /// The point's coordinate, without elevation or distance.
    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.coord().is_valid()
    }
}

/// Bounding box for a trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from trail points. Returns `None` for empty input.
    pub fn from_points(points: &[TrailPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
