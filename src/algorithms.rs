//! # Algorithm Toolbox
//!
//! This module provides direct access to all trail algorithms.
//! Use these for integrating specific algorithms into your own systems
//! without needing the stateful engine.
//!
//! ## Core Algorithms
//!
//! - **Normalization**: raw recorded samples → canonical trail geometry
//! - **Trail Statistics**: distance, elevation, difficulty, duration
//! - **Marker Clustering**: star-shaped single-link proximity clustering
//! - **Nearest Point**: closest trail vertex to a click coordinate
//! - **Terrain Analysis**: windowed elevation variance profile
//!
//! ## Geographic Utilities
//!
//! - **Haversine Distance**: great-circle distance between coordinates
//! - **Initial Bearing**: compass heading in `[0, 360)`
//! - **Interpolation**: linear blend between trail points
//!
//! # Example
//!
//! ```rust
//! use trail_engine::algorithms::{haversine_distance, Coordinate};
//!
//! let london = Coordinate::new(51.5074, -0.1278);
//! let paris = Coordinate::new(48.8566, 2.3522);
//! let distance = haversine_distance(&london, &paris);
//! println!("London to Paris: {:.0} km", distance / 1000.0);
//! ```

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{Bounds, Coordinate, TrailPoint};

// =============================================================================
// Geographic Utilities
// =============================================================================

pub use crate::geo_utils::{haversine_distance, initial_bearing, interpolate, meters_to_degrees};

// =============================================================================
// Normalization & Statistics
// =============================================================================

/// Convert heterogeneous raw samples into canonical trail points.
pub use crate::normalize::{normalize_trail, RawTrailPoint};

/// Derive summary statistics from a canonical point list.
pub use crate::stats::{compute_stats, Difficulty, TrailStats, TrailTotals};

// =============================================================================
// Terrain Analysis
// =============================================================================

/// Windowed elevation variance profile around a trail position.
pub use crate::terrain::{analyze_window, TerrainProfile};

// =============================================================================
// Marker Clustering
// =============================================================================

/// Star-shaped single-link clustering of marker points.
pub use crate::clustering::{cluster_markers, Cluster, ClusterConfig, ClusterInput};

// =============================================================================
// Nearest Point
// =============================================================================

/// Closest trail vertex to an arbitrary coordinate.
pub use crate::locate::{nearest_point, NearestPointResult};

// =============================================================================
// Flythrough Animation
// =============================================================================

/// Time-driven flythrough camera engine and its tick abstraction.
pub use crate::flight::{
    AnimationState, CameraFrame, FlightConfig, FlightEngine, FlightFrame, ManualTickSource,
    TickCallback, TickSource,
};
