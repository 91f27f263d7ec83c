//! Proximity clustering of trail start markers.
//!
//! At low zoom levels many trail start markers overlap visually; nearby ones
//! are collapsed into a single cluster marker sized by member count. The
//! clustering here is pure data-in/data-out; rendering owns nothing of it,
//! so any map surface can consume the result.
//!
//! The algorithm is a greedy star-shaped single-link pass: each not-yet
//! assigned point in input order opens a cluster and absorbs all remaining
//! unassigned points within the threshold of that seed. Membership is
//! measured against the seed, not transitively against every member, which
//! keeps the result deterministic for a given input order and bounds the
//! cost at O(n²) without a union-find closure.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::Coordinate;

/// A labeled marker point, one per trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInput {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ClusterInput {
    /// Create a new marker point.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }

    fn coord(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A group of nearby markers collapsed into one visual representation.
///
/// `count == member_ids.len()` and is at least 1; the center is the
/// arithmetic mean of the member coordinates. Clusters partition their
/// input: every input id belongs to exactly one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// The seed marker's id
    pub id: String,
    pub member_ids: Vec<String>,
    pub center_lat: f64,
    pub center_lng: f64,
    pub count: u32,
}

/// Zoom-dependent clustering thresholds.
///
/// The clusterer itself only accepts a distance; which distance applies at
/// which zoom level is a display concern configured here by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Zoom level at or above which markers are never clustered.
    /// Default: 13.0
    pub singleton_zoom: f64,

    /// Step table of `(minimum zoom, cluster distance in meters)`, ordered
    /// by ascending zoom. The entry with the highest matching minimum zoom
    /// wins. Default: 8 km below zoom 7, then 4 km, 1.5 km, 400 m.
    pub zoom_steps: Vec<(f64, f64)>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            singleton_zoom: 13.0,
            zoom_steps: vec![(0.0, 8000.0), (7.0, 4000.0), (10.0, 1500.0), (12.0, 400.0)],
        }
    }
}

impl ClusterConfig {
    /// Resolve the clustering distance for a zoom level.
    ///
    /// Returns 0 at or above `singleton_zoom`, which makes
    /// [`cluster_markers`] produce identity clustering.
    pub fn threshold_for_zoom(&self, zoom: f64) -> f64 {
        if zoom >= self.singleton_zoom {
            return 0.0;
        }

        let mut threshold = 0.0;
        for &(min_zoom, distance) in &self.zoom_steps {
            if zoom >= min_zoom {
                threshold = distance;
            }
        }
        threshold
    }
}

/// Cluster marker points with a single-link distance threshold.
///
/// A `max_distance_m` of 0 yields one singleton cluster per input point
/// (identity clustering, used at high zoom). Result order is stable with
/// respect to the input order of first-seen seeds.
///
/// # Example
/// ```
/// use trail_engine::{cluster_markers, ClusterInput};
///
/// let markers = vec![
///     ClusterInput::new("a", 45.9237, 6.8694),
///     ClusterInput::new("b", 45.9239, 6.8696), // ~30 m from a
///     ClusterInput::new("c", 46.2044, 6.1432), // Geneva, far away
/// ];
///
/// let clusters = cluster_markers(&markers, 500.0);
/// assert_eq!(clusters.len(), 2);
/// assert_eq!(clusters[0].count, 2);
/// ```
pub fn cluster_markers(points: &[ClusterInput], max_distance_m: f64) -> Vec<Cluster> {
    if max_distance_m <= 0.0 {
        return points
            .iter()
            .map(|p| Cluster {
                id: p.id.clone(),
                member_ids: vec![p.id.clone()],
                center_lat: p.latitude,
                center_lng: p.longitude,
                count: 1,
            })
            .collect();
    }

    let mut assigned = vec![false; points.len()];
    let mut clusters = Vec::new();

    for i in 0..points.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;

        let seed = &points[i];
        let seed_coord = seed.coord();
        let mut member_ids = vec![seed.id.clone()];
        let mut sum_lat = seed.latitude;
        let mut sum_lng = seed.longitude;

        // Absorb unassigned points within range of the seed, not of every
        // member: star-shaped, no transitive chaining
        for j in (i + 1)..points.len() {
            if assigned[j] {
                continue;
            }
            if haversine_distance(&seed_coord, &points[j].coord()) <= max_distance_m {
                assigned[j] = true;
                member_ids.push(points[j].id.clone());
                sum_lat += points[j].latitude;
                sum_lng += points[j].longitude;
            }
        }

        let count = member_ids.len();
        clusters.push(Cluster {
            id: seed.id.clone(),
            member_ids,
            center_lat: sum_lat / count as f64,
            center_lng: sum_lng / count as f64,
            count: count as u32,
        });
    }

    clusters
}
