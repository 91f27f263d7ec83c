//! Flythrough animation engine.
//!
//! Produces, tick by tick, a camera pose that tracks a position moving along
//! a trail at visually constant speed while adapting framing to local
//! terrain ruggedness.
//!
//! ## Architecture
//!
//! The engine owns a single [`AnimationState`] value and exposes
//! `start`/`tick`/`stop`/`reset`, so lifecycle transitions are explicit and
//! testable without a rendering surface attached. Ticks are driven by the
//! host through an abstract [`TickSource`] (a display-synced callback, a
//! fixed timer, or the deterministic [`ManualTickSource`] in tests); the
//! engine itself has no thread or timer concept and performs no blocking
//! I/O.
//!
//! Progress is computed from `now - started_at` at tick time rather than
//! accumulated per-tick deltas, so irregular tick cadence cannot drift the
//! clock. Cancellation is cooperative: the host must unregister its callback
//! on `stop`/`reset` so no tick executes after the state machine leaves
//! `Running`; a late tick is a no-op regardless because `tick` only acts in
//! the `Running` state.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> Running          on start
//! Running -> Paused        on stop (progress at interruption is recorded)
//! Running -> Completed     when progress reaches 1
//! Paused/Completed -> Running   a new start always begins at progress 0
//! any -> Idle              on reset
//! ```
//!
//! Restarting from a saved pause progress is intentionally unsupported; the
//! recorded progress exists for display only.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};
use crate::geo_utils::{initial_bearing, interpolate};
use crate::terrain::{analyze_window, TerrainProfile};
use crate::TrailPoint;

// ============================================================================
// Configuration
// ============================================================================

/// Tuning for the flythrough camera and pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightConfig {
    /// Samples to look ahead when computing bearing, which smooths heading
    /// changes versus aiming at the immediate next sample. Default: 5
    pub lookahead_samples: usize,

    /// Radius of the terrain analysis window in samples. Default: 10
    pub terrain_window_radius: usize,

    /// Camera zoom over flat terrain. Default: 15.0
    pub flat_zoom: f64,
    /// Camera zoom over high terrain (pulled further out). Default: 13.5
    pub high_terrain_zoom: f64,

    /// Camera pitch over flat terrain in degrees. Default: 55.0
    pub flat_pitch_deg: f64,
    /// Camera pitch over high terrain in degrees. Default: 68.0
    pub high_terrain_pitch_deg: f64,

    /// Camera distance offset floor in meters. Default: 300.0
    pub min_distance_offset_m: f64,
    /// Camera distance offset ceiling in meters. Default: 1200.0
    pub max_distance_offset_m: f64,
    /// Meters of distance offset added per unit of terrain roughness.
    /// Default: 8.0
    pub roughness_offset_gain: f64,

    /// Camera height above the terrain, floor in meters. Default: 150.0
    pub min_elevation_offset_m: f64,
    /// Camera height above the terrain, ceiling in meters. Default: 600.0
    pub max_elevation_offset_m: f64,
    /// Meters of camera height added per unit of terrain roughness.
    /// Default: 4.0
    pub roughness_elevation_gain: f64,

    /// Flythrough pacing in milliseconds per trail kilometer, used when the
    /// caller derives a duration from trail length. Default: 3000.0
    pub ms_per_km: f64,
    /// Derived duration floor in milliseconds. Default: 8000.0
    pub min_duration_ms: f64,
    /// Derived duration ceiling in milliseconds. Default: 90000.0
    pub max_duration_ms: f64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            lookahead_samples: 5,
            terrain_window_radius: 10,
            flat_zoom: 15.0,
            high_terrain_zoom: 13.5,
            flat_pitch_deg: 55.0,
            high_terrain_pitch_deg: 68.0,
            min_distance_offset_m: 300.0,
            max_distance_offset_m: 1200.0,
            roughness_offset_gain: 8.0,
            min_elevation_offset_m: 150.0,
            max_elevation_offset_m: 600.0,
            roughness_elevation_gain: 4.0,
            ms_per_km: 3000.0,
            min_duration_ms: 8000.0,
            max_duration_ms: 90000.0,
        }
    }
}

impl FlightConfig {
    /// Derive a wall-clock duration budget from trail length, clamped to the
    /// configured range.
    pub fn duration_for_distance(&self, distance_km: f64) -> f64 {
        (distance_km * self.ms_per_km).clamp(self.min_duration_ms, self.max_duration_ms)
    }
}

// ============================================================================
// State & Output Types
// ============================================================================

/// Lifecycle state of the animation engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimationState {
    Idle,
    Running { progress: f64, started_at_ms: f64 },
    /// Interrupted mid-flight; `saved_progress` is recorded for display.
    /// A new start always begins at progress 0.
    Paused { saved_progress: f64 },
    /// Terminal until a new start
    Completed,
}

/// Camera pose for one animation tick.
///
/// Consumed and discarded by the renderer; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub latitude: f64,
    pub longitude: f64,
    /// Compass heading in `[0, 360)`
    pub bearing_deg: f64,
    pub zoom: f64,
    pub pitch_deg: f64,
    /// Camera pull-back from the tracked position in meters
    pub distance_offset_m: f64,
    /// Camera elevation in meters
    pub elevation_m: f64,
}

/// Complete per-tick output: the camera pose plus any events that fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightFrame {
    pub camera: CameraFrame,
    /// Time progress in `[0, 1]`
    pub progress: f64,
    /// Integral kilometers crossed since the previous tick, in increasing
    /// order. A tick that skips several hundred meters still reports every
    /// boundary it jumped over.
    pub km_markers: Vec<u32>,
    /// True exactly once, on the tick that pins the final frame
    pub completed: bool,
}

// ============================================================================
// Flight Engine
// ============================================================================

/// The flythrough animation state machine.
///
/// One engine instance serves one trail view; starting a flight while
/// another is `Running` is a no-op (the clock is not restarted).
///
/// # Example
/// ```
/// use trail_engine::{normalize_trail, FlightEngine, RawTrailPoint};
///
/// let points = normalize_trail(&[
///     RawTrailPoint::new(0.0, 0.0),
///     RawTrailPoint::new(0.0, 0.01),
/// ]).unwrap();
///
/// let mut engine = FlightEngine::new();
/// engine.start(points, 1000.0, 0.0).unwrap();
///
/// let frame = engine.tick(500.0).unwrap();
/// assert!((frame.progress - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct FlightEngine {
    config: FlightConfig,
    points: Vec<TrailPoint>,
    total_distance: f64,
    duration_ms: f64,
    state: AnimationState,
    /// Last integral kilometer already reported as a marker event
    last_marker_km: u32,
}

impl Default for FlightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(FlightConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: FlightConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
            total_distance: 0.0,
            duration_ms: 0.0,
            state: AnimationState::Idle,
            last_marker_km: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Whether a flight is currently running.
    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimationState::Running { .. })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Start a flight over `points` with a wall-clock budget of
    /// `duration_ms`, where `now_ms` is the host clock at start.
    ///
    /// A start while already `Running` is a no-op: the clock is not
    /// restarted. From `Idle`, `Paused` or `Completed` the flight begins at
    /// progress 0.
    ///
    /// # Errors
    ///
    /// [`TrailError::InsufficientPoints`] when fewer than 2 points are
    /// supplied; a single-point or empty trail cannot be flown.
    pub fn start(&mut self, points: Vec<TrailPoint>, duration_ms: f64, now_ms: f64) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        if points.len() < 2 {
            return Err(TrailError::InsufficientPoints {
                point_count: points.len(),
                minimum_required: 2,
            });
        }

        self.total_distance = points.last().map(|p| p.cumulative_distance).unwrap_or(0.0);
        self.points = points;
        self.duration_ms = duration_ms;
        self.last_marker_km = 0;
        self.state = AnimationState::Running {
            progress: 0.0,
            started_at_ms: now_ms,
        };
        Ok(())
    }

    /// Advance the animation to the host clock `now_ms`.
    ///
    /// Returns `None` unless the engine is `Running`, so a tick delivered
    /// late (after `stop`/`reset`) does nothing. On the tick that reaches
    /// progress 1 the state transitions to `Completed` and the returned
    /// frame is pinned exactly to the last trail point with bearing 0.
    pub fn tick(&mut self, now_ms: f64) -> Option<FlightFrame> {
        let started_at_ms = match self.state {
            AnimationState::Running { started_at_ms, .. } => started_at_ms,
            _ => return None,
        };

        let elapsed = now_ms - started_at_ms;
        let time_progress = if self.duration_ms > 0.0 {
            (elapsed / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };

        // Uniform speed over arc-length, not over sample index, so the
        // camera moves at visually constant speed regardless of how densely
        // the trail was sampled
        let target_distance = self.total_distance * time_progress;

        let (index, seg_t) = self.segment_at(target_distance);
        let p0 = &self.points[index];
        let p1 = &self.points[(index + 1).min(self.points.len() - 1)];
        let position = interpolate(p0, p1, seg_t);

        let lookahead_index = (index + self.config.lookahead_samples).min(self.points.len() - 1);
        let lookahead = &self.points[lookahead_index];
        let bearing_deg = initial_bearing(&position.coord(), &lookahead.coord());

        let terrain = analyze_window(&self.points, index, self.config.terrain_window_radius);

        // Catch up on every integral kilometer crossed since the last
        // reported one; equality testing would drop boundaries under
        // skipped frames
        let current_km = (target_distance / 1000.0).floor() as u32;
        let km_markers: Vec<u32> = if current_km > self.last_marker_km {
            ((self.last_marker_km + 1)..=current_km).collect()
        } else {
            Vec::new()
        };
        self.last_marker_km = self.last_marker_km.max(current_km);

        if time_progress >= 1.0 {
            self.state = AnimationState::Completed;
            let last = self.points[self.points.len() - 1];
            let camera = self.camera_frame(&last, 0.0, &terrain);
            return Some(FlightFrame {
                camera,
                progress: 1.0,
                km_markers,
                completed: true,
            });
        }

        self.state = AnimationState::Running {
            progress: time_progress,
            started_at_ms,
        };

        let camera = self.camera_frame(&position, bearing_deg, &terrain);
        Some(FlightFrame {
            camera,
            progress: time_progress,
            km_markers,
            completed: false,
        })
    }

    /// Interrupt a running flight, recording progress at the interruption.
    ///
    /// No-op outside `Running`. A later start begins at progress 0.
    pub fn stop(&mut self) {
        if let AnimationState::Running { progress, .. } = self.state {
            self.state = AnimationState::Paused {
                saved_progress: progress,
            };
        }
    }

    /// Force the engine back to `Idle` from any state, clearing the loaded
    /// trail and any saved progress.
    pub fn reset(&mut self) {
        self.points.clear();
        self.total_distance = 0.0;
        self.duration_ms = 0.0;
        self.last_marker_km = 0;
        self.state = AnimationState::Idle;
    }

    /// Find the segment bracketing `target_distance` along the cumulative
    /// arc-length, returning the lower index and the progress within that
    /// segment (0 for a zero-length segment).
    fn segment_at(&self, target_distance: f64) -> (usize, f64) {
        let idx = self
            .points
            .partition_point(|p| p.cumulative_distance < target_distance);
        if idx == 0 {
            return (0, 0.0);
        }

        let i1 = idx.min(self.points.len() - 1);
        let i0 = i1 - 1;
        let seg_len = self.points[i1].cumulative_distance - self.points[i0].cumulative_distance;
        let seg_t = if seg_len > 0.0 {
            (target_distance - self.points[i0].cumulative_distance) / seg_len
        } else {
            0.0
        };
        (i0, seg_t)
    }

    /// Derive the camera pose from position, heading and local terrain.
    ///
    /// Offsets grow monotonically with roughness and are clamped to the
    /// configured ranges; flat terrain gets the lower pitch and the closer
    /// offset.
    fn camera_frame(
        &self,
        position: &TrailPoint,
        bearing_deg: f64,
        terrain: &TerrainProfile,
    ) -> CameraFrame {
        let cfg = &self.config;

        let (zoom, pitch_deg) = if terrain.is_high_terrain {
            (cfg.high_terrain_zoom, cfg.high_terrain_pitch_deg)
        } else {
            (cfg.flat_zoom, cfg.flat_pitch_deg)
        };

        let distance_offset_m = (cfg.min_distance_offset_m
            + terrain.roughness * cfg.roughness_offset_gain)
            .clamp(cfg.min_distance_offset_m, cfg.max_distance_offset_m);

        let elevation_offset_m = (cfg.min_elevation_offset_m
            + terrain.roughness * cfg.roughness_elevation_gain)
            .clamp(cfg.min_elevation_offset_m, cfg.max_elevation_offset_m);

        let ground = position.elevation.unwrap_or(terrain.avg_elevation);

        CameraFrame {
            latitude: position.latitude,
            longitude: position.longitude,
            bearing_deg,
            zoom,
            pitch_deg,
            distance_offset_m,
            elevation_m: ground + elevation_offset_m,
        }
    }
}

// ============================================================================
// Tick Sources
// ============================================================================

/// Callback invoked with a host timestamp in milliseconds.
pub type TickCallback = Box<dyn FnMut(f64) + Send>;

/// A cooperative tick scheduling capability supplied by the host.
///
/// The engine never assumes a specific scheduling primitive; a display
/// refresh callback, a fixed-interval timer and a deterministic test clock
/// all fit behind this trait. Hosts must unregister on `stop`/`reset` so no
/// tick executes after the state machine leaves `Running`.
pub trait TickSource {
    /// Install the callback to invoke on each tick.
    fn register(&mut self, callback: TickCallback);

    /// Remove the installed callback; subsequent ticks must not fire.
    fn unregister(&mut self);
}

/// A tick source driven explicitly by the caller.
///
/// Ticks fire only when [`fire`](ManualTickSource::fire) is called, which
/// makes animation behavior fully deterministic in tests and headless hosts.
#[derive(Default)]
pub struct ManualTickSource {
    callback: Option<TickCallback>,
}

impl ManualTickSource {
    /// Create an empty tick source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a callback is currently registered.
    pub fn is_registered(&self) -> bool {
        self.callback.is_some()
    }

    /// Invoke the registered callback with `now_ms`.
    ///
    /// Returns false when nothing is registered.
    pub fn fire(&mut self, now_ms: f64) -> bool {
        match &mut self.callback {
            Some(callback) => {
                callback(now_ms);
                true
            }
            None => false,
        }
    }
}

impl TickSource for ManualTickSource {
    fn register(&mut self, callback: TickCallback) {
        self.callback = Some(callback);
    }

    fn unregister(&mut self) {
        self.callback = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
