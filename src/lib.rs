//! Marble Rush - an endless procedurally-generated marble-rolling game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (path generation, chunk streaming, marble physics)
//! - `settings`: Persisted player preferences
//!
//! Rendering, camera and audio are external collaborators: they consume the
//! path/marble state exposed by `sim` and never reach back into it.

pub mod settings;
pub mod sim;

pub use settings::{ControlScheme, GameMode, Settings};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Reference tick rate; physics constants are tuned per-frame at 60 Hz
    pub const TICK_HZ: f32 = 60.0;
    /// Upper bound on a single frame's delta time (30 fps equivalent).
    /// A backgrounded tab must never turn into one giant integration step.
    pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

    /// Path geometry
    pub const CHUNK_LENGTH: f32 = 200.0;
    pub const POINTS_PER_CHUNK: usize = 50;
    pub const PATH_WIDTH_MAX: f32 = 12.0;
    pub const PATH_WIDTH_MIN: f32 = 6.0;
    /// Per-point heading change = curvature * TURN_GAIN (radians).
    /// Small enough that consecutive steps never fold back at step length.
    pub const TURN_GAIN: f32 = 0.025;
    pub const MIN_ELEVATION: f32 = -18.0;
    pub const MAX_ELEVATION: f32 = 18.0;
    /// Banking roll angle per unit of curvature, clamped to MAX_BANKING
    pub const BANKING_GAIN: f32 = 0.6;
    pub const MAX_BANKING: f32 = 0.5;
    /// Distance over which difficulty ramps from 0 to 1
    pub const DIFFICULTY_DISTANCE: f32 = 4000.0;

    /// Gap generation
    pub const GAP_EDGE_MARGIN_POINTS: usize = 5;
    pub const MIN_SEGMENT_POINTS: usize = 4;

    /// Chunk streaming
    pub const INITIAL_CHUNKS: usize = 3;
    pub const MAX_ACTIVE_CHUNKS: usize = 5;
    pub const CHUNK_LOAD_DISTANCE: f32 = 150.0;
    pub const CHUNK_UNLOAD_DISTANCE: f32 = 100.0;
    /// Chunks generated per forward-check trigger (keeps generation ahead of
    /// consumption even under bursty frame times)
    pub const CHUNK_LOAD_BATCH: usize = 2;
    /// Streaming maintenance runs every N ticks; the load/unload margins
    /// absorb this latency
    pub const STREAM_INTERVAL_TICKS: u64 = 4;

    /// Marble defaults (velocities are world units per frame at 60 Hz)
    pub const MARBLE_RADIUS: f32 = 0.3;
    pub const GRAVITY: f32 = 0.015;
    pub const FALL_GRAVITY_SCALE: f32 = 1.5;
    pub const JUMP_FORCE: f32 = 0.35;
    pub const JUMP_FORWARD_BOOST: f32 = 0.05;
    pub const JUMP_COOLDOWN_SECS: f32 = 0.5;
    pub const GROUND_FRICTION: f32 = 0.95;
    pub const VERTICAL_DAMPING: f32 = 0.8;
    pub const AIR_RESISTANCE: f32 = 0.995;
    pub const MAX_SPEED: f32 = 0.9;
    pub const TERMINAL_VELOCITY: f32 = 1.2;
    pub const ACCELERATION: f32 = 0.02;
    /// Lateral acceleration per frame in auto-forward mode; with ground
    /// friction this settles around 0.38 units/frame of lateral speed
    pub const STEER_ACCELERATION: f32 = 0.02;
    pub const AUTO_FORWARD_SPEED: f32 = 0.45;
    pub const BOUNCE_FACTOR: f32 = 0.3;
    /// Vertical speeds below this after a bounce are zeroed (no micro-bouncing)
    pub const MIN_BOUNCE_SPEED: f32 = 0.02;
    pub const GROUND_EPS: f32 = 0.01;

    /// Checkpoint / fall recovery
    pub const CHECKPOINT_INTERVAL_SECS: f32 = 1.0;
    pub const FALL_TIMEOUT_SECS: f32 = 2.0;
    /// Safety floor; falling past this resets immediately
    pub const FALL_FLOOR_Y: f32 = -80.0;
    /// How far below the local deck the marble must drop (while off every
    /// segment) before the orchestrator triggers a fall
    pub const FALL_TRIGGER_DROP: f32 = 1.0;
}

/// Default forward direction for a fresh path (and for direction-query fallback)
pub const DEFAULT_FORWARD: Vec3 = Vec3::Z;

/// Project a vector onto the horizontal (XZ) plane
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Horizontal distance between two points (the path is queried in plan view)
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(a - b).length()
}

/// Rotate a vector around the vertical (Y) axis
#[inline]
pub fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}
