//! Procedural path generation
//!
//! A `PathGenerator` turns a seed into an unbounded, deterministic sequence
//! of `PathChunk`s forming one continuous winding ribbon. The generation
//! cursor (position, direction, distance) is carried across chunk
//! boundaries, so chunk N's last point and chunk N+1's first point coincide
//! exactly and the ribbon never visibly seams.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::noise::NoiseField;
use super::theme::DecorInstance;
use crate::consts::*;
use crate::{DEFAULT_FORWARD, horizontal, rotate_y};

/// Biome flavor for a chunk; influences width, gap rate and decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    #[default]
    Meadow,
    Canyon,
    Glacier,
}

impl TerrainKind {
    /// Map a slow terrain-noise value in [-1, 1] to a biome
    pub fn from_noise(v: f32) -> Self {
        if v > 0.3 {
            TerrainKind::Canyon
        } else if v < -0.25 {
            TerrainKind::Glacier
        } else {
            TerrainKind::Meadow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerrainKind::Meadow => "meadow",
            TerrainKind::Canyon => "canyon",
            TerrainKind::Glacier => "glacier",
        }
    }

    /// Base per-point probability of starting a gap (scaled by difficulty)
    pub fn gap_chance(&self) -> f32 {
        match self {
            TerrainKind::Meadow => 0.008,
            TerrainKind::Canyon => 0.03,
            TerrainKind::Glacier => 0.018,
        }
    }

    /// Number of points skipped when a gap opens
    pub fn gap_width_points(&self) -> usize {
        match self {
            TerrainKind::Meadow => 2,
            TerrainKind::Canyon => 4,
            TerrainKind::Glacier => 3,
        }
    }

    /// Width multiplier applied on top of the difficulty-based narrowing
    pub fn width_scale(&self) -> f32 {
        match self {
            TerrainKind::Meadow => 1.0,
            TerrainKind::Canyon => 0.85,
            TerrainKind::Glacier => 0.95,
        }
    }
}

/// A single sample along the ribbon centerline
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathPoint {
    /// Centerline position in world units
    pub position: Vec3,
    /// Full lane width (always > 0)
    pub width: f32,
    /// Roll angle around the forward tangent (radians), from curvature
    pub banking: f32,
    /// Biome tag of the owning chunk
    pub terrain: TerrainKind,
}

/// A contiguous run of point indices `[start, end)` that is walkable.
/// Segments, not raw points, are the collision source of truth once gaps
/// exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub start: usize,
    pub end: usize,
}

impl PathSegment {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Opaque per-chunk handle populated by the rendering collaborator and
/// disposed when the owning chunk unloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// A contiguous unit of generated path; the unit of streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathChunk {
    /// Unique, monotonically assigned by the chunk manager
    pub id: u64,
    /// Ordered centerline samples (points_per_chunk + 1 of them)
    pub points: Vec<PathPoint>,
    /// Walkable partition of `points`; `[0, len)` when no gaps were created
    pub segments: Vec<PathSegment>,
    /// Nominal arc length (config constant)
    pub length: f32,
    /// Biome tag for the whole chunk
    pub terrain: TerrainKind,
    /// Renderer-owned handle, released into the manager's queue on unload
    #[serde(skip)]
    pub visual: Option<VisualHandle>,
    /// Theme decoration owned by (and dropped with) the chunk
    #[serde(skip)]
    pub decor: Vec<DecorInstance>,
}

impl PathChunk {
    pub fn start_position(&self) -> Vec3 {
        self.points[0].position
    }

    pub fn end_position(&self) -> Vec3 {
        self.points[self.points.len() - 1].position
    }

    /// Midpoint used for nearest-chunk queries
    pub fn midpoint(&self) -> Vec3 {
        (self.start_position() + self.end_position()) * 0.5
    }

    /// Index of the point nearest to a world position (plan view)
    pub fn nearest_point_index(&self, position: Vec3) -> usize {
        let mut best = 0;
        let mut best_dist = f32::MAX;
        for (i, point) in self.points.iter().enumerate() {
            let d = crate::horizontal_distance(point.position, position);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }

    /// Whether a point index lies on a walkable segment (not in a gap)
    pub fn point_on_segment(&self, index: usize) -> bool {
        self.segments.iter().any(|s| s.contains(index))
    }
}

/// Sequential-call state threaded across `generate_chunk` calls.
/// Never reset during a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationCursor {
    pub position: Vec3,
    /// Unit horizontal heading
    pub direction: Vec3,
    pub distance_traveled: f32,
    /// 0..1, monotonic in distance
    pub difficulty: f32,
}

impl Default for GenerationCursor {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: DEFAULT_FORWARD,
            distance_traveled: 0.0,
            difficulty: 0.0,
        }
    }
}

/// Startup-time generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub seed: u64,
    pub chunk_length: f32,
    pub points_per_chunk: usize,
    pub turn_gain: f32,
    pub width_max: f32,
    pub width_min: f32,
    /// Raw elevation noise is scaled by this before clamping
    pub elevation_amplitude: f32,
    pub min_elevation: f32,
    pub max_elevation: f32,
    pub difficulty_distance: f32,
    /// Chill mode forces this off: one full-length segment per chunk
    pub gaps_enabled: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_length: CHUNK_LENGTH,
            points_per_chunk: POINTS_PER_CHUNK,
            turn_gain: TURN_GAIN,
            width_max: PATH_WIDTH_MAX,
            width_min: PATH_WIDTH_MIN,
            elevation_amplitude: 22.0,
            min_elevation: MIN_ELEVATION,
            max_elevation: MAX_ELEVATION,
            difficulty_distance: DIFFICULTY_DISTANCE,
            gaps_enabled: true,
        }
    }
}

impl PathConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    #[inline]
    pub fn step_length(&self) -> f32 {
        self.chunk_length / self.points_per_chunk as f32
    }
}

/// Deterministic chunk synthesizer. Same seed, same call order: same path.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    pub config: PathConfig,
    pub cursor: GenerationCursor,
    noise: NoiseField,
    /// Per-instance gap stream; never a shared/global random source
    rng: Pcg32,
}

impl PathGenerator {
    pub fn new(config: PathConfig) -> Self {
        let noise = NoiseField::new(config.seed);
        let rng = Pcg32::seed_from_u64(config.seed ^ 0x6761_7073); // independent of noise streams
        let mut cursor = GenerationCursor::default();
        // Anchor the start height on the elevation field, else the first
        // step of the session opens with a height jump.
        cursor.position.y = (noise.elevation_at(0.0, 0.0) * config.elevation_amplitude)
            .clamp(config.min_elevation, config.max_elevation);
        Self {
            config,
            cursor,
            noise,
            rng,
        }
    }

    /// Synthesize the next chunk of path. Infallible by design: this is the
    /// backbone of the game and must produce a chunk for any cursor state.
    /// The id is bookkeeping only and does not affect geometry.
    pub fn generate_chunk(&mut self, id: u64) -> PathChunk {
        let n = self.config.points_per_chunk;
        let step = self.config.step_length();
        let start = self.cursor.position;
        let terrain = TerrainKind::from_noise(self.noise.terrain_at(start.x, start.z));

        let mut points = Vec::with_capacity(n + 1);
        let first_curvature = self.noise.curvature_at(start.x, start.z);
        points.push(self.make_point(start, first_curvature, terrain));

        for _ in 0..n {
            let p = self.cursor.position;
            let curvature = self.noise.curvature_at(p.x, p.z);
            self.cursor.direction =
                rotate_y(self.cursor.direction, curvature * self.config.turn_gain);

            let mut next = p + self.cursor.direction * step;
            let elevation = self.noise.elevation_at(next.x, next.z)
                * self.config.elevation_amplitude;
            next.y = elevation.clamp(self.config.min_elevation, self.config.max_elevation);
            self.cursor.position = next;

            points.push(self.make_point(next, curvature, terrain));
        }

        let segments = self.build_segments(&points, terrain);

        // Persist a direction consistent with the recent curve trend, not
        // just the final raw step, so the next chunk starts without a kink.
        let tail = 4.min(n);
        let recent = horizontal(points[n].position - points[n - tail].position);
        if recent.length_squared() > 1e-8 {
            let blended = horizontal(self.cursor.direction) + recent.normalize();
            if blended.length_squared() > 1e-8 {
                self.cursor.direction = blended.normalize();
            }
        }

        self.cursor.distance_traveled += self.config.chunk_length;
        self.cursor.difficulty =
            (self.cursor.distance_traveled / self.config.difficulty_distance).min(1.0);

        log::trace!(
            "generated chunk {id} ({} points, {} segments, {})",
            points.len(),
            segments.len(),
            terrain.as_str()
        );

        PathChunk {
            id,
            points,
            segments,
            length: self.config.chunk_length,
            terrain,
            visual: None,
            decor: Vec::new(),
        }
    }

    fn make_point(&self, position: Vec3, curvature: f32, terrain: TerrainKind) -> PathPoint {
        let t = self.cursor.difficulty;
        let width =
            (self.config.width_max + (self.config.width_min - self.config.width_max) * t)
                * terrain.width_scale();
        let banking = (curvature * BANKING_GAIN).clamp(-MAX_BANKING, MAX_BANKING);
        PathPoint {
            position,
            width,
            banking,
            terrain,
        }
    }

    /// Partition points into walkable runs, opening gaps probabilistically.
    /// Gaps never start inside the edge margins, never leave a run shorter
    /// than the minimum stable length, and never eat into the far margin.
    fn build_segments(&mut self, points: &[PathPoint], terrain: TerrainKind) -> Vec<PathSegment> {
        let len = points.len();
        if !self.config.gaps_enabled || len <= 2 * GAP_EDGE_MARGIN_POINTS {
            return vec![PathSegment::new(0, len)];
        }

        let chance = terrain.gap_chance() * self.cursor.difficulty;
        let gap_width = terrain.gap_width_points();
        let mut segments = Vec::new();
        let mut run_start = 0;
        let mut i = GAP_EDGE_MARGIN_POINTS;
        while i < len - GAP_EDGE_MARGIN_POINTS {
            let roll: f32 = self.rng.random();
            if roll < chance
                && i - run_start > MIN_SEGMENT_POINTS
                && i + gap_width <= len - GAP_EDGE_MARGIN_POINTS
            {
                segments.push(PathSegment::new(run_start, i));
                i += gap_width;
                run_start = i;
            } else {
                i += 1;
            }
        }
        segments.push(PathSegment::new(run_start, len));
        segments
    }
}
