//! Chunk streaming manager
//!
//! Owns the resident set of path chunks and keeps it bounded: chunks are
//! generated ahead of the marble before the runway gets short, unloaded once
//! they are safely behind, and hard-capped so memory and rendering cost stay
//! flat over an infinite run. Also answers the spatial queries the
//! orchestrator needs each tick (nearest chunk, surface height, direction).

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::path::{PathChunk, PathGenerator, VisualHandle};
use super::theme::LandscapeTheme;
use crate::DEFAULT_FORWARD;
use crate::consts::*;

/// What the path looks like underneath a world position
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    /// True when the position is over a walkable segment (within lane width,
    /// not in a gap). A missing chunk reports false, same as a gap.
    pub on_path: bool,
    /// Height of the nearest centerline point, valid even off-path (used to
    /// judge how far the marble has dropped below the deck)
    pub height: f32,
    /// Forward direction of the path at the nearest point
    pub direction: Vec3,
}

impl SurfaceSample {
    fn no_ground() -> Self {
        Self {
            on_path: false,
            height: 0.0,
            direction: DEFAULT_FORWARD,
        }
    }
}

/// Lifecycle manager for generated path chunks.
///
/// Tuning invariant (held by configuration, not enforced at runtime):
/// `MAX_ACTIVE_CHUNKS * CHUNK_LENGTH >= CHUNK_LOAD_DISTANCE +
/// CHUNK_UNLOAD_DISTANCE`, else the cap could evict a chunk the marble is
/// still on. Asserted in debug builds only.
pub struct ChunkManager {
    generator: PathGenerator,
    /// Resident chunks, ordered by id (generation order = travel order)
    chunks: Vec<PathChunk>,
    next_id: u64,
    theme: Option<&'static dyn LandscapeTheme>,
    /// Visual handles of unloaded chunks, drained by the renderer
    released: Vec<VisualHandle>,
}

impl ChunkManager {
    pub fn new(generator: PathGenerator) -> Self {
        Self {
            generator,
            chunks: Vec::new(),
            next_id: 0,
            theme: None,
            released: Vec::new(),
        }
    }

    pub fn with_theme(generator: PathGenerator, theme: &'static dyn LandscapeTheme) -> Self {
        let mut manager = Self::new(generator);
        manager.theme = Some(theme);
        manager
    }

    /// Generate the initial burst of chunks. Must be called once before the
    /// first physics tick.
    pub fn initialize(&mut self) {
        debug_assert!(
            MAX_ACTIVE_CHUNKS as f32 * CHUNK_LENGTH
                >= CHUNK_LOAD_DISTANCE + CHUNK_UNLOAD_DISTANCE,
            "chunk cap too small for the configured load/unload margins"
        );
        for _ in 0..INITIAL_CHUNKS {
            self.spawn_chunk();
        }
        log::info!(
            "chunk manager initialized: {} chunks, seed {}",
            self.chunks.len(),
            self.generator.config.seed
        );
    }

    /// Three-phase streaming maintenance. Runs after physics each tick (or
    /// at a reduced cadence; the load/unload margins absorb the latency).
    pub fn update(&mut self, marble_position: Vec3) {
        // Forward check: extend the runway before the marble can see its end.
        let furthest_end = self
            .chunks
            .iter()
            .map(|c| c.end_position().distance(marble_position))
            .fold(0.0, f32::max);
        if furthest_end < CHUNK_LOAD_DISTANCE {
            // A batch, not a single chunk: keeps generation strictly ahead
            // of consumption even under bursty frame times.
            for _ in 0..CHUNK_LOAD_BATCH {
                self.spawn_chunk();
            }
        }

        // Backward check: drop chunks fully behind the marble.
        if let Some(nearest_id) = self.chunk_at(marble_position).map(|c| c.id) {
            let resident = std::mem::take(&mut self.chunks);
            for chunk in resident {
                let behind = chunk.id < nearest_id;
                let far = chunk.start_position().distance(marble_position)
                    > CHUNK_UNLOAD_DISTANCE
                    && chunk.end_position().distance(marble_position) > CHUNK_UNLOAD_DISTANCE;
                if behind && far {
                    self.release(chunk);
                } else {
                    self.chunks.push(chunk);
                }
            }
        }

        // Memory cap: evict oldest first. Chunks are consumed in travel
        // order, so the smallest id is always the most expendable.
        while self.chunks.len() > MAX_ACTIVE_CHUNKS {
            let chunk = self.chunks.remove(0);
            self.release(chunk);
        }
    }

    fn spawn_chunk(&mut self) {
        let id = self.next_id;
        self.next_id += 1;
        let mut chunk = self.generator.generate_chunk(id);
        if let Some(theme) = self.theme {
            // Decoration is deterministic per chunk and owned by it.
            let mut rng =
                Pcg32::seed_from_u64(self.generator.config.seed ^ id.wrapping_mul(0x9e37_79b9));
            chunk.decor = theme.decorate(&chunk.points, &mut rng);
        }
        self.chunks.push(chunk);
    }

    /// Release everything a chunk owns before dropping it; the renderer
    /// drains the handle queue and disposes its side.
    fn release(&mut self, mut chunk: PathChunk) {
        if let Some(handle) = chunk.visual.take() {
            self.released.push(handle);
        }
        log::debug!("unloaded chunk {} ({} decor)", chunk.id, chunk.decor.len());
    }

    /// Resident chunk whose midpoint is nearest the position. None only
    /// before `initialize`.
    pub fn chunk_at(&self, position: Vec3) -> Option<&PathChunk> {
        self.chunks.iter().min_by(|a, b| {
            let da = a.midpoint().distance_squared(position);
            let db = b.midpoint().distance_squared(position);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Forward direction of the path nearest a position, with a fixed
    /// fallback when no chunk or too few points exist
    pub fn path_direction_at(&self, position: Vec3) -> Vec3 {
        let Some(chunk) = self.chunk_at(position) else {
            return DEFAULT_FORWARD;
        };
        Self::direction_at_point(chunk, chunk.nearest_point_index(position))
    }

    fn direction_at_point(chunk: &PathChunk, index: usize) -> Vec3 {
        let points = &chunk.points;
        if points.len() < 2 {
            return DEFAULT_FORWARD;
        }
        let delta = if index + 1 < points.len() {
            points[index + 1].position - points[index].position
        } else {
            points[index].position - points[index - 1].position
        };
        delta.try_normalize().unwrap_or(DEFAULT_FORWARD)
    }

    /// Resolve the ground under a position against chunk segments (the
    /// collision source of truth, not the raw point list)
    pub fn sample_surface(&self, position: Vec3) -> SurfaceSample {
        let Some(chunk) = self.chunk_at(position) else {
            return SurfaceSample::no_ground();
        };
        let index = chunk.nearest_point_index(position);
        let point = &chunk.points[index];
        let lateral = crate::horizontal_distance(point.position, position);
        let on_path =
            lateral <= point.width * 0.5 + MARBLE_RADIUS && chunk.point_on_segment(index);
        SurfaceSample {
            on_path,
            height: point.position.y,
            direction: Self::direction_at_point(chunk, index),
        }
    }

    /// Read-only snapshot for collaborators (renderer, start placement)
    pub fn active_chunks(&self) -> &[PathChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Renderer attaches its handle once it has built geometry for a chunk
    pub fn attach_visual(&mut self, id: u64, handle: VisualHandle) -> bool {
        if let Some(chunk) = self.chunks.iter_mut().find(|c| c.id == id) {
            chunk.visual = Some(handle);
            true
        } else {
            false
        }
    }

    /// Drain the handles of chunks unloaded since the last call
    pub fn take_released(&mut self) -> Vec<VisualHandle> {
        std::mem::take(&mut self.released)
    }

    pub fn generator(&self) -> &PathGenerator {
        &self.generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::path::PathConfig;
    use crate::sim::theme;

    fn manager(seed: u64) -> ChunkManager {
        ChunkManager::new(PathGenerator::new(PathConfig::with_seed(seed)))
    }

    /// Reference centerline from an identical generator (same seed, same
    /// call order, so ids and geometry match the manager's chunks)
    fn route(seed: u64, chunks: usize) -> Vec<Vec3> {
        let mut generator = PathGenerator::new(PathConfig::with_seed(seed));
        let mut route = Vec::new();
        for id in 0..chunks as u64 {
            let chunk = generator.generate_chunk(id);
            route.extend(chunk.points.iter().map(|p| p.position));
        }
        route
    }

    #[test]
    fn test_initialize_burst() {
        let mut manager = manager(42);
        assert!(manager.is_empty());
        manager.initialize();
        assert_eq!(manager.len(), INITIAL_CHUNKS);
    }

    #[test]
    fn test_streaming_bound_and_runway() {
        let mut manager = manager(42);
        manager.initialize();

        for position in route(42, 25) {
            manager.update(position);
            assert!(manager.len() <= MAX_ACTIVE_CHUNKS, "cap exceeded");

            // The marble's own chunk is always resident, and once the runway
            // shortens the newest chunk end moves back out of load range.
            let nearest = manager.chunk_at(position).expect("no resident chunk").id;
            let max_id = manager.active_chunks().iter().map(|c| c.id).max().unwrap();
            assert!(max_id >= nearest);
            let newest_end = manager
                .active_chunks()
                .iter()
                .max_by_key(|c| c.id)
                .unwrap()
                .end_position();
            assert!(
                newest_end.distance(position) >= CHUNK_LOAD_DISTANCE * 0.5,
                "runway collapsed near chunk {nearest}"
            );
        }
    }

    #[test]
    fn test_sample_on_centerline() {
        let mut manager = manager(7);
        manager.initialize();
        let point = manager.active_chunks()[0].points[10];

        let sample = manager.sample_surface(point.position);
        assert!(sample.on_path);
        assert_eq!(sample.height, point.position.y);
        assert!(sample.direction.length() > 0.99);
    }

    #[test]
    fn test_sample_off_path_laterally() {
        let mut manager = manager(7);
        manager.initialize();
        let chunk = &manager.active_chunks()[0];
        let point = chunk.points[10];
        let direction = ChunkManager::direction_at_point(chunk, 10);
        let side = glam::Vec3::Y.cross(direction).normalize();

        let sample = manager.sample_surface(point.position + side * (point.width * 2.0));
        assert!(!sample.on_path);
    }

    #[test]
    fn test_missing_chunk_is_no_ground() {
        let manager = manager(1);
        // Before initialize there are no chunks: treated as a gap, not an error.
        let sample = manager.sample_surface(glam::Vec3::ZERO);
        assert!(!sample.on_path);
        assert_eq!(manager.path_direction_at(glam::Vec3::ZERO), DEFAULT_FORWARD);
    }

    #[test]
    fn test_eviction_releases_visuals() {
        let mut manager = manager(42);
        manager.initialize();
        let first_id = manager.active_chunks()[0].id;
        assert!(manager.attach_visual(first_id, VisualHandle(77)));

        for position in route(42, 25) {
            manager.update(position);
        }
        let released = manager.take_released();
        assert!(released.contains(&VisualHandle(77)), "handle not released");
        assert!(manager.take_released().is_empty(), "queue should drain");
        assert!(
            manager.active_chunks().iter().all(|c| c.id != first_id),
            "first chunk should have been unloaded"
        );
    }

    #[test]
    fn test_theme_decoration_owned_by_chunks() {
        let generator = PathGenerator::new(PathConfig::with_seed(9));
        let mut manager =
            ChunkManager::with_theme(generator, theme::by_name("mountain").unwrap());
        manager.initialize();
        let total: usize = manager.active_chunks().iter().map(|c| c.decor.len()).sum();
        assert!(total > 0, "mountain theme should decorate the initial burst");
    }

    #[test]
    fn test_update_before_initialize_spawns_runway() {
        // A missing initialize call must not wedge the manager; the forward
        // check sees zero runway and starts generating.
        let mut manager = manager(3);
        manager.update(glam::Vec3::ZERO);
        assert!(!manager.is_empty());
    }
}
