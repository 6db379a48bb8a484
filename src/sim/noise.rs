//! Seeded scalar noise fields for path curvature, elevation and terrain
//!
//! World-position-keyed by design: every value is a pure function of the
//! seed and a world (x, z) coordinate, so re-querying the same location
//! yields the same value regardless of path history. Integer lattice hashing
//! plus smooth interpolation keeps the output bit-stable across platforms
//! (no trig, no platform-dependent intrinsics).

/// Derive an independent sub-seed for a purpose (curvature vs elevation vs
/// terrain) so the streams never correlate.
#[inline]
fn derive_seed(seed: u64, purpose: u64) -> u64 {
    let mut h = seed ^ purpose;
    h = h.wrapping_mul(0x517c_c1b7_2722_0a95);
    h ^= h >> 32;
    h
}

/// Hash a lattice corner to a value in [-1, 1] (splitmix64 finalizer)
#[inline]
fn lattice_hash(seed: u64, xi: i64, zi: i64) -> f32 {
    let mut h = seed
        ^ (xi as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ (zi as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^= h >> 31;
    // Top 24 bits -> [-1, 1]
    ((h >> 40) as f32 / (1u64 << 23) as f32) - 1.0
}

/// Quintic fade curve (C2-continuous across lattice cells)
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// 2D value noise over a hashed integer lattice, output in [-1, 1]
#[derive(Debug, Clone, Copy)]
pub struct ValueNoise2 {
    seed: u64,
}

impl ValueNoise2 {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Sample the noise at lattice coordinates
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let xf = x.floor();
        let zf = z.floor();
        let xi = xf as i64;
        let zi = zf as i64;
        let tx = fade(x - xf);
        let tz = fade(z - zf);

        let c00 = lattice_hash(self.seed, xi, zi);
        let c10 = lattice_hash(self.seed, xi + 1, zi);
        let c01 = lattice_hash(self.seed, xi, zi + 1);
        let c11 = lattice_hash(self.seed, xi + 1, zi + 1);

        let x0 = c00 + (c10 - c00) * tx;
        let x1 = c01 + (c11 - c01) * tx;
        x0 + (x1 - x0) * tz
    }

    /// Octaved sample: large/medium/small spatial frequencies summed with
    /// decreasing amplitude, normalized back to [-1, 1]
    pub fn octaved(
        &self,
        x: f32,
        z: f32,
        octaves: u32,
        base_frequency: f32,
        persistence: f32,
        lacunarity: f32,
    ) -> f32 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut frequency = base_frequency;
        for _ in 0..octaves {
            sum += self.sample(x * frequency, z * frequency) * amplitude;
            total += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }
        sum / total
    }
}

/// The scalar fields the path generator reads: curvature steers the ribbon,
/// elevation shapes its height profile, terrain picks the biome flavor.
#[derive(Debug, Clone, Copy)]
pub struct NoiseField {
    curvature: ValueNoise2,
    elevation: ValueNoise2,
    terrain: ValueNoise2,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        Self {
            curvature: ValueNoise2::new(derive_seed(seed, 1)),
            elevation: ValueNoise2::new(derive_seed(seed, 2)),
            terrain: ValueNoise2::new(derive_seed(seed, 3)),
        }
    }

    /// Curvature scalar in [-1, 1] at a world position. Three octaves so the
    /// winding never reads as a single repeating sine.
    pub fn curvature_at(&self, x: f32, z: f32) -> f32 {
        self.curvature.octaved(x, z, 3, 0.004, 0.5, 3.0)
    }

    /// Elevation scalar in [-1, 1] at a world position (caller scales and
    /// clamps to the configured band)
    pub fn elevation_at(&self, x: f32, z: f32) -> f32 {
        self.elevation.octaved(x, z, 3, 0.0025, 0.5, 3.0)
    }

    /// Slow-varying terrain selector in [-1, 1]; one biome region spans many
    /// chunks
    pub fn terrain_at(&self, x: f32, z: f32) -> f32 {
        self.terrain.sample(x * 0.0008, z * 0.0008)
    }
}
