//! Landscape themes
//!
//! A theme decides how the world reads: path surface colors, backdrop, and
//! the decorative props scattered alongside the ribbon. Decoration is pure
//! data; the renderer decides what a `DecorKind` looks like. Themes are
//! stateless statics so chunks can hold plain references.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use super::path::PathPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorKind {
    Tree,
    Boulder,
    Asteroid,
    Crystal,
}

/// One prop placed next to the path, owned by its chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecorInstance {
    pub kind: DecorKind,
    pub position: Vec3,
    pub scale: f32,
    pub rotation_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStyle {
    pub surface_color: [f32; 3],
    pub edge_color: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backdrop {
    pub sky_top: [f32; 3],
    pub sky_bottom: [f32; 3],
    pub fog_density: f32,
}

pub trait LandscapeTheme: Sync {
    fn name(&self) -> &'static str;
    fn path_style(&self) -> PathStyle;
    fn backdrop(&self) -> Backdrop;
    /// Scatter props along a chunk's centerline. The rng is seeded per chunk
    /// by the caller, so placement is deterministic and independent of
    /// generation order.
    fn decorate(&self, points: &[PathPoint], rng: &mut Pcg32) -> Vec<DecorInstance>;
}

/// Sideways unit vector at a centerline point, from its local direction
fn side_at(points: &[PathPoint], index: usize) -> Vec3 {
    let delta = if index + 1 < points.len() {
        points[index + 1].position - points[index].position
    } else if index > 0 {
        points[index].position - points[index - 1].position
    } else {
        crate::DEFAULT_FORWARD
    };
    let forward = crate::horizontal(delta)
        .try_normalize()
        .unwrap_or(crate::DEFAULT_FORWARD);
    Vec3::Y.cross(forward)
}

/// Place a prop beside a point, outside the rollable lane
fn beside(points: &[PathPoint], index: usize, rng: &mut Pcg32, lift: f32) -> Vec3 {
    let point = &points[index];
    let sign = if rng.random::<f32>() < 0.5 { -1.0 } else { 1.0 };
    let offset = point.width * 0.5 + 2.0 + rng.random::<f32>() * 6.0;
    point.position + side_at(points, index) * (sign * offset) + Vec3::Y * lift
}

pub struct MountainTheme;

impl LandscapeTheme for MountainTheme {
    fn name(&self) -> &'static str {
        "mountain"
    }

    fn path_style(&self) -> PathStyle {
        PathStyle {
            surface_color: [0.42, 0.36, 0.30],
            edge_color: [0.25, 0.20, 0.16],
        }
    }

    fn backdrop(&self) -> Backdrop {
        Backdrop {
            sky_top: [0.35, 0.55, 0.85],
            sky_bottom: [0.75, 0.85, 0.95],
            fog_density: 0.008,
        }
    }

    fn decorate(&self, points: &[PathPoint], rng: &mut Pcg32) -> Vec<DecorInstance> {
        let mut decor = Vec::new();
        for index in 0..points.len() {
            if rng.random::<f32>() >= 0.15 {
                continue;
            }
            let kind = if rng.random::<f32>() < 0.7 {
                DecorKind::Tree
            } else {
                DecorKind::Boulder
            };
            decor.push(DecorInstance {
                kind,
                position: beside(points, index, rng, 0.0),
                scale: 0.8 + rng.random::<f32>() * 0.9,
                rotation_y: rng.random::<f32>() * std::f32::consts::TAU,
            });
        }
        decor
    }
}

pub struct SpaceTheme;

impl LandscapeTheme for SpaceTheme {
    fn name(&self) -> &'static str {
        "space"
    }

    fn path_style(&self) -> PathStyle {
        PathStyle {
            surface_color: [0.12, 0.10, 0.22],
            edge_color: [0.45, 0.30, 0.85],
        }
    }

    fn backdrop(&self) -> Backdrop {
        Backdrop {
            sky_top: [0.01, 0.01, 0.04],
            sky_bottom: [0.06, 0.03, 0.12],
            fog_density: 0.002,
        }
    }

    fn decorate(&self, points: &[PathPoint], rng: &mut Pcg32) -> Vec<DecorInstance> {
        let mut decor = Vec::new();
        for index in 0..points.len() {
            if rng.random::<f32>() >= 0.08 {
                continue;
            }
            let (kind, lift) = if rng.random::<f32>() < 0.6 {
                // Asteroids drift above and below the ribbon.
                (DecorKind::Asteroid, rng.random::<f32>() * 16.0 - 8.0)
            } else {
                (DecorKind::Crystal, 0.0)
            };
            decor.push(DecorInstance {
                kind,
                position: beside(points, index, rng, lift),
                scale: 0.5 + rng.random::<f32>() * 1.5,
                rotation_y: rng.random::<f32>() * std::f32::consts::TAU,
            });
        }
        decor
    }
}

static MOUNTAIN: MountainTheme = MountainTheme;
static SPACE: SpaceTheme = SpaceTheme;

pub fn default_theme() -> &'static dyn LandscapeTheme {
    &MOUNTAIN
}

pub fn by_name(name: &str) -> Option<&'static dyn LandscapeTheme> {
    match name {
        "mountain" => Some(&MOUNTAIN),
        "space" => Some(&SPACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::path::{PathConfig, PathGenerator};
    use rand::SeedableRng;

    fn sample_points() -> Vec<PathPoint> {
        let mut generator = PathGenerator::new(PathConfig::with_seed(5));
        generator.generate_chunk(0).points
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("mountain").unwrap().name(), "mountain");
        assert_eq!(by_name("space").unwrap().name(), "space");
        assert!(by_name("underwater").is_none());
    }

    #[test]
    fn test_decoration_deterministic() {
        let points = sample_points();
        let a = MOUNTAIN.decorate(&points, &mut Pcg32::seed_from_u64(99));
        let b = MOUNTAIN.decorate(&points, &mut Pcg32::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_decoration_stays_off_the_lane() {
        let points = sample_points();
        let decor = MOUNTAIN.decorate(&points, &mut Pcg32::seed_from_u64(1));
        assert!(!decor.is_empty());
        for instance in &decor {
            let clearance = points
                .iter()
                .map(|p| crate::horizontal_distance(p.position, instance.position) - p.width * 0.5)
                .fold(f32::INFINITY, f32::min);
            assert!(clearance > 0.0, "prop inside the lane: {instance:?}");
        }
    }
}
