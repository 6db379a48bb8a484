//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, one stream per generator instance
//! - Single-threaded, driven by the host frame loop
//! - No rendering or platform dependencies

pub mod chunks;
pub mod marble;
pub mod noise;
pub mod path;
pub mod theme;
pub mod tick;

pub use chunks::{ChunkManager, SurfaceSample};
pub use marble::{ControlMode, Marble};
pub use noise::NoiseField;
pub use path::{
    GenerationCursor, PathChunk, PathConfig, PathGenerator, PathPoint, PathSegment, TerrainKind,
    VisualHandle,
};
pub use theme::{DecorInstance, LandscapeTheme};
pub use tick::{TickInput, World, tick};
