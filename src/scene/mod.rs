//! Scenes: animated visualizers driven by the shared feature snapshot.
//!
//! Every scene keeps a persistent entity pool that is rebuilt when the
//! surface size changes and mutated in place on every tick.

pub mod geometric;
pub mod palette;
pub mod particles;
pub mod renderer;
pub mod surface;
pub mod terrain;

use clap::ValueEnum;
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::audio::FeatureSnapshot;

pub use geometric::GeometricLayers;
pub use palette::{Palette, Theme};
pub use particles::ParticleField;
pub use renderer::{Renderer, RendererState};
pub use surface::{Surface, SurfaceSize};
pub use terrain::Terrain;

/// Visualizer variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    #[default]
    Particles,
    Geometric,
    #[value(name = "dream3d")]
    Dream3d,
}

impl SceneKind {
    pub const ALL: [SceneKind; 3] = [SceneKind::Particles, SceneKind::Geometric, SceneKind::Dream3d];

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Particles => "Particles",
            SceneKind::Geometric => "Geometric",
            SceneKind::Dream3d => "Dream 3D",
        }
    }

    pub fn next(self) -> SceneKind {
        let i = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// Fresh scene with an empty pool.
    pub fn build(self) -> Box<dyn Scene> {
        match self {
            SceneKind::Particles => Box::new(ParticleField::new()),
            SceneKind::Geometric => Box::new(GeometricLayers::new()),
            SceneKind::Dream3d => Box::new(Terrain::new(terrain::NOISE_SEED)),
        }
    }
}

/// One visualizer variant with its own persistent state.
pub trait Scene {
    fn kind(&self) -> SceneKind;

    /// Discard the entity pool and build one sized for `size`.
    fn reset(&mut self, size: SurfaceSize, rng: &mut StdRng);

    /// Advance one tick and draw onto `surface`.
    fn draw(&mut self, surface: &mut dyn Surface, snapshot: &FeatureSnapshot, palette: &Palette);

    /// Entities currently in the pool.
    fn entity_count(&self) -> usize;
}
