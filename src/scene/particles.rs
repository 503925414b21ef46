//! Particle field: drifting glyphs whose size and speed follow their own
//! spectrum bin.

use std::f64::consts::TAU;

use glam::{DAffine2, DVec2};
use rand::rngs::StdRng;
use rand::Rng;

use super::palette::{pick, Palette};
use super::surface::{Fill, Path, Surface, SurfaceSize};
use super::{Scene, SceneKind};
use crate::audio::FeatureSnapshot;

/// Surface area (in virtual pixels) per particle.
pub const AREA_PER_PARTICLE: f64 = 6000.0;

const GLOW: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: DVec2,
    pub size: f64,
    pub velocity: DVec2,
    /// Palette slot, resolved against the theme at draw time.
    pub color: usize,
    pub rotation: f64,
    pub rotation_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleShape {
    Triangle,
    Square,
    Circle,
}

impl ParticleShape {
    pub fn for_index(index: usize) -> Self {
        match index % 3 {
            0 => ParticleShape::Triangle,
            1 => ParticleShape::Square,
            _ => ParticleShape::Circle,
        }
    }

    /// Outline centred on the origin.
    fn path(self, size: f64) -> Path {
        match self {
            ParticleShape::Triangle => Path::new()
                .move_to(DVec2::new(0.0, -size))
                .line_to(DVec2::new(size, size))
                .line_to(DVec2::new(-size, size))
                .close(),
            ParticleShape::Square => {
                Path::new().rect(DVec2::splat(-size / 2.0), size, size)
            }
            ParticleShape::Circle => Path::new().arc(DVec2::ZERO, size / 2.0),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
    bounds: Option<SurfaceSize>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn spawn(size: SurfaceSize, rng: &mut StdRng) -> Particle {
        Particle {
            position: DVec2::new(
                rng.random::<f64>() * size.width,
                rng.random::<f64>() * size.height,
            ),
            size: rng.random::<f64>() * 4.0 + 2.0,
            velocity: DVec2::new(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5),
            color: rng.random_range(0..5),
            rotation: rng.random::<f64>() * TAU,
            rotation_speed: (rng.random::<f64>() - 0.5) * 0.02,
        }
    }
}

/// Wrap `value` to the opposite edge once it is fully outside `[0, extent]`.
fn wrap(value: f64, margin: f64, extent: f64) -> f64 {
    if value < -margin {
        extent + margin
    } else if value > extent + margin {
        -margin
    } else {
        value
    }
}

impl Scene for ParticleField {
    fn kind(&self) -> SceneKind {
        SceneKind::Particles
    }

    fn reset(&mut self, size: SurfaceSize, rng: &mut StdRng) {
        let count = (size.area() / AREA_PER_PARTICLE).floor().max(0.0) as usize;
        self.particles.clear();
        self.particles.reserve(count);
        for _ in 0..count {
            self.particles.push(Self::spawn(size, rng));
        }
        self.bounds = Some(size);
    }

    fn draw(&mut self, surface: &mut dyn Surface, snapshot: &FeatureSnapshot, palette: &Palette) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let active = snapshot.is_active();
        let total = self.particles.len();

        for (i, p) in self.particles.iter_mut().enumerate() {
            let influence = f64::from(snapshot.bin_at_fraction(i, total)) / 255.0;
            let (size_mod, speed_mod, spin_mod) = if active {
                (1.0 + influence * 2.0, 1.0 + influence * 1.5, 1.0 + influence)
            } else {
                (1.0, 1.0, 1.0)
            };
            let size = p.size * size_mod;

            let transform = DAffine2::from_angle_translation(p.rotation, p.position);
            let path = ParticleShape::for_index(i).path(size).transformed(&transform);
            surface.fill(
                &path,
                Fill {
                    color: pick(palette, p.color),
                    glow: GLOW * size_mod,
                },
            );

            p.position += p.velocity * speed_mod;
            p.rotation += p.rotation_speed * spin_mod;
            p.position.x = wrap(p.position.x, size, bounds.width);
            p.position.y = wrap(p.position.y, size, bounds.height);
        }
    }

    fn entity_count(&self) -> usize {
        self.particles.len()
    }
}
