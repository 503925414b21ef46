//! Geometric layers: concentric outlines whose count follows the volume.

use std::f64::consts::PI;

use glam::{DAffine2, DVec2};
use rand::rngs::StdRng;

use super::palette::{pick, Palette};
use super::surface::{Path, Stroke, StrokePaint, Surface, SurfaceSize};
use super::{Scene, SceneKind};
use crate::audio::FeatureSnapshot;

pub const MIN_LAYERS: usize = 5;
pub const MAX_LAYERS: usize = 15;

const TIME_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerShape {
    Pentagon,
    Hexagon,
    Star,
}

impl LayerShape {
    pub fn for_index(index: usize) -> Self {
        match index % 3 {
            0 => LayerShape::Pentagon,
            1 => LayerShape::Hexagon,
            _ => LayerShape::Star,
        }
    }

    fn path(self, size: f64) -> Path {
        match self {
            LayerShape::Pentagon => Path::polygon(DVec2::ZERO, size, 5),
            LayerShape::Hexagon => Path::polygon(DVec2::ZERO, size, 6),
            LayerShape::Star => Path::star(DVec2::ZERO, size, size * 0.5, 8),
        }
    }
}

/// Per-tick layout of one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub shape: LayerShape,
    pub size: f64,
    pub rotation: f64,
    pub line_width: f64,
    pub glow: f64,
    pub color: usize,
}

/// Number of layers drawn for a snapshot.
pub fn layer_count(snapshot: &FeatureSnapshot) -> usize {
    if snapshot.is_active() {
        let n = (MIN_LAYERS as f64 + f64::from(snapshot.volume) * 10.0).floor() as usize;
        n.clamp(MIN_LAYERS, MAX_LAYERS)
    } else {
        MIN_LAYERS
    }
}

#[derive(Debug)]
pub struct GeometricLayers {
    layers: Vec<Layer>,
    bounds: Option<SurfaceSize>,
    time: f64,
}

impl GeometricLayers {
    pub fn new() -> Self {
        Self {
            layers: Vec::with_capacity(MAX_LAYERS),
            bounds: None,
            time: 0.0,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    fn layout(&mut self, bounds: SurfaceSize, snapshot: &FeatureSnapshot) {
        let active = snapshot.is_active();
        let count = layer_count(snapshot);
        let base = bounds.min_side() * 0.3;

        self.layers.clear();
        for i in 0..count {
            let norm = f64::from(snapshot.bin_at_fraction(i, count)) / 255.0;
            let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
            let pulse = if active { 0.5 + norm * 0.5 } else { 1.0 };
            let mut rotation = self.time * direction * 0.2;
            if active {
                rotation += norm * PI;
            }
            self.layers.push(Layer {
                shape: LayerShape::for_index(i),
                size: base * (1.0 - i as f64 / count as f64) * pulse,
                rotation,
                line_width: 2.0 + norm * 3.0,
                glow: 15.0 * if active { 0.5 + norm * 0.5 } else { 0.5 },
                color: i % 5,
            });
        }
    }
}

impl Default for GeometricLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for GeometricLayers {
    fn kind(&self) -> SceneKind {
        SceneKind::Geometric
    }

    fn reset(&mut self, size: SurfaceSize, _rng: &mut StdRng) {
        self.layers.clear();
        self.bounds = Some(size);
        self.time = 0.0;
    }

    fn draw(&mut self, surface: &mut dyn Surface, snapshot: &FeatureSnapshot, palette: &Palette) {
        let Some(bounds) = self.bounds else {
            return;
        };
        self.layout(bounds, snapshot);

        let center = bounds.center();
        for layer in &self.layers {
            let transform = DAffine2::from_angle_translation(layer.rotation, center);
            let path = layer.shape.path(layer.size).transformed(&transform);
            surface.stroke(
                &path,
                &Stroke {
                    paint: StrokePaint::Solid(pick(palette, layer.color)),
                    width: layer.line_width,
                    alpha: 1.0,
                    glow: layer.glow,
                },
            );
        }
        self.time += TIME_STEP;
    }

    fn entity_count(&self) -> usize {
        self.layers.len()
    }
}
