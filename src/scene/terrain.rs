//! Pseudo-3D terrain: a perspective grid displaced by Perlin noise and the
//! spectrum, slowly rolling with the treble.

use glam::{DAffine2, DVec2};
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;

use super::palette::{pick, Palette};
use super::surface::{Fill, LinearGradient, Path, Stroke, StrokePaint, Surface, SurfaceSize};
use super::{Scene, SceneKind};
use crate::audio::FeatureSnapshot;

/// Spacing between grid points in virtual pixels.
pub const GRID_SIZE: f64 = 20.0;

/// Seed for the terrain noise field.
pub const NOISE_SEED: u32 = 0x5eed;

const HEIGHT_SCALE: f64 = 50.0;
const LINE_ALPHA: f64 = 0.3;
const POINT_GLOW: f64 = 10.0;

/// Deterministic smooth noise over three coordinates, in roughly [-1, 1].
#[derive(Clone)]
pub struct TerrainNoise {
    perlin: Perlin,
}

impl TerrainNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self.perlin.get([x, y, z])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    Diamond,
    Circle,
    Square,
}

impl CellShape {
    pub fn for_cell(x: i32, y: i32) -> Self {
        match (x + y).rem_euclid(3) {
            0 => CellShape::Diamond,
            1 => CellShape::Circle,
            _ => CellShape::Square,
        }
    }

    fn path(self, center: DVec2, size: f64) -> Path {
        match self {
            CellShape::Diamond => Path::new()
                .move_to(center + DVec2::new(0.0, -size))
                .line_to(center + DVec2::new(size, 0.0))
                .line_to(center + DVec2::new(0.0, size))
                .line_to(center + DVec2::new(-size, 0.0))
                .close(),
            CellShape::Circle => Path::new().arc(center, size),
            CellShape::Square => Path::new().rect(center - DVec2::splat(size / 2.0), size, size),
        }
    }
}

/// One grid point, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainCell {
    pub x: i32,
    pub y: i32,
    /// Noise remapped to [0, 1].
    pub noise: f64,
    pub audio: f64,
    pub height: f64,
    /// Position before rotation, relative to the surface centre.
    pub screen: DVec2,
    pub color: usize,
}

impl TerrainCell {
    fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            noise: 0.0,
            audio: 0.0,
            height: 0.0,
            screen: DVec2::ZERO,
            color: 0,
        }
    }

    fn point_size(&self) -> f64 {
        2.0 + self.audio * 8.0
    }
}

pub struct Terrain {
    cells: Vec<TerrainCell>,
    cols: i32,
    rows: i32,
    bounds: Option<SurfaceSize>,
    time: f64,
    noise: TerrainNoise,
}

impl Terrain {
    pub fn new(seed: u32) -> Self {
        Self {
            cells: Vec::new(),
            cols: 0,
            rows: 0,
            bounds: None,
            time: 0.0,
            noise: TerrainNoise::new(seed),
        }
    }

    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    pub fn grid(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }

    pub fn heights(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.height).collect()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let col = x + self.cols / 2;
        let row = y + self.rows / 2;
        if col < 0 || row < 0 || col >= self.cols || row >= self.rows {
            return None;
        }
        Some((row * self.cols + col) as usize)
    }

    /// Recompute every cell from the noise field and the snapshot.
    fn update_cells(&mut self, snapshot: &FeatureSnapshot) {
        let active = snapshot.is_active();
        let len = snapshot.len() as i32;
        let cols = f64::from(self.cols);
        let rows = f64::from(self.rows);
        let nz = self.time * 0.1;

        for cell in &mut self.cells {
            let (x, y) = (f64::from(cell.x), f64::from(cell.y));
            cell.noise = self.noise.sample(x / cols * 3.0, y / rows * 3.0, nz) * 0.5 + 0.5;
            cell.audio = if active && len > 0 {
                f64::from(snapshot.bin(((cell.x + cell.y) % len).unsigned_abs() as usize)) / 255.0
            } else {
                0.0
            };
            let scale = 1.5 - (y / rows + 0.5);
            cell.height = cell.noise * HEIGHT_SCALE + cell.audio * HEIGHT_SCALE;
            cell.screen = DVec2::new(x * GRID_SIZE * scale, y * GRID_SIZE * scale - cell.height);
            cell.color = ((cell.noise * 5.0).floor().max(0.0) as usize).min(4);
        }
    }

    fn rotation(&self, snapshot: &FeatureSnapshot) -> f64 {
        let sway = (self.time * 0.05).sin() * 0.1;
        if snapshot.is_active() {
            let treble = f64::from(snapshot.band_sum(20..50)) / (30.0 * 255.0);
            sway + treble * 0.1
        } else {
            sway
        }
    }

    fn link(
        &self,
        surface: &mut dyn Surface,
        transform: &DAffine2,
        from: &TerrainCell,
        to: &TerrainCell,
        palette: &Palette,
    ) {
        let start = transform.transform_point2(from.screen);
        let end = transform.transform_point2(to.screen);
        let path = Path::new().move_to(start).line_to(end);
        surface.stroke(
            &path,
            &Stroke {
                paint: StrokePaint::Gradient(LinearGradient {
                    start,
                    end,
                    from: pick(palette, from.color),
                    to: pick(palette, from.color + 1),
                }),
                width: 1.0,
                alpha: LINE_ALPHA,
                glow: 0.0,
            },
        );
    }
}

impl Scene for Terrain {
    fn kind(&self) -> SceneKind {
        SceneKind::Dream3d
    }

    fn reset(&mut self, size: SurfaceSize, _rng: &mut StdRng) {
        self.cols = (size.width / GRID_SIZE).ceil() as i32 + 2;
        self.rows = (size.height / GRID_SIZE).ceil() as i32 + 2;
        self.cells.clear();
        self.cells.reserve((self.cols * self.rows).max(0) as usize);
        for row in 0..self.rows {
            for col in 0..self.cols {
                self.cells
                    .push(TerrainCell::new(col - self.cols / 2, row - self.rows / 2));
            }
        }
        self.bounds = Some(size);
    }

    fn draw(&mut self, surface: &mut dyn Surface, snapshot: &FeatureSnapshot, palette: &Palette) {
        let Some(bounds) = self.bounds else {
            return;
        };
        self.update_cells(snapshot);

        let transform = DAffine2::from_angle_translation(self.rotation(snapshot), bounds.center());
        for cell in &self.cells {
            if let Some(right) = self.index(cell.x + 1, cell.y) {
                self.link(surface, &transform, cell, &self.cells[right], palette);
            }
            if let Some(below) = self.index(cell.x, cell.y + 1) {
                self.link(surface, &transform, cell, &self.cells[below], palette);
            }

            let center = transform.transform_point2(cell.screen);
            let path = CellShape::for_cell(cell.x, cell.y).path(center, cell.point_size());
            surface.fill(
                &path,
                Fill {
                    color: pick(palette, cell.color),
                    glow: POINT_GLOW,
                },
            );
        }

        let speed = if snapshot.is_active() {
            1.0 + f64::from(snapshot.volume) * 2.0
        } else {
            1.0
        };
        self.time += 0.01 * speed;
    }

    fn entity_count(&self) -> usize {
        self.cells.len()
    }
}
