// src/ui/trail.rs
//! Terminal drawing surface with motion trails.
//!
//! A terminal cannot blend a translucent black rectangle over what is already
//! on screen, so every drawn item is kept with an opacity instead. `fade`
//! multiplies all opacities down and drops items that became too dim; the
//! survivors are redrawn each frame through a Braille [`Canvas`], oldest
//! first.

use glam::DVec2;
use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points},
};

use crate::scene::surface::{Fill, Path, Rgb, Stroke, StrokePaint, Subpath, Surface, SurfaceSize};

/// Segments a gradient stroke is split into.
const GRADIENT_STEPS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Segment { from: DVec2, to: DVec2, color: Rgb },
    Ring { center: DVec2, radius: f64, color: Rgb },
    Dots { coords: Vec<(f64, f64)>, color: Rgb },
}

#[derive(Debug, Clone, PartialEq)]
struct TrailItem {
    mark: Mark,
    opacity: f64,
}

pub struct TrailCanvas {
    size: Option<SurfaceSize>,
    cell_width: u16,
    cell_height: u16,
    cutoff: f64,
    items: Vec<TrailItem>,
}

impl TrailCanvas {
    pub fn new(cell_width: u16, cell_height: u16, cutoff: f64) -> Self {
        Self {
            size: None,
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
            cutoff,
            items: Vec::new(),
        }
    }

    /// Virtual pixel size of a terminal area.
    pub fn size_for(&self, area: Rect) -> Option<SurfaceSize> {
        if area.width == 0 || area.height == 0 {
            return None;
        }
        Some(SurfaceSize::new(
            f64::from(area.width) * f64::from(self.cell_width),
            f64::from(area.height) * f64::from(self.cell_height),
        ))
    }

    /// Track the area the canvas is drawn into. A new size drops the trails.
    pub fn resize(&mut self, area: Rect) {
        let size = self.size_for(area);
        if size != self.size {
            self.items.clear();
            self.size = size;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push(&mut self, mark: Mark, opacity: f64) {
        if opacity >= self.cutoff {
            self.items.push(TrailItem { mark, opacity });
        }
    }

    /// Braille dots sit on a 2x4 grid per cell.
    fn dot_step(&self) -> DVec2 {
        DVec2::new(
            f64::from(self.cell_width) / 2.0,
            f64::from(self.cell_height) / 4.0,
        )
    }

    /// Interior sample points of a filled path.
    fn rasterize(&self, path: &Path) -> Vec<(f64, f64)> {
        let step = self.dot_step();
        let mut coords = Vec::new();
        for sub in path.subpaths() {
            match sub {
                Subpath::Circle { center, radius } => {
                    let reach = DVec2::splat(*radius);
                    scan(*center - reach, *center + reach, step, &mut coords, |p| {
                        p.distance_squared(*center) <= radius * radius
                    });
                }
                Subpath::Poly { points, .. } if points.len() >= 3 => {
                    let (min, max) = points.iter().fold(
                        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
                        |(lo, hi), &p| (lo.min(p), hi.max(p)),
                    );
                    scan(min, max, step, &mut coords, |p| contains(points, p));
                }
                Subpath::Poly { .. } => {}
            }
        }
        // small shapes still leave a mark
        if coords.is_empty() {
            if let Some((min, max)) = path.bounds() {
                let c = (min + max) / 2.0;
                coords.push((c.x, c.y));
            }
        }
        coords
    }

    /// Widget drawing the surviving trails, newest on top.
    pub fn widget(&self) -> Canvas<'_, impl Fn(&mut Context<'_>) + '_> {
        let (width, height) = self
            .size
            .map(|s| (s.width, s.height))
            .unwrap_or((1.0, 1.0));
        Canvas::default()
            .marker(Marker::Braille)
            .background_color(Color::Black)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(move |ctx| {
                for item in &self.items {
                    let color = rgb_color(item.mark.color().dim(item.opacity));
                    match &item.mark {
                        Mark::Segment { from, to, .. } => ctx.draw(&CanvasLine {
                            x1: from.x,
                            y1: height - from.y,
                            x2: to.x,
                            y2: height - to.y,
                            color,
                        }),
                        Mark::Ring { center, radius, .. } => ctx.draw(&Circle {
                            x: center.x,
                            y: height - center.y,
                            radius: *radius,
                            color,
                        }),
                        Mark::Dots { coords, .. } => {
                            let flipped: Vec<(f64, f64)> =
                                coords.iter().map(|&(x, y)| (x, height - y)).collect();
                            ctx.draw(&Points {
                                coords: &flipped,
                                color,
                            });
                        }
                    }
                }
            })
    }
}

impl Mark {
    fn color(&self) -> Rgb {
        match self {
            Mark::Segment { color, .. } | Mark::Ring { color, .. } | Mark::Dots { color, .. } => {
                *color
            }
        }
    }
}

pub fn rgb_color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

fn scan(
    min: DVec2,
    max: DVec2,
    step: DVec2,
    out: &mut Vec<(f64, f64)>,
    inside: impl Fn(DVec2) -> bool,
) {
    let mut y = (min.y / step.y).floor() * step.y;
    while y <= max.y {
        let mut x = (min.x / step.x).floor() * step.x;
        while x <= max.x {
            let p = DVec2::new(x, y);
            if inside(p) {
                out.push((x, y));
            }
            x += step.x;
        }
        y += step.y;
    }
}

/// Even-odd point in polygon test.
fn contains(points: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Consecutive point pairs of a subpath, closing the loop when asked.
fn edges(points: &[DVec2], closed: bool) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    let closing = (closed && points.len() > 2)
        .then(|| (points[points.len() - 1], points[0]));
    points.windows(2).map(|w| (w[0], w[1])).chain(closing)
}

impl Surface for TrailCanvas {
    fn size(&self) -> Option<SurfaceSize> {
        self.size
    }

    fn fade(&mut self, alpha: f64) {
        let keep = 1.0 - alpha.clamp(0.0, 1.0);
        let cutoff = self.cutoff;
        self.items.retain_mut(|item| {
            item.opacity *= keep;
            item.opacity >= cutoff
        });
    }

    fn fill(&mut self, path: &Path, fill: Fill) {
        // no blur in a terminal; glow is not rendered
        let coords = self.rasterize(path);
        self.push(
            Mark::Dots {
                coords,
                color: fill.color,
            },
            1.0,
        );
    }

    fn stroke(&mut self, path: &Path, stroke: &Stroke) {
        for sub in path.subpaths() {
            match sub {
                Subpath::Circle { center, radius } => {
                    let color = match stroke.paint {
                        StrokePaint::Solid(c) => c,
                        StrokePaint::Gradient(g) => g.color_at(*center),
                    };
                    self.push(
                        Mark::Ring {
                            center: *center,
                            radius: *radius,
                            color,
                        },
                        stroke.alpha,
                    );
                }
                Subpath::Poly { points, closed } => {
                    for (from, to) in edges(points, *closed) {
                        match stroke.paint {
                            StrokePaint::Solid(color) => {
                                self.push(Mark::Segment { from, to, color }, stroke.alpha)
                            }
                            StrokePaint::Gradient(g) => {
                                for step in 0..GRADIENT_STEPS {
                                    let t0 = step as f64 / GRADIENT_STEPS as f64;
                                    let t1 = (step + 1) as f64 / GRADIENT_STEPS as f64;
                                    let a = from.lerp(to, t0);
                                    let b = from.lerp(to, t1);
                                    let color = g.color_at((a + b) / 2.0);
                                    self.push(Mark::Segment { from: a, to: b, color }, stroke.alpha);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
