//! Abstract 2D drawing surface consumed by the scenes.
//!
//! Paths are built in local coordinates and placed with an affine transform,
//! the way a canvas context is translated and rotated before drawing.

use glam::{DAffine2, DVec2};

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::hex(0x000000);

    /// Colour from `0xRRGGBB`.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Linear blend toward `other`; `t` is clamped to [0,1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    /// Composite over black at `opacity`.
    pub fn dim(self, opacity: f64) -> Rgb {
        Rgb::BLACK.lerp(self, opacity)
    }
}

/// Drawable extent in virtual pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// A surface nothing can be drawn on.
    pub fn is_empty(&self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0)
    }
}

/// One piece of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Subpath {
    Poly { points: Vec<DVec2>, closed: bool },
    Circle { center: DVec2, radius: f64 },
}

/// Sequence of subpaths, built with canvas-style calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Subpath>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, p: DVec2) -> Self {
        self.subpaths.push(Subpath::Poly {
            points: vec![p],
            closed: false,
        });
        self
    }

    pub fn line_to(mut self, p: DVec2) -> Self {
        match self.subpaths.last_mut() {
            Some(Subpath::Poly { points, closed: false }) => points.push(p),
            _ => return self.move_to(p),
        }
        self
    }

    pub fn close(mut self) -> Self {
        if let Some(Subpath::Poly { closed, .. }) = self.subpaths.last_mut() {
            *closed = true;
        }
        self
    }

    /// Full circle.
    pub fn arc(mut self, center: DVec2, radius: f64) -> Self {
        self.subpaths.push(Subpath::Circle { center, radius });
        self
    }

    /// Axis-aligned rectangle from its top-left corner.
    pub fn rect(self, origin: DVec2, width: f64, height: f64) -> Self {
        self.move_to(origin)
            .line_to(origin + DVec2::new(width, 0.0))
            .line_to(origin + DVec2::new(width, height))
            .line_to(origin + DVec2::new(0.0, height))
            .close()
    }

    /// Regular polygon with its first vertex on the +x axis.
    pub fn polygon(center: DVec2, radius: f64, sides: usize) -> Self {
        let mut path = Path::new();
        for i in 0..sides {
            let angle = i as f64 / sides as f64 * std::f64::consts::TAU;
            let p = center + DVec2::from_angle(angle) * radius;
            path = if i == 0 { path.move_to(p) } else { path.line_to(p) };
        }
        path.close()
    }

    /// Star alternating between `outer` and `inner` radii.
    pub fn star(center: DVec2, outer: f64, inner: f64, points: usize) -> Self {
        let vertices = points * 2;
        let mut path = Path::new();
        for i in 0..vertices {
            let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
            let radius = if i % 2 == 0 { outer } else { inner };
            let p = center + DVec2::from_angle(angle) * radius;
            path = if i == 0 { path.move_to(p) } else { path.line_to(p) };
        }
        path.close()
    }

    pub fn subpaths(&self) -> &[Subpath] {
        &self.subpaths
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// Apply a rigid transform. Circle radii are kept as-is.
    pub fn transformed(&self, transform: &DAffine2) -> Path {
        let subpaths = self
            .subpaths
            .iter()
            .map(|sub| match sub {
                Subpath::Poly { points, closed } => Subpath::Poly {
                    points: points.iter().map(|&p| transform.transform_point2(p)).collect(),
                    closed: *closed,
                },
                Subpath::Circle { center, radius } => Subpath::Circle {
                    center: transform.transform_point2(*center),
                    radius: *radius,
                },
            })
            .collect();
        Path { subpaths }
    }

    /// Axis-aligned bounding box as (min, max).
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for sub in &self.subpaths {
            match sub {
                Subpath::Poly { points, .. } => {
                    for &p in points {
                        min = min.min(p);
                        max = max.max(p);
                    }
                }
                Subpath::Circle { center, radius } => {
                    min = min.min(*center - DVec2::splat(*radius));
                    max = max.max(*center + DVec2::splat(*radius));
                }
            }
        }
        (min.x <= max.x).then_some((min, max))
    }
}

/// Solid fill with an optional glow radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: Rgb,
    pub glow: f64,
}

/// Two-stop linear gradient between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradient {
    pub start: DVec2,
    pub end: DVec2,
    pub from: Rgb,
    pub to: Rgb,
}

impl LinearGradient {
    /// Colour at `p`, projected onto the gradient axis.
    pub fn color_at(&self, p: DVec2) -> Rgb {
        let axis = self.end - self.start;
        let len2 = axis.length_squared();
        if len2 <= f64::EPSILON {
            return self.from;
        }
        let t = (p - self.start).dot(axis) / len2;
        self.from.lerp(self.to, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokePaint {
    Solid(Rgb),
    Gradient(LinearGradient),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub paint: StrokePaint,
    pub width: f64,
    /// Global alpha for this stroke.
    pub alpha: f64,
    pub glow: f64,
}

/// Drawing target for scenes.
pub trait Surface {
    /// Current size, or `None` when there is nothing to draw on.
    fn size(&self) -> Option<SurfaceSize>;

    /// Cover everything drawn so far with black at `alpha` opacity.
    fn fade(&mut self, alpha: f64);

    fn fill(&mut self, path: &Path, fill: Fill);

    fn stroke(&mut self, path: &Path, stroke: &Stroke);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One recorded surface call.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Fade(f64),
        Fill(Path, Fill),
        Stroke(Path, Stroke),
    }

    /// Surface that records every call.
    pub struct RecordingSurface {
        pub size: Option<SurfaceSize>,
        pub ops: Vec<Op>,
    }

    impl RecordingSurface {
        pub fn new(width: f64, height: f64) -> Self {
            Self {
                size: Some(SurfaceSize::new(width, height)),
                ops: Vec::new(),
            }
        }

        pub fn fills(&self) -> Vec<&Fill> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Fill(_, f) => Some(f),
                    _ => None,
                })
                .collect()
        }

        pub fn strokes(&self) -> Vec<(&Path, &Stroke)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Stroke(p, s) => Some((p, s)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> Option<SurfaceSize> {
            self.size
        }
        fn fade(&mut self, alpha: f64) {
            self.ops.push(Op::Fade(alpha));
        }
        fn fill(&mut self, path: &Path, fill: Fill) {
            self.ops.push(Op::Fill(path.clone(), fill));
        }
        fn stroke(&mut self, path: &Path, stroke: &Stroke) {
            self.ops.push(Op::Stroke(path.clone(), *stroke));
        }
    }

    #[test]
    fn test_hex_and_lerp() {
        let magenta = Rgb::hex(0xff00ff);
        assert_eq!(magenta, Rgb { r: 255, g: 0, b: 255 });
        assert_eq!(magenta.lerp(Rgb::BLACK, 1.0), Rgb::BLACK);
        assert_eq!(magenta.dim(0.5), Rgb { r: 128, g: 0, b: 128 });
        assert_eq!(magenta.lerp(Rgb::BLACK, 7.0), Rgb::BLACK);
    }

    #[test]
    fn test_polygon_and_star_vertex_counts() {
        let hex = Path::polygon(DVec2::ZERO, 10.0, 6);
        match &hex.subpaths()[0] {
            Subpath::Poly { points, closed } => {
                assert_eq!(points.len(), 6);
                assert!(*closed);
                assert!((points[0] - DVec2::new(10.0, 0.0)).length() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
        let star = Path::star(DVec2::ZERO, 10.0, 5.0, 8);
        match &star.subpaths()[0] {
            Subpath::Poly { points, .. } => {
                assert_eq!(points.len(), 16);
                assert!((points[1].length() - 5.0).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_transform_rotates_and_translates() {
        let path = Path::new().move_to(DVec2::new(1.0, 0.0)).arc(DVec2::ZERO, 2.0);
        let t = DAffine2::from_angle_translation(std::f64::consts::FRAC_PI_2, DVec2::new(5.0, 5.0));
        let moved = path.transformed(&t);
        let (min, max) = moved.bounds().unwrap();
        assert!((min - DVec2::new(3.0, 3.0)).length() < 1e-9);
        assert!((max - DVec2::new(7.0, 7.0)).length() < 1e-9);
        match &moved.subpaths()[0] {
            Subpath::Poly { points, .. } => {
                assert!((points[0] - DVec2::new(5.0, 6.0)).length() < 1e-9)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_line_to_without_move_starts_subpath() {
        let path = Path::new().line_to(DVec2::ONE).line_to(DVec2::ZERO);
        assert_eq!(path.subpaths().len(), 1);
        assert_eq!(Path::new().bounds(), None);
    }

    #[test]
    fn test_gradient_projection() {
        let g = LinearGradient {
            start: DVec2::ZERO,
            end: DVec2::new(10.0, 0.0),
            from: Rgb::BLACK,
            to: Rgb::hex(0xffffff),
        };
        assert_eq!(g.color_at(DVec2::new(5.0, 3.0)), Rgb::hex(0x808080));
        assert_eq!(g.color_at(DVec2::new(-4.0, 0.0)), Rgb::BLACK);
    }

    #[test]
    fn test_empty_size() {
        assert!(SurfaceSize::new(0.0, 10.0).is_empty());
        assert!(SurfaceSize::new(f64::NAN, 10.0).is_empty());
        assert!(!SurfaceSize::new(1.0, 1.0).is_empty());
    }
}
