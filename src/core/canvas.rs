use std::sync::Arc;

use glam::Vec2;

use crate::texture::Texture;

/// Direction a gradient quad blends along, in the quad's own uv space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientAxis {
    /// u + v, top-left corner to bottom-right corner
    Diagonal,
    /// v, top edge to bottom edge
    Vertical,
}

/// How a quad's interior is painted
#[derive(Debug, Clone, PartialEq)]
pub enum QuadFill {
    Solid([u8; 4]),
    /// Texture sampled by uv, colour multiplied by `tint`, alpha scaled by `alpha`
    Texture { texture: Arc<Texture>, tint: f32, alpha: u8 },
    Gradient { axis: GradientAxis, start: [u8; 4], end: [u8; 4] },
}

/// 2D drawing operations for canvas
///
/// Everything except `Clear` and `Pixel` is composited source-over.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Fill entire canvas with color (r, g, b, a)
    Clear(u8, u8, u8, u8),

    /// Overwrite pixel at (x, y) with color (r, g, b, a)
    Pixel { x: u32, y: u32, r: u8, g: u8, b: u8, a: u8 },

    FilledCircle { center: Vec2, radius: f32, color: [u8; 4] },

    /// Quadratic bezier stroke
    Curve { from: Vec2, control: Vec2, to: Vec2, width: f32, color: [u8; 4] },

    /// Arbitrary convex quad; corners map to uv (0,0), (1,0), (1,1), (0,1)
    Quad { corners: [Vec2; 4], fill: QuadFill },

    /// Closed stroke around a quad's edges
    Outline { corners: [Vec2; 4], width: f32, color: [u8; 4] },
}

const CURVE_SEGMENTS: usize = 16;

/// Canvas state - RGBA pixel buffer with pending draw operations
#[derive(Clone)]
pub struct Canvas {
    pixels: Vec<u8>,
    operations: Vec<DrawOp>,
    width: u32,
    height: u32,
}

impl Canvas {
    /// Create new transparent canvas with dimensions
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize) * 4;

        Self {
            pixels: vec![0; size],
            operations: Vec::new(),
            width,
            height,
        }
    }

    /// Add draw operation - functional style
    pub fn draw(mut self, op: DrawOp) -> Self {
        self.operations.push(op);
        self
    }

    /// Execute all pending operations and return new canvas
    pub fn execute_ops(&self) -> Self {
        let mut canvas = Self {
            pixels: self.pixels.clone(),
            operations: Vec::new(),
            width: self.width,
            height: self.height,
        };

        for op in &self.operations {
            canvas.apply(op);
        }

        canvas
    }

    /// Execute a single operation in place
    pub fn apply(&mut self, op: &DrawOp) {
        match op {
            DrawOp::Clear(r, g, b, a) => self.clear([*r, *g, *b, *a]),
            DrawOp::Pixel { x, y, r, g, b, a } => self.set_pixel(*x, *y, [*r, *g, *b, *a]),
            DrawOp::FilledCircle { center, radius, color } => {
                self.fill_circle(*center, *radius, *color)
            }
            DrawOp::Curve { from, control, to, width, color } => {
                let points = flatten_quadratic(*from, *control, *to);
                self.stroke_polyline(&points, *width, *color)
            }
            DrawOp::Quad { corners, fill } => self.fill_quad(corners, fill),
            DrawOp::Outline { corners, width, color } => {
                let closed = [corners[0], corners[1], corners[2], corners[3], corners[0]];
                self.stroke_polyline(&closed, *width, *color)
            }
        }
    }

    /// Replace the buffer with a new size, transparent
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; (width as usize) * (height as usize) * 4];
    }

    fn clear(&mut self, color: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = self.index(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    /// Source-over composite of `color` onto (x, y)
    fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height || color[3] == 0 {
            return;
        }

        let idx = self.index(x as u32, y as u32);
        let dst = &mut self.pixels[idx..idx + 4];

        if color[3] == 255 {
            dst.copy_from_slice(&color);
            return;
        }

        let sa = color[3] as f32 / 255.0;
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= f32::EPSILON {
            return;
        }

        for c in 0..3 {
            let s = color[c] as f32;
            let d = dst[c] as f32;
            dst[c] = ((s * sa + d * da * (1.0 - sa)) / out_a).round().min(255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [u8; 4]) {
        let r_sq = radius * radius;
        let Some((x0, y0, x1, y1)) = self.clip_bounds(center - Vec2::splat(radius), center + Vec2::splat(radius)) else {
            return;
        };

        for py in y0..=y1 {
            for px in x0..=x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                if p.distance_squared(center) <= r_sq {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Stroke a polyline; each covered pixel is composited once
    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: [u8; 4]) {
        if points.len() < 2 {
            return;
        }

        let half = (width * 0.5).max(0.5);
        let (min, max) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        let Some((x0, y0, x1, y1)) = self.clip_bounds(min - Vec2::splat(half), max + Vec2::splat(half)) else {
            return;
        };

        let half_sq = half * half;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let covered = points
                    .windows(2)
                    .any(|seg| distance_sq_to_segment(p, seg[0], seg[1]) <= half_sq);
                if covered {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    fn fill_quad(&mut self, corners: &[Vec2; 4], fill: &QuadFill) {
        let (min, max) = corners.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        let Some((x0, y0, x1, y1)) = self.clip_bounds(min, max) else {
            return;
        };

        let [p0, p1, p2, p3] = *corners;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);

                let uv = if let Some([w0, w1, w2]) = barycentric(p, p0, p1, p2) {
                    // (0,0) (1,0) (1,1)
                    Vec2::new(w1 + w2, w2)
                } else if let Some([_, w2, w3]) = barycentric(p, p0, p2, p3) {
                    // (0,0) (1,1) (0,1)
                    Vec2::new(w2, w2 + w3)
                } else {
                    continue;
                };

                let color = shade_fill(fill, uv);
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Clip a float bounding box to integer pixel bounds, None if off-canvas
    fn clip_bounds(&self, min: Vec2, max: Vec2) -> Option<(i32, i32, i32, i32)> {
        if self.width == 0 || self.height == 0 || !min.is_finite() || !max.is_finite() {
            return None;
        }

        let x0 = min.x.floor().max(0.0) as i32;
        let y0 = min.y.floor().max(0.0) as i32;
        let x1 = max.x.ceil().min(self.width as f32 - 1.0) as i32;
        let y1 = max.y.ceil().min(self.height as f32 - 1.0) as i32;

        (x0 <= x1 && y0 <= y1).then_some((x0, y0, x1, y1))
    }

    /// RGBA of one pixel, transparent black when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let idx = self.index(x, y);
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2], self.pixels[idx + 3]]
    }

    /// Get pixel buffer
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Get canvas dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pending_ops(&self) -> usize {
        self.operations.len()
    }
}

fn shade_fill(fill: &QuadFill, uv: Vec2) -> [u8; 4] {
    match fill {
        QuadFill::Solid(color) => *color,
        QuadFill::Texture { texture, tint, alpha } => {
            let [r, g, b, a] = texture.sample(uv.x, uv.y);
            let tinted = |c: u8| (c as f32 * tint).round().clamp(0.0, 255.0) as u8;
            let a = (a as u32 * *alpha as u32 / 255) as u8;
            [tinted(r), tinted(g), tinted(b), a]
        }
        QuadFill::Gradient { axis, start, end } => {
            let t = match axis {
                GradientAxis::Diagonal => (uv.x + uv.y) * 0.5,
                GradientAxis::Vertical => uv.y,
            }
            .clamp(0.0, 1.0);
            let mut out = [0u8; 4];
            for c in 0..4 {
                out[c] = (start[c] as f32 + (end[c] as f32 - start[c] as f32) * t).round() as u8;
            }
            out
        }
    }
}

/// Barycentric weights of `p` in triangle (a, b, c), None when outside or degenerate
fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Option<[f32; 3]> {
    let area = (b - a).perp_dot(c - a);
    if area.abs() < 1e-6 {
        return None;
    }

    let w_a = (b - p).perp_dot(c - p) / area;
    let w_b = (c - p).perp_dot(a - p) / area;
    let w_c = 1.0 - w_a - w_b;

    const EPS: f32 = -1e-4;
    (w_a >= EPS && w_b >= EPS && w_c >= EPS).then_some([w_a, w_b, w_c])
}

fn distance_sq_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

fn flatten_quadratic(from: Vec2, control: Vec2, to: Vec2) -> Vec<Vec2> {
    (0..=CURVE_SEGMENTS)
        .map(|i| {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let inv = 1.0 - t;
            from * (inv * inv) + control * (2.0 * inv * t) + to * (t * t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_creation() {
        let canvas = Canvas::new(100, 100);
        assert_eq!(canvas.dimensions(), (100, 100));
        assert_eq!(canvas.pixels().len(), 100 * 100 * 4);
    }

    #[test]
    fn canvas_clear() {
        let canvas = Canvas::new(10, 10)
            .draw(DrawOp::Clear(255, 0, 0, 255))
            .execute_ops();

        assert_eq!(canvas.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(9, 9), [255, 0, 0, 255]);
    }

    #[test]
    fn canvas_set_pixel_overwrites() {
        let canvas = Canvas::new(10, 10)
            .draw(DrawOp::Clear(0, 0, 0, 255))
            .draw(DrawOp::Pixel { x: 5, y: 5, r: 100, g: 150, b: 200, a: 128 })
            .execute_ops();

        assert_eq!(canvas.pixel(5, 5), [100, 150, 200, 128]);
    }

    #[test]
    fn half_alpha_blends_over_opaque() {
        let canvas = Canvas::new(4, 4)
            .draw(DrawOp::Clear(0, 0, 0, 255))
            .draw(DrawOp::Quad {
                corners: [Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(4.0, 4.0), Vec2::new(0.0, 4.0)],
                fill: QuadFill::Solid([255, 255, 255, 128]),
            })
            .execute_ops();

        let [r, g, b, a] = canvas.pixel(1, 1);
        assert!((r as i32 - 128).abs() <= 1);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn quad_is_clipped_to_canvas() {
        let corners = [
            Vec2::new(-5.0, 8.0),
            Vec2::new(15.0, 8.0),
            Vec2::new(15.0, 28.0),
            Vec2::new(-5.0, 28.0),
        ];
        let canvas = Canvas::new(10, 10)
            .draw(DrawOp::Quad { corners, fill: QuadFill::Solid([9, 9, 9, 255]) })
            .execute_ops();

        assert_eq!(canvas.pixel(0, 9), [9, 9, 9, 255]);
        assert_eq!(canvas.pixel(0, 7), [0, 0, 0, 0]);
    }

    #[test]
    fn quad_maps_uv_corners() {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let fill = QuadFill::Gradient {
            axis: GradientAxis::Vertical,
            start: [0, 0, 0, 255],
            end: [200, 200, 200, 255],
        };
        let canvas = Canvas::new(10, 10)
            .draw(DrawOp::Quad { corners, fill })
            .execute_ops();

        let top = canvas.pixel(5, 0)[0];
        let bottom = canvas.pixel(5, 9)[0];
        assert!(top < 20, "top {}", top);
        assert!(bottom > 180, "bottom {}", bottom);
    }

    #[test]
    fn rotated_quad_leaves_corners_empty() {
        // diamond inscribed in a 20x20 canvas
        let corners = [
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 10.0),
        ];
        let canvas = Canvas::new(20, 20)
            .draw(DrawOp::Quad { corners, fill: QuadFill::Solid([1, 2, 3, 255]) })
            .execute_ops();

        assert_eq!(canvas.pixel(10, 10), [1, 2, 3, 255]);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(19, 19), [0, 0, 0, 0]);
    }

    #[test]
    fn overlapping_polyline_segments_blend_once() {
        let canvas = Canvas::new(20, 20)
            .draw(DrawOp::Clear(0, 0, 0, 255))
            .draw(DrawOp::Curve {
                from: Vec2::new(0.0, 10.0),
                control: Vec2::new(10.0, 10.0),
                to: Vec2::new(20.0, 10.0),
                width: 2.0,
                color: [255, 255, 255, 128],
            })
            .execute_ops();

        // a double blend would give ~191
        let r = canvas.pixel(10, 10)[0];
        assert!((r as i32 - 128).abs() <= 1, "got {}", r);
    }

    #[test]
    fn filled_circle_covers_center_only() {
        let canvas = Canvas::new(50, 50)
            .draw(DrawOp::FilledCircle { center: Vec2::new(25.0, 25.0), radius: 5.0, color: [100, 100, 100, 255] })
            .execute_ops();

        assert_eq!(canvas.pixel(25, 25), [100, 100, 100, 255]);
        assert_eq!(canvas.pixel(25, 22), [100, 100, 100, 255]);
        assert_eq!(canvas.pixel(25, 35), [0, 0, 0, 0]);
    }

    #[test]
    fn offscreen_ops_are_ignored() {
        let canvas = Canvas::new(10, 10)
            .draw(DrawOp::Pixel { x: 100, y: 100, r: 255, g: 0, b: 0, a: 255 })
            .draw(DrawOp::FilledCircle { center: Vec2::new(-50.0, -50.0), radius: 3.0, color: [255; 4] })
            .draw(DrawOp::Curve {
                from: Vec2::new(-5.0, -5.0),
                control: Vec2::new(-3.0, -12.0),
                to: Vec2::new(-1.0, -9.0),
                width: 1.0,
                color: [255; 4],
            })
            .execute_ops();

        assert!(canvas.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn resize_discards_contents() {
        let mut canvas = Canvas::new(4, 4).draw(DrawOp::Clear(1, 1, 1, 255)).execute_ops();
        canvas.resize(8, 2);
        assert_eq!(canvas.dimensions(), (8, 2));
        assert_eq!(canvas.pixels().len(), 8 * 2 * 4);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
    }
}
