//! Procedural surface materials for decorative tiles.
//!
//! Textures are painted with the software [`Canvas`] and then frozen into an
//! immutable [`Texture`] that tiles share through an `Arc`.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::{Canvas, DrawOp, GradientAxis, QuadFill};
use crate::math::{tile_rng, Rgb, TileRng};
use crate::tile::Material;

/// Surface style of a palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureStyle {
    Marble,
    Stone,
    WoodGrain,
    Terrazzo,
    #[default]
    Plain,
}

impl TextureStyle {
    fn salt(self) -> u64 {
        match self {
            TextureStyle::Marble => 1,
            TextureStyle::Stone => 2,
            TextureStyle::WoodGrain => 3,
            TextureStyle::Terrazzo => 4,
            TextureStyle::Plain => 5,
        }
    }
}

/// Immutable RGBA image
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    pub fn from_canvas(canvas: Canvas) -> Self {
        let (width, height) = canvas.dimensions();
        Self { width, height, pixels: canvas.into_pixels() }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Nearest-neighbour lookup; uv is clamped to [0, 1]
    pub fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        if self.width == 0 || self.height == 0 {
            return [0; 4];
        }
        let (width, height) = (self.width as usize, self.height as usize);
        let x = ((u.clamp(0.0, 1.0) * self.width as f32) as usize).min(width - 1);
        let y = ((v.clamp(0.0, 1.0) * self.height as f32) as usize).min(height - 1);
        let idx = (y * width + x) * 4;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2], self.pixels[idx + 3]]
    }

    /// Mean colour, used when a texture is drawn too small to sample
    pub fn average(&self) -> Rgb {
        let count = self.width as u64 * self.height as u64;
        if count == 0 {
            return Rgb::BLACK;
        }
        let mut sum = [0u64; 3];
        for px in self.pixels.chunks_exact(4) {
            for c in 0..3 {
                sum[c] += px[c] as u64;
            }
        }
        Rgb::new((sum[0] / count) as u8, (sum[1] / count) as u8, (sum[2] / count) as u8)
    }
}

const TERRAZZO_CHIPS: [Rgb; 4] = [
    Rgb::new(0xff, 0xff, 0xff),
    Rgb::new(0x33, 0x33, 0x33),
    Rgb::new(0x66, 0x66, 0x66),
    Rgb::new(0x99, 0x99, 0x99),
];

/// Synthesises tile materials at a fixed square resolution
#[derive(Debug, Clone, Copy)]
pub struct TextureSynthesizer {
    resolution: u32,
    enabled: bool,
}

impl TextureSynthesizer {
    pub fn new(resolution: u32, enabled: bool) -> Self {
        Self { resolution, enabled }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Material for a tile. The result is a pure function of `(style, base, seed)`.
    ///
    /// Degrades to a flat colour when texturing is disabled, the style is
    /// plain, or there is no pixel area to paint into.
    pub fn synthesize(&self, style: TextureStyle, base: Rgb, seed: u64) -> Material {
        if !self.enabled || self.resolution == 0 || style == TextureStyle::Plain {
            return Material::Flat(base);
        }

        let mut rng = tile_rng(seed, style.salt());
        let size = self.resolution as f32;
        let canvas = base_fill(self.resolution, base);

        let canvas = match style {
            TextureStyle::Marble => marble(canvas, size, &mut rng),
            TextureStyle::WoodGrain => wood_grain(canvas, size, &mut rng),
            TextureStyle::Stone => stone(canvas, size, base, &mut rng),
            TextureStyle::Terrazzo => terrazzo(canvas, size, &mut rng),
            TextureStyle::Plain => canvas,
        };

        Material::Textured(Arc::new(Texture::from_canvas(canvas.execute_ops())))
    }
}

/// Base gradient: slightly lighter at the top, slightly darker at the bottom
fn base_fill(resolution: u32, base: Rgb) -> Canvas {
    let size = resolution as f32;
    let corners = [
        Vec2::ZERO,
        Vec2::new(size, 0.0),
        Vec2::new(size, size),
        Vec2::new(0.0, size),
    ];
    Canvas::new(resolution, resolution)
        .draw(DrawOp::Clear(base.r, base.g, base.b, 255))
        .draw(DrawOp::Quad {
            corners,
            fill: QuadFill::Gradient {
                axis: GradientAxis::Vertical,
                start: base.shade(1.06).with_alpha(255),
                end: base.shade(0.94).with_alpha(255),
            },
        })
}

fn marble(mut canvas: Canvas, size: f32, rng: &mut TileRng) -> Canvas {
    let width = (size / 75.0).max(1.0);
    for _ in 0..3 {
        canvas = canvas.draw(DrawOp::Curve {
            from: Vec2::new(rng.gen::<f32>() * size, 0.0),
            control: Vec2::new(rng.gen::<f32>() * size, size * 0.5),
            to: Vec2::new(rng.gen::<f32>() * size, size),
            width,
            color: [180, 180, 180, 77],
        });
    }
    // hairline secondary veins
    for _ in 0..2 {
        canvas = canvas.draw(DrawOp::Curve {
            from: Vec2::new(0.0, rng.gen::<f32>() * size),
            control: Vec2::new(size * 0.5, rng.gen::<f32>() * size),
            to: Vec2::new(size, rng.gen::<f32>() * size),
            width: (width * 0.5).max(1.0),
            color: [160, 160, 160, 40],
        });
    }
    canvas
}

fn wood_grain(mut canvas: Canvas, size: f32, rng: &mut TileRng) -> Canvas {
    let scale = size / 150.0;
    for i in 0..8 {
        let y = size / 8.0 * i as f32 + (rng.gen::<f32>() - 0.5) * 20.0 * scale;
        let bow = (rng.gen::<f32>() - 0.5) * 10.0 * scale;
        canvas = canvas.draw(DrawOp::Curve {
            from: Vec2::new(0.0, y),
            control: Vec2::new(size * 0.5, y + bow),
            to: Vec2::new(size, y),
            width: scale.max(1.0),
            color: [0, 0, 0, 38],
        });
    }
    canvas
}

fn stone(mut canvas: Canvas, size: f32, base: Rgb, rng: &mut TileRng) -> Canvas {
    let speckles = ((size * size) / 90.0) as usize;
    for _ in 0..speckles {
        let light = rng.gen_bool(0.5);
        let tone = if light { base.mix(Rgb::WHITE, 0.35) } else { base.mix(Rgb::BLACK, 0.35) };
        let alpha = rng.gen_range(40u8..110);
        canvas = canvas.draw(DrawOp::FilledCircle {
            center: Vec2::new(rng.gen::<f32>() * size, rng.gen::<f32>() * size),
            radius: rng.gen_range(0.5f32..1.6) * (size / 150.0).max(0.6),
            color: tone.with_alpha(alpha),
        });
    }
    canvas
}

fn terrazzo(mut canvas: Canvas, size: f32, rng: &mut TileRng) -> Canvas {
    let scale = size / 150.0;
    for _ in 0..15 {
        let chip = TERRAZZO_CHIPS[rng.gen_range(0..TERRAZZO_CHIPS.len())];
        canvas = canvas.draw(DrawOp::FilledCircle {
            center: Vec2::new(rng.gen::<f32>() * size, rng.gen::<f32>() * size),
            radius: (rng.gen::<f32>() * 8.0 + 3.0) * scale,
            color: chip.with_alpha(255),
        });
    }
    canvas
}
