//! Per-cell RGBA rasterization of the trail field.
//!
//! One scalar drives three brightness curves. Low exponents saturate early and
//! give the wide halo; the high exponent only lights the dense core and pulls
//! its color toward white.

use essence_data::Rgb;

pub const BASE_EXPONENT: f32 = 0.55;
pub const GLOW_EXPONENT: f32 = 0.85;
pub const HIGHLIGHT_EXPONENT: f32 = 1.35;
/// How far the highlight curve blends a color toward white.
pub const HIGHLIGHT_BLEND: f32 = 0.45;
pub const GLOW_ALPHA: f32 = 210.0;
pub const HIGHLIGHT_ALPHA: f32 = 45.0;

/// RGBA bytes at grid resolution, non-premultiplied, ready for an `ImageData`.
#[derive(Debug, Clone, Default)]
pub struct TrailRaster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl TrailRaster {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let o = (y * self.width + x) * 4;
        [
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ]
    }

    /// Shades every cell from its amount and author.
    pub fn paint<F>(&mut self, amount: &[f32], authors: &[u32], color: F)
    where
        F: Fn(u32) -> Rgb,
    {
        debug_assert_eq!(amount.len() * 4, self.pixels.len());
        for ((px, v), author) in self.pixels.chunks_exact_mut(4).zip(amount).zip(authors) {
            px.copy_from_slice(&shade(*v, color(*author)));
        }
    }
}

/// Color and alpha of a single cell.
#[must_use]
pub fn shade(value: f32, color: Rgb) -> [u8; 4] {
    let v = value.clamp(0.0, 1.0);
    let base = v.powf(BASE_EXPONENT);
    let glow = v.powf(GLOW_EXPONENT);
    let highlight = v.powf(HIGHLIGHT_EXPONENT);

    let lift = |c: u8| {
        let c = f32::from(c);
        (c + (255.0 - c) * highlight * HIGHLIGHT_BLEND).min(255.0)
    };
    let channel = |c: u8| (lift(c) * base).floor() as u8;
    let alpha = (glow * GLOW_ALPHA + highlight * HIGHLIGHT_ALPHA)
        .min(255.0)
        .round() as u8;

    [channel(color.r), channel(color.g), channel(color.b), alpha]
}
