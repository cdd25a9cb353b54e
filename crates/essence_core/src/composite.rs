//! Multi-pass glow compositing of the trail raster.
//!
//! The raster is drawn three times with additive blending: a wide, faint,
//! heavily blurred halo, a tighter mid glow and finally the sharp core. The
//! [`GlowCompositor`] trait is the seam between the field and whatever
//! surface receives the pixels; the browser build drives a canvas through it,
//! headless runs use [`NullCompositor`] or the CPU [`SoftwareCompositor`].

use crate::raster::TrailRaster;

/// One draw of the raster onto the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowPass {
    /// Gaussian blur standard deviation in target pixels. Zero draws sharp.
    pub blur_px: f32,
    /// How far the destination rectangle extends past the grid on every side.
    pub pad_px: f32,
    pub opacity: f32,
}

/// The three passes, in draw order, plus the target extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowPlan {
    pub passes: [GlowPass; 3],
    pub dest_width: f32,
    pub dest_height: f32,
}

impl GlowPlan {
    /// Passes for a grid with cells of `cell` pixels.
    #[must_use]
    pub fn for_cell(cell: f32) -> [GlowPass; 3] {
        [
            GlowPass {
                blur_px: (cell * 0.85).max(1.5),
                pad_px: (cell * 0.8).max(2.0),
                opacity: 0.55,
            },
            GlowPass {
                blur_px: (cell * 0.45).max(0.75),
                pad_px: cell * 0.4,
                opacity: 0.35,
            },
            GlowPass {
                blur_px: 0.0,
                pad_px: 0.0,
                opacity: 0.9,
            },
        ]
    }

    #[must_use]
    pub fn for_raster(raster: &TrailRaster, cell: f32) -> Self {
        Self {
            passes: Self::for_cell(cell),
            dest_width: raster.width() as f32 * cell,
            dest_height: raster.height() as f32 * cell,
        }
    }
}

/// Receives a freshly painted raster once per drawn frame.
pub trait GlowCompositor {
    fn composite(&mut self, raster: &TrailRaster, plan: &GlowPlan);
}

/// Discards frames. Used where nothing is displayed.
#[derive(Debug, Default, Clone)]
pub struct NullCompositor {
    frames: u64,
}

impl NullCompositor {
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl GlowCompositor for NullCompositor {
    fn composite(&mut self, _raster: &TrailRaster, _plan: &GlowPlan) {
        self.frames += 1;
    }
}

/// CPU rendition of the canvas pipeline.
///
/// Accumulates premultiplied RGBA in `[0, 1]`; every pass is a bilinear
/// upscale into its destination rectangle, an optional Gaussian blur
/// (three box passes) and a saturating additive blend.
#[derive(Debug, Clone)]
pub struct SoftwareCompositor {
    width: usize,
    height: usize,
    accum: Vec<f32>,
    layer: Vec<f32>,
    tmp: Vec<f32>,
    frames: u64,
}

impl SoftwareCompositor {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let len = width * height * 4;
        Self {
            width,
            height,
            accum: vec![0.0; len],
            layer: vec![0.0; len],
            tmp: vec![0.0; len],
            frames: 0,
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
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Clears the target to transparent black.
    pub fn clear(&mut self) {
        self.accum.fill(0.0);
    }

    /// The composited frame as non-premultiplied RGBA bytes.
    #[must_use]
    pub fn frame_rgba(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.accum.len()];
        for (dst, src) in out.chunks_exact_mut(4).zip(self.accum.chunks_exact(4)) {
            let a = src[3].min(1.0);
            if a <= 0.0 {
                continue;
            }
            for c in 0..3 {
                dst[c] = ((src[c] / a).min(1.0) * 255.0).round() as u8;
            }
            dst[3] = (a * 255.0).round() as u8;
        }
        out
    }

    fn render_layer(&mut self, src: &[f32], sw: usize, sh: usize, pass: &GlowPass, plan: &GlowPlan) {
        self.layer.fill(0.0);
        let x0 = -pass.pad_px;
        let y0 = -pass.pad_px;
        let dw = plan.dest_width + pass.pad_px * 2.0;
        let dh = plan.dest_height + pass.pad_px * 2.0;
        if dw <= 0.0 || dh <= 0.0 {
            return;
        }
        let sx_scale = sw as f32 / dw;
        let sy_scale = sh as f32 / dh;

        for py in 0..self.height {
            let cy = py as f32 + 0.5;
            if cy < y0 || cy >= y0 + dh {
                continue;
            }
            let v = (cy - y0) * sy_scale - 0.5;
            for px in 0..self.width {
                let cx = px as f32 + 0.5;
                if cx < x0 || cx >= x0 + dw {
                    continue;
                }
                let u = (cx - x0) * sx_scale - 0.5;
                let o = (py * self.width + px) * 4;
                bilinear(src, sw, sh, u, v, &mut self.layer[o..o + 4]);
            }
        }
    }

    fn blur_layer(&mut self, sigma: f32) {
        for size in box_sizes_for_gauss(sigma, 3) {
            let r = (size - 1) / 2;
            if r == 0 {
                continue;
            }
            box_blur_h(&self.layer, &mut self.tmp, self.width, self.height, r);
            box_blur_v(&self.tmp, &mut self.layer, self.width, self.height, r);
        }
    }
}

impl GlowCompositor for SoftwareCompositor {
    fn composite(&mut self, raster: &TrailRaster, plan: &GlowPlan) {
        let (sw, sh) = (raster.width(), raster.height());
        if sw == 0 || sh == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let src = premultiply(raster.pixels());

        for pass in &plan.passes {
            self.render_layer(&src, sw, sh, pass, plan);
            if pass.blur_px > 0.0 {
                self.blur_layer(pass.blur_px);
            }
            for (acc, l) in self.accum.iter_mut().zip(&self.layer) {
                *acc = (*acc + l * pass.opacity).min(1.0);
            }
        }
        self.frames += 1;
    }
}

fn premultiply(pixels: &[u8]) -> Vec<f32> {
    let mut out = Vec::with_capacity(pixels.len());
    for px in pixels.chunks_exact(4) {
        let a = f32::from(px[3]) / 255.0;
        out.push(f32::from(px[0]) / 255.0 * a);
        out.push(f32::from(px[1]) / 255.0 * a);
        out.push(f32::from(px[2]) / 255.0 * a);
        out.push(a);
    }
    out
}

/// Samples `src` at continuous texel coordinates with clamp-to-edge.
fn bilinear(src: &[f32], w: usize, h: usize, u: f32, v: f32, out: &mut [f32]) {
    let u = u.clamp(0.0, (w - 1) as f32);
    let v = v.clamp(0.0, (h - 1) as f32);
    let x0 = u.floor() as usize;
    let y0 = v.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = u - x0 as f32;
    let fy = v - y0 as f32;
    for c in 0..4 {
        let a = src[(y0 * w + x0) * 4 + c];
        let b = src[(y0 * w + x1) * 4 + c];
        let d = src[(y1 * w + x0) * 4 + c];
        let e = src[(y1 * w + x1) * 4 + c];
        let top = a + (b - a) * fx;
        let bottom = d + (e - d) * fx;
        out[c] = top + (bottom - top) * fy;
    }
}

/// Odd box widths whose repeated application approximates a Gaussian of `sigma`.
fn box_sizes_for_gauss(sigma: f32, n: usize) -> Vec<usize> {
    let nf = n as f32;
    let w_ideal = (12.0 * sigma * sigma / nf + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wlf = wl as f32;
    let m_ideal =
        (12.0 * sigma * sigma - nf * wlf * wlf - 4.0 * nf * wlf - 3.0 * nf) / (-4.0 * wlf - 4.0);
    let m = m_ideal.round().max(0.0) as usize;
    (0..n)
        .map(|i| if i < m { wl as usize } else { wu as usize })
        .collect()
}

/// Horizontal box blur. Texels beyond the edge count as transparent.
fn box_blur_h(src: &[f32], dst: &mut [f32], w: usize, h: usize, r: usize) {
    let norm = 1.0 / (2 * r + 1) as f32;
    for y in 0..h {
        let row = y * w;
        for c in 0..4 {
            let mut acc = 0.0f32;
            for x in 0..=r.min(w - 1) {
                acc += src[(row + x) * 4 + c];
            }
            for x in 0..w {
                dst[(row + x) * 4 + c] = acc * norm;
                let enter = x + r + 1;
                if enter < w {
                    acc += src[(row + enter) * 4 + c];
                }
                if x >= r {
                    acc -= src[(row + x - r) * 4 + c];
                }
            }
        }
    }
}

fn box_blur_v(src: &[f32], dst: &mut [f32], w: usize, h: usize, r: usize) {
    let norm = 1.0 / (2 * r + 1) as f32;
    for x in 0..w {
        for c in 0..4 {
            let mut acc = 0.0f32;
            for y in 0..=r.min(h - 1) {
                acc += src[(y * w + x) * 4 + c];
            }
            for y in 0..h {
                dst[(y * w + x) * 4 + c] = acc * norm;
                let enter = y + r + 1;
                if enter < h {
                    acc += src[(enter * w + x) * 4 + c];
                }
                if y >= r {
                    acc -= src[((y - r) * w + x) * 4 + c];
                }
            }
        }
    }
}
