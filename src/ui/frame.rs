//! PNG export of software-composited frames.

use anyhow::{Context, Result};
use essence_core::composite::SoftwareCompositor;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Background the glow is composited over, matching the canvas page.
pub const BACKGROUND: [u8; 3] = [0x0b, 0x0d, 0x12];

/// Flattens the compositor's frame onto [`BACKGROUND`] as RGB bytes.
#[must_use]
pub fn flatten(compositor: &SoftwareCompositor) -> Vec<u8> {
    let rgba = compositor.frame_rgba();
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = u32::from(px[3]);
        for c in 0..3 {
            let fg = u32::from(px[c]);
            let bg = u32::from(BACKGROUND[c]);
            // Additive onto the background, as "lighter" does on the page.
            rgb.push((bg + fg * a / 255).min(255) as u8);
        }
    }
    rgb
}

/// Writes the current frame as an 8-bit RGB PNG.
pub fn save_png(path: &Path, compositor: &SoftwareCompositor) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, compositor.width() as u32, compositor.height() as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&flatten(compositor))?;
    tracing::info!(path = %path.display(), "Wrote frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frame_is_background() {
        let compositor = SoftwareCompositor::new(3, 2);
        let rgb = flatten(&compositor);
        assert_eq!(rgb.len(), 18);
        assert!(rgb.chunks_exact(3).all(|px| px == BACKGROUND));
    }

    #[test]
    fn test_save_png_writes_file() {
        let compositor = SoftwareCompositor::new(4, 4);
        let path = std::env::temp_dir().join("essence_frame_test.png");
        save_png(&path, &compositor).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let _ = std::fs::remove_file(&path);
    }
}
