//! Update kernels for the amount channel.
//!
//! Both kernels are pure functions over slices so the field can run them
//! row-parallel without aliasing: evaporation is element-wise, and diffusion
//! reads only `src` while writing only `dst`.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Proportional decay of one cell. `k` is `evaporation_per_sec * dt`.
#[inline(always)]
#[must_use]
pub fn evaporate_cell(v: f32, k: f32) -> f32 {
    if v > 0.0 {
        (v - k * v).max(0.0)
    } else {
        0.0
    }
}

pub fn evaporate(amount: &mut [f32], k: f32) {
    #[cfg(feature = "rayon")]
    amount.par_iter_mut().for_each(|v| *v = evaporate_cell(*v, k));
    #[cfg(not(feature = "rayon"))]
    amount.iter_mut().for_each(|v| *v = evaporate_cell(*v, k));
}

/// One explicit diffusion step from `src` into `dst`.
///
/// Each cell moves a fraction `alpha` of the way toward the mean of its four
/// orthogonal neighbours. Neighbours beyond the edge are replaced by the cell
/// itself (reflective boundary), and results are clamped to `[0, 1]`.
pub fn diffuse_into(src: &[f32], dst: &mut [f32], width: usize, height: usize, alpha: f32) {
    debug_assert_eq!(src.len(), width * height);
    debug_assert_eq!(dst.len(), width * height);

    #[cfg(feature = "rayon")]
    dst.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| diffuse_row(src, row, y, width, height, alpha));
    #[cfg(not(feature = "rayon"))]
    dst.chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| diffuse_row(src, row, y, width, height, alpha));
}

fn diffuse_row(src: &[f32], row: &mut [f32], y: usize, width: usize, height: usize, alpha: f32) {
    let y_up = if y > 0 { y - 1 } else { y };
    let y_dn = if y + 1 < height { y + 1 } else { y };
    for (x, out) in row.iter_mut().enumerate() {
        let x_lt = if x > 0 { x - 1 } else { x };
        let x_rt = if x + 1 < width { x + 1 } else { x };
        let center = src[y * width + x];
        let mean = (src[y_up * width + x]
            + src[y_dn * width + x]
            + src[y * width + x_lt]
            + src[y * width + x_rt])
            * 0.25;
        *out = (center + alpha * (mean - center)).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaporate_cell_is_proportional() {
        assert_eq!(evaporate_cell(0.0, 0.5), 0.0);
        assert_eq!(evaporate_cell(-0.2, 0.5), 0.0);
        assert!((evaporate_cell(0.8, 0.25) - 0.6).abs() < 1e-6);
        // Over-large k never drives the value negative.
        assert_eq!(evaporate_cell(0.8, 3.0), 0.0);
    }

    #[test]
    fn test_uniform_field_is_fixed_point() {
        let src = vec![0.5f32; 12];
        let mut dst = vec![0.0f32; 12];
        diffuse_into(&src, &mut dst, 4, 3, 0.7);
        assert!(dst.iter().all(|v| (*v - 0.5).abs() < 1e-7));
    }

    #[test]
    fn test_single_row_grid() {
        let src = vec![0.0, 1.0, 0.0];
        let mut dst = vec![0.0; 3];
        diffuse_into(&src, &mut dst, 3, 1, 0.4);
        // Up/down collapse onto the cell itself on a one-row grid.
        assert!((dst[1] - (1.0 + 0.4 * (0.5 - 1.0))).abs() < 1e-6);
        assert!((dst[0] - 0.1).abs() < 1e-6);
        assert!((dst[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_result_is_independent_of_traversal() {
        // A gradient would bias an in-place sweep; the two-buffer kernel is symmetric.
        let w = 5;
        let mut src = vec![0.0f32; w * w];
        src[2 * w + 2] = 1.0;
        let mut dst = vec![0.0f32; w * w];
        diffuse_into(&src, &mut dst, w, w, 0.5);
        let left = dst[2 * w + 1];
        let right = dst[2 * w + 3];
        let up = dst[w + 2];
        let down = dst[3 * w + 2];
        assert_eq!(left, right);
        assert_eq!(up, down);
        assert_eq!(left, up);
    }
}
