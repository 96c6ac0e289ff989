//! Shared raster passes for climate fields: Gaussian smoothing, distance
//! transforms, gradients, and block-mean resampling.
//!
//! All passes honour the lattice topology from [`crate::coords`]: x wraps
//! around the cylinder, y clamps at the poles.

use crate::coords::Grid;

/// Separable Gaussian blur with sigma in cells. Returns the input unchanged
/// for sigma ≤ 0.
pub fn gaussian_blur(grid: &Grid, data: &[f32], sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return data.to_vec();
    }
    let radius = (3.0 * sigma).ceil() as isize;
    let kernel = gaussian_kernel(sigma, radius);
    let n = grid.size;

    // Horizontal pass, wrapping in x.
    let mut tmp = vec![0.0f32; data.len()];
    for y in 0..n {
        for x in 0..n {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let dx = k as isize - radius;
                let nx = grid.wrap_x(x as isize + dx);
                acc += w * data[grid.idx(y, nx)];
            }
            tmp[grid.idx(y, x)] = acc;
        }
    }

    // Vertical pass, clamping in y.
    let mut out = vec![0.0f32; data.len()];
    for y in 0..n {
        for x in 0..n {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let dy = k as isize - radius;
                let ny = grid.clamp_y(y as isize + dy);
                acc += w * tmp[grid.idx(ny, x)];
            }
            out[grid.idx(y, x)] = acc;
        }
    }
    out
}

fn gaussian_kernel(sigma: f32, radius: isize) -> Vec<f32> {
    let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
    let denom = 2.0 * sigma * sigma;
    for k in -radius..=radius {
        kernel.push((-(k * k) as f32 / denom).exp());
    }
    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Chamfer distance (in cells) from every cell to the nearest cell where
/// `mask` is true. Cells inside the mask get 0. Two-pass 3×4 chamfer with
/// x-wrap handled by iterating the sweeps until stable (two rounds suffice
/// on a cylinder).
pub fn distance_to(grid: &Grid, mask: &[bool]) -> Vec<f32> {
    const ORTHO: f32 = 1.0;
    const DIAG: f32 = std::f32::consts::SQRT_2;
    let n = grid.size;
    let far = (2 * n) as f32;
    let mut dist: Vec<f32> = mask.iter().map(|&m| if m { 0.0 } else { far }).collect();

    // Two rounds of forward+backward sweeps so distances can propagate
    // across the x seam.
    for _ in 0..2 {
        for y in 0..n {
            for x in 0..n {
                let i = grid.idx(y, x);
                let mut d = dist[i];
                d = d.min(dist[grid.neighbour(y, x, 0, -1)] + ORTHO);
                if y > 0 {
                    d = d.min(dist[grid.neighbour(y, x, -1, 0)] + ORTHO);
                    d = d.min(dist[grid.neighbour(y, x, -1, -1)] + DIAG);
                    d = d.min(dist[grid.neighbour(y, x, -1, 1)] + DIAG);
                }
                dist[i] = d;
            }
        }
        for y in (0..n).rev() {
            for x in (0..n).rev() {
                let i = grid.idx(y, x);
                let mut d = dist[i];
                d = d.min(dist[grid.neighbour(y, x, 0, 1)] + ORTHO);
                if y + 1 < n {
                    d = d.min(dist[grid.neighbour(y, x, 1, 0)] + ORTHO);
                    d = d.min(dist[grid.neighbour(y, x, 1, 1)] + DIAG);
                    d = d.min(dist[grid.neighbour(y, x, 1, -1)] + DIAG);
                }
                dist[i] = d;
            }
        }
    }
    dist
}

/// Central-difference gradient. Returns (d/dy, d/dx) grids; x differences
/// wrap around the cylinder, y differences fall back to one-sided at the
/// poles (matching the half-step divisor there).
pub fn gradient(grid: &Grid, data: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let n = grid.size;
    let mut dy = vec![0.0f32; data.len()];
    let mut dx = vec![0.0f32; data.len()];
    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            let east = data[grid.idx(y, grid.wrap_x(x as isize + 1))];
            let west = data[grid.idx(y, grid.wrap_x(x as isize - 1))];
            dx[i] = (east - west) * 0.5;

            if y == 0 {
                dy[i] = data[grid.idx(1, x)] - data[i];
            } else if y == n - 1 {
                dy[i] = data[i] - data[grid.idx(n - 2, x)];
            } else {
                dy[i] = (data[grid.idx(y + 1, x)] - data[grid.idx(y - 1, x)]) * 0.5;
            }
        }
    }
    (dy, dx)
}

/// Smooth a field by averaging `block`-sized tiles and bilinearly
/// re-interpolating back to full resolution. Removes sub-block detail while
/// keeping the large-scale shape.
pub fn block_mean_resample(grid: &Grid, data: &[f32], block: usize) -> Vec<f32> {
    let n = grid.size;
    if block <= 1 || n < 2 * block {
        return data.to_vec();
    }
    let coarse_n = n.div_ceil(block);
    let mut coarse = vec![0.0f32; coarse_n * coarse_n];
    for cy in 0..coarse_n {
        for cx in 0..coarse_n {
            let mut sum = 0.0;
            let mut count = 0;
            for y in (cy * block)..((cy + 1) * block).min(n) {
                for x in (cx * block)..((cx + 1) * block).min(n) {
                    sum += data[grid.idx(y, x)];
                    count += 1;
                }
            }
            coarse[cy * coarse_n + cx] = sum / count as f32;
        }
    }

    // Bilinear upsample, sampling coarse cell centres.
    let mut out = vec![0.0f32; data.len()];
    let scale = coarse_n as f32 / n as f32;
    for y in 0..n {
        let fy = ((y as f32 + 0.5) * scale - 0.5).clamp(0.0, (coarse_n - 1) as f32);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(coarse_n - 1);
        let ty = fy - y0 as f32;
        for x in 0..n {
            let fx = ((x as f32 + 0.5) * scale - 0.5).clamp(0.0, (coarse_n - 1) as f32);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(coarse_n - 1);
            let tx = fx - x0 as f32;
            let top = coarse[y0 * coarse_n + x0] * (1.0 - tx) + coarse[y0 * coarse_n + x1] * tx;
            let bot = coarse[y1 * coarse_n + x0] * (1.0 - tx) + coarse[y1 * coarse_n + x1] * tx;
            out[grid.idx(y, x)] = top * (1.0 - ty) + bot * ty;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_preserves_constant_fields() {
        let g = Grid::new(16);
        let data = vec![3.5f32; g.cells()];
        let out = gaussian_blur(&g, &data, 2.0);
        for (i, v) in out.iter().enumerate() {
            assert!((v - 3.5).abs() < 1e-4, "cell {i}: {v} drifted from 3.5");
        }
    }

    #[test]
    fn blur_spreads_an_impulse() {
        let g = Grid::new(16);
        let mut data = vec![0.0f32; g.cells()];
        data[g.idx(8, 8)] = 1.0;
        let out = gaussian_blur(&g, &data, 1.5);
        assert!(out[g.idx(8, 8)] < 1.0, "peak should be reduced");
        assert!(out[g.idx(8, 9)] > 0.0, "mass should spread to neighbours");
        let total: f32 = out.iter().sum();
        assert!((total - 1.0).abs() < 1e-3, "blur should conserve mass, got {total}");
    }

    #[test]
    fn blur_wraps_across_the_x_seam() {
        let g = Grid::new(16);
        let mut data = vec![0.0f32; g.cells()];
        data[g.idx(8, 0)] = 1.0;
        let out = gaussian_blur(&g, &data, 1.5);
        assert!(out[g.idx(8, 15)] > 0.0, "mass should cross the longitude seam");
    }

    #[test]
    fn distance_counts_cells_to_the_mask() {
        let g = Grid::new(8);
        let mut mask = vec![false; g.cells()];
        mask[g.idx(4, 4)] = true;
        let d = distance_to(&g, &mask);
        assert_eq!(d[g.idx(4, 4)], 0.0);
        assert_eq!(d[g.idx(4, 6)], 2.0);
        assert!((d[g.idx(6, 6)] - 2.0 * std::f32::consts::SQRT_2).abs() < 1e-5);
        // Wrap: column 7 is one step west of the seed's antipode path.
        assert!(d[g.idx(4, 7)] <= 5.0 + 1e-5, "distance should wrap in x");
    }

    #[test]
    fn gradient_of_a_ramp_is_constant() {
        let g = Grid::new(8);
        let data: Vec<f32> = (0..g.cells()).map(|i| (i / g.size) as f32).collect();
        let (dy, dx) = gradient(&g, &data);
        for y in 0..g.size {
            for x in 0..g.size {
                let i = g.idx(y, x);
                assert!((dy[i] - 1.0).abs() < 1e-5, "dy at ({y},{x}) = {}", dy[i]);
                assert!(dx[i].abs() < 1e-5, "dx at ({y},{x}) = {}", dx[i]);
            }
        }
    }

    #[test]
    fn block_resample_flattens_detail() {
        let g = Grid::new(12);
        let data: Vec<f32> =
            (0..g.cells()).map(|i| if i % 2 == 0 { 0.0 } else { 10.0 }).collect();
        let out = block_mean_resample(&g, &data, 3);
        for v in &out {
            assert!((v - 5.0).abs() < 2.0, "checkerboard should average out, got {v}");
        }
    }
}
