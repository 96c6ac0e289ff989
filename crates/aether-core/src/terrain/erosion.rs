//! Hydraulic droplet erosion and thermal weathering.
//!
//! Droplets spawn at random land cells, follow the steepest-descent flow
//! map, erode in proportion to slope, and settle their sediment when the
//! slope flattens. A talus pass then relaxes over-steep faces. Both passes
//! wrap in x and clamp in y; ocean cells (negative height) are untouched.

use rand::rngs::StdRng;
use rand::Rng;

use crate::coords::Grid;

pub struct ErosionParams {
    pub iterations: usize,
    /// Droplets per iteration, as a fraction of the cell count.
    pub drop_rate: f32,
    pub strength: f32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self { iterations: 50, drop_rate: 0.05, strength: 0.3 }
    }
}

const MAX_PATH: usize = 30;
const TALUS_ANGLE: f32 = 0.05;

pub fn apply(heights: &mut [f32], grid: &Grid, rng: &mut StdRng, params: &ErosionParams) {
    let flow = flow_directions(heights, grid);
    hydraulic(heights, grid, rng, &flow, params);
    thermal(heights, grid, params.iterations / 2);
    renormalize(heights);
}

/// Steepest-descent direction per land cell, (dy, dx) in {−1, 0, 1}².
fn flow_directions(heights: &[f32], grid: &Grid) -> Vec<(i8, i8)> {
    let n = grid.size;
    let mut flow = vec![(0i8, 0i8); heights.len()];
    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            if heights[i] < 0.0 {
                continue;
            }
            let mut min_height = heights[i];
            let mut min_dir = (0i8, 0i8);
            for dy in -1i8..=1 {
                for dx in -1i8..=1 {
                    if dy == 0 && dx == 0 {
                        continue;
                    }
                    let j = grid.neighbour(y, x, dy as isize, dx as isize);
                    if heights[j] < min_height {
                        min_height = heights[j];
                        min_dir = (dy, dx);
                    }
                }
            }
            flow[i] = min_dir;
        }
    }
    flow
}

fn hydraulic(
    heights: &mut [f32],
    grid: &Grid,
    rng: &mut StdRng,
    flow: &[(i8, i8)],
    params: &ErosionParams,
) {
    let n = grid.size;
    let drops_per_iter = ((n * n) as f32 * params.drop_rate) as usize;

    for _ in 0..params.iterations {
        for _ in 0..drops_per_iter {
            let mut x = rng.gen_range(0..n);
            let mut y = rng.gen_range(0..n);
            if heights[grid.idx(y, x)] < 0.0 {
                continue;
            }

            let mut sediment = 0.0f32;
            let mut path = Vec::with_capacity(MAX_PATH);

            for _ in 0..MAX_PATH {
                let i = grid.idx(y, x);
                path.push(i);

                let (dy, dx) = flow[i];
                if dy == 0 && dx == 0 {
                    break;
                }
                let ny = grid.clamp_y(y as isize + dy as isize);
                let nx = grid.wrap_x(x as isize + dx as isize);
                let j = grid.idx(ny, nx);

                let drop = heights[i] - heights[j];
                if drop > 0.0 {
                    let erode = (drop * params.strength).min(0.01);
                    heights[i] -= erode;
                    sediment += erode;
                } else {
                    let deposit = sediment * 0.5;
                    heights[i] += deposit;
                    sediment -= deposit;
                }

                y = ny;
                x = nx;
                if heights[j] < 0.0 {
                    break;
                }
            }

            // Whatever the droplet still carries settles along its path.
            if sediment > 0.0 && !path.is_empty() {
                let per_cell = sediment / path.len() as f32;
                for &i in &path {
                    heights[i] += per_cell;
                }
            }
        }
    }
}

/// Move material off slopes steeper than the talus angle.
fn thermal(heights: &mut [f32], grid: &Grid, passes: usize) {
    let n = grid.size;
    for _ in 0..passes {
        for y in 0..n {
            for x in 0..n {
                let i = grid.idx(y, x);
                if heights[i] < 0.0 {
                    continue;
                }
                let mut max_slope = 0.0f32;
                let mut target = i;
                for (dy, dx) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
                    let j = grid.neighbour(y, x, dy, dx);
                    let slope = heights[i] - heights[j];
                    if slope > max_slope {
                        max_slope = slope;
                        target = j;
                    }
                }
                if max_slope > TALUS_ANGLE {
                    let moved = (max_slope - TALUS_ANGLE) * 0.5;
                    heights[i] -= moved;
                    heights[target] += moved;
                }
            }
        }
    }
}

/// Erosion can push cells past the working range; pull land back into
/// [0, 1] and ocean into [−0.5, 0] without mixing the two.
fn renormalize(heights: &mut [f32]) {
    let mut land_max = 0.0f32;
    let mut ocean_min = 0.0f32;
    for &h in heights.iter() {
        if h >= 0.0 {
            land_max = land_max.max(h);
        } else {
            ocean_min = ocean_min.min(h);
        }
    }
    if land_max <= 1.0 && ocean_min >= -0.5 {
        return;
    }
    for h in heights.iter_mut() {
        if *h >= 0.0 {
            if land_max > 1.0 {
                *h /= land_max;
            }
        } else if ocean_min < -0.5 {
            *h = *h / ocean_min.abs() * 0.5;
        }
    }
}
