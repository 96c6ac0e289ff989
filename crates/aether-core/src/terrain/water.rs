//! Water bodies: sea-level selection by coverage percentile, ocean depth
//! remapping, and river/lake carving into the water mask.

use rand::rngs::StdRng;
use rand::Rng;

use crate::coords::Grid;

/// Pick the sea level as the `coverage` percentile of the height
/// distribution, mark everything below it as water, and remap submerged
/// cells onto an exponential basin curve in [−0.5, 0).
pub fn generate_water_bodies(heights: &mut [f32], coverage: f32) -> (Vec<bool>, f32) {
    let mut sorted: Vec<f32> = heights.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((coverage.clamp(0.0, 1.0) * sorted.len() as f32) as usize).min(sorted.len() - 1);
    let sea_level = sorted[idx];

    let mut water = vec![false; heights.len()];
    let deepest = sorted[0];
    let span = (sea_level - deepest).max(f32::EPSILON);
    for i in 0..heights.len() {
        if heights[i] < sea_level {
            water[i] = true;
            // Exponential basin profile: most ocean is abyssal plain, with
            // steep shelves near the coast.
            let depth = (sea_level - heights[i]) / span;
            heights[i] = -0.5 * (1.0 - (-3.0 * depth).exp()) / (1.0 - (-3.0f32).exp());
        } else {
            // Re-zero land so the coastline sits at height 0.
            heights[i] = (heights[i] - sea_level) / (1.0 - sea_level).max(f32::EPSILON);
        }
    }
    (water, sea_level)
}

/// Trace rivers from high ground to the sea along steepest descent with a
/// little meander, marking their cells into the water mask.
pub fn carve_rivers(
    heights: &[f32],
    water: &mut [bool],
    grid: &Grid,
    rng: &mut StdRng,
    count: usize,
) {
    let n = grid.size;
    // Candidate sources: high cells well above the coast.
    let sources: Vec<usize> = (0..heights.len())
        .filter(|&i| !water[i] && heights[i] > 0.5)
        .collect();
    if sources.is_empty() {
        return;
    }

    for _ in 0..count {
        let start = sources[rng.gen_range(0..sources.len())];
        let mut y = start / n;
        let mut x = start % n;

        for _ in 0..(4 * n) {
            let i = grid.idx(y, x);
            if water[i] {
                break;
            }
            water[i] = true;

            // Steepest descent with occasional sideways meander.
            let mut best = i;
            let mut best_h = heights[i];
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if dy == 0 && dx == 0 {
                        continue;
                    }
                    let j = grid.neighbour(y, x, dy, dx);
                    if heights[j] < best_h {
                        best_h = heights[j];
                        best = j;
                    }
                }
            }
            if best == i {
                break; // Local depression: the river ends in a lake.
            }
            let mut ny = best / n;
            let mut nx = best % n;
            if rng.gen_bool(0.2) {
                // Meander one cell sideways when the terrain allows it.
                let j = grid.neighbour(ny, nx, 0, if rng.gen_bool(0.5) { 1 } else { -1 });
                if heights[j] <= heights[i] {
                    ny = j / n;
                    nx = j % n;
                }
            }
            y = ny;
            x = nx;
        }
    }
}

/// Mark closed land depressions as lakes.
pub fn fill_lakes(heights: &[f32], water: &mut [bool], grid: &Grid, count: usize) {
    let n = grid.size;
    let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            if water[i] {
                continue;
            }
            let mut is_minimum = true;
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if dy == 0 && dx == 0 {
                        continue;
                    }
                    if heights[grid.neighbour(y, x, dy, dx)] < heights[i] {
                        is_minimum = false;
                    }
                }
            }
            if is_minimum {
                candidates.push((heights[i], y, x));
            }
        }
    }
    // Deepest depressions first.
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
    for &(_, y, x) in candidates.iter().take(count) {
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                water[grid.neighbour(y, x, dy, dx)] = true;
            }
        }
    }
}

/// Convert a normalized height to meters: shores up to 2000 m, normal land
/// 600–3000 m, mountains 3000–8000 m. Negative heights map below sea
/// level.
pub fn elevation_meters(heights: &[f32]) -> Vec<f32> {
    heights
        .iter()
        .map(|&h| {
            if h < 0.3 {
                h * 2000.0
            } else if h < 0.6 {
                600.0 + (h - 0.3) / 0.3 * 2400.0
            } else {
                3000.0 + (h - 0.6) / 0.4 * 5000.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    #[test]
    fn coverage_percentile_sets_the_water_fraction() {
        let mut h: Vec<f32> = (0..64 * 64).map(|i| (i % 101) as f32 / 100.0).collect();
        let (water, _) = generate_water_bodies(&mut h, 0.65);
        let wet = water.iter().filter(|&&w| w).count() as f32 / water.len() as f32;
        assert!(
            (wet - 0.65).abs() < 0.02,
            "water fraction {wet} should match the requested coverage"
        );
    }

    #[test]
    fn submerged_cells_go_negative_and_land_positive() {
        let mut h: Vec<f32> = (0..32 * 32).map(|i| (i % 97) as f32 / 96.0).collect();
        let (water, _) = generate_water_bodies(&mut h, 0.5);
        for i in 0..h.len() {
            if water[i] {
                assert!((-0.5..0.0).contains(&h[i]), "cell {i}: wet height {}", h[i]);
            } else {
                assert!((0.0..=1.0).contains(&h[i]), "cell {i}: dry height {}", h[i]);
            }
        }
    }

    #[test]
    fn rivers_run_from_the_source_downhill() {
        let g = Grid::new(32);
        // A single peak in a dry world sloping to the edge.
        let c = 16.0f32;
        let mut h: Vec<f32> = (0..g.cells())
            .map(|i| {
                let y = (i / 32) as f32;
                let x = (i % 32) as f32;
                let d = ((x - c).powi(2) + (y - c).powi(2)).sqrt();
                (1.0 - d / 22.0).max(0.05)
            })
            .collect();
        let (mut water, _) = generate_water_bodies(&mut h, 0.2);
        let before = water.iter().filter(|&&w| w).count();
        let mut rng = StdRng::seed_from_u64(4);
        carve_rivers(&h, &mut water, &g, &mut rng, 5);
        let after = water.iter().filter(|&&w| w).count();
        assert!(after > before, "rivers should add water cells ({before} -> {after})");
    }

    #[test]
    fn elevation_bands_are_monotonic() {
        let e = elevation_meters(&[-0.4, 0.0, 0.29, 0.3, 0.6, 1.0]);
        assert!(e[0] < 0.0, "submerged cells map below sea level");
        assert_eq!(e[1], 0.0);
        assert!(e.windows(2).all(|w| w[0] <= w[1]), "bands must be monotonic: {e:?}");
        // Band arithmetic runs in f32; compare with a tolerance.
        assert_relative_eq!(e[4], 3000.0, epsilon = 1e-2);
        assert_relative_eq!(e[5], 8000.0, epsilon = 1e-2);
    }
}
