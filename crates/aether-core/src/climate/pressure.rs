//! Base-state surface pressure.
//!
//! Barometric altitude term plus idealized circulation-belt offsets,
//! smoothed by block-mean resampling and textured with a little coherent
//! noise. Runs first in the stage order; wind differentiates this field.

use crate::coords::Grid;
use crate::noise::Fbm;

use super::field::ClimateField;
use super::grid;

/// Standard sea-level pressure, hPa.
pub const SEA_LEVEL_PRESSURE: f32 = 1013.25;
/// Atmospheric scale height, meters.
pub const SCALE_HEIGHT_M: f32 = 8500.0;
/// Hard bounds on surface pressure, hPa.
pub const PRESSURE_MIN: f32 = 870.0;
pub const PRESSURE_MAX: f32 = 1090.0;

const BELT_OFFSET_HPA: f32 = 5.0;
const NOISE_AMPLITUDE_HPA: f32 = 5.0;

pub fn generate(field: &mut ClimateField, grid: &Grid, noise: &Fbm) {
    let n = grid.size;
    for y in 0..n {
        let belt = belt_offset(grid.lat_of_row(y).abs() as f32);
        for x in 0..n {
            let i = grid.idx(y, x);
            let elev = field.elevation[i].max(0.0);
            let barometric = SEA_LEVEL_PRESSURE * (-elev / SCALE_HEIGHT_M).exp();
            field.pressure[i] = barometric + belt;
        }
    }

    // Coarsen then re-interpolate so belt boundaries blend into broad
    // gradients instead of steps.
    field.pressure = grid::block_mean_resample(grid, &field.pressure, 3);

    let scale = 4.0 / n as f64;
    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            let jitter = noise.sample3(x as f64 * scale, y as f64 * scale, 0.0, 4, 0.5, 2.0);
            field.pressure[i] += jitter as f32 * NOISE_AMPLITUDE_HPA;
            field.pressure[i] = field.pressure[i].clamp(PRESSURE_MIN, PRESSURE_MAX);
        }
    }
}

/// Idealized belt structure: equatorial low, subtropical high, sub-polar
/// low, polar high.
fn belt_offset(abs_lat: f32) -> f32 {
    if abs_lat < 15.0 {
        -BELT_OFFSET_HPA
    } else if abs_lat < 35.0 {
        BELT_OFFSET_HPA
    } else if abs_lat < 65.0 {
        -BELT_OFFSET_HPA
    } else {
        BELT_OFFSET_HPA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Grid;

    fn flat_field(size: usize) -> (ClimateField, Grid) {
        let g = Grid::new(size);
        let f = ClimateField::new(g, vec![false; g.cells()], vec![0.0; g.cells()]);
        (f, g)
    }

    #[test]
    fn pressure_stays_in_physical_bounds() {
        let (mut f, g) = flat_field(32);
        // Exaggerated terrain to stress the clamp.
        for i in 0..f.elevation.len() {
            f.elevation[i] = (i % 7) as f32 * 1500.0;
        }
        generate(&mut f, &g, &Fbm::new(9));
        for (i, p) in f.pressure.iter().enumerate() {
            assert!(
                (PRESSURE_MIN..=PRESSURE_MAX).contains(p),
                "cell {i}: pressure {p} out of bounds"
            );
        }
    }

    #[test]
    fn high_terrain_lowers_pressure() {
        let g = Grid::new(32);
        let mut elev = vec![0.0f32; g.cells()];
        // A plateau on the right half, at matched latitudes.
        for y in 0..32 {
            for x in 16..32 {
                elev[g.idx(y, x)] = 4000.0;
            }
        }
        let mut f = ClimateField::new(g, vec![false; g.cells()], elev);
        generate(&mut f, &g, &Fbm::new(9));
        let lowland = f.pressure[g.idx(16, 4)];
        let plateau = f.pressure[g.idx(16, 24)];
        assert!(
            plateau < lowland - 100.0,
            "4 km plateau should sit far below sea-level pressure ({plateau} vs {lowland})"
        );
    }

    #[test]
    fn subtropics_read_higher_than_equator_on_average() {
        let (mut f, g) = flat_field(64);
        generate(&mut f, &g, &Fbm::new(3));
        let row_mean = |y: usize| -> f32 {
            (0..64).map(|x| f.pressure[g.idx(y, x)]).sum::<f32>() / 64.0
        };
        // Row 31 ≈ 1.4°N (equatorial low), row 23 ≈ 24.3°N (subtropical high).
        assert!(
            row_mean(23) > row_mean(31),
            "subtropical mean {} should exceed equatorial mean {}",
            row_mean(23),
            row_mean(31)
        );
    }
}
