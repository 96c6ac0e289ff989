//! Base-state relative humidity.
//!
//! Water cells sit at saturation; land humidity combines distance-to-water
//! decay with an upwind moisture trace, capped by a simplified
//! Clausius–Clapeyron limit, then adjusted for orography and latitude belts.

use crate::coords::Grid;

use super::field::ClimateField;
use super::grid;

/// e-folding distance (cells) of the moisture decay away from water.
const DECAY_CELLS: f32 = 50.0;
/// Steps and stride of the upwind water search.
const TRACE_STEPS: usize = 10;
const TRACE_STRIDE: f32 = 2.0;

pub fn generate(field: &mut ClimateField, grid: &Grid) {
    let dist = grid::distance_to(grid, &field.water);

    // Large-scale transport uses a heavily smoothed wind field.
    let u_smooth = grid::gaussian_blur(grid, &field.wind_u, 5.0);
    let v_smooth = grid::gaussian_blur(grid, &field.wind_v, 5.0);

    let n = grid.size;
    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            if field.water[i] {
                field.humidity[i] = 1.0;
                continue;
            }
            let dist_effect = (-dist[i] / DECAY_CELLS).exp();
            let speed = (u_smooth[i] * u_smooth[i] + v_smooth[i] * v_smooth[i]).sqrt();
            field.humidity[i] = if speed > 0.5 {
                let wind_term = upwind_moisture(field, grid, y, x, u_smooth[i] / speed, v_smooth[i] / speed);
                0.3 * dist_effect + 0.7 * wind_term
            } else {
                dist_effect
            };
        }
    }

    clausius_clapeyron_cap(field);
    orographic_adjustment(field, grid);
    zonal_belts(field, grid);

    field.humidity = grid::gaussian_blur(grid, &field.humidity, 1.0);
    for h in &mut field.humidity {
        *h = h.clamp(0.0, 1.0);
    }
}

/// Walk upwind looking for water, weighting nearby hits more heavily.
/// `v_n` is the northward component; upwind rows grow when the flow comes
/// from the south.
fn upwind_moisture(field: &ClimateField, grid: &Grid, y: usize, x: usize, u: f32, v_n: f32) -> f32 {
    let mut total = 0.0f32;
    let mut hits = 0u32;
    for step in 1..=TRACE_STEPS {
        let off = step as f32 * TRACE_STRIDE;
        let uy = grid.clamp_y(y as isize + (v_n * off).round() as isize);
        let ux = grid.wrap_x(x as isize - (u * off).round() as isize);
        if field.water[grid.idx(uy, ux)] {
            total += 1.0 / (step as f32).sqrt();
            hits += 1;
        }
    }
    if hits > 0 {
        (total / hits as f32 * 1.5).min(1.0)
    } else {
        0.0
    }
}

/// Cold air holds less moisture. 0.5 at 0 °C, zero at −30 °C, saturating
/// toward 1.0 above 40 °C.
fn clausius_clapeyron_cap(field: &mut ClimateField) {
    for i in 0..field.humidity.len() {
        if field.water[i] {
            continue;
        }
        let t = field.temperature[i];
        let max_humidity = if t < 0.0 {
            (0.5 * (1.0 + t / 30.0)).max(0.0)
        } else {
            0.5 + 0.5 * (t / 40.0).min(1.0)
        };
        field.humidity[i] = field.humidity[i].min(max_humidity);
    }
}

/// Windward slopes gain moisture, leeward slopes dry out.
fn orographic_adjustment(field: &mut ClimateField, grid: &Grid) {
    let norm_elev: Vec<f32> = field.elevation.iter().map(|e| e / 8000.0).collect();
    let (dh_dy, dh_dx) = grid::gradient(grid, &norm_elev);

    for i in 0..field.humidity.len() {
        if field.water[i] {
            continue;
        }
        let speed = field.wind_speed(i);
        if speed <= 0.5 {
            continue;
        }
        let de = dh_dx[i];
        let dn = -dh_dy[i];
        let slope = (de * de + dn * dn).sqrt();
        if slope <= 0.02 {
            continue;
        }
        let upslope = (field.wind_u[i] * de + field.wind_v[i] * dn) / speed;
        if upslope > 0.0 {
            field.humidity[i] = (field.humidity[i] + upslope * slope * 3.0).min(1.0);
        } else {
            field.humidity[i] = (field.humidity[i] + upslope * slope * 5.0).max(0.1);
        }
    }
}

/// ITCZ moistening near the equator, subtropical desert-belt drying.
fn zonal_belts(field: &mut ClimateField, grid: &Grid) {
    let n = grid.size;
    for y in 0..n {
        let abs_lat = grid.lat_of_row(y).abs() as f32;
        for x in 0..n {
            let i = grid.idx(y, x);
            if field.water[i] {
                continue;
            }
            if abs_lat < 10.0 {
                field.humidity[i] = (field.humidity[i] * 1.3).min(1.0);
            } else if (15.0..35.0).contains(&abs_lat) {
                field.humidity[i] *= 0.7;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Grid;

    fn field_with_west_ocean(size: usize) -> (ClimateField, Grid) {
        let g = Grid::new(size);
        let mut water = vec![false; g.cells()];
        for y in 0..size {
            for x in 0..size / 4 {
                water[g.idx(y, x)] = true;
            }
        }
        let mut f = ClimateField::new(g, water, vec![0.0; g.cells()]);
        for t in &mut f.temperature {
            *t = 20.0;
        }
        (f, g)
    }

    #[test]
    fn water_cells_saturate_and_land_stays_bounded() {
        let (mut f, g) = field_with_west_ocean(32);
        generate(&mut f, &g);
        for y in 0..32 {
            for x in 0..32 {
                let i = g.idx(y, x);
                let h = f.humidity[i];
                assert!((0.0..=1.0).contains(&h), "cell ({x},{y}): humidity {h}");
            }
        }
        // Pre-blur water cells are 1.0; after the final smoothing interior
        // ocean remains near saturation.
        let deep_ocean = f.humidity[g.idx(16, 2)];
        assert!(deep_ocean > 0.9, "open-ocean humidity {deep_ocean} should stay high");
    }

    #[test]
    fn humidity_decays_inland_without_wind() {
        let (mut f, g) = field_with_west_ocean(64);
        generate(&mut f, &g);
        let y = 32;
        let near = f.humidity[g.idx(y, 18)];
        let far = f.humidity[g.idx(y, 40)];
        assert!(
            near > far,
            "coastal land ({near}) should be moister than the interior ({far})"
        );
    }

    #[test]
    fn onshore_wind_beats_offshore_wind() {
        let (mut onshore, g) = field_with_west_ocean(64);
        let (mut offshore, _) = field_with_west_ocean(64);
        for i in 0..g.cells() {
            onshore.wind_u[i] = 8.0; // westerly, blowing off the ocean
            offshore.wind_u[i] = -8.0; // easterly, upwind is dry interior
        }
        generate(&mut onshore, &g);
        generate(&mut offshore, &g);
        let i = g.idx(32, 20);
        assert!(
            onshore.humidity[i] > offshore.humidity[i],
            "upwind ocean should moisten coastal land ({} vs {})",
            onshore.humidity[i],
            offshore.humidity[i]
        );
    }

    #[test]
    fn cold_air_is_capped_dry() {
        let g = Grid::new(16);
        let mut water = vec![false; g.cells()];
        for y in 0..16 {
            water[g.idx(y, 0)] = true;
        }
        let mut f = ClimateField::new(g, water, vec![0.0; g.cells()]);
        for t in &mut f.temperature {
            *t = -30.0;
        }
        generate(&mut f, &g);
        for y in 0..16 {
            for x in 2..16 {
                let h = f.humidity[g.idx(y, x)];
                assert!(h < 0.3, "−30 °C land at ({x},{y}) should be near-dry, got {h}");
            }
        }
    }
}
