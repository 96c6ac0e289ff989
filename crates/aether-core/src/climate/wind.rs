//! Base-state surface wind.
//!
//! Geostrophic balance from the pressure field, a thermal-wind nudge,
//! boundary-layer friction keyed to terrain roughness, then local
//! circulations (sea/land breeze, slope winds) and a light smoothing pass.
//!
//! Convention: `wind_u` is eastward, `wind_v` is northward. Row index grows
//! southward, so row-space gradients are negated when they enter the
//! meridional component.

use crate::coords::Grid;

use super::field::ClimateField;
use super::grid;

/// Sea-level air density, kg/m³.
const RHO_SEA_LEVEL: f32 = 1.225;
/// Below this |f| the geostrophic balance blows up; flow goes straight
/// down-gradient instead.
const CORIOLIS_FLOOR: f32 = 1e-10;
/// Down-gradient flow speed in the equatorial branch, m/s.
const EQUATORIAL_SPEED: f32 = 10.0;
/// Global wind speed ceiling, m/s.
const MAX_SPEED: f32 = 30.0;

pub fn generate(
    field: &mut ClimateField,
    grid: &Grid,
    heightmap: &[f32],
    km_per_cell: f64,
    is_day: bool,
) {
    let cell_m = (km_per_cell * 1000.0) as f32;
    let (dp_dy, dp_dx) = grid::gradient(grid, &field.pressure);

    // hPa per cell → Pa per meter.
    let to_pam = 100.0 / cell_m;

    for i in 0..field.pressure.len() {
        let f = field.coriolis[i];
        let rho = RHO_SEA_LEVEL * (-field.elevation[i].max(0.0) / 8500.0).exp();
        let de = dp_dx[i] * to_pam; // eastward pressure gradient
        let dn = -dp_dy[i] * to_pam; // northward (row index grows southward)
        if f.abs() > CORIOLIS_FLOOR {
            field.wind_u[i] = -dn / (rho * f);
            field.wind_v[i] = de / (rho * f);
        } else {
            // Equatorial cells: no geostrophic balance, air runs straight
            // from high to low pressure.
            let mag = (de * de + dn * dn).sqrt();
            if mag > 0.0 {
                field.wind_u[i] = -de / mag * EQUATORIAL_SPEED;
                field.wind_v[i] = -dn / mag * EQUATORIAL_SPEED;
            }
        }
    }

    // Thermal wind nudge: meridional temperature contrast feeds the zonal
    // flow, and vice versa.
    let (dt_dy, dt_dx) = grid::gradient(grid, &field.temperature);
    for i in 0..field.wind_u.len() {
        if field.coriolis[i].abs() > CORIOLIS_FLOOR {
            field.wind_u[i] -= dt_dy[i] * 0.5;
            field.wind_v[i] += dt_dx[i] * 0.5;
        }
    }

    rescale_to_max(field, MAX_SPEED);
    surface_friction(field, grid, heightmap);
    sea_land_breeze(field, grid, is_day);
    slope_winds(field, grid, heightmap, is_day);

    field.wind_u = grid::gaussian_blur(grid, &field.wind_u, 1.0);
    field.wind_v = grid::gaussian_blur(grid, &field.wind_v, 1.0);
}

fn rescale_to_max(field: &mut ClimateField, max_speed: f32) {
    let mut max = 0.0f32;
    for i in 0..field.wind_u.len() {
        max = max.max(field.wind_speed(i));
    }
    if max > max_speed {
        let scale = max_speed / max;
        for i in 0..field.wind_u.len() {
            field.wind_u[i] *= scale;
            field.wind_v[i] *= scale;
        }
    }
}

/// Friction slows the surface wind and turns it toward low pressure. The
/// turning angle and speed loss both grow with terrain roughness.
fn surface_friction(field: &mut ClimateField, grid: &Grid, heightmap: &[f32]) {
    let n = grid.size;
    let mut roughness = vec![0.1f32; field.wind_u.len()];
    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            if !field.water[i] {
                let neighbours = [
                    heightmap[grid.neighbour(y, x, -1, 0)],
                    heightmap[grid.neighbour(y, x, 1, 0)],
                    heightmap[grid.neighbour(y, x, 0, -1)],
                    heightmap[grid.neighbour(y, x, 0, 1)],
                ];
                let mean: f32 = neighbours.iter().sum::<f32>() / 4.0;
                let var: f32 =
                    neighbours.iter().map(|h| (h - mean) * (h - mean)).sum::<f32>() / 4.0;
                roughness[i] = 0.3 + var * 5.0;
            }
        }
    }

    for (i, &rough) in roughness.iter().enumerate() {
        let reduction = (1.0 - 0.5 * rough).clamp(0.2, 0.9);
        let angle = (10.0 + 20.0 * rough).min(30.0).to_radians();
        // Friction turning is toward low pressure: counterclockwise in the
        // northern hemisphere, clockwise in the southern.
        let angle = if field.coriolis[i] >= 0.0 { angle } else { -angle };
        let (sin_a, cos_a) = angle.sin_cos();
        let u = field.wind_u[i];
        let v = field.wind_v[i];
        field.wind_u[i] = (u * cos_a - v * sin_a) * reduction;
        field.wind_v[i] = (u * sin_a + v * cos_a) * reduction;
    }
}

/// Daytime sea breeze (water → land) and nighttime land breeze, within 10
/// cells of a coast, fading linearly with distance.
fn sea_land_breeze(field: &mut ClimateField, grid: &Grid, is_day: bool) {
    let land: Vec<bool> = field.water.iter().map(|&w| !w).collect();
    let dist_to_water = grid::distance_to(grid, &field.water);
    let dist_to_land = grid::distance_to(grid, &land);
    let n = grid.size;
    const BREEZE_SPEED: f32 = 2.0;
    const BREEZE_RANGE: f32 = 10.0;

    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            let coast_dist = dist_to_water[i].min(dist_to_land[i]);
            if coast_dist >= BREEZE_RANGE {
                continue;
            }
            // Mean offset toward local water within a 5-cell window.
            let mut sum_dx = 0.0f32;
            let mut sum_dn = 0.0f32;
            let mut water_cells = 0u32;
            let mut land_cells = 0u32;
            for dy in -5i32..=5 {
                for dx in -5i32..=5 {
                    let j = grid.neighbour(y, x, dy as isize, dx as isize);
                    if field.water[j] {
                        sum_dx += dx as f32;
                        sum_dn -= dy as f32;
                        water_cells += 1;
                    } else {
                        land_cells += 1;
                    }
                }
            }
            if water_cells == 0 || land_cells == 0 {
                continue;
            }
            let mut dir_x = sum_dx / water_cells as f32;
            let mut dir_n = sum_dn / water_cells as f32;
            let mag = (dir_x * dir_x + dir_n * dir_n).sqrt();
            if mag == 0.0 {
                continue;
            }
            dir_x /= mag;
            dir_n /= mag;
            // Day: flow from water onto land. Night: reversed.
            if is_day {
                dir_x = -dir_x;
                dir_n = -dir_n;
            }
            let strength = BREEZE_SPEED * (1.0 - coast_dist / BREEZE_RANGE);
            field.wind_u[i] += dir_x * strength;
            field.wind_v[i] += dir_n * strength;
        }
    }
}

/// Anabatic (daytime upslope) and katabatic (nighttime downslope) winds on
/// significant terrain slopes.
fn slope_winds(field: &mut ClimateField, grid: &Grid, heightmap: &[f32], is_day: bool) {
    let (dh_dy, dh_dx) = grid::gradient(grid, heightmap);
    const SLOPE_THRESHOLD: f32 = 0.05;

    for i in 0..field.wind_u.len() {
        if field.water[i] {
            continue;
        }
        let de = dh_dx[i];
        let dn = -dh_dy[i];
        let slope = (de * de + dn * dn).sqrt();
        if slope <= SLOPE_THRESHOLD {
            continue;
        }
        let (mut dir_x, mut dir_n) = (de / slope, dn / slope); // upslope
        if !is_day {
            dir_x = -dir_x;
            dir_n = -dir_n;
        }
        let strength = 3.0 * slope;
        field.wind_u[i] += dir_x * strength;
        field.wind_v[i] += dir_n * strength;
    }
}
