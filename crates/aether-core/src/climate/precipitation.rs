//! Base-state precipitation.
//!
//! Supersaturation-flavoured humidity response scaled by a temperature
//! efficiency curve, then amplified where the surface wind converges,
//! reshaped by orographic lift and rain shadows, belted by the global
//! circulation, and topped up with lake-effect precipitation.

use crate::coords::Grid;

use super::field::ClimateField;
use super::grid;

/// Precipitation at full saturation and ideal temperature, mm/day.
const SATURATION_RATE: f32 = 15.0;

pub fn generate(field: &mut ClimateField, grid: &Grid, heightmap: &[f32]) {
    for i in 0..field.precipitation.len() {
        let humidity_factor = field.humidity[i] * field.humidity[i];
        field.precipitation[i] =
            SATURATION_RATE * humidity_factor * efficiency(field.temperature[i]);
    }

    convergence_boost(field, grid);
    orographic(field, grid, heightmap);
    zonal_belts(field, grid);
    lake_effect(field, grid);

    field.precipitation = grid::gaussian_blur(grid, &field.precipitation, 1.0);
    for p in &mut field.precipitation {
        *p = p.max(0.0);
    }
}

/// Condensation efficiency: 0.7 at 0 °C, peaking at 1.0 near 25 °C, tailing
/// off in both the cold and the hot directions.
fn efficiency(temp: f32) -> f32 {
    if temp < 0.0 {
        0.7 + 0.3 * (temp / 30.0) // down to 0.4 at −30 °C
    } else if temp < 25.0 {
        0.7 + 0.3 * (temp / 25.0)
    } else {
        1.0 - 0.3 * ((temp - 25.0) / 15.0).min(1.0)
    }
}

/// Converging surface winds lift air and wring out moisture. The divergence
/// field is normalised so the strongest convergence doubles rainfall.
fn convergence_boost(field: &mut ClimateField, grid: &Grid) {
    let (_, du_dx) = grid::gradient(grid, &field.wind_u);
    let (dv_dy, _) = grid::gradient(grid, &field.wind_v);

    // v is northward while the row axis points south, so ∂v/∂north is the
    // negated row-space derivative. Convergence is minus the divergence.
    let convergence: Vec<f32> = (0..field.precipitation.len())
        .map(|i| -(du_dx[i] - dv_dy[i]))
        .collect();
    let max_abs = convergence.iter().fold(0.0f32, |m, c| m.max(c.abs()));
    if max_abs > 0.0 {
        for (i, c) in convergence.iter().enumerate() {
            let c = c / max_abs * 2.0;
            if c > 0.0 {
                field.precipitation[i] *= 1.0 + c;
            }
        }
    }
}

/// Windward slopes squeeze out extra rain; lee slopes cast a shadow that
/// extends several cells downwind.
fn orographic(field: &mut ClimateField, grid: &Grid, heightmap: &[f32]) {
    let (dh_dy, dh_dx) = grid::gradient(grid, heightmap);
    let n = grid.size;

    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
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
            if slope <= 0.01 {
                continue;
            }
            let u_norm = field.wind_u[i] / speed;
            let v_norm = field.wind_v[i] / speed;
            let upslope = u_norm * de + v_norm * dn;
            if upslope > 0.0 {
                field.precipitation[i] += upslope * slope * 15.0;
            } else {
                field.precipitation[i] = (field.precipitation[i] + upslope * slope * 8.0).max(0.2);
                // Extended rain shadow downwind of the lee slope.
                for step in 1..=5i32 {
                    let sy = grid.clamp_y(y as isize - (v_norm * step as f32).round() as isize);
                    let sx = grid.wrap_x(x as isize + (u_norm * step as f32).round() as isize);
                    let j = grid.idx(sy, sx);
                    if !field.water[j] {
                        field.precipitation[j] *= 0.8 - 0.1 * step as f32;
                    }
                }
            }
        }
    }
}

/// Circulation-belt multipliers, land only: wet ITCZ, dry subtropics, wet
/// storm tracks, dry poles.
fn zonal_belts(field: &mut ClimateField, grid: &Grid) {
    let n = grid.size;
    for y in 0..n {
        let abs_lat = grid.lat_of_row(y).abs() as f32;
        let factor = if abs_lat < 10.0 {
            1.4
        } else if abs_lat > 15.0 && abs_lat < 35.0 {
            0.6
        } else if abs_lat > 40.0 && abs_lat < 65.0 {
            1.2
        } else if abs_lat > 70.0 {
            0.5
        } else {
            1.0
        };
        if factor == 1.0 {
            continue;
        }
        for x in 0..n {
            let i = grid.idx(y, x);
            if !field.water[i] {
                field.precipitation[i] *= factor;
            }
        }
    }
}

/// Cold air crossing much warmer water picks up moisture and dumps it on
/// the downwind shore.
fn lake_effect(field: &mut ClimateField, grid: &Grid) {
    let n = grid.size;
    const UPWIND_CELLS: f32 = 5.0;
    for y in 0..n {
        for x in 0..n {
            let i = grid.idx(y, x);
            if field.water[i] {
                continue;
            }
            let speed = field.wind_speed(i);
            if speed <= 1.0 {
                continue;
            }
            let uy = grid
                .clamp_y(y as isize + (field.wind_v[i] / speed * UPWIND_CELLS).round() as isize);
            let ux = grid
                .wrap_x(x as isize - (field.wind_u[i] / speed * UPWIND_CELLS).round() as isize);
            let j = grid.idx(uy, ux);
            if !field.water[j] {
                continue;
            }
            let temp_here = field.temperature[i];
            if field.temperature[j] - temp_here > 5.0 && temp_here < 10.0 {
                let boost = 1.0 + 0.5 * (-temp_here / 10.0).clamp(0.0, 1.0);
                field.precipitation[i] *= boost;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Grid;

    fn uniform_field(size: usize, humidity: f32, temp: f32) -> (ClimateField, Grid) {
        let g = Grid::new(size);
        let mut f = ClimateField::new(g, vec![false; g.cells()], vec![0.0; g.cells()]);
        for i in 0..g.cells() {
            f.humidity[i] = humidity;
            f.temperature[i] = temp;
        }
        (f, g)
    }

    #[test]
    fn precipitation_is_never_negative() {
        let (mut f, g) = uniform_field(32, 0.4, -20.0);
        for i in 0..g.cells() {
            f.wind_u[i] = if i % 3 == 0 { 5.0 } else { -5.0 };
        }
        let height: Vec<f32> = (0..g.cells()).map(|i| ((i * 7) % 13) as f32 * 0.05).collect();
        generate(&mut f, &g, &height);
        for (i, p) in f.precipitation.iter().enumerate() {
            assert!(*p >= 0.0, "cell {i}: precipitation {p} went negative");
        }
    }

    #[test]
    fn wetter_air_rains_more() {
        let (mut dry, g) = uniform_field(16, 0.3, 20.0);
        let (mut wet, _) = uniform_field(16, 0.9, 20.0);
        let height = vec![0.0f32; g.cells()];
        generate(&mut dry, &g, &height);
        generate(&mut wet, &g, &height);
        // Quadratic humidity response: 9x the rain for 3x the humidity,
        // before belt multipliers (identical between the two fields).
        let mid = g.idx(8, 8);
        assert!(
            wet.precipitation[mid] > dry.precipitation[mid] * 5.0,
            "humidity response should be superlinear ({} vs {})",
            wet.precipitation[mid],
            dry.precipitation[mid]
        );
    }

    #[test]
    fn efficiency_peaks_in_the_warm_midrange() {
        assert!(efficiency(25.0) > efficiency(0.0));
        assert!(efficiency(25.0) > efficiency(40.0));
        assert!(efficiency(0.0) > efficiency(-30.0));
        assert!((efficiency(25.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn windward_slopes_out_rain_lee_slopes() {
        let g = Grid::new(32);
        let mut f = ClimateField::new(g, vec![false; g.cells()], vec![0.0; g.cells()]);
        for i in 0..g.cells() {
            f.humidity[i] = 0.6;
            f.temperature[i] = 15.0;
            f.wind_u[i] = 10.0; // steady westerly
        }
        // North-south ridge at x=16.
        let mut height = vec![0.0f32; g.cells()];
        for y in 0..32 {
            for x in 0..32 {
                let d = (x as f32 - 16.0).abs();
                height[g.idx(y, x)] = (1.0 - d / 6.0).max(0.0) * 0.8;
            }
        }
        generate(&mut f, &g, &height);
        let windward = f.precipitation[g.idx(16, 13)];
        let leeward = f.precipitation[g.idx(16, 19)];
        assert!(
            windward > leeward,
            "windward side ({windward}) should out-rain the rain shadow ({leeward})"
        );
    }

    #[test]
    fn desert_belt_drier_than_storm_track() {
        let (mut f, g) = uniform_field(64, 0.5, 15.0);
        let height = vec![0.0f32; g.cells()];
        generate(&mut f, &g, &height);
        // Row 22 ≈ 27°N (subtropical belt), row 13 ≈ 53°N (storm track).
        let desert = f.precipitation[g.idx(22, 32)];
        let storm = f.precipitation[g.idx(13, 32)];
        assert!(
            storm > desert,
            "storm track ({storm}) should be wetter than the desert belt ({desert})"
        );
    }
}
