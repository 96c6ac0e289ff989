//! Temporal update passes: seasonal and diurnal temperature, seasonal
//! precipitation, and seasonal wind shifts.
//!
//! Every pass starts from the annual-mean snapshot in [`BaseState`], so
//! calling the update repeatedly for the same clock is idempotent and
//! nothing drifts over long simulations.

use crate::coords::Grid;
use crate::planetary::PlanetarySystem;

use super::field::{BaseState, ClimateField};

/// Base diurnal temperature range on dry lowland at the equator, °C.
const DIURNAL_RANGE_C: f32 = 15.0;

/// `dist_to_water` is the caller's cached distance transform of the
/// write-once water mask; the update never recomputes it.
pub fn update(
    field: &mut ClimateField,
    base: &BaseState,
    grid: &Grid,
    planetary: &PlanetarySystem,
    variation_strength: f32,
    dist_to_water: &[f32],
) {
    seasonal_temperature(field, base, grid, planetary, variation_strength, dist_to_water);
    diurnal_temperature(field, grid, planetary);
    seasonal_precipitation(field, base, grid, planetary, variation_strength, dist_to_water);
    seasonal_winds(field, base, grid, planetary, variation_strength);
}

/// Seasonal amplitude by climate zone, widened over continental interiors
/// and halved over open water.
fn seasonal_temperature(
    field: &mut ClimateField,
    base: &BaseState,
    grid: &Grid,
    planetary: &PlanetarySystem,
    variation_strength: f32,
    dist_to_water: &[f32],
) {
    let n = grid.size;
    for y in 0..n {
        let lat = grid.lat_of_row(y);
        let abs_lat = lat.abs() as f32;
        let sf = planetary.seasonal_factor(lat) as f32 * variation_strength;
        let zone_range = if abs_lat < 15.0 {
            5.0
        } else if abs_lat < 35.0 {
            15.0
        } else if abs_lat < 65.0 {
            25.0
        } else {
            30.0
        };
        for x in 0..n {
            let i = grid.idx(y, x);
            let range = if field.water[i] {
                zone_range * 0.5
            } else {
                let continental = (dist_to_water[i] / 50.0).min(1.0);
                zone_range * (1.0 + continental)
            };
            field.temperature[i] = base.temperature[i] + sf * range;
        }
    }
}

/// Daytime sine curve peaking at solar noon; nights cool toward a minimum
/// just before dawn. Water cells are skipped; their thermal mass damps the
/// cycle below relevance.
fn diurnal_temperature(field: &mut ClimateField, grid: &Grid, planetary: &PlanetarySystem) {
    let (_, hour) = planetary.current_time();
    let day_length = planetary.day_length_hours();
    let time_factor = (std::f64::consts::PI * hour / day_length).sin().max(0.0) as f32;
    let night_progress = (hour / day_length) as f32;
    let night_factor = if night_progress > 0.5 {
        1.0 - (night_progress - 0.5) * 2.0
    } else {
        night_progress * 2.0
    };

    let n = grid.size;
    for y in 0..n {
        let abs_lat = grid.lat_of_row(y).abs() as f32;
        for x in 0..n {
            let i = grid.idx(y, x);
            if field.water[i] {
                continue;
            }
            let mut range = DIURNAL_RANGE_C;
            range *= 1.0 - 0.6 * field.humidity[i];
            range *= 1.0 - 0.5 * (abs_lat / 90.0);
            range *= 1.0 + 0.5 * (field.elevation[i].max(0.0) / 8000.0);

            let offset = if planetary.day_night_mask[i] {
                time_factor * range
            } else {
                -range * (0.5 + 0.5 * night_factor)
            };
            field.temperature[i] += offset;
        }
    }
}

/// Latitude-zone precipitation seasonality: twin equatorial wet seasons,
/// a single monsoon peak in the tropics, coastal-vs-continental temperate
/// regimes, and drier polar winters. Land only.
fn seasonal_precipitation(
    field: &mut ClimateField,
    base: &BaseState,
    grid: &Grid,
    planetary: &PlanetarySystem,
    variation_strength: f32,
    dist_to_water: &[f32],
) {
    let (day, _) = planetary.current_time();
    let year_position = (day / planetary.year_length_days()) as f32;
    let n = grid.size;

    for y in 0..n {
        let lat = grid.lat_of_row(y);
        let abs_lat = lat.abs() as f32;
        let sf = planetary.seasonal_factor(lat) as f32;
        for x in 0..n {
            let i = grid.idx(y, x);
            if field.water[i] {
                field.precipitation[i] = base.precipitation[i];
                continue;
            }
            let season_mod = if abs_lat < 10.0 {
                (year_position * 4.0 * std::f32::consts::PI).sin() * 0.3
            } else if abs_lat < 30.0 {
                sf.max(0.0) * 0.8
            } else if abs_lat < 60.0 {
                if dist_to_water[i] < 10.0 {
                    -sf * 0.4
                } else {
                    sf * 0.3
                }
            } else {
                sf * 0.5
            };
            let effect = 1.0 + season_mod * variation_strength;
            field.precipitation[i] = (base.precipitation[i] * effect).max(0.0);
        }
    }
}

/// The ITCZ migrates with the thermal equator; trade winds, storm tracks,
/// and the polar vortices shift with it.
fn seasonal_winds(
    field: &mut ClimateField,
    base: &BaseState,
    grid: &Grid,
    planetary: &PlanetarySystem,
    variation_strength: f32,
) {
    let (day, _) = planetary.current_time();
    let year_position = (day / planetary.year_length_days()) as f32;
    let itcz_shift = (std::f32::consts::TAU * year_position).sin() * 15.0;

    let n = grid.size;
    for y in 0..n {
        let lat = grid.lat_of_row(y);
        let abs_lat = lat.abs() as f32;
        for x in 0..n {
            let i = grid.idx(y, x);
            let u = base.wind_u[i];
            let v = base.wind_v[i];
            if abs_lat < 30.0 {
                let shift = 0.05 * itcz_shift * variation_strength;
                field.wind_u[i] = u;
                field.wind_v[i] = v + shift * 3.0;
            } else if abs_lat < 60.0 {
                let shift = 0.03 * itcz_shift * variation_strength;
                field.wind_u[i] = u + shift * 2.0;
                field.wind_v[i] = v + shift;
            } else {
                let sf = planetary.seasonal_factor(lat) as f32;
                let strength_mod = 1.0 + 0.3 * (-sf * variation_strength);
                field.wind_u[i] = u * strength_mod;
                field.wind_v[i] = v * strength_mod;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::grid::distance_to;
    use crate::planetary::PlanetaryConfig;

    fn setup(size: usize) -> (ClimateField, BaseState, Grid, PlanetarySystem) {
        let g = Grid::new(size);
        let mut f = ClimateField::new(g, vec![false; g.cells()], vec![0.0; g.cells()]);
        for i in 0..g.cells() {
            f.temperature[i] = 10.0;
            f.humidity[i] = 0.5;
            f.precipitation[i] = 2.0;
            f.wind_u[i] = 3.0;
        }
        let base = BaseState::capture(&f);
        let p = PlanetarySystem::new(PlanetaryConfig {
            world_size: size,
            ..PlanetaryConfig::default()
        });
        (f, base, g, p)
    }

    #[test]
    fn update_is_idempotent_for_a_fixed_clock() {
        let (mut f, base, g, mut p) = setup(32);
        let dist = distance_to(&g, &f.water);
        p.set_time(120.0, 6.0);
        update(&mut f, &base, &g, &p, 1.0, &dist);
        let once = f.temperature.clone();
        update(&mut f, &base, &g, &p, 1.0, &dist);
        assert_eq!(f.temperature, once, "re-running the same clock must not drift");
    }

    #[test]
    fn midlatitude_summer_beats_winter() {
        let (mut f, base, g, mut p) = setup(64);
        let dist = distance_to(&g, &f.water);
        // Row 16 ≈ 44°N. Compare mid-year (northern summer) against day 0.
        let i = g.idx(16, 32);
        p.set_time(182.0, 12.0);
        update(&mut f, &base, &g, &p, 1.0, &dist);
        let summer = f.temperature[i];
        p.set_time(0.0, 12.0);
        update(&mut f, &base, &g, &p, 1.0, &dist);
        let winter = f.temperature[i];
        assert!(
            summer > winter + 10.0,
            "mid-latitude seasons should swing hard: summer {summer} vs winter {winter}"
        );
    }

    #[test]
    fn zero_variation_strength_freezes_the_seasons() {
        let (mut f, base, g, mut p) = setup(32);
        let dist = distance_to(&g, &f.water);
        p.set_time(182.0, 12.0);
        update(&mut f, &base, &g, &p, 0.0, &dist);
        // Diurnal cycle still runs, but the seasonal component is gone:
        // compare against the opposite solstice at the same hour.
        let summer = f.temperature.clone();
        p.set_time(0.0, 12.0);
        update(&mut f, &base, &g, &p, 0.0, &dist);
        // Compare sub-polar noon cells, where the day/night state matches on
        // both solstices and the diurnal term cancels.
        for y in 6..26 {
            let i = g.idx(y, 16);
            assert!(
                (f.temperature[i] - summer[i]).abs() < 0.5,
                "row {y}: {} vs {} with seasons disabled",
                f.temperature[i],
                summer[i]
            );
        }
    }

    #[test]
    fn ocean_seasonality_is_damped() {
        let g = Grid::new(64);
        let mut water = vec![false; g.cells()];
        for x in 0..32 {
            for y in 0..64 {
                water[g.idx(y, x)] = true;
            }
        }
        let mut f = ClimateField::new(g, water, vec![0.0; g.cells()]);
        for i in 0..g.cells() {
            f.temperature[i] = 10.0;
        }
        let base = BaseState::capture(&f);
        let mut p = PlanetarySystem::new(PlanetaryConfig {
            world_size: 64,
            ..PlanetaryConfig::default()
        });
        p.set_time(182.0, 0.0);
        let dist = distance_to(&g, &f.water);
        update(&mut f, &base, &g, &p, 1.0, &dist);
        let y = 16; // ~44°N
        let ocean_swing = (f.temperature[g.idx(y, 10)] - 10.0).abs();
        let inland_seasonal = f.temperature[g.idx(y, 55)] - 10.0;
        assert!(
            inland_seasonal.abs() > ocean_swing,
            "continental swing ({inland_seasonal}) should exceed ocean swing ({ocean_swing})"
        );
    }

    #[test]
    fn polar_vortex_strengthens_in_winter() {
        let (mut f, base, g, mut p) = setup(64);
        let dist = distance_to(&g, &f.water);
        // Row 3 ≈ 81°N; northern winter at day 0.
        p.set_time(0.0, 0.0);
        update(&mut f, &base, &g, &p, 1.0, &dist);
        let i = g.idx(3, 32);
        assert!(
            f.wind_u[i].abs() > base.wind_u[i].abs(),
            "winter polar wind {} should exceed base {}",
            f.wind_u[i],
            base.wind_u[i]
        );
    }
}
