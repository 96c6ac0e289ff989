//! Base-state surface temperature.
//!
//! Latitude-band base curve, altitude lapse, ocean heat transport, coastal
//! moderation, and continental-interior cooling, in that order. The stage is
//! deliberately noise-free so a water-free flat world yields a purely zonal
//! field.

use crate::coords::Grid;

use super::field::ClimateField;
use super::grid;

/// Reference global-mean surface temperature the band curve is tuned to, °C.
pub const REFERENCE_MEAN_C: f32 = 14.0;

/// Zone lapse rates, °C per km of elevation.
const LAPSE_TROPICAL: f32 = 5.5;
const LAPSE_TEMPERATE: f32 = 6.5;
const LAPSE_POLAR: f32 = 7.5;

pub fn generate(field: &mut ClimateField, grid: &Grid, base_temperature: f32) {
    let n = grid.size;
    let offset = base_temperature - REFERENCE_MEAN_C;

    for y in 0..n {
        let lat = grid.lat_of_row(y).abs() as f32;
        let base = band_base(lat) + offset;
        let lapse = lapse_rate(lat);
        for x in 0..n {
            let i = grid.idx(y, x);
            let elev_km = (field.elevation[i].max(0.0)) / 1000.0;
            field.temperature[i] = base - lapse * elev_km;
        }
    }

    let has_water = field.water.iter().any(|&w| w);
    if has_water {
        ocean_heat_transport(field, grid);
        coastal_moderation(field, grid);
        continental_cooling(field, grid);
    }
}

/// Piecewise latitude curve: flat equatorial band, then progressively
/// steeper falloff through the tropics, temperate zone, and polar cap.
fn band_base(abs_lat: f32) -> f32 {
    if abs_lat < 10.0 {
        26.0
    } else if abs_lat < 30.0 {
        28.0 - (abs_lat - 10.0) * 0.4
    } else if abs_lat < 60.0 {
        16.0 - (abs_lat - 30.0) * 0.5
    } else {
        -14.0 - (abs_lat - 60.0) * 0.4
    }
}

fn lapse_rate(abs_lat: f32) -> f32 {
    if abs_lat < 30.0 {
        LAPSE_TROPICAL
    } else if abs_lat < 60.0 {
        LAPSE_TEMPERATE
    } else {
        LAPSE_POLAR
    }
}

/// Smooth ocean temperatures and superimpose warm/cool current bands.
fn ocean_heat_transport(field: &mut ClimateField, grid: &Grid) {
    let smoothed = grid::gaussian_blur(grid, &field.temperature, 5.0);
    let n = grid.size;
    for y in 0..n {
        let abs_lat = grid.lat_of_row(y).abs() as f32;
        // Warm poleward currents centred near 45°, cool equatorward return
        // flow near 15°.
        let warm = 5.0 * (-((abs_lat - 45.0) / 15.0).powi(2)).exp();
        let cool = -2.0 * (-((abs_lat - 15.0) / 10.0).powi(2)).exp();
        for x in 0..n {
            let i = grid.idx(y, x);
            if field.water[i] {
                field.temperature[i] = smoothed[i] + warm + cool;
            }
        }
    }
}

/// Blend coastal land toward the mean temperature of nearby ocean.
fn coastal_moderation(field: &mut ClimateField, grid: &Grid) {
    let dist = grid::distance_to(grid, &field.water);
    let ocean_mean = {
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for (i, &w) in field.water.iter().enumerate() {
            if w {
                sum += field.temperature[i] as f64;
                count += 1;
            }
        }
        (sum / count as f64) as f32
    };
    for i in 0..field.temperature.len() {
        if !field.water[i] && dist[i] < 20.0 {
            let strength = 0.7 * (-dist[i] / 20.0).exp();
            field.temperature[i] += strength * (ocean_mean - field.temperature[i]) * 0.5;
        }
    }
}

/// Continental interiors run colder than the zonal mean, strongest in the
/// mid-latitudes.
fn continental_cooling(field: &mut ClimateField, grid: &Grid) {
    let dist = grid::distance_to(grid, &field.water);
    let n = grid.size;
    for y in 0..n {
        let abs_lat = grid.lat_of_row(y).abs() as f32;
        let zonal = if (30.0..60.0).contains(&abs_lat) {
            1.0
        } else if abs_lat < 30.0 {
            abs_lat / 30.0
        } else {
            ((90.0 - abs_lat) / 30.0).max(0.0)
        };
        for x in 0..n {
            let i = grid.idx(y, x);
            if !field.water[i] {
                let continentality = (dist[i] / 30.0).min(1.0);
                field.temperature[i] -= 5.0 * continentality * zonal;
            }
        }
    }
}
