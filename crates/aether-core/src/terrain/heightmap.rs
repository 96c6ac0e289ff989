//! Heightmap synthesis: cylindrical fBm blended with a continental mask,
//! then reshaped around a fixed sea-level pivot.
//!
//! Noise is sampled on a cylinder (longitude on a circle, latitude along
//! the axis) so the east-west seam is continuous by construction.

use crate::coords::Grid;
use crate::noise::Fbm;

use super::grid_minmax;

/// Fraction of the raw [0, 1] height range treated as ocean when shaping.
pub const SHAPING_SEA_LEVEL: f32 = 0.3;

pub struct NoiseParams {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub scale: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self { octaves: 6, persistence: 0.5, lacunarity: 2.0, scale: 2.0 }
    }
}

/// Build the raw terrain surface in [−0.5, 1]: negative ocean floor, land
/// rising to 1.0.
pub fn generate(grid: &Grid, noise: &Fbm, continents: &Fbm, params: &NoiseParams) -> Vec<f32> {
    let mut heights = base_noise(grid, noise, params);
    let mask = continental_mask(grid, continents);

    // Continents dominate the blend so landmasses cluster instead of
    // speckling.
    for (h, m) in heights.iter_mut().zip(&mask) {
        *h = *h * 0.4 + *m * 0.6;
    }
    normalize(&mut heights);
    shape(&mut heights);
    heights
}

fn base_noise(grid: &Grid, noise: &Fbm, params: &NoiseParams) -> Vec<f32> {
    let n = grid.size;
    let mut heights = vec![0.0f32; grid.cells()];
    for y in 0..n {
        // Latitude along the cylinder axis.
        let axis = (y as f64 / n as f64) * std::f64::consts::PI - std::f64::consts::FRAC_PI_2;
        for x in 0..n {
            let lon = (x as f64 / n as f64) * std::f64::consts::TAU;
            let nx = lon.cos() * params.scale;
            let nz = lon.sin() * params.scale;
            let ny = axis * params.scale;
            heights[grid.idx(y, x)] =
                noise.sample3(nx, ny, nz, params.octaves, params.persistence, params.lacunarity)
                    as f32;
        }
    }
    normalize(&mut heights);
    heights
}

/// Low-frequency continent blobs with a coastal falloff gradient.
fn continental_mask(grid: &Grid, continents: &Fbm) -> Vec<f32> {
    const CONTINENT_SCALE: f64 = 3.0;
    const CONTINENT_SIZE: f32 = 0.2;

    let n = grid.size;
    let mut mask = vec![0.0f32; grid.cells()];
    for y in 0..n {
        let axis = (y as f64 / n as f64) * std::f64::consts::PI - std::f64::consts::FRAC_PI_2;
        for x in 0..n {
            let lon = (x as f64 / n as f64) * std::f64::consts::TAU;
            mask[grid.idx(y, x)] = continents.sample3(
                lon.cos() * CONTINENT_SCALE,
                axis * CONTINENT_SCALE,
                lon.sin() * CONTINENT_SCALE,
                2,
                0.5,
                2.0,
            ) as f32;
        }
    }
    normalize(&mut mask);

    // Threshold the top of the distribution into continent cores, then let
    // a distance gradient form the shelves around them.
    let cores: Vec<bool> = mask.iter().map(|&m| m > 1.0 - CONTINENT_SIZE).collect();
    let dist = crate::climate::grid::distance_to(grid, &cores);
    let max_dist = dist.iter().fold(0.0f32, |m, &d| m.max(d));
    if max_dist > 0.0 {
        for i in 0..mask.len() {
            let gradient = 1.0 - dist[i] / max_dist;
            mask[i] = if cores[i] { 1.0 } else { mask[i].max(gradient * 0.7) };
        }
    }
    normalize(&mut mask);
    mask
}

/// Piecewise reshaping: compress the sub-sea range into [−0.5, 0], expand
/// the midlands, keep the peaks.
fn shape(heights: &mut [f32]) {
    for h in heights.iter_mut() {
        let v = *h;
        *h = if v < SHAPING_SEA_LEVEL {
            let depth = v / SHAPING_SEA_LEVEL;
            -0.5 * (1.0 - depth * depth)
        } else if v < 0.7 {
            (v - SHAPING_SEA_LEVEL) / (0.7 - SHAPING_SEA_LEVEL) * 0.6
        } else {
            0.6 + (v - 0.7) / 0.3 * 0.4
        };
    }
}

fn normalize(data: &mut [f32]) {
    let (min, max) = grid_minmax(data);
    let span = max - min;
    if span > 0.0 {
        for v in data.iter_mut() {
            *v = (*v - min) / span;
        }
    }
}
