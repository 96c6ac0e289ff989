//! Struct-of-arrays climate field store.
//!
//! Every physical quantity is its own row-major `Vec<f32>` sized to the
//! grid, so field passes iterate flat slices and serialization stays a
//! plain derive. The water mask and Coriolis column are written once at
//! construction and never mutated by stages.

use serde::{Deserialize, Serialize};

use crate::coords::Grid;

/// All per-cell climate quantities, row-major, one `Vec` per field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateField {
    pub grid: Grid,
    /// Surface air temperature, °C.
    pub temperature: Vec<f32>,
    /// Sea-level-adjusted surface pressure, hPa, clamped to [870, 1090].
    pub pressure: Vec<f32>,
    /// Relative humidity, [0, 1].
    pub humidity: Vec<f32>,
    /// Eastward wind component, m/s.
    pub wind_u: Vec<f32>,
    /// Northward wind component, m/s.
    pub wind_v: Vec<f32>,
    /// Precipitation, mm/day, ≥ 0.
    pub precipitation: Vec<f32>,
    /// Surface elevation in meters (≤ 0 under water).
    pub elevation: Vec<f32>,
    /// Write-once water mask.
    pub water: Vec<bool>,
    /// Write-once Coriolis parameter per cell, rad/s.
    pub coriolis: Vec<f32>,
    /// Growing degree days (base 5 °C), present when index derivation ran.
    pub growing_degree_days: Option<Vec<f32>>,
    /// Aridity index (annual precipitation / potential evapotranspiration).
    pub aridity_index: Option<Vec<f32>>,
}

impl ClimateField {
    /// Zeroed field store with the mask and Coriolis column filled in.
    pub fn new(grid: Grid, water: Vec<bool>, elevation: Vec<f32>) -> Self {
        let cells = grid.cells();
        let mut coriolis = vec![0.0f32; cells];
        for y in 0..grid.size {
            let f = grid.coriolis_of_row(y) as f32;
            for x in 0..grid.size {
                coriolis[grid.idx(y, x)] = f;
            }
        }
        Self {
            grid,
            temperature: vec![0.0; cells],
            pressure: vec![0.0; cells],
            humidity: vec![0.0; cells],
            wind_u: vec![0.0; cells],
            wind_v: vec![0.0; cells],
            precipitation: vec![0.0; cells],
            elevation,
            water,
            coriolis,
            growing_degree_days: None,
            aridity_index: None,
        }
    }

    /// Wind speed at a flat index, m/s.
    #[inline]
    pub fn wind_speed(&self, i: usize) -> f32 {
        (self.wind_u[i] * self.wind_u[i] + self.wind_v[i] * self.wind_v[i]).sqrt()
    }

    /// Meteorological wind direction at a flat index: degrees the wind blows
    /// FROM, clockwise from north.
    #[inline]
    pub fn wind_direction_deg(&self, i: usize) -> f32 {
        let deg = (-self.wind_u[i]).atan2(-self.wind_v[i]).to_degrees();
        deg.rem_euclid(360.0)
    }

    /// Fraction of cells under water.
    pub fn water_fraction(&self) -> f32 {
        let wet = self.water.iter().filter(|&&w| w).count();
        wet as f32 / self.water.len().max(1) as f32
    }
}

/// Immutable snapshot of the annual-mean fields, captured once after base
/// generation. Temporal updates always start from here, so repeated calls
/// never accumulate drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseState {
    pub temperature: Vec<f32>,
    pub precipitation: Vec<f32>,
    pub wind_u: Vec<f32>,
    pub wind_v: Vec<f32>,
}

impl BaseState {
    pub fn capture(field: &ClimateField) -> Self {
        Self {
            temperature: field.temperature.clone(),
            precipitation: field.precipitation.clone(),
            wind_u: field.wind_u.clone(),
            wind_v: field.wind_v.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coriolis_column_is_filled_per_row() {
        let g = Grid::new(8);
        let f = ClimateField::new(g, vec![false; g.cells()], vec![0.0; g.cells()]);
        assert!(f.coriolis[g.idx(0, 3)] > 0.0, "north rows positive");
        assert!(f.coriolis[g.idx(7, 3)] < 0.0, "south rows negative");
        assert_eq!(f.coriolis[g.idx(2, 0)], f.coriolis[g.idx(2, 7)], "constant per row");
    }

    #[test]
    fn wind_direction_is_meteorological() {
        let g = Grid::new(2);
        let mut f = ClimateField::new(g, vec![false; 4], vec![0.0; 4]);
        // Pure southerly flow (blowing toward north) comes FROM 180°.
        f.wind_v[0] = 5.0;
        assert!((f.wind_direction_deg(0) - 180.0).abs() < 1e-4);
        // Pure westerly flow comes FROM 270°.
        f.wind_u[1] = 5.0;
        assert!((f.wind_direction_deg(1) - 270.0).abs() < 1e-4);
    }

    #[test]
    fn base_state_snapshot_is_independent() {
        let g = Grid::new(4);
        let mut f = ClimateField::new(g, vec![false; 16], vec![0.0; 16]);
        f.temperature[0] = 20.0;
        let base = BaseState::capture(&f);
        f.temperature[0] = -5.0;
        assert_eq!(base.temperature[0], 20.0, "snapshot must not alias the field");
    }
}
