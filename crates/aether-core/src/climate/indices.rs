//! Derived climate indices: growing degree days and an aridity index.
//!
//! These are diagnostics, not simulation state. Derivation is best-effort:
//! the orchestrator logs and skips on failure rather than aborting base
//! generation.

use thiserror::Error;

use super::field::ClimateField;

/// Growing-degree-day base temperature, °C.
const GDD_BASE_C: f32 = 5.0;
const DAYS_PER_YEAR: f32 = 365.0;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("temperature field contains a non-finite value at cell {cell}")]
    NonFiniteTemperature { cell: usize },
    #[error("precipitation field contains a non-finite value at cell {cell}")]
    NonFinitePrecipitation { cell: usize },
}

/// Annual growing degree days above 5 °C, estimated from the mean field.
pub fn growing_degree_days(field: &ClimateField) -> Result<Vec<f32>, IndexError> {
    let mut gdd = Vec::with_capacity(field.temperature.len());
    for (cell, &t) in field.temperature.iter().enumerate() {
        if !t.is_finite() {
            return Err(IndexError::NonFiniteTemperature { cell });
        }
        gdd.push((t - GDD_BASE_C).max(0.0) * DAYS_PER_YEAR);
    }
    Ok(gdd)
}

/// Aridity index: annual precipitation over potential evapotranspiration.
/// Values under ~0.2 read as desert, over ~0.65 as humid.
pub fn aridity_index(field: &ClimateField) -> Result<Vec<f32>, IndexError> {
    let mut aridity = Vec::with_capacity(field.precipitation.len());
    for cell in 0..field.precipitation.len() {
        let p = field.precipitation[cell];
        let t = field.temperature[cell];
        if !p.is_finite() {
            return Err(IndexError::NonFinitePrecipitation { cell });
        }
        if !t.is_finite() {
            return Err(IndexError::NonFiniteTemperature { cell });
        }
        let annual_precip = p * DAYS_PER_YEAR;
        // Thornthwaite-flavoured PET estimate: warm, dry air evaporates the
        // most. Floored so the ratio stays defined in polar cold.
        let humidity_term = (1.0 - 0.5 * field.humidity[cell].sqrt()).max(0.25);
        let pet = (16.0 * (t.max(0.0) / 5.0).powf(1.514) * humidity_term * 12.0).max(50.0);
        aridity.push((annual_precip / pet).clamp(0.0, 10.0));
    }
    Ok(aridity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Grid;

    fn field_with(temp: f32, precip: f32, humidity: f32) -> ClimateField {
        let g = Grid::new(4);
        let mut f = ClimateField::new(g, vec![false; g.cells()], vec![0.0; g.cells()]);
        for i in 0..g.cells() {
            f.temperature[i] = temp;
            f.precipitation[i] = precip;
            f.humidity[i] = humidity;
        }
        f
    }

    #[test]
    fn gdd_zero_below_base_and_scales_above() {
        let cold = field_with(2.0, 1.0, 0.5);
        assert_eq!(growing_degree_days(&cold).unwrap()[0], 0.0);
        let warm = field_with(25.0, 1.0, 0.5);
        assert_eq!(growing_degree_days(&warm).unwrap()[0], 20.0 * DAYS_PER_YEAR);
    }

    #[test]
    fn deserts_score_lower_than_rainforests() {
        let desert = field_with(30.0, 0.2, 0.15);
        let rainforest = field_with(26.0, 8.0, 0.9);
        let a_desert = aridity_index(&desert).unwrap()[0];
        let a_forest = aridity_index(&rainforest).unwrap()[0];
        assert!(
            a_forest > a_desert * 5.0,
            "rainforest {a_forest} vs desert {a_desert}"
        );
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let mut f = field_with(10.0, 1.0, 0.5);
        f.temperature[3] = f32::NAN;
        assert!(growing_degree_days(&f).is_err());
        assert!(aridity_index(&f).is_err());
    }
}
