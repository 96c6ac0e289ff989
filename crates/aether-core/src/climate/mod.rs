//! The climate engine.
//!
//! Consumes a heightmap and water mask from the terrain provider and sun
//! geometry from the planetary provider, derives the quasi-steady base
//! state in a fixed stage order (pressure → temperature → wind → humidity
//! → precipitation), layers optional fantasy perturbations on top, then
//! serves temporal updates, point queries, and Köppen classification.

pub mod fantasy;
pub mod field;
pub mod grid;
pub mod koppen;

mod humidity;
mod indices;
mod precipitation;
mod pressure;
mod seasonal;
mod temperature;
mod wind;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::coords::Grid;
use crate::noise::Fbm;
use crate::planetary::PlanetarySystem;
use crate::WorldError;

pub use fantasy::{FantasyFeatures, FeatureKind};
pub use field::{BaseState, ClimateField};
pub use koppen::ClassificationCache;

/// Climate engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateConfig {
    pub world_size: usize,
    /// Global mean surface temperature target, °C.
    pub base_temperature: f32,
    /// Multiplier on all seasonal effects (0 disables seasons).
    pub seasonal_variation_strength: f32,
    /// Explicit seed; `None` draws one at construction.
    pub seed: Option<u64>,
    pub fantasy: FantasyFeatures,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            world_size: 256,
            base_temperature: 14.0,
            seasonal_variation_strength: 1.0,
            seed: None,
            fantasy: FantasyFeatures::default(),
        }
    }
}

/// A full per-cell climate record, as returned by point queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CellState {
    pub temperature: f32,
    pub precipitation: f32,
    pub humidity: f32,
    pub wind_speed: f32,
    /// Direction the wind blows from, degrees clockwise from north.
    pub wind_direction: f32,
    pub pressure: f32,
    pub elevation: f32,
    pub is_water: bool,
}

/// Owns the climate field, its immutable base-state snapshot, the orbital
/// clock, and the classification cache.
#[derive(Debug)]
pub struct ClimateSystem {
    config: ClimateConfig,
    grid: Grid,
    field: ClimateField,
    base: BaseState,
    planetary: PlanetarySystem,
    heightmap: Vec<f32>,
    dist_to_water: Vec<f32>,
    cache: ClassificationCache,
    seed: u64,
}

impl ClimateSystem {
    /// Build the base state. `heightmap` is the normalized terrain surface,
    /// `water` the provider's water mask; `elevation_m` overrides the
    /// heightmap-derived meters grid when the caller has a better one.
    pub fn new(
        heightmap: Vec<f32>,
        water: Vec<bool>,
        planetary: PlanetarySystem,
        config: ClimateConfig,
        elevation_m: Option<Vec<f32>>,
    ) -> Result<Self, WorldError> {
        let grid = Grid::new(config.world_size);
        let expected = grid.cells();
        check_len("heightmap", heightmap.len(), expected, grid.size)?;
        check_len("water mask", water.len(), expected, grid.size)?;
        check_len(
            "planetary grid",
            planetary.grid().cells(),
            expected,
            grid.size,
        )?;
        let elevation = match elevation_m {
            Some(e) => {
                check_len("elevation grid", e.len(), expected, grid.size)?;
                e
            }
            None => crate::terrain::elevation_meters(&heightmap),
        };

        let seed = config.seed.unwrap_or_else(rand::random);
        let noise = Fbm::new(seed as u32);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut field = ClimateField::new(grid, water, elevation);
        debug!("generating base climate (size {}, seed {seed})", grid.size);

        pressure::generate(&mut field, &grid, &noise);
        temperature::generate(&mut field, &grid, config.base_temperature);
        let is_day = planetary.daylight_fraction() > 0.5;
        wind::generate(&mut field, &grid, &heightmap, planetary.km_per_cell, is_day);
        humidity::generate(&mut field, &grid);
        precipitation::generate(&mut field, &grid, &heightmap);

        // Indices are diagnostics; a failure is logged and skipped.
        match indices::growing_degree_days(&field) {
            Ok(gdd) => field.growing_degree_days = Some(gdd),
            Err(e) => warn!("skipping growing-degree-day index: {e}"),
        }
        match indices::aridity_index(&field) {
            Ok(aridity) => field.aridity_index = Some(aridity),
            Err(e) => warn!("skipping aridity index: {e}"),
        }

        fantasy::apply(&mut field, &grid, &noise, &mut rng, &config.fantasy);

        let base = BaseState::capture(&field);
        let dist_to_water = grid::distance_to(&grid, &field.water);

        Ok(Self {
            config,
            grid,
            field,
            base,
            planetary,
            heightmap,
            dist_to_water,
            cache: ClassificationCache::default(),
            seed,
        })
    }

    pub fn config(&self) -> &ClimateConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// The seed actually used, whether configured or drawn.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn field(&self) -> &ClimateField {
        &self.field
    }

    pub fn planetary(&self) -> &PlanetarySystem {
        &self.planetary
    }

    pub fn heightmap(&self) -> &[f32] {
        &self.heightmap
    }

    /// Advance the simulation to (day, hour) and recompute the seasonal and
    /// diurnal fields from the base-state snapshot. Invalidates cached
    /// classifications.
    pub fn update(&mut self, day_of_year: f64, hour_of_day: f64) {
        self.planetary.set_time(day_of_year, hour_of_day);
        seasonal::update(
            &mut self.field,
            &self.base,
            &self.grid,
            &self.planetary,
            self.config.seasonal_variation_strength,
            &self.dist_to_water,
        );
        self.cache.clear();
        debug!("climate updated to day {day_of_year:.1}, hour {hour_of_day:.1}");
    }

    /// Full climate record at a cell. Out-of-range coordinates are an
    /// error, never clamped.
    pub fn state_at(&self, x: usize, y: usize) -> Result<CellState, WorldError> {
        if !self.grid.contains(x, y) {
            return Err(WorldError::InvalidCoordinate { x, y, size: self.grid.size });
        }
        let i = self.grid.idx(y, x);
        Ok(CellState {
            temperature: self.field.temperature[i],
            precipitation: self.field.precipitation[i],
            humidity: self.field.humidity[i],
            wind_speed: self.field.wind_speed(i),
            wind_direction: self.field.wind_direction_deg(i),
            pressure: self.field.pressure[i],
            elevation: self.field.elevation[i],
            is_water: self.field.water[i],
        })
    }

    /// Köppen-style classification code for a cell, memoized until the next
    /// `update`.
    pub fn classify(&mut self, x: usize, y: usize) -> Result<&'static str, WorldError> {
        if let Some(code) = self.cache.get(x, y) {
            return Ok(code);
        }
        if !self.grid.contains(x, y) {
            return Err(WorldError::InvalidCoordinate { x, y, size: self.grid.size });
        }
        let i = self.grid.idx(y, x);
        let code = if self.field.water[i] {
            "Ocean"
        } else {
            let lat = self.grid.lat_of_row(y);
            let seasonal_range = self.planetary.seasonal_factor(lat).abs() as f32
                * 20.0
                * self.config.seasonal_variation_strength;
            let temp = self.field.temperature[i];
            let warmest = temp + seasonal_range / 2.0;
            let coldest = temp - seasonal_range / 2.0;
            let coastal = self.dist_to_water[i] < 10.0;
            let share = koppen::summer_precip_share(
                lat.abs() as f32,
                coastal,
                self.config.seasonal_variation_strength,
            );
            koppen::classify_cell(temp, self.field.precipitation[i], warmest, coldest, share)
        };
        self.cache.insert(x, y, code);
        Ok(code)
    }
}

fn check_len(
    what: &'static str,
    got: usize,
    expected: usize,
    size: usize,
) -> Result<(), WorldError> {
    if got != expected {
        return Err(WorldError::GridMismatch { what, got, expected, size });
    }
    Ok(())
}
