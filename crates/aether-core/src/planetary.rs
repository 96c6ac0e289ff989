//! Planetary ephemeris provider: orbital clock, day/night cycle, solar
//! radiation, and per-latitude seasonal factors.
//!
//! Uses closed-form solar geometry (declination from axial tilt, the
//! sunrise equation, and an eccentricity distance factor) rather than a
//! full ephemeris. Day 0 of the year sits at the northern winter solstice.

use serde::{Deserialize, Serialize};

use crate::coords::Grid;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Orbital and rotational parameters. Defaults are Earth-like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetaryConfig {
    pub world_size: usize,
    /// Axial tilt in degrees (Earth: 23.5).
    pub axial_tilt_deg: f64,
    /// Length of a day in hours (Earth: 24).
    pub day_length_hours: f64,
    /// Length of a year in days (Earth: 365.25).
    pub year_length_days: f64,
    /// Orbital eccentricity (Earth: 0.0167).
    pub eccentricity: f64,
    /// Day of year at which the planet is closest to its sun.
    pub perihelion_day: f64,
    /// Starting day of the simulation clock.
    pub start_day: f64,
    /// Multiplier on seasonal effects (1.0 = Earth-like).
    pub seasonal_factor: f64,
    /// World scale relative to Earth's surface area.
    pub earth_scale: f64,
}

impl Default for PlanetaryConfig {
    fn default() -> Self {
        Self {
            world_size: 256,
            axial_tilt_deg: 23.5,
            day_length_hours: 24.0,
            year_length_days: 365.25,
            eccentricity: 0.0167,
            perihelion_day: 14.0,
            start_day: 0.0,
            seasonal_factor: 1.0,
            earth_scale: 0.0083,
        }
    }
}

/// Simulated orbital state: clock plus derived per-cell sun exposure.
#[derive(Debug)]
pub struct PlanetarySystem {
    config: PlanetaryConfig,
    grid: Grid,
    current_day: f64,
    current_hour: f64,
    /// Per-cell daylight flag for the current clock, row-major.
    pub day_night_mask: Vec<bool>,
    /// Per-cell solar radiation intensity (0 at night), row-major.
    pub solar_radiation: Vec<f32>,
    /// Grid cell size in km, from the scaled planet circumference.
    pub km_per_cell: f64,
}

impl PlanetarySystem {
    pub fn new(config: PlanetaryConfig) -> Self {
        let grid = Grid::new(config.world_size);
        let radius_km = EARTH_RADIUS_KM * config.earth_scale.sqrt();
        let km_per_cell = 2.0 * std::f64::consts::PI * radius_km / config.world_size as f64;
        let cells = grid.cells();

        let mut system = Self {
            current_day: config.start_day.rem_euclid(config.year_length_days),
            current_hour: 0.0,
            day_night_mask: vec![false; cells],
            solar_radiation: vec![0.0; cells],
            km_per_cell,
            config,
            grid,
        };
        system.update_sun();
        system
    }

    pub fn config(&self) -> &PlanetaryConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Current (day_of_year, hour_of_day).
    pub fn current_time(&self) -> (f64, f64) {
        (self.current_day, self.current_hour)
    }

    pub fn year_length_days(&self) -> f64 {
        self.config.year_length_days
    }

    pub fn day_length_hours(&self) -> f64 {
        self.config.day_length_hours
    }

    /// Set the clock to an absolute time and refresh the sun-derived grids.
    pub fn set_time(&mut self, day_of_year: f64, hour_of_day: f64) {
        self.current_day = day_of_year.rem_euclid(self.config.year_length_days);
        self.current_hour = hour_of_day.rem_euclid(self.config.day_length_hours);
        self.update_sun();
    }

    /// Advance the clock, rolling over days and years as needed.
    pub fn advance(&mut self, hours: f64) {
        let mut hour = self.current_hour + hours;
        let mut day = self.current_day;
        while hour >= self.config.day_length_hours {
            hour -= self.config.day_length_hours;
            day += 1.0;
            if day >= self.config.year_length_days {
                day -= self.config.year_length_days;
            }
        }
        self.current_day = day;
        self.current_hour = hour;
        self.update_sun();
    }

    /// Solar declination for the current day, in radians.
    /// Day 0 ≈ northern winter solstice, day ≈ year/2 ≈ northern summer.
    pub fn declination(&self) -> f64 {
        let year_angle =
            2.0 * std::f64::consts::PI * self.current_day / self.config.year_length_days;
        -self.config.axial_tilt_deg.to_radians() * year_angle.cos()
    }

    /// Sine of the solar altitude at (lat, lon) for the current clock.
    fn solar_altitude_sin(&self, lat_rad: f64, lon_rad: f64) -> f64 {
        let decl = self.declination();
        // Local hour angle: 0 at local solar noon. The prime meridian sees
        // noon at hour = day_length/2.
        let hour_frac = self.current_hour / self.config.day_length_hours;
        let hour_angle = 2.0 * std::f64::consts::PI * hour_frac - std::f64::consts::PI + lon_rad;
        lat_rad.sin() * decl.sin() + lat_rad.cos() * decl.cos() * hour_angle.cos()
    }

    /// Orbital distance factor 1/d² from eccentricity and perihelion phase.
    fn orbital_factor(&self) -> f64 {
        let two_pi = 2.0 * std::f64::consts::PI;
        let year_angle = two_pi * self.current_day / self.config.year_length_days;
        let perihelion_angle = two_pi * self.config.perihelion_day / self.config.year_length_days;
        let diff = (year_angle - perihelion_angle).rem_euclid(two_pi);
        let distance = 1.0 - self.eccentricity() * diff.cos();
        1.0 / (distance * distance)
    }

    fn eccentricity(&self) -> f64 {
        self.config.eccentricity
    }

    /// Recompute the day/night mask and solar radiation for the current clock.
    fn update_sun(&mut self) {
        let orbital = self.orbital_factor();
        let n = self.grid.size;
        for y in 0..n {
            let lat_rad = self.grid.lat_of_row(y).to_radians();
            for x in 0..n {
                let lon_rad = self.grid.lon_of_col(x).to_radians();
                let sin_alt = self.solar_altitude_sin(lat_rad, lon_rad);
                let i = self.grid.idx(y, x);
                self.day_night_mask[i] = sin_alt > 0.0;
                self.solar_radiation[i] = if sin_alt > 0.0 {
                    (sin_alt * orbital) as f32
                } else {
                    0.0
                };
            }
        }
    }

    /// Seasonal factor for a latitude, in [−1, 1]. Positive means
    /// summer-like conditions: the noon sun stands higher than it would at
    /// equinox for that latitude.
    pub fn seasonal_factor(&self, latitude_deg: f64) -> f64 {
        let lat = latitude_deg.to_radians();
        let decl = self.declination();
        let noon_altitude = std::f64::consts::FRAC_PI_2 - (lat - decl).abs();
        let equinox_altitude = std::f64::consts::FRAC_PI_2 - lat.abs();
        let effect = (noon_altitude - equinox_altitude) / std::f64::consts::FRAC_PI_2;
        (effect * self.config.seasonal_factor).clamp(-1.0, 1.0)
    }

    /// Day length in hours at a latitude for the current day, from the
    /// sunrise equation. Returns 0 for polar night and the full configured
    /// day length for polar day.
    pub fn day_length_at(&self, latitude_deg: f64) -> f64 {
        let lat = latitude_deg.to_radians();
        let decl = self.declination();
        let cos_h0 = -lat.tan() * decl.tan();
        if cos_h0 <= -1.0 {
            self.config.day_length_hours // polar day
        } else if cos_h0 >= 1.0 {
            0.0 // polar night
        } else {
            let h0 = cos_h0.acos();
            (h0 / std::f64::consts::PI) * self.config.day_length_hours
        }
    }

    /// Northern-hemisphere season name for the current day.
    pub fn season(&self) -> &'static str {
        let pos = self.current_day / self.config.year_length_days;
        if pos < 0.25 {
            "Winter"
        } else if pos < 0.5 {
            "Spring"
        } else if pos < 0.75 {
            "Summer"
        } else {
            "Fall"
        }
    }

    /// Human-readable clock stamp, e.g. "day 182, 13:30 (Summer)".
    pub fn format_date(&self) -> String {
        let hours = self.current_hour.floor() as u32;
        let minutes = ((self.current_hour - self.current_hour.floor()) * 60.0).round() as u32;
        format!(
            "day {}, {:02}:{:02} ({})",
            self.current_day.floor() as u64,
            hours,
            minutes % 60,
            self.season()
        )
    }

    /// Fraction of the grid currently in daylight.
    pub fn daylight_fraction(&self) -> f64 {
        let lit = self.day_night_mask.iter().filter(|&&d| d).count();
        lit as f64 / self.day_night_mask.len().max(1) as f64
    }
}
