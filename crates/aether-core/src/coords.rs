//! Grid geometry: cell → latitude/longitude mapping and neighbour indexing.
//!
//! The world is an N×N equirectangular lattice. Latitude runs from +90° at
//! row 0 to −90° at row N−1 and clamps at the poles; longitude runs from
//! −180° at column 0 to +180° at column N−1 and wraps cylindrically, so
//! column 0 and column N are adjacent. All coordinate math uses f64.

use serde::{Deserialize, Serialize};

/// Planetary angular velocity in rad/s (Earth value).
pub const OMEGA: f64 = 7.292e-5;

/// Square world lattice with deterministic index ↔ lat/lon mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub size: usize,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    #[inline]
    pub fn cells(&self) -> usize {
        self.size * self.size
    }

    #[inline]
    pub fn idx(&self, y: usize, x: usize) -> usize {
        y * self.size + x
    }

    /// Latitude of a row in degrees: +90 at row 0, −90 at row size−1.
    #[inline]
    pub fn lat_of_row(&self, y: usize) -> f64 {
        if self.size <= 1 {
            return 0.0;
        }
        90.0 - (y as f64 / (self.size - 1) as f64) * 180.0
    }

    /// Longitude of a column in degrees: −180 at column 0, +180 at size−1.
    #[inline]
    pub fn lon_of_col(&self, x: usize) -> f64 {
        if self.size <= 1 {
            return 0.0;
        }
        (x as f64 / (self.size - 1) as f64) * 360.0 - 180.0
    }

    /// Coriolis parameter f = 2Ω·sin(φ) for a row, in rad/s.
    #[inline]
    pub fn coriolis_of_row(&self, y: usize) -> f64 {
        2.0 * OMEGA * self.lat_of_row(y).to_radians().sin()
    }

    /// Wrap a signed column index onto the cylinder.
    #[inline]
    pub fn wrap_x(&self, x: isize) -> usize {
        let n = self.size as isize;
        (((x % n) + n) % n) as usize
    }

    /// Clamp a signed row index at the poles.
    #[inline]
    pub fn clamp_y(&self, y: isize) -> usize {
        y.clamp(0, self.size as isize - 1) as usize
    }

    /// Neighbour index with wrap-x/clamp-y semantics.
    #[inline]
    pub fn neighbour(&self, y: usize, x: usize, dy: isize, dx: isize) -> usize {
        let ny = self.clamp_y(y as isize + dy);
        let nx = self.wrap_x(x as isize + dx);
        self.idx(ny, nx)
    }

    /// True if (x, y) lies inside the lattice.
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }
}
