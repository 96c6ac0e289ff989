//! Procedural planet simulation: terrain, orbital mechanics, and a
//! quasi-steady climate engine with optional fantasy perturbations.
//!
//! Pipeline:
//!   Terrain provider (heightmap + water mask) and planetary provider
//!   (day/night, solar radiation, seasonal factors) run first and feed the
//!   climate engine, which derives pressure → temperature → wind →
//!   humidity → precipitation in a fixed dependency order, then answers
//!   point queries and Köppen-style classification.

pub mod climate;
pub mod coords;
pub mod noise;
pub mod planetary;
pub mod terrain;

use thiserror::Error;

pub use climate::{CellState, ClimateConfig, ClimateSystem, FantasyFeatures};
pub use coords::Grid;
pub use planetary::{PlanetaryConfig, PlanetarySystem};
pub use terrain::TerrainGenerator;

/// Errors surfaced by the world simulation layers.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A point query addressed a cell outside the N×N grid.
    /// Queries never clamp; the caller must stay in [0, N).
    #[error("coordinate ({x}, {y}) is outside the {size}x{size} grid")]
    InvalidCoordinate { x: usize, y: usize, size: usize },

    /// An input grid did not match the configured world size.
    #[error("{what} has {got} cells, expected {expected} ({size}x{size})")]
    GridMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
        size: usize,
    },
}
