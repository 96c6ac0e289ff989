//! World simulation driver: generates terrain, spins up the climate engine,
//! advances the clock to a requested day/hour, and reports field summaries
//! plus sampled point queries with their climate classifications.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use aether_core::climate::FantasyFeatures;
use aether_core::terrain::TerrainConfig;
use aether_core::{CellState, ClimateConfig, ClimateSystem, PlanetaryConfig, PlanetarySystem, TerrainGenerator};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "aether-sim",
    about = "Generate a procedural world and query its climate"
)]
struct Args {
    /// Grid edge length in cells (the world is size x size)
    #[arg(long, default_value = "128")]
    size: usize,

    /// World seed (omit for a random one)
    #[arg(long)]
    seed: Option<u64>,

    /// Target fraction of the surface below sea level
    #[arg(long, default_value = "0.65")]
    water_coverage: f32,

    /// Global mean surface temperature, celsius
    #[arg(long, default_value = "14.0")]
    base_temp: f32,

    /// Seasonal variation multiplier (0 disables seasons)
    #[arg(long, default_value = "1.0")]
    seasons: f32,

    /// Axial tilt in degrees
    #[arg(long, default_value = "23.5")]
    tilt: f64,

    /// Magical hotspot strength, 0-1
    #[arg(long, default_value = "0.0")]
    hotspots: f32,

    /// Elemental zone strength, 0-1
    #[arg(long, default_value = "0.0")]
    elemental: f32,

    /// Aether current strength, 0-1
    #[arg(long, default_value = "0.0")]
    currents: f32,

    /// Reality flux strength, 0-1
    #[arg(long, default_value = "0.0")]
    flux: f32,

    /// Day of year to advance the clock to
    #[arg(long, default_value = "0")]
    day: f64,

    /// Hour of day to advance the clock to
    #[arg(long, default_value = "12")]
    hour: f64,

    /// Number of sample points per axis in the report
    #[arg(long, default_value = "4")]
    samples: usize,

    /// Write the full report as JSON instead of text
    #[arg(short, long)]
    output: Option<PathBuf>,
}

// ── Report schema ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Report {
    seed: u64,
    size: usize,
    date: String,
    water_fraction: f32,
    mean_temperature: f32,
    mean_precipitation: f32,
    mean_pressure: f32,
    samples: Vec<Sample>,
}

#[derive(Serialize)]
struct Sample {
    x: usize,
    y: usize,
    latitude: f64,
    longitude: f64,
    classification: &'static str,
    #[serde(flatten)]
    state: CellState,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let terrain = TerrainGenerator::new(TerrainConfig {
        size: args.size,
        water_coverage: args.water_coverage,
        seed: args.seed,
        ..Default::default()
    });
    let seed = terrain.seed();
    let elevation = terrain.elevation_m();
    let (heightmap, water) = terrain.into_parts();

    let planetary = PlanetarySystem::new(PlanetaryConfig {
        world_size: args.size,
        axial_tilt_deg: args.tilt,
        ..Default::default()
    });

    let mut climate = ClimateSystem::new(
        heightmap,
        water,
        planetary,
        ClimateConfig {
            world_size: args.size,
            base_temperature: args.base_temp,
            seasonal_variation_strength: args.seasons,
            seed: Some(seed),
            fantasy: FantasyFeatures {
                magical_hotspots: args.hotspots,
                elemental_zones: args.elemental,
                aether_currents: args.currents,
                reality_flux: args.flux,
            },
        },
        Some(elevation),
    )
    .context("climate construction failed")?;

    climate.update(args.day, args.hour);

    let report = build_report(&mut climate, &args)?;
    match &args.output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&report)?;
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("report written to {}", path.display());
        }
        None => print_report(&report),
    }
    Ok(())
}

fn build_report(climate: &mut ClimateSystem, args: &Args) -> Result<Report> {
    let grid = climate.grid();
    let field = climate.field();
    let n = grid.cells() as f32;

    let water_fraction = field.water_fraction();
    let mean_temperature = field.temperature.iter().sum::<f32>() / n;
    let mean_precipitation = field.precipitation.iter().sum::<f32>() / n;
    let mean_pressure = field.pressure.iter().sum::<f32>() / n;
    let date = climate.planetary().format_date();

    let mut samples = Vec::new();
    let step = (args.size / (args.samples + 1)).max(1);
    for sy in 1..=args.samples {
        for sx in 1..=args.samples {
            let x = (sx * step).min(args.size - 1);
            let y = (sy * step).min(args.size - 1);
            let state = climate.state_at(x, y)?;
            let classification = climate.classify(x, y)?;
            samples.push(Sample {
                x,
                y,
                latitude: grid.lat_of_row(y),
                longitude: grid.lon_of_col(x),
                classification,
                state,
            });
        }
    }

    Ok(Report {
        seed: climate.seed(),
        size: args.size,
        date,
        water_fraction,
        mean_temperature,
        mean_precipitation,
        mean_pressure,
        samples,
    })
}

fn print_report(report: &Report) {
    println!(
        "world {}x{} seed {} | {}",
        report.size, report.size, report.seed, report.date
    );
    println!(
        "water {:.1}%  mean temp {:.1} C  mean precip {:.2} mm/day  mean pressure {:.1} hPa",
        report.water_fraction * 100.0,
        report.mean_temperature,
        report.mean_precipitation,
        report.mean_pressure
    );
    println!();
    println!(
        "{:>5} {:>5} {:>7} {:>8} {:>6} {:>8} {:>7} {:>6} {:>8}  class",
        "x", "y", "lat", "lon", "temp", "precip", "humid", "wind", "pressure"
    );
    for s in &report.samples {
        println!(
            "{:>5} {:>5} {:>7.1} {:>8.1} {:>6.1} {:>8.2} {:>7.2} {:>6.1} {:>8.1}  {}",
            s.x,
            s.y,
            s.latitude,
            s.longitude,
            s.state.temperature,
            s.state.precipitation,
            s.state.humidity,
            s.state.wind_speed,
            s.state.pressure,
            s.classification
        );
    }
}
