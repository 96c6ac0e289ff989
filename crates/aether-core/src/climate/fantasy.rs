//! Fantasy climate perturbations, layered over the physical base state.
//!
//! Four feature families, each gated by a strength in [0, 1] (0 disables
//! it): thermal hotspots, elemental zones with their own wind regimes,
//! path-shaped aether currents, and noise-driven reality flux pockets.
//! Placement draws from the engine's seeded RNG, so a fixed seed yields the
//! same anomalies every run.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::coords::Grid;
use crate::noise::Fbm;

use super::field::ClimateField;

/// Per-family perturbation strengths. Absent fields deserialize to 0.0,
/// which disables the family.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FantasyFeatures {
    pub magical_hotspots: f32,
    pub elemental_zones: f32,
    pub aether_currents: f32,
    pub reality_flux: f32,
}

impl FantasyFeatures {
    pub fn any_enabled(&self) -> bool {
        self.magical_hotspots > 0.0
            || self.elemental_zones > 0.0
            || self.aether_currents > 0.0
            || self.reality_flux > 0.0
    }
}

/// The feature families, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    MagicalHotspots,
    ElementalZones,
    AetherCurrents,
    RealityFlux,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::MagicalHotspots,
        FeatureKind::ElementalZones,
        FeatureKind::AetherCurrents,
        FeatureKind::RealityFlux,
    ];

    fn strength(self, features: &FantasyFeatures) -> f32 {
        match self {
            FeatureKind::MagicalHotspots => features.magical_hotspots,
            FeatureKind::ElementalZones => features.elemental_zones,
            FeatureKind::AetherCurrents => features.aether_currents,
            FeatureKind::RealityFlux => features.reality_flux,
        }
    }

    /// Feature count scales with the square root of the world size.
    fn count(self, world_size: usize, strength: f32) -> usize {
        let per_kind = match self {
            FeatureKind::MagicalHotspots => 0.5,
            FeatureKind::ElementalZones => 0.3,
            FeatureKind::AetherCurrents => 0.2,
            FeatureKind::RealityFlux => 0.15,
        };
        ((world_size as f32).sqrt() * strength * per_kind) as usize
    }
}

pub fn apply(
    field: &mut ClimateField,
    grid: &Grid,
    noise: &Fbm,
    rng: &mut StdRng,
    features: &FantasyFeatures,
) {
    if !features.any_enabled() {
        return;
    }
    for kind in FeatureKind::ALL {
        let strength = kind.strength(features);
        if strength <= 0.0 {
            continue;
        }
        let count = kind.count(grid.size, strength);
        for _ in 0..count {
            match kind {
                FeatureKind::MagicalHotspots => place_hotspot(field, grid, rng, strength),
                FeatureKind::ElementalZones => place_elemental_zone(field, grid, noise, rng, strength),
                FeatureKind::AetherCurrents => place_aether_current(field, grid, rng, strength),
                FeatureKind::RealityFlux => place_reality_flux(field, grid, noise, rng, strength),
            }
        }
    }
}

/// Pick a cell, preferring land for the first several attempts.
fn pick_site(field: &ClimateField, grid: &Grid, rng: &mut StdRng, prefer_land: bool) -> (usize, usize) {
    let mut x = rng.gen_range(0..grid.size);
    let mut y = rng.gen_range(0..grid.size);
    if prefer_land {
        for attempt in 0..10 {
            if !field.water[grid.idx(y, x)] || attempt > 5 {
                break;
            }
            x = rng.gen_range(0..grid.size);
            y = rng.gen_range(0..grid.size);
        }
    }
    (y, x)
}

// ── magical hotspots ──

struct HotspotType {
    temp: f32,
    humidity: f32,
    precip: f32,
    radius: f32,
}

const HOTSPOT_TYPES: [HotspotType; 5] = [
    // arcane nexus
    HotspotType { temp: 25.0, humidity: 0.4, precip: 1.5, radius: 10.0 },
    // frost well
    HotspotType { temp: -25.0, humidity: -0.2, precip: -0.5, radius: 15.0 },
    // sunburst vent
    HotspotType { temp: 40.0, humidity: -0.8, precip: -0.8, radius: 12.0 },
    // ethereal fountain
    HotspotType { temp: 5.0, humidity: 0.9, precip: 2.0, radius: 14.0 },
    // void tear
    HotspotType { temp: -15.0, humidity: -0.5, precip: -0.7, radius: 8.0 },
];

fn place_hotspot(field: &mut ClimateField, grid: &Grid, rng: &mut StdRng, strength: f32) {
    let kind = &HOTSPOT_TYPES[rng.gen_range(0..HOTSPOT_TYPES.len())];
    let (cy, cx) = pick_site(field, grid, rng, true);
    let radius = kind.radius * strength * (0.8 + 0.4 * rng.gen::<f32>());
    let r = radius.max(1.0) as isize;

    for dy in -r..=r {
        // Rows past a pole are skipped, never clamped: clamping would pile
        // every out-of-range offset onto the pole row.
        let Some(ny) = footprint_row(grid, cy, dy) else {
            continue;
        };
        for dx in -r..=r {
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance > radius {
                continue;
            }
            let i = grid.idx(ny, grid.wrap_x(cx as isize + dx));
            let falloff = (1.0 - distance / radius).powf(1.5);
            field.temperature[i] += kind.temp * falloff * strength;
            apply_humidity_delta(field, i, kind.humidity * falloff * strength);
            apply_precip_delta(field, i, kind.precip * falloff * strength, 0.0);
        }
    }
}

/// Row of a footprint offset, or `None` when it falls past a pole.
fn footprint_row(grid: &Grid, cy: usize, dy: isize) -> Option<usize> {
    let ny = cy as isize + dy;
    if ny < 0 || ny >= grid.size as isize {
        None
    } else {
        Some(ny as usize)
    }
}

/// Positive deltas add toward saturation; negative ones scale down.
fn apply_humidity_delta(field: &mut ClimateField, i: usize, delta: f32) {
    if delta >= 0.0 {
        field.humidity[i] = (field.humidity[i] + delta).min(1.0);
    } else {
        field.humidity[i] = (field.humidity[i] * (1.0 + delta)).max(0.0);
    }
}

/// Precipitation deltas are multiplicative in both directions.
fn apply_precip_delta(field: &mut ClimateField, i: usize, delta: f32, floor: f32) {
    field.precipitation[i] = (field.precipitation[i] * (1.0 + delta)).max(floor);
}

// ── elemental zones ──

#[derive(Clone, Copy)]
enum WindPattern {
    Spiral,
    Outward,
    Random,
    Gentle,
    Stagnant,
}

struct ElementalType {
    temp: f32,
    humidity: f32,
    precip: f32,
    wind_strength: f32,
    wind_pattern: WindPattern,
    radius: f32,
    over_water: bool,
}

const ELEMENTAL_TYPES: [ElementalType; 6] = [
    // fire
    ElementalType {
        temp: 40.0,
        humidity: -0.8,
        precip: -0.9,
        wind_strength: 1.5,
        wind_pattern: WindPattern::Spiral,
        radius: 30.0,
        over_water: false,
    },
    // ice
    ElementalType {
        temp: -30.0,
        humidity: -0.5,
        precip: -0.2,
        wind_strength: 0.7,
        wind_pattern: WindPattern::Outward,
        radius: 35.0,
        over_water: false,
    },
    // storm
    ElementalType {
        temp: 0.0,
        humidity: 0.9,
        precip: 2.0,
        wind_strength: 2.5,
        wind_pattern: WindPattern::Spiral,
        radius: 40.0,
        over_water: false,
    },
    // desert
    ElementalType {
        temp: 15.0,
        humidity: -0.9,
        precip: -0.9,
        wind_strength: 1.2,
        wind_pattern: WindPattern::Random,
        radius: 45.0,
        over_water: false,
    },
    // verdant
    ElementalType {
        temp: 10.0,
        humidity: 0.8,
        precip: 1.5,
        wind_strength: 0.8,
        wind_pattern: WindPattern::Gentle,
        radius: 38.0,
        over_water: false,
    },
    // mist
    ElementalType {
        temp: -5.0,
        humidity: 1.0,
        precip: 0.5,
        wind_strength: 0.4,
        wind_pattern: WindPattern::Stagnant,
        radius: 33.0,
        over_water: true,
    },
];

fn place_elemental_zone(
    field: &mut ClimateField,
    grid: &Grid,
    noise: &Fbm,
    rng: &mut StdRng,
    strength: f32,
) {
    let zone = &ELEMENTAL_TYPES[rng.gen_range(0..ELEMENTAL_TYPES.len())];
    let (cy, cx) = pick_site(field, grid, rng, !zone.over_water);
    let radius = zone.radius * strength * (0.7 + 0.6 * rng.gen::<f32>());
    let r = radius.max(1.0) as isize;

    for dy in -r..=r {
        let Some(ny) = footprint_row(grid, cy, dy) else {
            continue;
        };
        for dx in -r..=r {
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance > radius {
                continue;
            }
            let i = grid.idx(ny, grid.wrap_x(cx as isize + dx));
            // Sharper falloff keeps the zones distinct.
            let falloff = (1.0 - distance / radius).powf(1.8);
            field.temperature[i] += zone.temp * falloff * strength;
            apply_humidity_delta(field, i, zone.humidity * falloff * strength);
            if zone.precip >= 0.0 {
                apply_precip_delta(field, i, zone.precip * falloff * strength, 0.0);
            } else {
                apply_precip_delta(field, i, zone.precip * falloff * strength, 0.1);
            }

            let (new_u, new_v) = match zone.wind_pattern {
                WindPattern::Spiral => {
                    let angle = (dy as f32).atan2(dx as f32)
                        + distance / radius * std::f32::consts::PI;
                    (
                        angle.cos() * zone.wind_strength * 5.0,
                        -angle.sin() * zone.wind_strength * 5.0,
                    )
                }
                WindPattern::Outward => {
                    if distance > 0.0 {
                        (
                            dx as f32 / distance * zone.wind_strength * 5.0,
                            -dy as f32 / distance * zone.wind_strength * 5.0,
                        )
                    } else {
                        (0.0, 0.0)
                    }
                }
                WindPattern::Random => {
                    let n = noise.sample2(
                        (cx as isize + dx) as f64 * 0.1,
                        (cy as isize + dy) as f64 * 0.1,
                        1,
                        0.5,
                        2.0,
                    ) as f32;
                    let angle = n * std::f32::consts::TAU;
                    (
                        angle.cos() * zone.wind_strength * 5.0,
                        angle.sin() * zone.wind_strength * 5.0,
                    )
                }
                WindPattern::Gentle => {
                    let angle = std::f32::consts::FRAC_PI_4;
                    (
                        angle.cos() * zone.wind_strength * 3.0,
                        angle.sin() * zone.wind_strength * 3.0,
                    )
                }
                WindPattern::Stagnant => (field.wind_u[i] * 0.2, field.wind_v[i] * 0.2),
            };
            field.wind_u[i] = field.wind_u[i] * (1.0 - falloff) + new_u * falloff;
            field.wind_v[i] = field.wind_v[i] * (1.0 - falloff) + new_v * falloff;
        }
    }
}

// ── aether currents ──

#[derive(Clone, Copy)]
enum FlowPattern {
    Meander,
    Sine,
    Spiral,
    Linear,
}

struct CurrentType {
    temp_mod: f32,
    humidity_mod: f32,
    width: f32,
    flow_pattern: FlowPattern,
}

const CURRENT_TYPES: [CurrentType; 5] = [
    // life stream
    CurrentType { temp_mod: 5.0, humidity_mod: 0.4, width: 8.0, flow_pattern: FlowPattern::Meander },
    // astral tide
    CurrentType { temp_mod: -10.0, humidity_mod: -0.2, width: 12.0, flow_pattern: FlowPattern::Sine },
    // phoenix wind
    CurrentType { temp_mod: 15.0, humidity_mod: -0.3, width: 6.0, flow_pattern: FlowPattern::Spiral },
    // void current
    CurrentType { temp_mod: -20.0, humidity_mod: -0.5, width: 10.0, flow_pattern: FlowPattern::Linear },
    // fey breeze
    CurrentType { temp_mod: 0.0, humidity_mod: 0.7, width: 7.0, flow_pattern: FlowPattern::Meander },
];

fn place_aether_current(field: &mut ClimateField, grid: &Grid, rng: &mut StdRng, strength: f32) {
    let current = &CURRENT_TYPES[rng.gen_range(0..CURRENT_TYPES.len())];
    let start_x = rng.gen_range(0..grid.size) as f32;
    let start_y = rng.gen_range(0..grid.size) as f32;
    let width = (current.width * strength).max(1.0);
    let length = (rng.gen_range(50.0..200.0) * strength) as usize;
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);

    let points = trace_path(grid, rng, current.flow_pattern, start_x, start_y, angle, length);
    if points.is_empty() {
        return;
    }

    let w = width as isize;
    for (step, &(py, px)) in points.iter().enumerate() {
        // Flow direction from the path tangent.
        let tangent = if step + 1 < points.len() {
            let (ny, nx) = points[step + 1];
            let dxp = nx as f32 - px as f32;
            let dyp = ny as f32 - py as f32;
            let len = (dxp * dxp + dyp * dyp).sqrt();
            if len > 0.0 {
                Some((dxp / len, -dyp / len))
            } else {
                None
            }
        } else {
            None
        };

        for dy in -w..=w {
            let Some(ny) = footprint_row(grid, py, dy) else {
                continue;
            };
            for dx in -w..=w {
                let distance = ((dx * dx + dy * dy) as f32).sqrt();
                if distance > width {
                    continue;
                }
                let i = grid.idx(ny, grid.wrap_x(px as isize + dx));
                let falloff = (1.0 - distance / width).powi(2);
                field.temperature[i] += current.temp_mod * falloff * strength;
                field.humidity[i] =
                    (field.humidity[i] + current.humidity_mod * falloff * strength).clamp(0.0, 1.0);
                if let Some((tx, tn)) = tangent {
                    let flow = 10.0 * strength * falloff;
                    field.wind_u[i] += tx * flow;
                    field.wind_v[i] += tn * flow;
                }
            }
        }
    }
}

/// Integrate a path across the lattice, wrapping in x and stopping at the
/// poles.
fn trace_path(
    grid: &Grid,
    rng: &mut StdRng,
    pattern: FlowPattern,
    mut x: f32,
    mut y: f32,
    mut angle: f32,
    length: usize,
) -> Vec<(usize, usize)> {
    let n = grid.size as f32;
    let mut points = Vec::with_capacity(length);
    let mut curvature = 0.0f32;
    let base_angle = angle;
    let amplitude = rng.gen_range(10.0..30.0f32);
    let wavelength = rng.gen_range(20.0..60.0f32);
    let mut spiral_radius = 5.0f32;

    for step in 0..length {
        if y < 0.0 || y >= n {
            break;
        }
        let px = grid.wrap_x(x.floor() as isize);
        points.push((y as usize, px));

        match pattern {
            FlowPattern::Meander => {
                curvature = (curvature + rng.gen_range(-0.1..0.1)).clamp(-0.2, 0.2);
                angle += curvature;
                x += angle.cos() * 2.0;
                y += angle.sin() * 2.0;
            }
            FlowPattern::Sine => {
                let phase = std::f32::consts::TAU * step as f32 / wavelength;
                x += base_angle.cos() * 2.0;
                y += base_angle.sin() * 2.0 + amplitude * phase.sin() * 0.1;
            }
            FlowPattern::Spiral => {
                angle += 0.1;
                spiral_radius += 0.2;
                x += angle.cos() * spiral_radius * 0.1;
                y += angle.sin() * spiral_radius * 0.1;
            }
            FlowPattern::Linear => {
                angle += rng.gen_range(-0.05..0.05);
                x += angle.cos() * 2.0;
                y += angle.sin() * 2.0;
            }
        }
    }
    points
}

// ── reality flux ──

struct FluxType {
    temp_range: f32,
    humidity_range: f32,
    wind_chaos: Option<f32>,
    seasonal_shift: bool,
    alien_weather: bool,
    radius: f32,
}

const FLUX_TYPES: [FluxType; 4] = [
    // chaotic flux
    FluxType {
        temp_range: 40.0,
        humidity_range: 1.0,
        wind_chaos: Some(2.0),
        seasonal_shift: false,
        alien_weather: false,
        radius: 25.0,
    },
    // temporal anomaly
    FluxType {
        temp_range: 30.0,
        humidity_range: 0.8,
        wind_chaos: None,
        seasonal_shift: true,
        alien_weather: false,
        radius: 20.0,
    },
    // planar bleed
    FluxType {
        temp_range: 50.0,
        humidity_range: 1.0,
        wind_chaos: None,
        seasonal_shift: false,
        alien_weather: true,
        radius: 15.0,
    },
    // arcane storm
    FluxType {
        temp_range: 25.0,
        humidity_range: 0.7,
        wind_chaos: None,
        seasonal_shift: false,
        alien_weather: false,
        radius: 30.0,
    },
];

fn place_reality_flux(
    field: &mut ClimateField,
    grid: &Grid,
    noise: &Fbm,
    rng: &mut StdRng,
    strength: f32,
) {
    let flux = &FLUX_TYPES[rng.gen_range(0..FLUX_TYPES.len())];
    let (cy, cx) = pick_site(field, grid, rng, false);
    let radius = (flux.radius * strength).max(1.0);
    let r = radius as isize;

    for dy in -r..=r {
        let Some(row) = footprint_row(grid, cy, dy) else {
            continue;
        };
        for dx in -r..=r {
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance > radius {
                continue;
            }
            let i = grid.idx(row, grid.wrap_x(cx as isize + dx));
            let falloff = (1.0 - distance / radius).powf(1.5);
            let nx = cx as isize + dx;
            let ny = cy as isize + dy;
            let n = noise.sample3(nx as f64 * 0.1, ny as f64 * 0.1, 7.3, 4, 0.5, 2.0) as f32;

            field.temperature[i] += n * flux.temp_range * falloff * strength;
            field.humidity[i] =
                (field.humidity[i] + n * flux.humidity_range * falloff * strength).clamp(0.0, 1.0);

            if let Some(chaos) = flux.wind_chaos {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let speed = chaos * falloff * strength * 5.0;
                field.wind_u[i] += angle.cos() * speed;
                field.wind_v[i] += angle.sin() * speed;
            }

            if flux.seasonal_shift {
                if n > 0.3 {
                    field.temperature[i] += 10.0 * falloff * strength;
                } else if n < -0.3 {
                    field.temperature[i] -= 10.0 * falloff * strength;
                }
            }

            if flux.alien_weather {
                if n > 0.7 {
                    field.temperature[i] = 50.0 * falloff + (1.0 - falloff) * field.temperature[i];
                    field.humidity[i] = 0.1 * falloff + (1.0 - falloff) * field.humidity[i];
                } else if n < -0.7 {
                    field.temperature[i] = -40.0 * falloff + (1.0 - falloff) * field.temperature[i];
                    field.precipitation[i] *= 3.0 * falloff + (1.0 - falloff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Grid;
    use rand::SeedableRng;

    fn baseline(size: usize) -> (ClimateField, Grid) {
        let g = Grid::new(size);
        let mut f = ClimateField::new(g, vec![false; g.cells()], vec![0.0; g.cells()]);
        for i in 0..g.cells() {
            f.temperature[i] = 10.0;
            f.humidity[i] = 0.5;
            f.precipitation[i] = 3.0;
        }
        (f, g)
    }

    #[test]
    fn zero_strengths_leave_the_field_untouched() {
        let (mut f, g) = baseline(64);
        let before = f.temperature.clone();
        let mut rng = StdRng::seed_from_u64(1);
        apply(&mut f, &g, &Fbm::new(1), &mut rng, &FantasyFeatures::default());
        assert_eq!(f.temperature, before);
    }

    #[test]
    fn hotspots_perturb_the_temperature_field() {
        let (mut f, g) = baseline(64);
        let before = f.temperature.clone();
        let mut rng = StdRng::seed_from_u64(42);
        let features = FantasyFeatures { magical_hotspots: 1.0, ..Default::default() };
        apply(&mut f, &g, &Fbm::new(42), &mut rng, &features);
        let changed = f
            .temperature
            .iter()
            .zip(&before)
            .filter(|(a, b)| (*a - *b).abs() > 0.1)
            .count();
        assert!(changed > 0, "hotspots should move temperatures somewhere");
        // Sanity bound: a 64-cell world places √64·0.5 = 4 hotspots of
        // radius ≤ ~17; the whole map must not be rewritten.
        assert!(changed < g.cells(), "perturbation should stay localized");
    }

    #[test]
    fn polar_footprints_apply_each_cell_at_most_once() {
        // A footprint crossing a pole must drop the out-of-range rows, not
        // fold them back onto the pole row. The palette's largest thermal
        // delta is 40, so no single hotspot may move any cell further.
        for seed in 0..200 {
            let (mut f, g) = baseline(48);
            let mut rng = StdRng::seed_from_u64(seed);
            place_hotspot(&mut f, &g, &mut rng, 1.0);
            for (i, t) in f.temperature.iter().enumerate() {
                let delta = (t - 10.0).abs();
                assert!(
                    delta <= 40.0 + 1e-3,
                    "seed {seed} cell {i}: thermal delta {delta} exceeds one application"
                );
            }
        }
    }

    #[test]
    fn same_seed_places_identical_features() {
        let features = FantasyFeatures {
            magical_hotspots: 0.8,
            elemental_zones: 0.5,
            aether_currents: 0.5,
            reality_flux: 0.4,
        };
        let (mut a, g) = baseline(64);
        let (mut b, _) = baseline(64);
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        apply(&mut a, &g, &Fbm::new(99), &mut rng_a, &features);
        apply(&mut b, &g, &Fbm::new(99), &mut rng_b, &features);
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.humidity, b.humidity);
        assert_eq!(a.wind_u, b.wind_u);
    }

    #[test]
    fn humidity_stays_clamped_under_heavy_flux() {
        let (mut f, g) = baseline(64);
        let mut rng = StdRng::seed_from_u64(7);
        let features = FantasyFeatures {
            elemental_zones: 1.0,
            reality_flux: 1.0,
            ..Default::default()
        };
        apply(&mut f, &g, &Fbm::new(7), &mut rng, &features);
        for (i, h) in f.humidity.iter().enumerate() {
            assert!((0.0..=1.0).contains(h), "cell {i}: humidity {h} out of range");
        }
    }
}
