//! Köppen-style climate classification with a memoization cache.
//!
//! The classifier works from the annual-mean cell record plus estimated
//! warmest/coldest-month temperatures and a summer-rain share derived from
//! the latitude-zone precipitation regime. Water cells short-circuit to
//! "Ocean".

use std::collections::HashMap;

/// Memoized per-cell classification codes. Cleared whenever the fields the
/// codes were derived from change.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    codes: HashMap<(usize, usize), &'static str>,
}

impl ClassificationCache {
    pub fn get(&self, x: usize, y: usize) -> Option<&'static str> {
        self.codes.get(&(x, y)).copied()
    }

    pub fn insert(&mut self, x: usize, y: usize, code: &'static str) {
        self.codes.insert((x, y), code);
    }

    pub fn clear(&mut self) {
        self.codes.clear();
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Fraction of annual rain falling in the summer half-year, estimated from
/// the latitude-zone seasonal regime: twin equatorial wet seasons read as
/// even, monsoon belts as summer-heavy, temperate coasts as winter-heavy.
pub fn summer_precip_share(abs_lat: f32, coastal: bool, variation_strength: f32) -> f32 {
    let season_mod = if abs_lat < 10.0 {
        0.0
    } else if abs_lat < 30.0 {
        0.8
    } else if abs_lat < 60.0 {
        if coastal {
            -0.4
        } else {
            0.3
        }
    } else {
        0.5
    } * variation_strength;
    let summer = 1.0 + season_mod;
    let winter = (1.0 - season_mod).max(0.0);
    summer / (summer + winter)
}

/// Classify a land cell from annual means and monthly estimates.
///
/// `temp` and `precip` are annual means (°C, mm/day); `warmest` and
/// `coldest` are estimated monthly extremes; `summer_share` is the summer
/// fraction of annual rain.
pub fn classify_cell(
    temp: f32,
    precip: f32,
    warmest: f32,
    coldest: f32,
    summer_share: f32,
) -> &'static str {
    let annual_precip = precip * 365.0;

    if coldest >= 18.0 {
        // Tropical.
        if annual_precip >= 1500.0 {
            "Af"
        } else if annual_precip >= 25.0 * (100.0 - (annual_precip / 25.0).min(60.0)) {
            "Am"
        } else {
            "Aw"
        }
    } else if annual_precip < 10.0 * warmest {
        // Arid. The threshold scales with the warmth of the growing season.
        let semi_arid = annual_precip > 5.0 * warmest;
        match (semi_arid, temp > 0.0) {
            (true, true) => "BSh",
            (true, false) => "BSk",
            (false, true) => "BWh",
            (false, false) => "BWk",
        }
    } else if coldest > 0.0 && warmest > 10.0 {
        // Temperate.
        if annual_precip > 480.0 {
            temperate_code(warmest, summer_share, "Cwa", "Cwb", "Csa", "Csb", "Cfa", "Cfb")
        } else {
            "Cs"
        }
    } else if warmest > 10.0 {
        // Continental.
        if annual_precip > 480.0 {
            temperate_code(warmest, summer_share, "Dwa", "Dwb", "Dsa", "Dsb", "Dfa", "Dfb")
        } else {
            "Df"
        }
    } else if warmest > 0.0 {
        "ET"
    } else {
        "EF"
    }
}

#[allow(clippy::too_many_arguments)]
fn temperate_code(
    warmest: f32,
    summer_share: f32,
    wa: &'static str,
    wb: &'static str,
    sa: &'static str,
    sb: &'static str,
    fa: &'static str,
    fb: &'static str,
) -> &'static str {
    let hot_summer = warmest > 22.0;
    if summer_share > 0.6 {
        if hot_summer {
            wa
        } else {
            wb
        }
    } else if summer_share < 0.4 {
        if hot_summer {
            sa
        } else {
            sb
        }
    } else if hot_summer {
        fa
    } else {
        fb
    }
}
