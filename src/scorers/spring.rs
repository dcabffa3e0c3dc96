//! Spring / wick sub-score (0-15)
//!
//! A spring is a bar whose low pierces support and whose close reclaims it.
//! Only the latest bar is examined; a non-spring bar scores 0.

use super::{helpers, Components, ScoringInput};
use crate::{params::ScoringParams, range::RangeLevels, OHLCVExt, OHLCV};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpringComponents {
    pub detected: bool,
    /// Lower wick versus body (0-7)
    pub wick: f64,
    /// Lower wick versus upper wick (0-4)
    pub position: f64,
    /// Wick low versus RL (0-4)
    pub support: f64,
    /// Volume above its prior average (0-1)
    pub volume_bonus: f64,
}

impl Components for SpringComponents {
    const MAX: f64 = 15.0;

    fn raw(&self) -> f64 {
        self.wick + self.position + self.support + self.volume_bonus
    }
}

/// Low below support, close back above it
#[inline]
pub fn is_spring_bar<T: OHLCV>(bar: &T, levels: &RangeLevels) -> bool {
    bar.low() < levels.support && bar.close() > levels.support
}

pub fn score<T: OHLCV>(input: &ScoringInput<'_, T>) -> SpringComponents {
    let Some(bar) = input.bar() else {
        return SpringComponents::default();
    };
    if !is_spring_bar(bar, input.levels) {
        return SpringComponents::default();
    }

    let p = input.params;
    let lower = bar.lower_shadow();
    let upper = bar.upper_shadow();

    SpringComponents {
        detected: true,
        wick: wick_score(lower, bar.body(), p),
        position: position_score(lower, upper),
        support: support_score(bar.low(), input.levels.support, p),
        volume_bonus: match input.volume_multiple() {
            Some(m) if m > 1.0 => 1.0,
            _ => 0.0,
        },
    }
}

/// 7 at or above the full ratio, 6..7 between half and full, linear below
fn wick_score(lower: f64, body: f64, p: &ScoringParams) -> f64 {
    if lower <= 0.0 {
        return 0.0;
    }
    let Some(r) = helpers::ratio(lower, body) else {
        // bodiless bar with a lower wick
        return 7.0;
    };
    let (full, half) = (p.spring_wick_full, p.spring_wick_half);
    if r >= full {
        7.0
    } else if r >= half {
        6.0 + (r - half) / (full - half)
    } else {
        6.0 * r / half
    }
}

fn position_score(lower: f64, upper: f64) -> f64 {
    if upper <= 0.0 {
        return if lower > 0.0 { 4.0 } else { 0.0 };
    }
    if lower >= 1.2 * upper {
        4.0
    } else if lower >= 0.8 * upper {
        2.0
    } else {
        0.0
    }
}

fn support_score(low: f64, support: f64, p: &ScoringParams) -> f64 {
    let pct = p.spring_support_pct.get();
    match helpers::pct_distance(low, support) {
        Some(d) if d <= pct => 4.0,
        Some(d) if d <= 2.0 * pct => 2.0,
        _ => 0.0,
    }
}
