//! Accumulation sub-score (0-20)
//!
//! Range width (0-10) plus position of the close inside the range (0-10)
//! plus a low-volatility bonus (0-1). A range wider than
//! `accumulation_max_range_pct` is not an accumulation range and scores 0.

use super::{helpers, Components, ScoringInput};
use crate::OHLCV;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccumulationComponents {
    /// Range width as a percent of support
    pub range_pct: f64,
    pub width: f64,
    pub position: f64,
    pub atr_bonus: f64,
}

impl Components for AccumulationComponents {
    const MAX: f64 = 20.0;

    fn raw(&self) -> f64 {
        self.width + self.position + self.atr_bonus
    }
}

pub fn score<T: OHLCV>(input: &ScoringInput<'_, T>) -> AccumulationComponents {
    let p = input.params;
    let range_pct = input.levels.range_pct();

    if range_pct > p.accumulation_max_range_pct.get() {
        return AccumulationComponents {
            range_pct,
            ..Default::default()
        };
    }

    AccumulationComponents {
        range_pct,
        width: width_score(range_pct, input),
        position: position_score(input),
        atr_bonus: atr_bonus(input),
    }
}

fn width_score<T: OHLCV>(range_pct: f64, input: &ScoringInput<'_, T>) -> f64 {
    let p = input.params;
    if range_pct <= p.width_tight_pct.get() {
        10.0
    } else if range_pct <= p.width_mid_pct.get() {
        7.0
    } else if range_pct <= p.accumulation_max_range_pct.get() {
        4.0
    } else {
        0.0
    }
}

/// Near RL scores 7, near RH 5, near VAL 3; additive, capped at 10
fn position_score<T: OHLCV>(input: &ScoringInput<'_, T>) -> f64 {
    let p = input.params;
    let levels = input.levels;
    let close = input.close();

    let mut points = 0.0;
    if helpers::within_pct(close, levels.support, p.near_support_pct.get()) {
        points += 7.0;
    }
    if helpers::within_pct(close, levels.resistance, p.near_resistance_pct.get()) {
        points += 5.0;
    }
    if helpers::within_pct(close, levels.value_area_low, p.near_val_pct.get()) {
        points += 3.0;
    }
    f64::min(points, 10.0)
}

fn atr_bonus<T: OHLCV>(input: &ScoringInput<'_, T>) -> f64 {
    match helpers::ratio(input.atr(), input.close()) {
        Some(r) if r * 100.0 <= input.params.atr_bonus_pct.get() => 1.0,
        _ => 0.0,
    }
}
