//! Momentum sub-scores: RSI recovery (0-10) and ATR volatility (0-10)

use super::{helpers, Components, ScoringInput};
use crate::{indicators::Series, params::ScoringParams, OHLCV};

// ============================================================
// RSI RECOVERY
// ============================================================

/// RSI rising off a recent trough. The turn and rebound parts outweigh the
/// depth of the trough itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RsiRecoveryComponents {
    /// How oversold the trough was (1-3)
    pub depth: f64,
    /// Distance climbed off the trough, full at 10 RSI points (0-4)
    pub rebound: f64,
    /// RSI up on the latest bar (1.5), and on the bar before (1.5)
    pub turn: f64,
}

impl Components for RsiRecoveryComponents {
    const MAX: f64 = 10.0;

    fn raw(&self) -> f64 {
        self.depth + self.rebound + self.turn
    }
}

pub fn rsi_recovery<T: OHLCV>(input: &ScoringInput<'_, T>) -> RsiRecoveryComponents {
    recovery(&input.indicators.rsi, input.index(), input.params)
}

/// Recovery components of `rsi` at `index`. Zero unless the trough of the
/// last `rsi_lookback` values is at or below `rsi_recovery_ceiling` and the
/// current value is above it.
pub fn recovery(rsi: &Series, index: usize, p: &ScoringParams) -> RsiRecoveryComponents {
    let Some(window) = rsi.window(index, p.rsi_lookback.get()) else {
        return RsiRecoveryComponents::default();
    };
    let trough = window.iter().copied().fold(f64::INFINITY, f64::min);
    let Some(current) = rsi.get(index) else {
        return RsiRecoveryComponents::default();
    };

    let oversold = p.rsi_oversold.get();
    let ceiling = p.rsi_recovery_ceiling.get();
    if trough > ceiling || current <= trough {
        return RsiRecoveryComponents::default();
    }

    let depth = if trough <= oversold {
        3.0
    } else if trough <= (oversold + ceiling) / 2.0 {
        2.0
    } else {
        1.0
    };

    let rebound = 4.0 * ((current - trough) / 10.0).min(1.0);

    let prev = index.checked_sub(1).and_then(|i| rsi.get(i));
    let prev2 = index.checked_sub(2).and_then(|i| rsi.get(i));
    let turn = match (prev, prev2) {
        (Some(p1), Some(p2)) if current > p1 && p1 > p2 => 3.0,
        (Some(p1), _) if current > p1 => 1.5,
        _ => 0.0,
    };

    RsiRecoveryComponents {
        depth,
        rebound,
        turn,
    }
}

// ============================================================
// ATR VOLATILITY
// ============================================================

/// Lower ATR relative to close scores higher:
/// under 1% 10, under 2% 8, under 3% 5, under 5% 3, otherwise 0
pub fn atr_volatility<T: OHLCV>(input: &ScoringInput<'_, T>) -> f64 {
    helpers::ratio(input.atr(), input.close()).map_or(0.0, |r| atr_tier(r * 100.0))
}

pub fn atr_tier(atr_pct: f64) -> f64 {
    match atr_pct {
        p if p < 1.0 => 10.0,
        p if p < 2.0 => 8.0,
        p if p < 3.0 => 5.0,
        p if p < 5.0 => 3.0,
        _ => 0.0,
    }
}
