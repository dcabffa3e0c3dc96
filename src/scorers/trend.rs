//! Trend sub-scores: breakout proximity (0-10), EMA cross (0-10) and the
//! golden cross bonus (+2)

use super::{helpers, Components, ScoringInput};
use crate::{indicators::Series, OHLCV};

// ============================================================
// BREAKOUT PROXIMITY
// ============================================================

/// `10 * exp(-d / breakout_decay_atr)` where `d` is the distance from close
/// up to RH in ATRs. Zero once the close is above RH, beyond
/// `breakout_max_atr`, for a flat range, or with no ATR.
pub fn breakout_proximity<T: OHLCV>(input: &ScoringInput<'_, T>) -> f64 {
    let p = input.params;
    let levels = input.levels;
    let close = input.close();

    if levels.is_flat() || close > levels.resistance {
        return 0.0;
    }
    let Some(distance) = helpers::ratio(levels.resistance - close, input.atr()) else {
        return 0.0;
    };
    if distance > p.breakout_max_atr {
        return 0.0;
    }
    helpers::clamp_points(10.0 * (-distance / p.breakout_decay_atr).exp(), 0.0, 10.0)
}

// ============================================================
// EMA CROSS
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmaCrossComponents {
    /// Fast EMA above slow EMA (6)
    pub alignment: f64,
    /// Fast SMA above slow SMA as well (2)
    pub confirmation: f64,
    /// EMA gap, scaled up to `ema_gap_full_pct` (0-2)
    pub gap: f64,
}

impl Components for EmaCrossComponents {
    const MAX: f64 = 10.0;

    fn raw(&self) -> f64 {
        self.alignment + self.confirmation + self.gap
    }
}

pub fn ema_cross<T: OHLCV>(input: &ScoringInput<'_, T>) -> EmaCrossComponents {
    let ind = input.indicators;
    let index = input.index();
    let (Some(fast), Some(slow)) = (ind.ema_fast.get(index), ind.ema_slow.get(index)) else {
        return EmaCrossComponents::default();
    };
    if fast <= slow {
        return EmaCrossComponents::default();
    }

    let sma_up = matches!(
        (ind.sma_fast.get(index), ind.sma_slow.get(index)),
        (Some(f), Some(s)) if f > s
    );
    let gap_pct = helpers::ratio(fast - slow, slow).map_or(0.0, |r| r * 100.0);
    let full = input.params.ema_gap_full_pct.get();

    EmaCrossComponents {
        alignment: 6.0,
        confirmation: if sma_up { 2.0 } else { 0.0 },
        gap: helpers::ratio(gap_pct, full).map_or(0.0, |r| 2.0 * r.min(1.0)),
    }
}

// ============================================================
// GOLDEN CROSS
// ============================================================

/// Bars since `fast` last crossed above `slow`, looking back at most
/// `lookback` bars from `index` (0 means the cross happened on `index`)
pub fn bars_since_cross_up(
    fast: &Series,
    slow: &Series,
    index: usize,
    lookback: usize,
) -> Option<usize> {
    (0..=lookback).find(|&k| {
        let Some(i) = index.checked_sub(k).filter(|&i| i > 0) else {
            return false;
        };
        match (fast.get(i), slow.get(i), fast.get(i - 1), slow.get(i - 1)) {
            (Some(f), Some(s), Some(pf), Some(ps)) => f > s && pf <= ps,
            _ => false,
        }
    })
}

/// +2 when `fast` crossed above `slow` within `lookback` bars, is still
/// above it, and the gap widened on the latest bar
pub fn golden_cross(fast: &Series, slow: &Series, index: usize, lookback: usize) -> f64 {
    let gap = |i: usize| Some(fast.get(i)? - slow.get(i)?);
    let Some(now) = gap(index) else {
        return 0.0;
    };
    let widening = index
        .checked_sub(1)
        .and_then(gap)
        .is_some_and(|prev| now > prev);

    if now > 0.0 && widening && bars_since_cross_up(fast, slow, index, lookback).is_some() {
        2.0
    } else {
        0.0
    }
}

pub fn golden_cross_bonus<T: OHLCV>(input: &ScoringInput<'_, T>) -> f64 {
    golden_cross(
        &input.indicators.ema_fast,
        &input.indicators.ema_slow,
        input.index(),
        input.params.golden_cross_lookback.get(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        scorers::fixture::{sideways, with_last, Fixture},
        Candle,
    };

    /// Slow line flat at 100, fast line at 99 until `cross`, then rising
    fn crossing(n: usize, cross: usize) -> (Series, Series) {
        let fast = (0..n)
            .map(|i| if i < cross { 99.0 } else { 100.0 + (i + 1 - cross) as f64 })
            .collect();
        (Series::new(0, fast), Series::new(0, vec![100.0; n]))
    }

    #[test]
    fn test_cross_five_bars_ago_earns_bonus() {
        let (fast, slow) = crossing(30, 24);
        assert_eq!(bars_since_cross_up(&fast, &slow, 29, 10), Some(5));
        assert_eq!(golden_cross(&fast, &slow, 29, 10), 2.0);
    }

    #[test]
    fn test_cross_eleven_bars_ago_earns_nothing() {
        let (fast, slow) = crossing(30, 18);
        assert_eq!(bars_since_cross_up(&fast, &slow, 29, 10), None);
        assert_eq!(golden_cross(&fast, &slow, 29, 10), 0.0);
    }

    #[test]
    fn test_cross_at_lookback_edge_counts() {
        let (fast, slow) = crossing(30, 19);
        assert_eq!(bars_since_cross_up(&fast, &slow, 29, 10), Some(10));
        assert_eq!(golden_cross(&fast, &slow, 29, 10), 2.0);
    }

    #[test]
    fn test_narrowing_gap_earns_nothing() {
        let fast = Series::new(0, vec![99.0, 99.0, 103.0, 102.0]);
        let slow = Series::new(0, vec![100.0; 4]);
        assert_eq!(bars_since_cross_up(&fast, &slow, 3, 10), Some(1));
        assert_eq!(golden_cross(&fast, &slow, 3, 10), 0.0);
    }

    #[test]
    fn test_breakout_proximity_decays() {
        // close 99.8, RH 101, ATR 2: d = 0.6
        let fx = Fixture::new(sideways(60));
        let expected = 10.0 * (-0.6f64 / 1.5).exp();
        assert!((breakout_proximity(&fx.input()) - expected).abs() < 1e-9);

        let broken = Fixture::new(with_last(59, Candle::new(59, 100.8, 103.0, 100.6, 102.5, 1.0)));
        assert_eq!(breakout_proximity(&broken.input()), 0.0);

        let flat = Fixture::new(vec![Candle::new(0, 5.0, 5.0, 5.0, 5.0, 1.0); 60]);
        assert_eq!(breakout_proximity(&flat.input()), 0.0);
    }

    #[test]
    fn test_ema_cross_uptrend() {
        let bars: Vec<Candle> = (0..80)
            .map(|i| {
                let c = 100.0 * 1.01f64.powi(i as i32);
                Candle::new(i as i64, c, c * 1.005, c * 0.995, c, 1000.0)
            })
            .collect();
        let c = ema_cross(&Fixture::new(bars).input());
        assert_eq!(c.alignment, 6.0);
        assert_eq!(c.confirmation, 2.0);
        assert_eq!(c.gap, 2.0);
        assert_eq!(c.points(), 10.0);
    }

    #[test]
    fn test_ema_cross_downtrend() {
        let bars: Vec<Candle> = (0..80)
            .map(|i| {
                let c = 100.0 * 0.99f64.powi(i as i32);
                Candle::new(i as i64, c, c * 1.005, c * 0.995, c, 1000.0)
            })
            .collect();
        assert_eq!(ema_cross(&Fixture::new(bars).input()).points(), 0.0);
    }
}
