//! Sub-scorers
//!
//! Eight independent signals, each a pure function of the scan input:
//!
//! | Sub-score | Max | Module |
//! |---|---|---|
//! | Accumulation (`akumulasyon`) | 20 | [`accumulation`] |
//! | Spring / wick | 15 | [`spring`] |
//! | OBV trend | 15 | [`volume`] |
//! | Smart volume (`hacim`) | 10 | [`volume`] |
//! | Breakout proximity (`breakout_yakin`) | 10 | [`trend`] |
//! | EMA cross (`ema_kesisim`) | 10 | [`trend`] |
//! | RSI recovery (`rsi_toparlanma`) | 10 | [`momentum`] |
//! | ATR volatility | 10 | [`momentum`] |
//!
//! Scorers that add several parts return a component record; the parts are
//! kept unclamped and [`Components::points`] clamps the sum once.

pub mod accumulation;
pub mod helpers;
pub mod momentum;
pub mod spring;
pub mod trend;
pub mod volume;

pub use accumulation::AccumulationComponents;
pub use momentum::RsiRecoveryComponents;
pub use spring::SpringComponents;
pub use trend::EmaCrossComponents;
pub use volume::SmartVolumeComponents;

use crate::{
    classify::PatternFlags, indicators::IndicatorSet, params::ScoringParams, range::RangeLevels,
    result::ScoreBreakdown, OHLCV,
};

/// Everything a sub-scorer may read. Always refers to the latest bar.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a, T: OHLCV> {
    pub bars: &'a [T],
    pub indicators: &'a IndicatorSet,
    pub levels: &'a RangeLevels,
    pub flags: &'a PatternFlags,
    pub params: &'a ScoringParams,
}

impl<'a, T: OHLCV> ScoringInput<'a, T> {
    /// Index of the bar being scored
    #[inline]
    pub fn index(&self) -> usize {
        self.bars.len().saturating_sub(1)
    }

    #[inline]
    pub fn bar(&self) -> Option<&'a T> {
        self.bars.last()
    }

    /// Latest close, or 0 for an empty series
    #[inline]
    pub fn close(&self) -> f64 {
        self.bar().map_or(0.0, |b| b.close())
    }

    /// ATR at the latest bar, or 0 before warm-up
    #[inline]
    pub fn atr(&self) -> f64 {
        self.indicators.atr.get(self.index()).unwrap_or(0.0)
    }

    /// Latest volume divided by the fast average of the bars before it
    #[inline]
    pub fn volume_multiple(&self) -> Option<f64> {
        let bar = self.bar()?;
        let avg = self.indicators.prior_volume_avg(self.index())?;
        helpers::ratio(bar.volume(), avg)
    }
}

/// Additive parts of a sub-score
pub trait Components {
    /// Cap of the clamped sub-score
    const MAX: f64;

    /// Unclamped sum of the parts
    fn raw(&self) -> f64;

    /// The sub-score, clamped once into `[0, MAX]`
    fn points(&self) -> f64 {
        helpers::clamp_points(self.raw(), 0.0, Self::MAX)
    }
}

/// Run every sub-scorer and collect the breakdown
pub fn score_all<T: OHLCV>(input: &ScoringInput<'_, T>) -> ScoreBreakdown {
    let acc = accumulation::score(input);
    let spr = spring::score(input);
    let vol = volume::smart_volume(input);
    let ema = trend::ema_cross(input);
    let rsi = momentum::rsi_recovery(input);

    ScoreBreakdown {
        accumulation: acc.points(),
        spring: spr.points(),
        obv: volume::obv_trend(input),
        volume: vol.points(),
        breakout_proximity: trend::breakout_proximity(input),
        ema_cross: ema.points(),
        rsi_recovery: rsi.points(),
        atr: momentum::atr_volatility(input),

        range_pct: acc.range_pct,
        range_width_score: acc.width,
        range_position_score: acc.position,
        atr_bonus: acc.atr_bonus,

        spring_wick_score: spr.wick,
        spring_pos_score: spr.position,
        spring_support_score: spr.support,
        spring_vol_bonus: spr.volume_bonus,

        volume_score: vol.points(),
        dry_up_score: vol.dry_up,
        spring_volume_score: vol.spring_volume,
        breakout_volume_score: vol.breakout_volume,
        churn_penalty: vol.churn_penalty,

        golden_cross_bonus: trend::golden_cross_bonus(input),
    }
}
