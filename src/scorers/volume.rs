//! Volume sub-scores: OBV trend (0-15) and smart volume (0-10)

use super::{helpers, spring, Components, ScoringInput};
use crate::{OHLCVExt, OHLCV};

// ============================================================
// OBV TREND
// ============================================================

/// Share of rising OBV steps over the trailing `obv_window` bars, scaled to
/// 15. Zero unless OBV is net higher over the window.
pub fn obv_trend<T: OHLCV>(input: &ScoringInput<'_, T>) -> f64 {
    let n = input.params.obv_window.get();
    let Some(window) = input.indicators.obv.window(input.index(), n + 1) else {
        return 0.0;
    };

    let net = window[n] - window[0];
    if net <= 0.0 {
        return 0.0;
    }
    let up = window.windows(2).filter(|w| w[1] > w[0]).count();
    helpers::clamp_points(15.0 * up as f64 / n as f64, 0.0, 15.0)
}

// ============================================================
// SMART VOLUME
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmartVolumeComponents {
    /// Fast volume average drying up against the slow one (0-3)
    pub dry_up: f64,
    /// Volume on a spring bar (0-3)
    pub spring_volume: f64,
    /// Volume on a breakout or near-breakout bar (0-3)
    pub breakout_volume: f64,
    /// High volume without progress (-1 or 0)
    pub churn_penalty: f64,
}

impl Components for SmartVolumeComponents {
    const MAX: f64 = 10.0;

    fn raw(&self) -> f64 {
        self.dry_up + self.spring_volume + self.breakout_volume + self.churn_penalty
    }
}

pub fn smart_volume<T: OHLCV>(input: &ScoringInput<'_, T>) -> SmartVolumeComponents {
    let Some(bar) = input.bar() else {
        return SmartVolumeComponents::default();
    };
    let p = input.params;
    let index = input.index();
    let multiple = input.volume_multiple().unwrap_or(0.0);

    let dry_up = input
        .indicators
        .vma_fast
        .get(index)
        .zip(input.indicators.vma_slow.get(index))
        .and_then(|(fast, slow)| helpers::ratio(fast, slow))
        .map_or(0.0, |r| {
            if r <= p.dry_up_strong.get() {
                3.0
            } else if r <= p.dry_up_mild.get() {
                1.5
            } else {
                0.0
            }
        });

    let spring_bar = spring::is_spring_bar(bar, input.levels);
    let spring_volume = if spring_bar {
        helpers::tiered(multiple, p.spring_volume_strong, p.spring_volume_mild, 3.0, 1.5)
    } else {
        0.0
    };

    // one spike is credited once; a spring bar takes the spring tier
    let breakout_volume = if !spring_bar && (input.flags.breakout || input.flags.near_breakout) {
        helpers::tiered(multiple, p.breakout_volume_strong, p.breakout_volume_mild, 3.0, 1.5)
    } else {
        0.0
    };

    let atr = input.atr();
    let prev_close = index.checked_sub(1).map(|i| input.bars[i].close());
    let narrow = atr > 0.0 && bar.true_range(prev_close) <= p.churn_spread_atr * atr;
    let churn_penalty = if multiple >= p.churn_volume && narrow {
        -1.0
    } else {
        0.0
    };

    SmartVolumeComponents {
        dry_up,
        spring_volume,
        breakout_volume,
        churn_penalty,
    }
}
