//! Accumulation range levels
//!
//! The range is measured over a trailing window that ends at the bar before
//! the latest one, so the latest bar can pierce (spring) or clear (breakout)
//! the levels it is compared against.

use std::ops::Range;

use crate::{params::ScoringParams, OHLCVExt, OHLCV};

/// Heights at or below this fraction of RH are treated as a zero-width range
pub const FLAT_EPSILON: f64 = 1e-12;

#[inline]
fn is_flat_height(height: f64, resistance: f64) -> bool {
    height <= FLAT_EPSILON * resistance.abs()
}

/// Support, value-area low and resistance of the current range
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RangeLevels {
    /// Lowest low in the window
    #[serde(rename = "RL")]
    pub support: f64,
    /// Lower edge of the volume-profile value area
    #[serde(rename = "VAL")]
    pub value_area_low: f64,
    /// Highest high in the window
    #[serde(rename = "RH")]
    pub resistance: f64,
    /// Range height, `RH - RL`
    #[serde(rename = "H")]
    pub height: f64,
}

impl RangeLevels {
    /// Range width as a percent of support. Zero for a flat range.
    pub fn range_pct(&self) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        let base = if self.support > 0.0 {
            self.support
        } else {
            f64::EPSILON
        };
        self.height / base * 100.0
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        is_flat_height(self.height, self.resistance)
    }
}

/// Bar indices of the range window for a series of `len` bars
pub fn window_bounds(len: usize, window: usize) -> Range<usize> {
    let end = len.saturating_sub(1);
    end - window.min(end)..end
}

/// Derive range levels from the window bars. `None` for an empty window.
pub fn analyze<T: OHLCV>(window: &[T], params: &ScoringParams) -> Option<RangeLevels> {
    let first = window.first()?;
    let (support, resistance) = window
        .iter()
        .fold((first.low(), first.high()), |(lo, hi), bar| {
            (lo.min(bar.low()), hi.max(bar.high()))
        });
    let height = (resistance - support).max(0.0);

    let value_area_low = if is_flat_height(height, resistance) {
        support
    } else {
        value_area_low(window, support, height, params)
            .unwrap_or(support + params.val_fallback.get() * height)
            .clamp(support, resistance)
    };

    Some(RangeLevels {
        support,
        value_area_low,
        resistance,
        height,
    })
}

/// Lower edge of the value area of a typical-price volume profile.
/// `None` when the window carries no volume.
fn value_area_low<T: OHLCV>(
    window: &[T],
    support: f64,
    height: f64,
    params: &ScoringParams,
) -> Option<f64> {
    let bins = params.val_bins.get();
    let mut hist = vec![0.0; bins];
    for bar in window {
        let pos = (bar.typical_price() - support) / height;
        let idx = ((pos * bins as f64).floor().max(0.0) as usize).min(bins - 1);
        hist[idx] += bar.volume();
    }

    let total: f64 = hist.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let poc = hist
        .iter()
        .enumerate()
        .fold(0, |best, (i, v)| if *v > hist[best] { i } else { best });

    let target = params.value_area.get() * total;
    let (mut lo, mut hi) = (poc, poc);
    let mut covered = hist[poc];
    while covered < target {
        let below = lo.checked_sub(1).map(|i| hist[i]);
        let above = (hi + 1 < bins).then(|| hist[hi + 1]);
        match (below, above) {
            (Some(b), Some(a)) if a > b => {
                hi += 1;
                covered += a;
            }
            (Some(b), _) => {
                lo -= 1;
                covered += b;
            }
            (None, Some(a)) => {
                hi += 1;
                covered += a;
            }
            (None, None) => break,
        }
    }

    Some(support + height * lo as f64 / bins as f64)
}

// ============================================================
// TESTS
// ============================================================
