//! Base technical indicators
//!
//! All series are aligned to the input bars: [`Series::get`] takes a bar
//! index and returns `None` until the indicator has warmed up. Nothing here
//! produces NaN for valid (finite, non-negative) input.

use crate::{params::ScoringParams, OHLCVExt, Result, ScoreError, OHLCV};

// ============================================================
// SERIES
// ============================================================

/// Indicator values for bars `start..start + values.len()`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    start: usize,
    values: Vec<f64>,
}

impl Series {
    pub fn new(start: usize, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    /// A series with no values, for a series of `len` bars
    pub fn empty(len: usize) -> Self {
        Self {
            start: len,
            values: Vec::new(),
        }
    }

    /// First bar index with a value
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last bar index with a value
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.values.len()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(self.start)
            .and_then(|i| self.values.get(i).copied())
    }

    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values for the `len` bars ending at `index` (inclusive), if all exist
    pub fn window(&self, index: usize, len: usize) -> Option<&[f64]> {
        let first = (index + 1).checked_sub(len)?;
        if first < self.start || index >= self.end() {
            return None;
        }
        Some(&self.values[first - self.start..=index - self.start])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

// ============================================================
// INDICATOR FUNCTIONS
// ============================================================

/// Simple moving average
pub fn sma(values: &[f64], period: usize) -> Series {
    if period == 0 || values.len() < period {
        return Series::empty(values.len());
    }
    let avgs = values
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect();
    Series::new(period - 1, avgs)
}

/// Exponential moving average, `k = 2 / (period + 1)`, seeded with the SMA
/// of the first `period` values.
pub fn ema(values: &[f64], period: usize) -> Series {
    if period == 0 || values.len() < period {
        return Series::empty(values.len());
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &v in &values[period..] {
        prev = v * k + prev * (1.0 - k);
        out.push(prev);
    }
    Series::new(period - 1, out)
}

/// Wilder's average true range. The first bar's true range is its high-low
/// range; the seed is the mean of the first `period` true ranges.
pub fn wilder_atr<T: OHLCV>(bars: &[T], period: usize) -> Series {
    if period == 0 || bars.len() < period {
        return Series::empty(bars.len());
    }
    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = i.checked_sub(1).map(|p| bars[p].close());
            bar.true_range(prev_close)
        })
        .collect();

    let p = period as f64;
    let mut atr = tr[..period].iter().sum::<f64>() / p;
    let mut out = Vec::with_capacity(bars.len() - period + 1);
    out.push(atr);
    for &t in &tr[period..] {
        atr = (atr * (p - 1.0) + t) / p;
        out.push(atr);
    }
    Series::new(period - 1, out)
}

/// On-balance volume, starting at zero on the first bar
pub fn obv<T: OHLCV>(bars: &[T]) -> Series {
    let mut out = Vec::with_capacity(bars.len());
    let mut acc = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let prev = bars[i - 1].close();
            if bar.close() > prev {
                acc += bar.volume();
            } else if bar.close() < prev {
                acc -= bar.volume();
            }
        }
        out.push(acc);
    }
    Series::new(0, out)
}

/// Wilder RSI. 100 when the average loss is zero; always within [0, 100].
pub fn wilder_rsi(closes: &[f64], period: usize) -> Series {
    if period == 0 || closes.len() <= period {
        return Series::empty(closes.len());
    }
    let p = period as f64;
    let (mut gain, mut loss) = closes[..=period]
        .windows(2)
        .fold((0.0, 0.0), |(g, l), w| {
            let d = w[1] - w[0];
            (g + d.max(0.0), l + (-d).max(0.0))
        });
    gain /= p;
    loss /= p;

    let mut out = Vec::with_capacity(closes.len() - period);
    out.push(rsi_value(gain, loss));
    for w in closes[period..].windows(2) {
        let d = w[1] - w[0];
        gain = (gain * (p - 1.0) + d.max(0.0)) / p;
        loss = (loss * (p - 1.0) + (-d).max(0.0)) / p;
        out.push(rsi_value(gain, loss));
    }
    Series::new(period, out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Volume-weighted average typical price over `bars`. `None` when the bars
/// carry no volume.
pub fn anchored_vwap<T: OHLCV>(bars: &[T]) -> Option<f64> {
    let (pv, v) = bars.iter().fold((0.0, 0.0), |(pv, v), bar| {
        (pv + bar.typical_price() * bar.volume(), v + bar.volume())
    });
    (v > 0.0).then(|| pv / v)
}

// ============================================================
// INDICATOR SET
// ============================================================

/// Everything the sub-scorers read, computed once per scan
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub close: Vec<f64>,
    pub atr: Series,
    pub ema_fast: Series,
    pub ema_slow: Series,
    pub sma_fast: Series,
    pub sma_slow: Series,
    pub obv: Series,
    pub vma_fast: Series,
    pub vma_slow: Series,
    pub rsi: Series,
    /// VWAP anchored at `anchor`, or the last close when there is no volume
    pub avwap: f64,
    pub anchor: usize,
}

impl IndicatorSet {
    /// Compute all indicators. Fails with `InsufficientData` when the series
    /// is shorter than `params.min_bars`.
    pub fn compute<T: OHLCV>(bars: &[T], anchor: usize, params: &ScoringParams) -> Result<Self> {
        let need = params.min_bars.get();
        if bars.len() < need {
            return Err(ScoreError::InsufficientData {
                need,
                got: bars.len(),
            });
        }

        let close: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        let volume: Vec<f64> = bars.iter().map(|b| b.volume()).collect();
        let anchor = anchor.min(bars.len() - 1);
        let last_close = close[close.len() - 1];

        Ok(Self {
            atr: wilder_atr(bars, params.atr_period.get()),
            ema_fast: ema(&close, params.ema_fast.get()),
            ema_slow: ema(&close, params.ema_slow.get()),
            sma_fast: sma(&close, params.ema_fast.get()),
            sma_slow: sma(&close, params.ema_slow.get()),
            obv: obv(bars),
            vma_fast: sma(&volume, params.volume_fast.get()),
            vma_slow: sma(&volume, params.volume_slow.get()),
            rsi: wilder_rsi(&close, params.rsi_period.get()),
            avwap: anchored_vwap(&bars[anchor..]).unwrap_or(last_close),
            anchor,
            close,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Fast volume average over the bars strictly before `index`
    #[inline]
    pub fn prior_volume_avg(&self, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|i| self.vma_fast.get(i))
    }
}

// ============================================================
// TESTS
// ============================================================
