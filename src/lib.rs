//! # dca-scorer
//!
//! Deterministic accumulation-quality scoring for OHLCV candle series.
//!
//! A scan turns one symbol's candles into a 0..=100 score, a category label,
//! the accumulation range levels (RL / VAL / RH) and three take-profit bands.
//! Every scan is a pure function of its input: no state survives between calls.
//!
//! ## Quick Start
//!
//! ```rust
//! use dca_scorer::prelude::*;
//!
//! let bars: Vec<Candle> = (0..60)
//!     .map(|i| Candle::new(i, 100.0, 101.0, 99.0, 100.0 + (i % 2) as f64 * 0.5, 1_000.0))
//!     .collect();
//!
//! let scorer = ScorerBuilder::new().build().unwrap();
//! let result = scorer.score("BTCUSDT", Market::Crypto, &bars).unwrap();
//!
//! assert!((0.0..=100.0).contains(&result.score));
//! ```

pub mod classify;
pub mod indicators;
pub mod params;
pub mod range;
pub mod result;
pub mod scorers;
pub mod targets;

pub mod prelude {
    pub use crate::{
        // Classification
        classify::{pattern_flags, Category, PatternFlags},
        // Indicators
        indicators::{IndicatorSet, Series},
        // Parameters
        params::{ParamMeta, ParamType, ScoringParams, PARAM_META},
        // Levels
        range::RangeLevels,
        // Output
        result::{ScanResult, ScoreBreakdown},
        // Parallel
        scan_parallel,
        targets::{TargetBand, TargetBands, TradePlan},
        // Types
        Candle,
        // Engine
        DcaScorer,
        Market,
        // Core traits
        OHLCVExt,
        Percent,
        Period,
        Ratio,
        Result,
        ScanError,
        ScanRequest,
        // Errors
        ScoreError,
        ScorerBuilder,
        Timeframe,
        OHLCV,
    };
}

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::{
    classify::Category,
    indicators::IndicatorSet,
    params::ScoringParams,
    result::ScanResult,
    scorers::{helpers, ScoringInput},
    targets::TargetBands,
};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScoreError>;

/// Errors that can occur while scoring a candle series
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Malformed candle at index {index}: {reason}")]
    MalformedCandle { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(ScoreError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoreError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScoreError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

/// Percentage threshold (finite, >= 0). `3.0` means three percent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(ScoreError::InvalidValue("Percent cannot be NaN or infinite"));
        }
        if value < 0.0 {
            return Err(ScoreError::OutOfRange {
                field: "Percent",
                value,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    /// The threshold as a fraction (`3.0` -> `0.03`)
    #[inline]
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }
}

impl serde::Serialize for Percent {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Percent {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Percent::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    /// (high + low + close) / 3
    #[inline]
    fn typical_price(&self) -> f64 {
        (self.high() + self.low() + self.close()) / 3.0
    }

    /// Wilder's true range against the previous close. Falls back to the
    /// bar range for the first bar of a series.
    #[inline]
    fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let range = self.range();
        match prev_close {
            Some(pc) => range
                .max((self.high() - pc).abs())
                .max((self.low() - pc).abs()),
            None => range,
        }
    }

    /// Validate OHLCV data consistency. `index` is reported back in the error.
    fn validate(&self, index: usize) -> Result<()> {
        let fields = [
            self.open(),
            self.high(),
            self.low(),
            self.close(),
            self.volume(),
        ];
        if fields.iter().any(|v| v.is_nan()) {
            return Err(ScoreError::MalformedCandle {
                index,
                reason: "NaN in OHLCV",
            });
        }
        if fields.iter().any(|v| v.is_infinite()) {
            return Err(ScoreError::MalformedCandle {
                index,
                reason: "Infinite value in OHLCV",
            });
        }
        if fields[..4].iter().any(|v| *v < 0.0) {
            return Err(ScoreError::MalformedCandle {
                index,
                reason: "negative price",
            });
        }
        if self.volume() < 0.0 {
            return Err(ScoreError::MalformedCandle {
                index,
                reason: "negative volume",
            });
        }
        if self.high() < self.low() {
            return Err(ScoreError::MalformedCandle {
                index,
                reason: "high < low",
            });
        }
        let span = self.low()..=self.high();
        if !span.contains(&self.open()) || !span.contains(&self.close()) {
            return Err(ScoreError::MalformedCandle {
                index,
                reason: "open or close outside [low, high]",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// INPUT CONTRACT
// ============================================================

/// One bar of a candle series
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

/// Market a symbol trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Crypto,
    Bist,
    Us,
    Fx,
}

impl Market {
    pub fn as_str(self) -> &'static str {
        match self {
            Market::Crypto => "crypto",
            Market::Bist => "bist",
            Market::Us => "us",
            Market::Fx => "fx",
        }
    }
}

/// Candle timeframe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "4h")]
    FourHour,
}

/// A single scan invocation: one symbol and its candle history
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanRequest {
    pub symbol: String,
    pub market: Market,
    #[serde(default)]
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
}

// ============================================================
// SCORER ENGINE
// ============================================================

/// Main scoring engine. Holds only validated, immutable parameters.
#[derive(Debug, Clone, Default)]
pub struct DcaScorer {
    params: ScoringParams,
}

impl DcaScorer {
    pub fn new(params: ScoringParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Minimum number of candles a series needs
    #[inline]
    pub fn min_bars(&self) -> usize {
        self.params.min_bars.get()
    }

    // ===========================================
    // LOW-LEVEL: Primitives
    // ===========================================

    /// Compute the indicator set for a series, anchoring the VWAP at the
    /// start of the range window.
    pub fn compute_indicators<T: OHLCV>(&self, bars: &[T]) -> Result<IndicatorSet> {
        self.validate_bars(bars)?;
        let window = range::window_bounds(bars.len(), self.params.range_window.get());
        IndicatorSet::compute(bars, window.start, &self.params)
    }

    // ===========================================
    // HIGH-LEVEL: Full scan
    // ===========================================

    /// Score one symbol's candle series.
    pub fn score<T: OHLCV>(&self, symbol: &str, market: Market, bars: &[T]) -> Result<ScanResult> {
        if let Err(error) = self.validate_bars(bars) {
            warn!(symbol, %error, "rejecting candle series");
            return Err(error);
        }

        let window = range::window_bounds(bars.len(), self.params.range_window.get());
        let levels = range::analyze(&bars[window.clone()], &self.params).ok_or(
            ScoreError::InsufficientData {
                need: self.min_bars(),
                got: bars.len(),
            },
        )?;
        let indicators = IndicatorSet::compute(bars, window.start, &self.params)?;

        let index = bars.len() - 1;
        let bar = &bars[index];
        let flags = classify::pattern_flags(bar, &levels, &self.params);

        let input = ScoringInput {
            bars,
            indicators: &indicators,
            levels: &levels,
            flags: &flags,
            params: &self.params,
        };
        let details = scorers::score_all(&input);
        trace!(symbol, ?details, "score breakdown");

        let score = details.total();
        let category = Category::from_score(score);
        let targets = TargetBands::from_levels(&levels, &self.params);

        let close = bar.close();
        let vol_ratio = indicators
            .prior_volume_avg(index)
            .and_then(|avg| helpers::ratio(bar.volume(), avg))
            .unwrap_or(0.0);

        debug!(symbol, score, %category, bars = bars.len(), "scan complete");

        Ok(ScanResult {
            symbol: symbol.to_string(),
            market,
            levels,
            atr: indicators.atr.last().unwrap_or(0.0),
            vol_ratio,
            close,
            score,
            category,
            range_pct: details.range_pct,
            score_details: details,
            targets,
            flags,
            ema20: indicators.ema_fast.last().unwrap_or(close),
            ema50: indicators.ema_slow.last().unwrap_or(close),
            avwap: indicators.avwap,
        })
    }

    /// Score a request object.
    pub fn scan(&self, request: &ScanRequest) -> Result<ScanResult> {
        self.score(&request.symbol, request.market, &request.candles)
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn validate_bars<T: OHLCV>(&self, bars: &[T]) -> Result<()> {
        let need = self.min_bars();
        if bars.len() < need {
            return Err(ScoreError::InsufficientData {
                need,
                got: bars.len(),
            });
        }
        for (i, bar) in bars.iter().enumerate() {
            bar.validate(i)?;
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating DcaScorer instances
#[derive(Debug, Clone, Default)]
pub struct ScorerBuilder {
    params: ScoringParams,
}

impl ScorerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all parameters
    pub fn params(mut self, params: ScoringParams) -> Self {
        self.params = params;
        self
    }

    /// Override a single parameter by name
    pub fn set(mut self, name: &str, value: f64) -> Result<Self> {
        self.params.set(name, value)?;
        Ok(self)
    }

    /// Minimum candle count (and the InsufficientData threshold)
    pub fn min_bars(mut self, bars: usize) -> Result<Self> {
        self.params.min_bars = Period::new(bars)?;
        Ok(self)
    }

    /// Range window length in bars
    pub fn range_window(mut self, bars: usize) -> Result<Self> {
        self.params.range_window = Period::new(bars)?;
        Ok(self)
    }

    /// Build the scorer
    pub fn build(self) -> Result<DcaScorer> {
        DcaScorer::new(self.params)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

/// Error from scanning a single symbol
#[derive(Debug, Clone, thiserror::Error)]
#[error("{symbol}: {error}")]
pub struct ScanError {
    pub symbol: String,
    #[source]
    pub error: ScoreError,
}

/// Score many independent requests in parallel.
///
/// Successes come back ordered by descending score, ties broken by symbol.
pub fn scan_parallel<'a, I>(scorer: &DcaScorer, requests: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    I: IntoParallelIterator<Item = &'a ScanRequest>,
{
    let results: Vec<_> = requests
        .into_par_iter()
        .map(|request| {
            scorer.scan(request).map_err(|error| ScanError {
                symbol: request.symbol.clone(),
                error,
            })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    successes.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
