//! Tunable scoring parameters
//!
//! Every threshold the scorer uses lives in [`ScoringParams`]. The same
//! definition also produces [`PARAM_META`], which enables:
//! - Grid search over thresholds
//! - Parameter documentation
//! - Overriding parameters by name from untyped input
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use dca_scorer::params::{ScoringParams, PARAM_META};
//!
//! for param in PARAM_META.iter().take(3) {
//!   println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut overrides = HashMap::new();
//! overrides.insert("range_window", 90.0);
//! let params = ScoringParams::with_params(&overrides).unwrap();
//! assert_eq!(params.range_window.get(), 90);
//! ```

use std::collections::HashMap;

use crate::{Percent, Period, Ratio, Result, ScoreError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value (0.0..=1.0)
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Percentage threshold (`3.0` means three percent)
  Percent,
  /// Unbounded positive multiplier (e.g. volume vs its average)
  Factor,
}

/// Metadata for a single scoring parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name, identical to the `ScoringParams` field
  pub name: &'static str,
  /// Parameter type
  pub param_type: ParamType,
  /// Default value
  pub default: f64,
  /// Accepted range, also used for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn new(
    name: &'static str,
    param_type: ParamType,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    if step <= 0.0 || max < min {
      return vec![min];
    }
    let count = ((max - min) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| min + i as f64 * step).collect()
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    if !value.is_finite() {
      return Err(ScoreError::InvalidValue("parameter cannot be NaN or infinite"));
    }
    let (min, max, _) = self.range;
    if value < min - f64::EPSILON || value > max + f64::EPSILON {
      return Err(ScoreError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(ScoreError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
      ParamType::Ratio | ParamType::Percent | ParamType::Factor => Ok(()),
    }
  }
}

/// Look up metadata by parameter name
pub fn param_meta(name: &str) -> Option<&'static ParamMeta> {
  PARAM_META.iter().find(|m| m.name == name)
}

// ============================================================
// PARAMETER TABLE
// ============================================================

/// Generates `ScoringParams`, its `Default`, `PARAM_META` and name-based access
/// from one table, so the struct and its metadata cannot drift apart.
macro_rules! define_params {
  (
    $(
      #[doc = $doc:literal]
      $field:ident: $kind:ident = $default:literal, range($min:literal, $max:literal, $step:literal);
    )*
  ) => {
    /// Scoring thresholds and lookback lengths
    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    #[serde(default)]
    pub struct ScoringParams {
      $(
        #[doc = $doc]
        pub $field: define_params!(@ty $kind),
      )*
    }

    impl Default for ScoringParams {
      fn default() -> Self {
        Self {
          $($field: define_params!(@new $kind, $default),)*
        }
      }
    }

    /// Metadata for every field of [`ScoringParams`], in declaration order
    pub const PARAM_META: &[ParamMeta] = &[
      $(
        ParamMeta::new(
          stringify!($field),
          ParamType::$kind,
          $default as f64,
          ($min as f64, $max as f64, $step as f64),
          $doc,
        ),
      )*
    ];

    impl ScoringParams {
      /// Current value of a parameter by name
      pub fn get(&self, name: &str) -> Option<f64> {
        $(
          if name == stringify!($field) {
            return Some(define_params!(@get $kind, self.$field));
          }
        )*
        None
      }

      /// Set a parameter by name, validating it against its metadata
      pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let meta = param_meta(name)
          .ok_or_else(|| ScoreError::InvalidConfig(format!("unknown parameter `{name}`")))?;
        meta.validate(value)?;
        $(
          if name == stringify!($field) {
            self.$field = define_params!(@from $kind, value)?;
          }
        )*
        Ok(())
      }
    }
  };

  (@ty Period) => { Period };
  (@ty Ratio) => { Ratio };
  (@ty Percent) => { Percent };
  (@ty Factor) => { f64 };

  (@new Period, $v:literal) => { Period::new_const($v) };
  (@new Ratio, $v:literal) => { Ratio::new_const($v) };
  (@new Percent, $v:literal) => { Percent::new_const($v) };
  (@new Factor, $v:literal) => { $v };

  (@get Period, $e:expr) => { $e.get() as f64 };
  (@get Ratio, $e:expr) => { $e.get() };
  (@get Percent, $e:expr) => { $e.get() };
  (@get Factor, $e:expr) => { $e };

  (@from Period, $v:expr) => { Period::new($v as usize) };
  (@from Ratio, $v:expr) => { Ratio::new($v) };
  (@from Percent, $v:expr) => { Percent::new($v) };
  (@from Factor, $v:expr) => { Ok::<f64, ScoreError>($v) };
}

define_params! {
  // Lookback
  /// Minimum candle count a series needs before it can be scored
  min_bars: Period = 50, range(20, 1000, 10);
  /// Bars in the accumulation range window (ending before the latest bar)
  range_window: Period = 60, range(10, 1000, 10);

  // Indicators
  /// Fast EMA period (the `ema20` output field)
  ema_fast: Period = 20, range(5, 100, 5);
  /// Slow EMA period (the `ema50` output field)
  ema_slow: Period = 50, range(10, 200, 10);
  /// Fast volume moving average period
  volume_fast: Period = 20, range(5, 100, 5);
  /// Slow volume moving average period
  volume_slow: Period = 50, range(10, 200, 10);
  /// Wilder ATR period
  atr_period: Period = 14, range(5, 50, 1);
  /// Wilder RSI period
  rsi_period: Period = 14, range(5, 50, 1);

  // Range levels
  /// Histogram bins of the volume profile used for VAL
  val_bins: Period = 100, range(10, 1000, 10);
  /// Share of volume the value area must cover
  value_area: Ratio = 0.70, range(0.5, 0.95, 0.05);
  /// VAL position inside the range when the profile has no volume
  val_fallback: Ratio = 0.25, range(0.0, 0.5, 0.05);

  // Accumulation
  /// Range width scoring 10 points
  width_tight_pct: Percent = 10.0, range(1.0, 50.0, 1.0);
  /// Range width scoring 7 points
  width_mid_pct: Percent = 15.0, range(1.0, 50.0, 1.0);
  /// Widest range that still counts as accumulation (4 points)
  accumulation_max_range_pct: Percent = 20.0, range(1.0, 50.0, 1.0);
  /// Close this near RL scores 7 position points
  near_support_pct: Percent = 3.0, range(0.5, 10.0, 0.5);
  /// Close this near RH scores 5 position points
  near_resistance_pct: Percent = 3.0, range(0.5, 10.0, 0.5);
  /// Close this near VAL scores 3 position points
  near_val_pct: Percent = 2.0, range(0.5, 10.0, 0.5);
  /// ATR/close at or below this earns the accumulation ATR bonus
  atr_bonus_pct: Percent = 2.0, range(0.5, 5.0, 0.5);

  // Spring
  /// Lower wick / body ratio that earns the full 7 wick points
  spring_wick_full: Factor = 1.5, range(0.5, 5.0, 0.1);
  /// Lower wick / body ratio that earns 6 wick points
  spring_wick_half: Factor = 0.5, range(0.1, 2.0, 0.1);
  /// Wick low this near RL earns 4 support points (twice as far earns 2)
  spring_support_pct: Percent = 1.0, range(0.25, 5.0, 0.25);

  // OBV
  /// Trailing bars examined for OBV upslope
  obv_window: Period = 20, range(5, 100, 5);

  // Smart volume
  /// Fast/slow volume average ratio for the full dry-up score
  dry_up_strong: Ratio = 0.8, range(0.3, 1.0, 0.05);
  /// Fast/slow volume average ratio for the partial dry-up score
  dry_up_mild: Ratio = 0.9, range(0.3, 1.0, 0.05);
  /// Spring bar volume multiple for the full spring volume score
  spring_volume_strong: Factor = 1.5, range(1.0, 5.0, 0.1);
  /// Spring bar volume multiple for the partial spring volume score
  spring_volume_mild: Factor = 1.2, range(1.0, 5.0, 0.1);
  /// Breakout bar volume multiple for the full breakout volume score
  breakout_volume_strong: Factor = 1.8, range(1.0, 5.0, 0.1);
  /// Breakout bar volume multiple for the partial breakout volume score
  breakout_volume_mild: Factor = 1.3, range(1.0, 5.0, 0.1);
  /// Volume multiple that marks a churn bar
  churn_volume: Factor = 1.5, range(1.0, 5.0, 0.1);
  /// Bar true range at or below this many ATRs marks a churn bar
  churn_spread_atr: Factor = 0.6, range(0.1, 2.0, 0.1);

  // Breakout
  /// Close within this much below RH flags a near breakout
  near_breakout_pct: Percent = 3.0, range(0.5, 10.0, 0.5);
  /// ATR distance over which breakout proximity decays by a factor of e
  breakout_decay_atr: Factor = 1.5, range(0.25, 10.0, 0.25);
  /// Beyond this many ATRs below RH the proximity score is zero
  breakout_max_atr: Factor = 5.0, range(0.5, 20.0, 0.5);

  // EMA cross
  /// Bars back a fast-over-slow EMA cross still earns the golden cross bonus
  golden_cross_lookback: Period = 10, range(1, 50, 1);
  /// EMA gap (percent of slow EMA) that earns the full gap points
  ema_gap_full_pct: Percent = 2.0, range(0.25, 10.0, 0.25);

  // RSI recovery
  /// Trailing RSI values searched for an oversold trough
  rsi_lookback: Period = 10, range(3, 50, 1);
  /// Deep oversold RSI level
  rsi_oversold: Percent = 30.0, range(5.0, 50.0, 1.0);
  /// Highest RSI trough that still counts as a recovery setup
  rsi_recovery_ceiling: Percent = 40.0, range(10.0, 60.0, 1.0);

  // Flags and targets
  /// Close within this much above VAL still flags the DCA zone
  dca_zone_pct: Percent = 2.0, range(0.0, 10.0, 0.5);
  /// Minimum target span as a percent of RH, used when the range is flat
  target_min_span_pct: Percent = 1.0, range(0.1, 10.0, 0.1);
}

impl ScoringParams {
  /// Create params from a name -> value map
  ///
  /// Missing parameters use their default values.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    let mut out = Self::default();
    for (name, value) in params {
      out.set(name, *value)?;
    }
    out.validate()?;
    Ok(out)
  }

  /// Bars needed before every indicator has produced its first value
  pub fn warmup_bars(&self) -> usize {
    [
      self.ema_slow.get(),
      self.ema_fast.get(),
      self.volume_slow.get(),
      self.volume_fast.get(),
      self.atr_period.get(),
      self.rsi_period.get() + 1,
      self.obv_window.get() + 1,
    ]
    .into_iter()
    .max()
    .unwrap_or(1)
  }

  /// Validate every field against its metadata, then cross-field rules
  pub fn validate(&self) -> Result<()> {
    for meta in PARAM_META {
      if let Some(value) = self.get(meta.name) {
        meta.validate(value)?;
      }
    }

    let rule = |ok: bool, msg: &str| -> Result<()> {
      if ok {
        Ok(())
      } else {
        Err(ScoreError::InvalidConfig(msg.to_string()))
      }
    };

    rule(self.ema_fast < self.ema_slow, "ema_fast must be shorter than ema_slow")?;
    rule(self.volume_fast < self.volume_slow, "volume_fast must be shorter than volume_slow")?;
    rule(
      self.min_bars.get() >= self.warmup_bars(),
      "min_bars must cover the longest indicator warm-up",
    )?;
    rule(
      self.golden_cross_lookback.get() < self.min_bars.get(),
      "golden_cross_lookback must be shorter than min_bars",
    )?;
    rule(
      self.width_tight_pct <= self.width_mid_pct
        && self.width_mid_pct <= self.accumulation_max_range_pct,
      "range width tiers must be ascending",
    )?;
    rule(self.spring_wick_half < self.spring_wick_full, "spring_wick_half must be below spring_wick_full")?;
    rule(self.dry_up_strong <= self.dry_up_mild, "dry_up_strong must not exceed dry_up_mild")?;
    rule(
      self.spring_volume_mild <= self.spring_volume_strong,
      "spring_volume_mild must not exceed spring_volume_strong",
    )?;
    rule(
      self.breakout_volume_mild <= self.breakout_volume_strong,
      "breakout_volume_mild must not exceed breakout_volume_strong",
    )?;
    rule(
      self.rsi_oversold <= self.rsi_recovery_ceiling,
      "rsi_oversold must not exceed rsi_recovery_ceiling",
    )?;
    rule(self.value_area.get() > 0.0, "value_area must be positive")?;
    Ok(())
  }
}

// ============================================================
// TESTS
// ============================================================
