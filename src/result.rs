//! Scan output and its JSON contract
//!
//! Field names follow the consuming frontend exactly: range levels and the
//! pattern flags are flattened into the top-level object, sub-scores keep
//! their short Turkish names under `score_details`.

use crate::{
    classify::{Category, PatternFlags},
    range::RangeLevels,
    targets::TargetBands,
    Market,
};

/// Per-component scores of one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreBreakdown {
    // Primary sub-scores
    /// Accumulation (0-20)
    #[serde(rename = "akumulasyon")]
    pub accumulation: f64,
    /// Spring / wick (0-15)
    pub spring: f64,
    /// OBV trend (0-15)
    pub obv: f64,
    /// Smart volume (0-10)
    #[serde(rename = "hacim")]
    pub volume: f64,
    /// Breakout proximity (0-10)
    #[serde(rename = "breakout_yakin")]
    pub breakout_proximity: f64,
    /// EMA cross (0-10)
    #[serde(rename = "ema_kesisim")]
    pub ema_cross: f64,
    /// RSI recovery (0-10)
    #[serde(rename = "rsi_toparlanma")]
    pub rsi_recovery: f64,
    /// ATR volatility (0-10)
    pub atr: f64,

    // Accumulation detail
    pub range_pct: f64,
    pub range_width_score: f64,
    pub range_position_score: f64,
    pub atr_bonus: f64,

    // Spring detail
    pub spring_wick_score: f64,
    pub spring_pos_score: f64,
    pub spring_support_score: f64,
    pub spring_vol_bonus: f64,

    // Smart volume detail
    pub volume_score: f64,
    pub dry_up_score: f64,
    pub spring_volume_score: f64,
    pub breakout_volume_score: f64,
    pub churn_penalty: f64,

    /// +2 on a recent, widening golden cross
    pub golden_cross_bonus: f64,
}

impl ScoreBreakdown {
    /// Sum of the eight primary sub-scores
    pub fn primary_sum(&self) -> f64 {
        self.primary().iter().map(|(_, v)| v).sum()
    }

    /// Primary sum plus the golden cross bonus, clamped to `[0, 100]`
    pub fn total(&self) -> f64 {
        let total = self.primary_sum() + self.golden_cross_bonus;
        if total.is_finite() {
            total.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Primary sub-scores with their JSON names
    pub fn primary(&self) -> [(&'static str, f64); 8] {
        [
            ("akumulasyon", self.accumulation),
            ("spring", self.spring),
            ("obv", self.obv),
            ("hacim", self.volume),
            ("breakout_yakin", self.breakout_proximity),
            ("ema_kesisim", self.ema_cross),
            ("rsi_toparlanma", self.rsi_recovery),
            ("atr", self.atr),
        ]
    }

    /// Cap of each primary sub-score, in [`ScoreBreakdown::primary`] order
    pub const CAPS: [f64; 8] = [20.0, 15.0, 15.0, 10.0, 10.0, 10.0, 10.0, 10.0];
}

/// Result of scoring one symbol
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    pub market: Market,
    #[serde(flatten)]
    pub levels: RangeLevels,
    #[serde(rename = "ATR")]
    pub atr: f64,
    #[serde(rename = "volRatio")]
    pub vol_ratio: f64,
    pub close: f64,
    pub score: f64,
    pub category: Category,
    pub score_details: ScoreBreakdown,
    pub range_pct: f64,
    pub targets: TargetBands,
    #[serde(flatten)]
    pub flags: PatternFlags,
    pub ema20: f64,
    pub ema50: f64,
    pub avwap: f64,
}
