//! Take-profit bands and the derived trade plan
//!
//! Bands extend above RH by fixed multiples of the range span:
//!
//! | Band | From | To |
//! |---|---|---|
//! | T1 | RH + 0.45 span | RH + 0.85 span |
//! | T2 | RH + 1.50 span | RH + 1.55 span |
//! | T3 | RH + 2.80 span | RH + 3.00 span |
//!
//! The span is the range height, floored at `target_min_span_pct` of RH so a
//! flat range still yields strictly increasing bands.

use crate::{params::ScoringParams, range::RangeLevels, result::ScanResult};

/// (from, to) multiples of the span for T1, T2, T3
pub const BAND_MULTIPLES: [(f64, f64); 3] = [(0.45, 0.85), (1.50, 1.55), (2.80, 3.00)];

/// Smallest span used when both the height and RH are zero
const MIN_SPAN: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TargetBand {
    pub from: f64,
    pub to: f64,
    pub label: String,
}

impl TargetBand {
    fn new(from: f64, to: f64, label: &str) -> Self {
        Self {
            from,
            to,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TargetBands {
    #[serde(rename = "T1")]
    pub conservative: TargetBand,
    #[serde(rename = "T2")]
    pub moderate: TargetBand,
    #[serde(rename = "T3")]
    pub aggressive: TargetBand,
}

impl TargetBands {
    pub fn from_levels(levels: &RangeLevels, params: &ScoringParams) -> Self {
        let rh = levels.resistance;
        let span = levels
            .height
            .max(rh.abs() * params.target_min_span_pct.fraction())
            .max(MIN_SPAN);
        let band = |(from, to): (f64, f64), label| TargetBand::new(rh + from * span, rh + to * span, label);

        let [t1, t2, t3] = BAND_MULTIPLES;
        Self {
            conservative: band(t1, "Conservative"),
            moderate: band(t2, "Moderate"),
            aggressive: band(t3, "Aggressive"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetBand> {
        [&self.conservative, &self.moderate, &self.aggressive].into_iter()
    }

    /// `T1.from < T1.to <= T2.from < T2.to <= T3.from < T3.to`
    pub fn is_ordered(&self) -> bool {
        let bands: Vec<_> = self.iter().collect();
        bands.iter().all(|b| b.from < b.to) && bands.windows(2).all(|w| w[0].to <= w[1].from)
    }
}

// ============================================================
// TRADE PLAN
// ============================================================

/// Entry levels for the four setups
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entries {
    pub breakout: f64,
    pub retest: f64,
    pub dca_avg: f64,
    pub dip_reclaim: f64,
}

/// Protective stop for each entry
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stops {
    pub breakout: f64,
    pub retest: f64,
    pub dca: f64,
    pub dip_reclaim: f64,
}

/// Entries, stops and the spring low derived from a scan's levels and ATR
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradePlan {
    pub entries: Entries,
    pub stops: Stops,
    #[serde(rename = "springLow")]
    pub spring_low: f64,
}

impl TradePlan {
    pub fn new(levels: &RangeLevels, atr: f64) -> Self {
        let rl = levels.support;
        let rh = levels.resistance;
        Self {
            entries: Entries {
                breakout: rh + 0.1 * atr,
                retest: rh,
                dca_avg: (rl + levels.value_area_low) / 2.0,
                dip_reclaim: rl + 0.1 * atr,
            },
            stops: Stops {
                breakout: rh - 0.8 * atr,
                retest: rh - atr,
                dca: rl - 0.25 * atr,
                dip_reclaim: rl - 0.1 * atr,
            },
            spring_low: 0.95 * rl,
        }
    }

    pub fn from_result(result: &ScanResult) -> Self {
        Self::new(&result.levels, result.atr)
    }
}
