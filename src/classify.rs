//! Score categories and pattern flags
//!
//! Both are pure functions of already computed values; no sub-scorer reads
//! the category, and the flags only gate the breakout volume score.

use std::fmt;

use crate::{params::ScoringParams, range::RangeLevels, OHLCV};

// ============================================================
// CATEGORY
// ============================================================

/// Score band, ordered from weakest to strongest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Category {
    Weak,
    Neutral,
    #[serde(rename = "DCA")]
    Dca,
    #[serde(rename = "DCA Strong")]
    DcaStrong,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Weak,
        Category::Neutral,
        Category::Dca,
        Category::DcaStrong,
        Category::StrongBuy,
    ];

    /// Band for a total score. Fractional scores fall into the band whose
    /// next threshold they have not reached (29.5 is Weak).
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 30.0 => Category::Weak,
            s if s < 50.0 => Category::Neutral,
            s if s < 70.0 => Category::Dca,
            s if s < 85.0 => Category::DcaStrong,
            s if s >= 85.0 => Category::StrongBuy,
            // NaN
            _ => Category::Weak,
        }
    }

    /// Inclusive integer score band
    pub fn band(self) -> (u8, u8) {
        match self {
            Category::Weak => (0, 29),
            Category::Neutral => (30, 49),
            Category::Dca => (50, 69),
            Category::DcaStrong => (70, 84),
            Category::StrongBuy => (85, 100),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Weak => "Weak",
            Category::Neutral => "Neutral",
            Category::Dca => "DCA",
            Category::DcaStrong => "DCA Strong",
            Category::StrongBuy => "Strong Buy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// PATTERN FLAGS
// ============================================================

/// Price-versus-range flags of the latest bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PatternFlags {
    /// Close inside the DCA zone: at or above RL, not far above VAL
    #[serde(rename = "isDCA")]
    pub dca: bool,
    /// Low below RL, close back above it
    #[serde(rename = "isDipReclaim")]
    pub dip_reclaim: bool,
    /// Close in the upper half of the range, within `near_breakout_pct`
    /// below RH
    #[serde(rename = "isNearBreakout")]
    pub near_breakout: bool,
    /// Close above RH
    #[serde(rename = "isBreakout")]
    pub breakout: bool,
}

/// Evaluate the flags for `bar` against the range levels.
///
/// `near_breakout` is never set together with `breakout` or `dip_reclaim`,
/// and never for a flat range. `dca` is never set together with `breakout`.
pub fn pattern_flags<T: OHLCV>(bar: &T, levels: &RangeLevels, params: &ScoringParams) -> PatternFlags {
    let close = bar.close();
    let rl = levels.support;
    let rh = levels.resistance;

    let breakout = close > rh;
    let dip_reclaim = bar.low() < rl && close > rl;
    let near_breakout = !levels.is_flat()
        && !breakout
        && !dip_reclaim
        && close >= rl + 0.5 * levels.height
        && close >= rh * (1.0 - params.near_breakout_pct.fraction());
    let dca = !breakout
        && close >= rl
        && close <= levels.value_area_low * (1.0 + params.dca_zone_pct.fraction());

    PatternFlags {
        dca,
        dip_reclaim,
        near_breakout,
        breakout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    fn levels() -> RangeLevels {
        RangeLevels {
            support: 90.0,
            value_area_low: 94.0,
            resistance: 110.0,
            height: 20.0,
        }
    }

    fn flags_for(low: f64, close: f64) -> PatternFlags {
        let bar = Candle::new(0, close, close.max(low) + 1.0, low, close, 1.0);
        pattern_flags(&bar, &levels(), &ScoringParams::default())
    }

    #[test]
    fn test_category_bands() {
        assert_eq!(Category::from_score(0.0), Category::Weak);
        assert_eq!(Category::from_score(29.0), Category::Weak);
        assert_eq!(Category::from_score(29.5), Category::Weak);
        assert_eq!(Category::from_score(30.0), Category::Neutral);
        assert_eq!(Category::from_score(49.9), Category::Neutral);
        assert_eq!(Category::from_score(50.0), Category::Dca);
        assert_eq!(Category::from_score(70.0), Category::DcaStrong);
        assert_eq!(Category::from_score(84.0), Category::DcaStrong);
        assert_eq!(Category::from_score(85.0), Category::StrongBuy);
        assert_eq!(Category::from_score(100.0), Category::StrongBuy);
        assert_eq!(Category::from_score(f64::NAN), Category::Weak);
    }

    #[test]
    fn test_bands_partition_score_range() {
        for score in 0..=100u8 {
            let matching: Vec<_> = Category::ALL
                .iter()
                .filter(|c| (c.band().0..=c.band().1).contains(&score))
                .collect();
            assert_eq!(matching.len(), 1, "score {score}");
            assert_eq!(*matching[0], Category::from_score(score as f64));
        }
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::DcaStrong.to_string(), "DCA Strong");
        assert_eq!(
            serde_json::to_string(&Category::StrongBuy).unwrap(),
            "\"Strong Buy\""
        );
    }

    #[test]
    fn test_breakout_flags() {
        let f = flags_for(108.0, 111.0);
        assert!(f.breakout);
        assert!(!f.near_breakout);
        assert!(!f.dca);

        let f = flags_for(105.0, 108.0);
        assert!(f.near_breakout);
        assert!(!f.breakout);

        let f = flags_for(100.0, 105.0);
        assert!(!f.near_breakout);
    }

    #[test]
    fn test_dip_and_dca_flags() {
        let f = flags_for(89.0, 91.0);
        assert!(f.dip_reclaim);
        assert!(f.dca);

        let f = flags_for(93.0, 95.5);
        assert!(f.dca);
        assert!(!f.dip_reclaim);

        let f = flags_for(98.0, 100.0);
        assert!(!f.dca);

        // below support is not the DCA zone
        let f = flags_for(85.0, 88.0);
        assert!(!f.dca);
        assert!(!f.dip_reclaim);
    }

    #[test]
    fn test_flat_range_flags() {
        let flat = RangeLevels {
            support: 100.0,
            value_area_low: 100.0,
            resistance: 100.0,
            height: 0.0,
        };
        let bar = Candle::new(0, 100.0, 100.0, 100.0, 100.0, 1.0);
        let f = pattern_flags(&bar, &flat, &ScoringParams::default());
        assert!(!f.breakout && !f.near_breakout && !f.dip_reclaim);
        assert!(f.dca);

        // clearing a zero-width range is still a breakout
        let bar = Candle::new(0, 100.0, 105.5, 100.0, 105.0, 1.0);
        let f = pattern_flags(&bar, &flat, &ScoringParams::default());
        assert!(f.breakout);
        assert!(!f.near_breakout && !f.dca);
    }

    #[test]
    fn test_near_breakout_needs_upper_half() {
        // 99..101: the 3% band below RH covers the whole range
        let narrow = RangeLevels {
            support: 99.0,
            value_area_low: 99.92,
            resistance: 101.0,
            height: 2.0,
        };
        let params = ScoringParams::default();

        let reclaim = Candle::new(0, 99.0, 99.4, 98.5, 99.2, 1.0);
        let f = pattern_flags(&reclaim, &narrow, &params);
        assert!(f.dip_reclaim);
        assert!(!f.near_breakout);

        let lower_half = Candle::new(0, 99.5, 99.9, 99.3, 99.6, 1.0);
        assert!(!pattern_flags(&lower_half, &narrow, &params).near_breakout);

        let upper_half = Candle::new(0, 100.2, 100.8, 100.1, 100.6, 1.0);
        assert!(pattern_flags(&upper_half, &narrow, &params).near_breakout);

        // a strong reversal from below support stays a dip reclaim
        let reversal = Candle::new(0, 99.0, 100.9, 98.8, 100.7, 1.0);
        let f = pattern_flags(&reversal, &narrow, &params);
        assert!(f.dip_reclaim);
        assert!(!f.near_breakout);
    }
}
