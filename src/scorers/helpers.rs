//! Shared numeric helpers for the sub-scorers
//!
//! Every division in the scorers goes through these so a zero or
//! degenerate denominator yields `None` instead of NaN or infinity. No
//! threshold here is absolute, so scores do not depend on the price scale.

/// `num / den`, or `None` when `den` is not positive or the quotient
/// overflows
#[inline]
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den > 0.0 && num.is_finite() && den.is_finite() {
        let r = num / den;
        r.is_finite().then_some(r)
    } else {
        None
    }
}

/// Absolute distance of `value` from `level` as a percent of `level`
#[inline]
pub fn pct_distance(value: f64, level: f64) -> Option<f64> {
    ratio((value - level).abs(), level).map(|r| r * 100.0)
}

/// True when `value` lies within `pct` percent of `level`
#[inline]
pub fn within_pct(value: f64, level: f64, pct: f64) -> bool {
    pct_distance(value, level).is_some_and(|d| d <= pct)
}

/// Clamp a point value into `[min, max]`; non-finite input scores zero
#[inline]
pub fn clamp_points(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}

/// Two-tier threshold score: `full` at or above `strong`, `partial` at or
/// above `mild`, otherwise zero
#[inline]
pub fn tiered(value: f64, strong: f64, mild: f64, full: f64, partial: f64) -> f64 {
    if value >= strong {
        full
    } else if value >= mild {
        partial
    } else {
        0.0
    }
}
