//! Shared candle thresholds and trailing averages
//!
//! TA-Lib style comparisons: a body or shadow is "short"/"long" relative to the
//! average over the bars *before* the one being tested. When there is no
//! meaningful average (first bar, flat history) the checks fall back to ratios
//! of the bar's own range.

use crate::series::Series;

// ============================================================
// THRESHOLDS
// ============================================================

/// Trailing window for body/range averages
pub const CANDLE_AVG_PERIOD: usize = 10;
/// Trailing window for Near/Far comparisons
pub const NEAR_AVG_PERIOD: usize = 5;

/// Body is doji-like: body <= avg_range * DOJI_FACTOR
pub const DOJI_FACTOR: f64 = 0.1;
/// Body is short: body < avg_body * BODY_SHORT_FACTOR
pub const BODY_SHORT_FACTOR: f64 = 1.0;
/// Body is long: body > avg_body * BODY_LONG_FACTOR
pub const BODY_LONG_FACTOR: f64 = 1.0;
/// Shadow very short: shadow < avg_range * SHADOW_VERYSHORT_FACTOR
pub const SHADOW_VERYSHORT_FACTOR: f64 = 0.1;
pub const NEAR_FACTOR: f64 = 0.2;
pub const FAR_FACTOR: f64 = 0.6;

// Fallback ratio-based thresholds
pub const DOJI_RATIO: f64 = 0.1;
pub const BODY_SHORT_RATIO: f64 = 0.3;
pub const BODY_LONG_RATIO: f64 = 0.7;
pub const SHADOW_SHORT_RATIO: f64 = 0.1;

// ============================================================
// COMPARISONS
// ============================================================

/// Zero body is always a doji.
#[inline]
pub fn is_doji(body: f64, avg_range: f64, range: f64, factor: f64) -> bool {
    if body <= 0.0 {
        return true;
    }
    if avg_range > 0.0 {
        body <= avg_range * factor
    } else {
        range > 0.0 && body / range <= DOJI_RATIO
    }
}

#[inline]
pub fn is_body_short(body: f64, avg_body: f64, range: f64, factor: f64) -> bool {
    if avg_body > 0.0 {
        body < avg_body * factor
    } else {
        range > 0.0 && body / range <= BODY_SHORT_RATIO
    }
}

#[inline]
pub fn is_body_long(body: f64, avg_body: f64, range: f64, factor: f64) -> bool {
    if avg_body > 0.0 {
        body > avg_body * factor
    } else {
        range > 0.0 && body / range >= BODY_LONG_RATIO
    }
}

/// Shadow longer than the bar's own body.
#[inline]
pub fn is_shadow_long(shadow: f64, body: f64) -> bool {
    shadow > body
}

#[inline]
pub fn is_shadow_very_short(shadow: f64, avg_range: f64, range: f64, factor: f64) -> bool {
    if avg_range > 0.0 {
        shadow < avg_range * factor
    } else {
        range > 0.0 && shadow / range <= SHADOW_SHORT_RATIO
    }
}

// ============================================================
// TRAILING AVERAGES
// ============================================================

/// Mean of `measure` over the `period` bars preceding `at`.
/// At index 0 the bar itself is used.
fn trailing_mean(at: usize, period: usize, measure: impl Fn(usize) -> f64) -> f64 {
    if at == 0 {
        return measure(0);
    }
    let start = at.saturating_sub(period);
    let sum: f64 = (start..at).map(&measure).sum();
    sum / (at - start) as f64
}

#[inline]
pub fn trailing_avg_body(series: &Series, at: usize, period: usize) -> f64 {
    trailing_mean(at, period, |i| (series.close[i] - series.open[i]).abs())
}

#[inline]
pub fn trailing_avg_range(series: &Series, at: usize, period: usize) -> f64 {
    trailing_mean(at, period, |i| series.high[i] - series.low[i])
}

/// Average body and range at `at` over the default candle window.
#[inline]
pub fn candle_averages(series: &Series, at: usize) -> (f64, f64) {
    (
        trailing_avg_body(series, at, CANDLE_AVG_PERIOD),
        trailing_avg_range(series, at, CANDLE_AVG_PERIOD),
    )
}
