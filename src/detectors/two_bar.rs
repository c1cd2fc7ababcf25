//! Two-bar candlestick rules
//!
//! TA-Lib counterparts: CDLENGULFING, CDLHARAMI, CDLPIERCING.

#![allow(clippy::default_constructed_unit_structs)]

use super::{
    helpers::{self, is_body_long, is_body_short},
    CandleRule, SIGNAL_FULL, SIGNAL_PARTIAL,
};
use crate::{series::Series, Bar, OHLCVExt};

impl_with_defaults!(EngulfingDetector, HaramiDetector, PiercingDetector);

/// TA-Lib candle color: white when close >= open
#[inline]
fn is_white(bar: &Bar) -> bool {
    bar.close >= bar.open
}

/// Sign of the signal, from the direction of the second bar
#[inline]
fn signed(bullish: bool, magnitude: i32) -> i32 {
    if bullish {
        magnitude
    } else {
        -magnitude
    }
}

// ============================================================
// ENGULFING
// ============================================================

/// CDLENGULFING - second body engulfs the first, opposite color
///
/// `±100` when both body ends are strictly engulfed, `±80` when one end matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngulfingDetector;

impl CandleRule for EngulfingDetector {
    fn id(&self) -> &'static str {
        "CDL_ENGULFING"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, series: &Series, index: usize) -> Option<i32> {
        let prev = series.bar(index.checked_sub(1)?)?;
        let curr = series.bar(index)?;

        let bullish = match (is_white(&prev), is_white(&curr)) {
            (false, true) => true,
            (true, false) => false,
            _ => return None,
        };

        // At most one end of the engulfing body may coincide with the prior body
        let (top, bottom) = if bullish {
            (curr.close, curr.open)
        } else {
            (curr.open, curr.close)
        };
        let (prev_top, prev_bottom) = (prev.body_top(), prev.body_bottom());

        let engulfs = (top >= prev_top && bottom < prev_bottom)
            || (top > prev_top && bottom <= prev_bottom);
        if !engulfs {
            return None;
        }

        let strict = top != prev_top && bottom != prev_bottom;
        Some(signed(bullish, if strict { SIGNAL_FULL } else { SIGNAL_PARTIAL }))
    }
}

// ============================================================
// HARAMI
// ============================================================

/// CDLHARAMI - long body followed by a short body inside it
///
/// Direction is the reverse of the first bar. `±100` when strictly inside,
/// `±80` when one end touches.
#[derive(Debug, Clone, Copy)]
pub struct HaramiDetector {
    pub body_long_factor: f64,
    pub body_short_factor: f64,
}

impl Default for HaramiDetector {
    fn default() -> Self {
        Self {
            body_long_factor: helpers::BODY_LONG_FACTOR,
            body_short_factor: helpers::BODY_SHORT_FACTOR,
        }
    }
}

impl CandleRule for HaramiDetector {
    fn id(&self) -> &'static str {
        "CDL_HARAMI"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, series: &Series, index: usize) -> Option<i32> {
        let prev = series.bar(index.checked_sub(1)?)?;
        let curr = series.bar(index)?;

        let prev_body = prev.body();
        if prev_body <= f64::EPSILON {
            return None;
        }
        let prev_avg_body = helpers::trailing_avg_body(series, index - 1, helpers::CANDLE_AVG_PERIOD);
        if !is_body_long(prev_body, prev_avg_body, prev.range(), self.body_long_factor) {
            return None;
        }

        let (avg_body, _) = helpers::candle_averages(series, index);
        if !is_body_short(curr.body(), avg_body, curr.range(), self.body_short_factor) {
            return None;
        }

        let (prev_top, prev_bottom) = (prev.body_top(), prev.body_bottom());
        let (top, bottom) = (curr.body_top(), curr.body_bottom());
        if top > prev_top || bottom < prev_bottom {
            return None;
        }

        let strict = top < prev_top && bottom > prev_bottom;
        Some(signed(
            prev.is_bearish(),
            if strict { SIGNAL_FULL } else { SIGNAL_PARTIAL },
        ))
    }
}

// ============================================================
// PIERCING
// ============================================================

/// CDLPIERCING - long black bar, then a long white bar opening below its low
/// and closing past the midpoint of its body
#[derive(Debug, Clone, Copy)]
pub struct PiercingDetector {
    pub body_long_factor: f64,
    /// Fraction of the first body the second close must recover
    pub penetration: f64,
}

impl Default for PiercingDetector {
    fn default() -> Self {
        Self {
            body_long_factor: helpers::BODY_LONG_FACTOR,
            penetration: 0.5,
        }
    }
}

impl CandleRule for PiercingDetector {
    fn id(&self) -> &'static str {
        "CDL_PIERCING"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, series: &Series, index: usize) -> Option<i32> {
        let prev = series.bar(index.checked_sub(1)?)?;
        let curr = series.bar(index)?;

        if is_white(&prev) || !is_white(&curr) {
            return None;
        }

        let prev_body = prev.body();
        let prev_avg_body = helpers::trailing_avg_body(series, index - 1, helpers::CANDLE_AVG_PERIOD);
        if !is_body_long(prev_body, prev_avg_body, prev.range(), self.body_long_factor) {
            return None;
        }
        let (avg_body, _) = helpers::candle_averages(series, index);
        if !is_body_long(curr.body(), avg_body, curr.range(), self.body_long_factor) {
            return None;
        }

        // Opens below the prior low, closes inside the prior body above its midpoint
        if curr.open >= prev.low {
            return None;
        }
        if curr.close >= prev.open {
            return None;
        }
        if curr.close <= prev.close + prev_body * self.penetration {
            return None;
        }

        Some(SIGNAL_FULL)
    }
}
