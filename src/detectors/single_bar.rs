//! Single-bar candlestick rules
//!
//! TA-Lib counterparts: CDLDOJI, CDLHAMMER, CDLSHOOTINGSTAR. Hammer and
//! Shooting Star also look at the preceding bar for position, so they need
//! two bars of history.

use super::{
    helpers::{self, is_body_short, is_doji, is_shadow_long, is_shadow_very_short},
    CandleRule, SIGNAL_FULL,
};
use crate::{series::Series, OHLCVExt};

impl_with_defaults!(DojiDetector, HammerDetector, ShootingStarDetector);

// ============================================================
// DOJI
// ============================================================

/// CDLDOJI - open and close (nearly) equal
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub doji_factor: f64,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            doji_factor: helpers::DOJI_FACTOR,
        }
    }
}

impl CandleRule for DojiDetector {
    fn id(&self) -> &'static str {
        "CDL_DOJI"
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, series: &Series, index: usize) -> Option<i32> {
        let bar = series.bar(index)?;
        let (_, avg_range) = helpers::candle_averages(series, index);

        is_doji(bar.body(), avg_range, bar.range(), self.doji_factor).then_some(SIGNAL_FULL)
    }
}

// ============================================================
// HAMMER / SHOOTING STAR
// ============================================================

/// CDLHAMMER - small body at the top of a long lower shadow, at or below the prior low
#[derive(Debug, Clone, Copy)]
pub struct HammerDetector {
    pub body_short_factor: f64,
    pub shadow_veryshort_factor: f64,
    pub near_factor: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            body_short_factor: helpers::BODY_SHORT_FACTOR,
            shadow_veryshort_factor: helpers::SHADOW_VERYSHORT_FACTOR,
            near_factor: helpers::NEAR_FACTOR,
        }
    }
}

impl CandleRule for HammerDetector {
    fn id(&self) -> &'static str {
        "CDL_HAMMER"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, series: &Series, index: usize) -> Option<i32> {
        let prev = series.bar(index.checked_sub(1)?)?;
        let bar = series.bar(index)?;

        let body = bar.body();
        let range = bar.range();
        let (avg_body, avg_range) = helpers::candle_averages(series, index);

        if !is_body_short(body, avg_body, range, self.body_short_factor) {
            return None;
        }
        if !is_shadow_long(bar.lower_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short(bar.upper_shadow(), avg_range, range, self.shadow_veryshort_factor) {
            return None;
        }

        // Body sits at or below the prior bar's low, within a Near tolerance
        let near = helpers::trailing_avg_range(series, index - 1, helpers::NEAR_AVG_PERIOD)
            * self.near_factor;
        if bar.body_bottom() > prev.low + near {
            return None;
        }

        Some(SIGNAL_FULL)
    }
}

/// CDLSHOOTINGSTAR - small body gapping up, long upper shadow, almost no lower shadow
#[derive(Debug, Clone, Copy)]
pub struct ShootingStarDetector {
    pub body_short_factor: f64,
    pub shadow_veryshort_factor: f64,
}

impl Default for ShootingStarDetector {
    fn default() -> Self {
        Self {
            body_short_factor: helpers::BODY_SHORT_FACTOR,
            shadow_veryshort_factor: helpers::SHADOW_VERYSHORT_FACTOR,
        }
    }
}

impl CandleRule for ShootingStarDetector {
    fn id(&self) -> &'static str {
        "CDL_SHOOTINGSTAR"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, series: &Series, index: usize) -> Option<i32> {
        let prev = series.bar(index.checked_sub(1)?)?;
        let bar = series.bar(index)?;

        // Real-body gap up
        if bar.body_bottom() <= prev.body_top() {
            return None;
        }

        let body = bar.body();
        let range = bar.range();
        let (avg_body, avg_range) = helpers::candle_averages(series, index);

        if !is_body_short(body, avg_body, range, self.body_short_factor) {
            return None;
        }
        if !is_shadow_long(bar.upper_shadow(), body) {
            return None;
        }
        if !is_shadow_very_short(bar.lower_shadow(), avg_range, range, self.shadow_veryshort_factor) {
            return None;
        }

        Some(-SIGNAL_FULL)
    }
}
