//! Three-bar candlestick rules
//!
//! TA-Lib counterparts: CDL3WHITESOLDIERS, CDL3BLACKCROWS, CDLMORNINGSTAR,
//! CDLEVENINGSTAR.

use super::{
  helpers::{self, is_body_long, is_body_short},
  CandleRule, SIGNAL_FULL,
};
use crate::{series::Series, OHLCVExt};

impl_with_defaults!(
  ThreeWhiteSoldiersDetector,
  ThreeBlackCrowsDetector,
  MorningStarDetector,
  EveningStarDetector,
);

/// Very-short-shadow threshold for the bar at `at`
#[inline]
fn very_short_shadow(series: &Series, at: usize, factor: f64) -> f64 {
  helpers::trailing_avg_range(series, at, helpers::CANDLE_AVG_PERIOD) * factor
}

// ============================================================
// THREE WHITE SOLDIERS / THREE BLACK CROWS
// ============================================================

/// CDL3WHITESOLDIERS - three rising white bars closing near their highs
#[derive(Debug, Clone, Copy)]
pub struct ThreeWhiteSoldiersDetector {
  pub shadow_veryshort_factor: f64,
  pub near_factor: f64,
  pub far_factor: f64,
  pub body_short_factor: f64,
}

impl Default for ThreeWhiteSoldiersDetector {
  fn default() -> Self {
    Self {
      shadow_veryshort_factor: helpers::SHADOW_VERYSHORT_FACTOR,
      near_factor: helpers::NEAR_FACTOR,
      far_factor: helpers::FAR_FACTOR,
      body_short_factor: helpers::BODY_SHORT_FACTOR,
    }
  }
}

impl CandleRule for ThreeWhiteSoldiersDetector {
  fn id(&self) -> &'static str {
    "CDL_3WHITESOLDIERS"
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect(&self, series: &Series, index: usize) -> Option<i32> {
    let first = series.bar(index.checked_sub(2)?)?;
    let second = series.bar(index - 1)?;
    let third = series.bar(index)?;

    if !first.is_bullish() || !second.is_bullish() || !third.is_bullish() {
      return None;
    }
    if second.close <= first.close || third.close <= second.close {
      return None;
    }

    // Each closes at or very near its high
    let soldiers = [(index - 2, &first), (index - 1, &second), (index, &third)];
    for (at, bar) in soldiers {
      if bar.upper_shadow() >= very_short_shadow(series, at, self.shadow_veryshort_factor) {
        return None;
      }
    }

    // Each opens within (or just above) the prior body
    let near_first = helpers::trailing_avg_range(series, index - 2, helpers::NEAR_AVG_PERIOD) * self.near_factor;
    let near_second = helpers::trailing_avg_range(series, index - 1, helpers::NEAR_AVG_PERIOD) * self.near_factor;
    if second.open <= first.open || second.open > first.close + near_first {
      return None;
    }
    if third.open <= second.open || third.open > second.close + near_second {
      return None;
    }

    // Bodies do not shrink by more than a Far distance
    let far_first = helpers::trailing_avg_range(series, index - 2, helpers::NEAR_AVG_PERIOD) * self.far_factor;
    let far_second = helpers::trailing_avg_range(series, index - 1, helpers::NEAR_AVG_PERIOD) * self.far_factor;
    if second.body() <= first.body() - far_first {
      return None;
    }
    if third.body() <= second.body() - far_second {
      return None;
    }

    let body_short = helpers::trailing_avg_body(series, index, helpers::CANDLE_AVG_PERIOD) * self.body_short_factor;
    if third.body() < body_short {
      return None;
    }

    Some(SIGNAL_FULL)
  }
}

/// CDL3BLACKCROWS - white bar, then three falling black bars closing near their lows
#[derive(Debug, Clone, Copy)]
pub struct ThreeBlackCrowsDetector {
  pub shadow_veryshort_factor: f64,
}

impl Default for ThreeBlackCrowsDetector {
  fn default() -> Self {
    Self {
      shadow_veryshort_factor: helpers::SHADOW_VERYSHORT_FACTOR,
    }
  }
}

impl CandleRule for ThreeBlackCrowsDetector {
  fn id(&self) -> &'static str {
    "CDL_3BLACKCROWS"
  }

  fn min_bars(&self) -> usize {
    4
  }

  fn detect(&self, series: &Series, index: usize) -> Option<i32> {
    let prior = series.bar(index.checked_sub(3)?)?;
    let first = series.bar(index - 2)?;
    let second = series.bar(index - 1)?;
    let third = series.bar(index)?;

    if !prior.is_bullish() {
      return None;
    }
    if !first.is_bearish() || !second.is_bearish() || !third.is_bearish() {
      return None;
    }
    if second.close >= first.close || third.close >= second.close {
      return None;
    }

    // Each opens strictly inside the prior body
    if second.open >= first.open || second.open <= first.close {
      return None;
    }
    if third.open >= second.open || third.open <= second.close {
      return None;
    }

    if prior.high <= first.close {
      return None;
    }

    let crows = [(index - 2, &first), (index - 1, &second), (index, &third)];
    for (at, bar) in crows {
      if bar.lower_shadow() >= very_short_shadow(series, at, self.shadow_veryshort_factor) {
        return None;
      }
    }

    Some(-SIGNAL_FULL)
  }
}

// ============================================================
// MORNING STAR / EVENING STAR
// ============================================================

/// CDLMORNINGSTAR - long black, short body gapping down, white closing into the first body
#[derive(Debug, Clone, Copy)]
pub struct MorningStarDetector {
  pub body_long_factor: f64,
  pub body_short_factor: f64,
  pub penetration: f64,
}

impl Default for MorningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      body_short_factor: helpers::BODY_SHORT_FACTOR,
      penetration: 0.3,
    }
  }
}

impl CandleRule for MorningStarDetector {
  fn id(&self) -> &'static str {
    "CDL_MORNINGSTAR"
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect(&self, series: &Series, index: usize) -> Option<i32> {
    let first = series.bar(index.checked_sub(2)?)?;
    let second = series.bar(index - 1)?;
    let third = series.bar(index)?;

    // Colors: black, any, white
    if first.close >= first.open || third.close < third.open {
      return None;
    }

    let first_body = first.body();
    let avg_first = helpers::trailing_avg_body(series, index - 2, helpers::CANDLE_AVG_PERIOD);
    if !is_body_long(first_body, avg_first, first.range(), self.body_long_factor) {
      return None;
    }

    let avg_second = helpers::trailing_avg_body(series, index - 1, helpers::CANDLE_AVG_PERIOD);
    if !is_body_short(second.body(), avg_second, second.range(), self.body_short_factor) {
      return None;
    }

    // Real-body gap down between the first and the star
    if second.body_top() >= first.body_bottom() {
      return None;
    }

    let avg_third = helpers::trailing_avg_body(series, index, helpers::CANDLE_AVG_PERIOD);
    if third.body() <= avg_third {
      return None;
    }

    if third.close <= first.close + first_body * self.penetration {
      return None;
    }

    Some(SIGNAL_FULL)
  }
}

/// CDLEVENINGSTAR - long white, short body gapping up, black closing into the first body
#[derive(Debug, Clone, Copy)]
pub struct EveningStarDetector {
  pub body_long_factor: f64,
  pub body_short_factor: f64,
  pub penetration: f64,
}

impl Default for EveningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      body_short_factor: helpers::BODY_SHORT_FACTOR,
      penetration: 0.3,
    }
  }
}

impl CandleRule for EveningStarDetector {
  fn id(&self) -> &'static str {
    "CDL_EVENINGSTAR"
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect(&self, series: &Series, index: usize) -> Option<i32> {
    let first = series.bar(index.checked_sub(2)?)?;
    let second = series.bar(index - 1)?;
    let third = series.bar(index)?;

    // Colors: white, any, black
    if first.close < first.open || third.close >= third.open {
      return None;
    }

    let first_body = first.body();
    let avg_first = helpers::trailing_avg_body(series, index - 2, helpers::CANDLE_AVG_PERIOD);
    if !is_body_long(first_body, avg_first, first.range(), self.body_long_factor) {
      return None;
    }

    let avg_second = helpers::trailing_avg_body(series, index - 1, helpers::CANDLE_AVG_PERIOD);
    if !is_body_short(second.body(), avg_second, second.range(), self.body_short_factor) {
      return None;
    }

    // Real-body gap up between the first and the star
    if second.body_bottom() <= first.body_top() {
      return None;
    }

    let avg_third = helpers::trailing_avg_body(series, index, helpers::CANDLE_AVG_PERIOD);
    if third.body() <= avg_third {
      return None;
    }

    if third.close >= first.close - first_body * self.penetration {
      return None;
    }

    Some(-SIGNAL_FULL)
  }
}
