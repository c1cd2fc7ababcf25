//! Support/resistance level detection
//!
//! Three stages, each usable on its own:
//!
//! 1. [`scan_pivots`] finds bars whose high (low) is the extreme of a symmetric
//!    window of `period` bars on each side.
//! 2. [`score_strength`] counts how often the whole series revisits the pivot
//!    price and how much volume traded on those revisits.
//! 3. [`rank_levels`] keeps the strongest candidate in each price neighborhood
//!    and caps the result.
//!
//! [`detect_levels`] chains them with the default 20-bar window, 0.1 % touch
//! tolerance, 0.5 % proximity and a cap of 6.

use rayon::prelude::*;
use tracing::debug;

use crate::{series::Series, AnalysisError, Period, Ratio, Result, OHLCV};

// ============================================================
// TYPES
// ============================================================

/// Which side of price a level sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
}

/// Touch count and volume behind a level
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStrength {
    pub touches: usize,
    pub average_volume: f64,
    /// `touches * average_volume`
    pub score: f64,
}

impl LevelStrength {
    /// Returns `None` when there are no touches (average undefined).
    pub fn from_touches(touches: usize, total_volume: f64) -> Option<Self> {
        if touches == 0 {
            return None;
        }
        let average_volume = total_volume / touches as f64;
        Some(Self {
            touches,
            average_volume,
            score: touches as f64 * average_volume,
        })
    }
}

/// A scored horizontal price level
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    #[serde(rename = "type")]
    pub kind: LevelKind,
    pub price: f64,
    /// Time of the first bar of the confirming window
    pub start_time: i64,
    /// Time of the bar `period` bars after the pivot
    pub end_time: i64,
    pub strength: LevelStrength,
}

/// Raw pivot found by the scanner, before scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub index: usize,
    pub kind: LevelKind,
    pub price: f64,
}

// ============================================================
// CONFIG
// ============================================================

/// Level detection parameters
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelConfig {
    /// Window radius around each pivot candidate
    pub period: Period,
    /// Relative band around a pivot price that counts as a touch
    pub touch_tolerance: Ratio,
    /// Relative distance under which two levels are considered the same
    pub proximity: Ratio,
    pub max_levels: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            period: Period::new_const(20),
            touch_tolerance: Ratio::new_const(0.001),
            proximity: Ratio::new_const(0.005),
            max_levels: 6,
        }
    }
}

impl LevelConfig {
    /// Defaults with a custom window radius.
    pub fn with_period(period: usize) -> Result<Self> {
        Ok(Self {
            period: Period::new(period)?,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_levels == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_levels must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// PIVOT SCANNER
// ============================================================

#[inline]
fn window_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[inline]
fn window_min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Find every pivot high and low.
///
/// For each index `i` in `[period, len - period)` the window is
/// `[i - period, i + period)`. A bar whose high equals the window maximum
/// yields a resistance pivot, one whose low equals the window minimum a
/// support pivot. Equality is exact, so a repeated extremum yields one pivot
/// per occurrence. Output is ordered by index, resistance before support.
pub fn scan_pivots(series: &Series, period: Period) -> Vec<Pivot> {
    let p = period.get();
    let n = series.len();
    if p.checked_mul(2).map_or(true, |width| n <= width) {
        return Vec::new();
    }

    (p..n - p)
        .into_par_iter()
        .flat_map_iter(|i| {
            let window = i - p..i + p;

            let high = series.high[i];
            let resistance = (high == window_max(&series.high[window.clone()])).then_some(Pivot {
                index: i,
                kind: LevelKind::Resistance,
                price: high,
            });

            let low = series.low[i];
            let support = (low == window_min(&series.low[window])).then_some(Pivot {
                index: i,
                kind: LevelKind::Support,
                price: low,
            });

            resistance.into_iter().chain(support)
        })
        .collect()
}

// ============================================================
// STRENGTH SCORER
// ============================================================

/// Score the level at `index` against the entire series.
///
/// A bar touches a resistance when `|high - price| <= price * tolerance`
/// (support uses the low). The pivot bar always touches itself, so the
/// result is `None` only for an out-of-range index.
pub fn score_strength(
    series: &Series,
    index: usize,
    kind: LevelKind,
    tolerance: Ratio,
) -> Option<LevelStrength> {
    let prices = match kind {
        LevelKind::Resistance => &series.high,
        LevelKind::Support => &series.low,
    };
    let price = *prices.get(index)?;
    let threshold = price * tolerance.get();

    let (touches, total_volume) = prices
        .iter()
        .zip(&series.volume)
        .filter(|(p, _)| (*p - price).abs() <= threshold)
        .fold((0usize, 0.0), |(t, v), (_, vol)| (t + 1, v + vol));

    LevelStrength::from_touches(touches, total_volume)
}

// ============================================================
// RANKER / DEDUPLICATOR
// ============================================================

/// Relative distance test against the candidate's own price.
#[inline]
fn is_nearby(accepted: f64, candidate: f64, proximity: Ratio) -> bool {
    if candidate == 0.0 {
        return accepted == 0.0;
    }
    (accepted - candidate).abs() / candidate < proximity.get()
}

/// Keep the strongest level of each price neighborhood, at most `max_levels`.
///
/// Candidates are visited in descending score order and accepted unless an
/// already accepted level lies within `proximity` of the candidate's price.
/// Support and resistance share the same neighborhoods.
pub fn rank_levels(mut candidates: Vec<Level>, proximity: Ratio, max_levels: usize) -> Vec<Level> {
    candidates.sort_by(|a, b| b.strength.score.total_cmp(&a.strength.score));

    let mut accepted: Vec<Level> = Vec::with_capacity(candidates.len().min(max_levels));
    for candidate in candidates {
        if accepted.len() >= max_levels {
            break;
        }
        if accepted
            .iter()
            .any(|level| is_nearby(level.price, candidate.price, proximity))
        {
            continue;
        }
        accepted.push(candidate);
    }

    accepted
}

// ============================================================
// OPERATION
// ============================================================

/// Detect the ranked support/resistance levels of a bar sequence.
///
/// Fails on empty, unordered or invalid input. A sequence too short for a
/// single full window yields an empty list.
pub fn detect_levels<T: OHLCV>(bars: &[T], config: &LevelConfig) -> Result<Vec<Level>> {
    config.validate()?;
    let series = Series::from_bars(bars)?;
    Ok(detect_levels_in(&series, config))
}

/// [`detect_levels`] over an already validated series.
pub fn detect_levels_in(series: &Series, config: &LevelConfig) -> Vec<Level> {
    let period = config.period.get();
    let pivots = scan_pivots(series, config.period);

    let candidates: Vec<Level> = pivots
        .par_iter()
        .filter_map(|pivot| {
            let strength = score_strength(series, pivot.index, pivot.kind, config.touch_tolerance)?;
            Some(Level {
                kind: pivot.kind,
                price: pivot.price,
                start_time: series.time[pivot.index - period],
                end_time: series.time[pivot.index + period],
                strength,
            })
        })
        .collect();

    let levels = rank_levels(candidates, config.proximity, config.max_levels);
    debug!(
        bars = series.len(),
        pivots = pivots.len(),
        levels = levels.len(),
        "level detection finished"
    );
    levels
}

// ============================================================
// TESTS
// ============================================================
