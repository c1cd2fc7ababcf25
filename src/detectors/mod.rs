//! Candlestick pattern detectors
//!
//! A detector is any [`SignalDetector`]: given the five aligned series it
//! returns one integer per bar. `0` means the pattern is absent, a positive
//! value a bullish occurrence and a negative value a bearish one, with the
//! absolute value as magnitude (the TA-Lib `±100` / `±80` convention).
//!
//! Built-in detectors are written as [`CandleRule`]s, evaluated bar by bar;
//! anything else (another numerical library, a model, a closure) can be
//! plugged in through [`SignalDetector`] directly or via [`FnDetector`].
//!
//! # Built-ins
//!
//! - **Single-bar**: Doji, Hammer, Shooting Star
//! - **Two-bar**: Engulfing, Harami, Piercing
//! - **Three-bar**: Morning/Evening Star, Three White Soldiers, Three Black Crows

use crate::series::Series;

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;

/// Full-strength signal
pub const SIGNAL_FULL: i32 = 100;
/// Signal for a pattern whose defining comparison only just holds
pub const SIGNAL_PARTIAL: i32 = 80;

/// Why a detector produced no usable output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DetectorError {
    #[error("Signal series has {got} values, expected {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Detector failed: {message}")]
    Failed { message: String },
}

impl DetectorError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Object-safe pattern capability: five series in, one signal per bar out
///
/// Report failures by returning a [`DetectorError`]: the classifier skips the
/// detector and records the error. A panic is not caught and aborts the
/// whole classification.
pub trait SignalDetector: Send + Sync {
    fn evaluate(&self, series: &Series) -> Result<Vec<i32>, DetectorError>;
}

/// Per-bar candle rule - the shape of every built-in detector
pub trait CandleRule: Send + Sync {
    /// Library identifier, e.g. `CDL_ENGULFING`
    fn id(&self) -> &'static str;

    /// Bars needed before the rule can fire
    fn min_bars(&self) -> usize;

    /// Signed signal at `index`, `None` when the pattern is absent
    fn detect(&self, series: &Series, index: usize) -> Option<i32>;
}

impl<R: CandleRule> SignalDetector for R {
    fn evaluate(&self, series: &Series) -> Result<Vec<i32>, DetectorError> {
        let min_bars = self.min_bars();
        Ok((0..series.len())
            .map(|i| {
                if i + 1 < min_bars {
                    0
                } else {
                    self.detect(series, i).unwrap_or(0)
                }
            })
            .collect())
    }
}

/// Adapts a closure into a [`SignalDetector`]
pub struct FnDetector<F>(pub F);

impl<F> FnDetector<F>
where
    F: Fn(&Series) -> Result<Vec<i32>, DetectorError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> SignalDetector for FnDetector<F>
where
    F: Fn(&Series) -> Result<Vec<i32>, DetectorError> + Send + Sync,
{
    fn evaluate(&self, series: &Series) -> Result<Vec<i32>, DetectorError> {
        (self.0)(series)
    }
}

impl<F> std::fmt::Debug for FnDetector<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnDetector")
    }
}
