//! # pivotscope - support/resistance levels and candlestick signals
//!
//! Two independent, pure analyses over an ordered sequence of OHLCV bars:
//!
//! - [`detect_levels`]: pivot-based horizontal levels, scored by touches and
//!   volume, de-duplicated and capped to the strongest few.
//! - [`detect_patterns`]: a catalog of candlestick detectors evaluated over the
//!   whole series, reporting which ones fire at the most recent bar.
//!
//! ## Quick Start
//!
//! ```rust
//! use pivotscope::prelude::*;
//!
//! let bars: Vec<Bar> = (0..60)
//!     .map(|i| {
//!         let base = 100.0 + (i as f64 * 0.7).sin() * 5.0;
//!         Bar::new(i * 60_000, base, base + 1.0, base - 1.0, base + 0.2, 1_000.0)
//!     })
//!     .collect();
//!
//! let levels = detect_levels(&bars, &LevelConfig::default()).unwrap();
//! assert!(levels.len() <= 6);
//!
//! let report = detect_patterns(&bars).unwrap();
//! for signal in &report.signals {
//!     println!("{} {:?} {}", signal.name, signal.kind, signal.strength);
//! }
//! ```

pub mod catalog;
pub mod classifier;
pub mod detectors;
pub mod levels;
pub mod series;

pub mod prelude {
    pub use crate::{
        // Operations
        analyze,
        analyze_parallel,
        // Catalog
        catalog::{Catalog, CatalogBuilder, CatalogEntry},
        // Classifier
        classifier::{
            detect_patterns, ClassifierConfig, DetectorFailure, PatternClassifier,
            PatternReport, PatternSignal, SignalOrder, SignalType,
        },
        // Detectors
        detectors::*,
        // Levels
        levels::{detect_levels, Level, LevelConfig, LevelKind, LevelStrength, Pivot},
        series::Series,
        // Types
        bars_from_json,
        Analysis,
        AnalysisError,
        Bar,
        InstrumentAnalysis,
        InstrumentError,
        OHLCVExt,
        Period,
        Ratio,
        Result,
        OHLCV,
    };
}

pub use classifier::detect_patterns;
pub use levels::detect_levels;

use classifier::{PatternClassifier, PatternReport};
use levels::{Level, LevelConfig};
use series::Series;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that reject an analysis request outright
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Empty bar sequence")]
    EmptyInput,

    #[error("Bars out of order at index {index}: time {time} precedes {previous}")]
    Unordered {
        index: usize,
        time: i64,
        previous: i64,
    },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Malformed bar data: {0}")]
    Malformed(String),

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    /// True for errors caused by the bar sequence itself rather than by configuration.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::Unordered { .. } | Self::InvalidBar { .. } | Self::Malformed(_)
        )
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Bar count (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    /// Bar timestamp, in whatever unit the caller uses (typically epoch millis)
    fn time(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate OHLCV data consistency. The reported index is always 0;
    /// sequence-level validation rewrites it.
    fn validate(&self) -> Result<()> {
        let fields = [
            self.open(),
            self.high(),
            self.low(),
            self.close(),
            self.volume(),
        ];
        if fields.iter().any(|v| v.is_nan()) {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if fields.iter().any(|v| v.is_infinite()) {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if fields.iter().any(|v| *v < 0.0) {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "Negative value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(AnalysisError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// BAR RECORD
// ============================================================

/// A single OHLCV bar as supplied by the data-acquisition layer
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl OHLCV for Bar {
    fn time(&self) -> i64 {
        self.time
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Parse a JSON array of bar records (`{"time", "open", "high", "low", "close", "volume"}`).
///
/// A record missing a field or carrying a non-numeric value is rejected as
/// [`AnalysisError::Malformed`]. Ordering and value checks happen later, in
/// [`Series::from_bars`].
pub fn bars_from_json(json: &str) -> Result<Vec<Bar>> {
    serde_json::from_str(json).map_err(|e| AnalysisError::Malformed(e.to_string()))
}

/// Reject empty, unordered or numerically invalid bar sequences.
pub(crate) fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    if bars.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            AnalysisError::InvalidBar { reason, .. } => AnalysisError::InvalidBar { index: i, reason },
            other => other,
        })?;
    }

    for (i, pair) in bars.windows(2).enumerate() {
        let (previous, time) = (pair[0].time(), pair[1].time());
        if time < previous {
            return Err(AnalysisError::Unordered {
                index: i + 1,
                time,
                previous,
            });
        }
    }

    Ok(())
}

// ============================================================
// COMBINED ANALYSIS
// ============================================================

/// Both analyses over the same bar sequence
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Analysis {
    pub levels: Vec<Level>,
    pub patterns: PatternReport,
}

/// Validate once, then run level detection and pattern classification.
pub fn analyze<T: OHLCV>(
    bars: &[T],
    level_config: &LevelConfig,
    classifier: &PatternClassifier,
) -> Result<Analysis> {
    level_config.validate()?;
    let series = Series::from_bars(bars)?;

    Ok(Analysis {
        levels: levels::detect_levels_in(&series, level_config),
        patterns: classifier.classify_series(&series),
    })
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Result of analyzing a single instrument
#[derive(Debug)]
pub struct InstrumentAnalysis {
    pub symbol: String,
    pub analysis: Analysis,
}

/// Error from analyzing a single instrument
#[derive(Debug)]
pub struct InstrumentError {
    pub symbol: String,
    pub error: AnalysisError,
}

/// Analyze many instruments concurrently. Invocations share no state, so a
/// bad series only fails its own instrument.
pub fn analyze_parallel<'a, T, I>(
    instruments: I,
    level_config: &LevelConfig,
    classifier: &PatternClassifier,
) -> (Vec<InstrumentAnalysis>, Vec<InstrumentError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            analyze(bars, level_config, classifier)
                .map(|analysis| InstrumentAnalysis {
                    symbol: symbol.to_string(),
                    analysis,
                })
                .map_err(|error| InstrumentError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
