//! Pattern classification
//!
//! Runs every detector in a [`Catalog`] over the full series and converts the
//! signed per-bar values at the most recent bar(s) into typed
//! [`PatternSignal`]s. A detector that errors, or returns a series of the
//! wrong length, is skipped and reported as a [`DetectorFailure`]; the others
//! still run.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    catalog::Catalog,
    detectors::DetectorError,
    series::Series,
    Period, Result, OHLCV,
};

// ============================================================
// OUTPUT TYPES
// ============================================================

/// Direction of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Bullish,
    Bearish,
}

/// A pattern firing at one bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSignal {
    pub time: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SignalType,
    pub strength: u32,
}

impl PatternSignal {
    /// Map a raw detector value to a signal; `0` means absent.
    pub fn from_raw(time: i64, name: impl Into<String>, raw: i32) -> Option<Self> {
        if raw == 0 {
            return None;
        }
        Some(Self {
            time,
            name: name.into(),
            kind: if raw > 0 {
                SignalType::Bullish
            } else {
                SignalType::Bearish
            },
            strength: raw.unsigned_abs(),
        })
    }
}

/// A detector that was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorFailure {
    pub name: String,
    pub error: DetectorError,
}

/// Signals plus any non-fatal detector failures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternReport {
    pub signals: Vec<PatternSignal>,
    pub failures: Vec<DetectorFailure>,
}

impl PatternReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================
// CONFIGURATION
// ============================================================

/// Order of [`PatternReport::signals`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalOrder {
    /// Catalog order, then bar order
    #[default]
    Catalog,
    /// Descending strength; ties keep catalog order
    Strength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Number of most recent bars to report signals for
    pub lookback: Period,
    /// Drop signals weaker than this
    pub min_strength: Option<u32>,
    pub order: SignalOrder,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            lookback: Period::new_const(1),
            min_strength: None,
            order: SignalOrder::Catalog,
        }
    }
}

// ============================================================
// CLASSIFIER
// ============================================================

/// Catalog plus extraction settings. Holds no per-call state.
#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    catalog: Catalog,
    config: ClassifierConfig,
}

impl PatternClassifier {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            config: ClassifierConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClassifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Validate `bars`, then classify.
    pub fn classify<T: OHLCV>(&self, bars: &[T]) -> Result<PatternReport> {
        let series = Series::from_bars(bars)?;
        Ok(self.classify_series(&series))
    }

    /// Classify an already adapted series.
    pub fn classify_series(&self, series: &Series) -> PatternReport {
        let mut report = PatternReport::default();
        let Some(last) = series.last_index() else {
            return report;
        };
        let n = last + 1;
        let first = n.saturating_sub(self.config.lookback.get());

        for entry in self.catalog.iter() {
            let values = match entry.detector().evaluate(series) {
                Ok(values) if values.len() == n => values,
                Ok(values) => {
                    let error = DetectorError::LengthMismatch {
                        expected: n,
                        got: values.len(),
                    };
                    warn!(detector = entry.name(), %error, "skipping detector");
                    report.failures.push(DetectorFailure {
                        name: entry.name().to_string(),
                        error,
                    });
                    continue;
                }
                Err(error) => {
                    warn!(detector = entry.name(), %error, "skipping detector");
                    report.failures.push(DetectorFailure {
                        name: entry.name().to_string(),
                        error,
                    });
                    continue;
                }
            };

            report.signals.extend(
                (first..n)
                    .filter_map(|i| PatternSignal::from_raw(series.time[i], entry.name(), values[i]))
                    .filter(|s| self.config.min_strength.map_or(true, |min| s.strength >= min)),
            );
        }

        if self.config.order == SignalOrder::Strength {
            report.signals.sort_by(|a, b| b.strength.cmp(&a.strength));
        }

        debug!(
            bars = n,
            detectors = self.catalog.len(),
            signals = report.signals.len(),
            failures = report.failures.len(),
            "classified patterns"
        );
        report
    }
}

/// Classify the final bar of `bars` against the standard catalog.
pub fn detect_patterns<T: OHLCV>(bars: &[T]) -> Result<PatternReport> {
    PatternClassifier::default().classify(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::CatalogBuilder,
        detectors::{FnDetector, SignalDetector},
        AnalysisError, Bar,
    };

    fn flat(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar::new(1_000 + i as i64, 10.0, 11.0, 9.0, 10.5, 100.0))
            .collect()
    }

    fn constant(value: i32) -> impl SignalDetector {
        FnDetector::new(move |s: &Series| Ok(vec![value; s.len()]))
    }

    fn last_only(value: i32) -> impl SignalDetector {
        FnDetector::new(move |s: &Series| {
            let mut out = vec![0; s.len()];
            if let Some(last) = out.last_mut() {
                *last = value;
            }
            Ok(out)
        })
    }

    #[test]
    fn test_signal_from_raw() {
        assert_eq!(PatternSignal::from_raw(1, "X", 0), None);

        let bull = PatternSignal::from_raw(1, "X", 100).unwrap();
        assert_eq!(bull.kind, SignalType::Bullish);
        assert_eq!(bull.strength, 100);

        let bear = PatternSignal::from_raw(1, "X", -80).unwrap();
        assert_eq!(bear.kind, SignalType::Bearish);
        assert_eq!(bear.strength, 80);

        let extreme = PatternSignal::from_raw(1, "X", i32::MIN).unwrap();
        assert_eq!(extreme.strength, 2_147_483_648);
    }

    #[test]
    fn test_reads_final_bar_in_catalog_order() {
        let catalog = CatalogBuilder::new()
            .add("B", last_only(-80))
            .add("QUIET", constant(0))
            .add("A", last_only(100))
            .build()
            .unwrap();
        let report = PatternClassifier::new(catalog).classify(&flat(5)).unwrap();

        let names: Vec<_> = report.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(report.signals.iter().all(|s| s.time == 1_004));
        assert_eq!(report.signals[0].kind, SignalType::Bearish);
        assert!(report.is_clean());
    }

    #[test]
    fn test_earlier_bars_ignored_by_default() {
        let catalog = CatalogBuilder::new()
            .add(
                "EARLY",
                FnDetector::new(|s: &Series| {
                    let mut out = vec![0; s.len()];
                    out[0] = 100;
                    Ok(out)
                }),
            )
            .build()
            .unwrap();
        let report = PatternClassifier::new(catalog).classify(&flat(4)).unwrap();
        assert!(report.signals.is_empty());
    }

    #[test]
    fn test_failures_are_isolated() {
        let catalog = CatalogBuilder::new()
            .add("BROKEN", FnDetector::new(|_: &Series| Err(DetectorError::failed("boom"))))
            .add("SHORT", FnDetector::new(|_: &Series| Ok(vec![100])))
            .add("OK", constant(100))
            .build()
            .unwrap();
        let report = PatternClassifier::new(catalog).classify(&flat(3)).unwrap();

        assert_eq!(report.signals.len(), 1);
        assert_eq!(report.signals[0].name, "OK");
        assert_eq!(
            report.failures,
            vec![
                DetectorFailure {
                    name: "BROKEN".into(),
                    error: DetectorError::failed("boom"),
                },
                DetectorFailure {
                    name: "SHORT".into(),
                    error: DetectorError::LengthMismatch { expected: 3, got: 1 },
                },
            ]
        );
    }

    #[test]
    #[should_panic(expected = "backend crashed")]
    fn test_panicking_detector_is_not_caught() {
        let catalog = CatalogBuilder::new()
            .add("OK", constant(100))
            .add(
                "CRASH",
                FnDetector::new(|_: &Series| -> std::result::Result<Vec<i32>, DetectorError> {
                    panic!("backend crashed")
                }),
            )
            .build()
            .unwrap();
        let _ = PatternClassifier::new(catalog).classify(&flat(3));
    }

    #[test]
    fn test_lookback_and_strength_order() {
        let catalog = CatalogBuilder::new()
            .add("WEAK", constant(80))
            .add("STRONG", constant(-100))
            .build()
            .unwrap();
        let config = ClassifierConfig {
            lookback: Period::new(2).unwrap(),
            min_strength: None,
            order: SignalOrder::Strength,
        };
        let report = PatternClassifier::new(catalog).with_config(config).classify(&flat(5)).unwrap();

        let got: Vec<_> = report.signals.iter().map(|s| (s.name.as_str(), s.time)).collect();
        assert_eq!(
            got,
            vec![("STRONG", 1_003), ("STRONG", 1_004), ("WEAK", 1_003), ("WEAK", 1_004)]
        );
    }

    #[test]
    fn test_min_strength_filter() {
        let catalog = CatalogBuilder::new()
            .add("WEAK", constant(80))
            .add("STRONG", constant(100))
            .build()
            .unwrap();
        let config = ClassifierConfig {
            min_strength: Some(100),
            ..Default::default()
        };
        let report = PatternClassifier::new(catalog).with_config(config).classify(&flat(2)).unwrap();
        assert_eq!(report.signals.len(), 1);
        assert_eq!(report.signals[0].name, "STRONG");
    }

    #[test]
    fn test_lookback_longer_than_series() {
        let config = ClassifierConfig {
            lookback: Period::new(50).unwrap(),
            ..Default::default()
        };
        let catalog = CatalogBuilder::new().add("ALL", constant(100)).build().unwrap();
        let report = PatternClassifier::new(catalog).with_config(config).classify(&flat(3)).unwrap();
        assert_eq!(report.signals.len(), 3);
    }

    #[test]
    fn test_rejects_empty_input() {
        let bars: Vec<Bar> = vec![];
        let err = detect_patterns(&bars).unwrap_err();
        assert_eq!(err, AnalysisError::EmptyInput);
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_empty_series_yields_empty_report() {
        let report = PatternClassifier::default().classify_series(&Series::default());
        assert_eq!(report, PatternReport::default());
    }

    #[test]
    fn test_single_bar_is_enough() {
        let report = detect_patterns(&flat(1)).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_signal_json_shape() {
        let signal = PatternSignal::from_raw(42, "HAMMER", 100).unwrap();
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"time": 42, "name": "HAMMER", "type": "bullish", "strength": 100})
        );
    }

    #[test]
    fn test_config_from_json() {
        let config: ClassifierConfig =
            serde_json::from_str(r#"{"lookback": 3, "order": "strength"}"#).unwrap();
        assert_eq!(config.lookback.get(), 3);
        assert_eq!(config.order, SignalOrder::Strength);
        assert_eq!(config.min_strength, None);
    }
}
