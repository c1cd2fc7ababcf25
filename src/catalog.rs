//! Detector catalog
//!
//! An immutable, ordered list of named [`SignalDetector`]s handed to the
//! classifier at construction time. Order is significant: it is the order
//! signals are reported in.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
    detectors::{
        CandleRule, DojiDetector, EngulfingDetector, EveningStarDetector, HammerDetector,
        HaramiDetector, MorningStarDetector, PiercingDetector, ShootingStarDetector,
        SignalDetector, ThreeBlackCrowsDetector, ThreeWhiteSoldiersDetector,
    },
    AnalysisError, Result,
};

/// One named capability in a [`Catalog`]
#[derive(Clone)]
pub struct CatalogEntry {
    name: String,
    detector: Arc<dyn SignalDetector>,
}

impl CatalogEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detector(&self) -> &dyn SignalDetector {
        self.detector.as_ref()
    }
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Ordered, validated list of detectors. Cheap to clone.
#[derive(Clone)]
pub struct Catalog {
    entries: Arc<[CatalogEntry]>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// The eight default patterns
    pub fn standard() -> Self {
        Self {
            entries: CatalogBuilder::new().with_defaults().entries.into(),
        }
    }

    /// Defaults plus Harami and Piercing
    pub fn extended() -> Self {
        Self {
            entries: CatalogBuilder::new().with_extended_defaults().entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(CatalogEntry::name).collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`Catalog`]
#[derive(Default)]
pub struct CatalogBuilder {
    entries: Vec<CatalogEntry>,
}

/// Chain `add(name, Default::default())` calls onto a builder.
macro_rules! catalog_defaults {
  ($builder:expr, $($name:literal => $detector:ty),* $(,)?) => {
    $builder$(.add($name, <$detector>::default()))*
  };
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// ENGULFING, HAMMER, SHOOTING_STAR, DOJI, MORNING_STAR, EVENING_STAR,
    /// THREE_WHITE_SOLDIERS, THREE_BLACK_CROWS
    pub fn with_defaults(self) -> Self {
        catalog_defaults!(self,
            "ENGULFING" => EngulfingDetector,
            "HAMMER" => HammerDetector,
            "SHOOTING_STAR" => ShootingStarDetector,
            "DOJI" => DojiDetector,
            "MORNING_STAR" => MorningStarDetector,
            "EVENING_STAR" => EveningStarDetector,
            "THREE_WHITE_SOLDIERS" => ThreeWhiteSoldiersDetector,
            "THREE_BLACK_CROWS" => ThreeBlackCrowsDetector,
        )
    }

    /// Defaults followed by HARAMI and PIERCING
    pub fn with_extended_defaults(self) -> Self {
        catalog_defaults!(self.with_defaults(),
            "HARAMI" => HaramiDetector,
            "PIERCING" => PiercingDetector,
        )
    }

    /// Append a named detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, name: impl Into<String>, detector: impl SignalDetector + 'static) -> Self {
        self.entries.push(CatalogEntry {
            name: name.into(),
            detector: Arc::new(detector),
        });
        self
    }

    /// Append a candle rule under its library id with the `CDL_` prefix stripped
    pub fn add_rule<R: CandleRule + 'static>(self, rule: R) -> Self {
        let id = rule.id();
        let name = id.strip_prefix("CDL_").unwrap_or(id);
        self.add(name, rule)
    }

    /// Build the catalog
    pub fn build(self) -> Result<Catalog> {
        if self.entries.is_empty() {
            return Err(AnalysisError::InvalidConfig("catalog has no detectors".into()));
        }

        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.name.trim().is_empty() {
                return Err(AnalysisError::InvalidConfig("catalog entry with empty name".into()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "duplicate catalog entry {}",
                    entry.name
                )));
            }
        }

        Ok(Catalog {
            entries: self.entries.into(),
        })
    }
}
