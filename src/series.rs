//! Column-oriented view of a bar sequence.
//!
//! Detectors and the level scanner work on parallel per-field arrays rather
//! than on bar records. Building a [`Series`] is the single validation point:
//! once one exists, it is non-empty, chronologically ordered and finite.

use crate::{validate_bars, Bar, Result, OHLCV};

/// Five aligned price/volume columns plus the bar times
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub time: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl Series {
    /// Validate `bars` and reshape them into columns.
    pub fn from_bars<T: OHLCV>(bars: &[T]) -> Result<Self> {
        validate_bars(bars)?;

        let n = bars.len();
        let mut series = Series {
            time: Vec::with_capacity(n),
            open: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
            volume: Vec::with_capacity(n),
        };

        for bar in bars {
            series.time.push(bar.time());
            series.open.push(bar.open());
            series.high.push(bar.high());
            series.low.push(bar.low());
            series.close.push(bar.close());
            series.volume.push(bar.volume());
        }

        Ok(series)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Reassemble the bar at `index`.
    #[inline]
    pub fn bar(&self, index: usize) -> Option<Bar> {
        Some(Bar {
            time: *self.time.get(index)?,
            open: *self.open.get(index)?,
            high: *self.high.get(index)?,
            low: *self.low.get(index)?,
            close: *self.close.get(index)?,
            volume: *self.volume.get(index)?,
        })
    }
}
