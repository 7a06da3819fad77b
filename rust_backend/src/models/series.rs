//! Per-station time series returned by the sensor layer.

use serde::{Deserialize, Serialize};

use super::RNode;

/// One sample of a station series. `None` marks a non-numeric sample
/// (no data reported, or not computable).
pub type Sample = Option<f64>;

/// A time series for one station (or virtual node), aligned with the
/// timeline of the period it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    pub label: String,
    pub data: Vec<Sample>,
}

impl StationSeries {
    pub fn new(label: impl Into<String>, data: Vec<Sample>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }

    /// Build a series where every sample is present.
    pub fn from_values(label: impl Into<String>, values: &[f64]) -> Self {
        Self::new(label, values.iter().copied().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `index`, flattening out-of-range and missing samples.
    pub fn at(&self, index: usize) -> Sample {
        self.data.get(index).copied().flatten()
    }
}

/// Ramp flow measured at a merge point.
///
/// `rnode` is `None` when the sensor layer reports a placeholder node that
/// cannot be classified as entrance or exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeFlow {
    pub rnode: Option<RNode>,
    pub data: Vec<Sample>,
}
