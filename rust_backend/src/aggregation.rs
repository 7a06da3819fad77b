//! Spatial aggregation of per-station series into route-level series.
//!
//! Two reductions are provided: [`spatial_average`] gap-fills the
//! station-by-timestep matrix before averaging, [`spatial_total`] sums the
//! raw samples and only drops non-numeric ones.

use thiserror::Error;

use crate::models::StationSeries;

/// Marker an [`Imputation`] leaves in cells it could not estimate.
pub const UNRESOLVED: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("Cannot aggregate an empty station set")]
    EmptyStationSet,

    #[error("Cannot aggregate series with an empty timeline")]
    EmptyTimeline,

    #[error("Series '{label}' has {actual} samples, expected {expected}")]
    RaggedSeries {
        label: String,
        expected: usize,
        actual: usize,
    },
}

pub type AggregationResult<T> = Result<T, AggregationError>;

/// Gap-filling over a station-by-timestep matrix.
///
/// Input cells that are negative are missing. Implementations return a
/// matrix of the same shape in which every missing cell is either estimated
/// or left negative (unresolvable).
pub trait Imputation {
    fn impute(&self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>>;
}

/// Fills a missing cell with the mean of the valid upstream/downstream
/// stations at the same timestep, falling back to the mean of the same
/// station's previous/next timesteps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborImputation;

impl Imputation for NeighborImputation {
    fn impute(&self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let valid = |s: Option<&Vec<f64>>, t: Option<usize>| -> Option<f64> {
            let v = *s?.get(t?)?;
            (v >= 0.0).then_some(v)
        };
        let mean = |vals: [Option<f64>; 2]| -> Option<f64> {
            let found: Vec<f64> = vals.into_iter().flatten().collect();
            if found.is_empty() {
                None
            } else {
                Some(found.iter().sum::<f64>() / found.len() as f64)
            }
        };

        let mut filled = matrix.to_vec();
        for (sidx, row) in matrix.iter().enumerate() {
            for (didx, &value) in row.iter().enumerate() {
                if value >= 0.0 {
                    continue;
                }
                let spatial = mean([
                    valid(sidx.checked_sub(1).and_then(|s| matrix.get(s)), Some(didx)),
                    valid(matrix.get(sidx + 1), Some(didx)),
                ]);
                let temporal = || {
                    mean([
                        valid(Some(row), didx.checked_sub(1)),
                        valid(Some(row), Some(didx + 1)),
                    ])
                };
                filled[sidx][didx] = spatial.or_else(temporal).unwrap_or(UNRESOLVED);
            }
        }
        filled
    }
}

/// Check the station set and return the common timeline length.
fn timeline_len(series_set: &[StationSeries]) -> AggregationResult<usize> {
    let first = series_set.first().ok_or(AggregationError::EmptyStationSet)?;
    let expected = first.len();
    if expected == 0 {
        return Err(AggregationError::EmptyTimeline);
    }
    if let Some(bad) = series_set.iter().find(|s| s.len() != expected) {
        return Err(AggregationError::RaggedSeries {
            label: bad.label.clone(),
            expected,
            actual: bad.len(),
        });
    }
    Ok(expected)
}

/// Route-level average with the default [`NeighborImputation`].
pub fn spatial_average(series_set: &[StationSeries]) -> AggregationResult<Vec<Option<f64>>> {
    spatial_average_with(series_set, &NeighborImputation)
}

/// Route-level average per timestep after gap-filling with `imputation`.
///
/// Stations whose imputed value is negative are left out of the mean. A
/// timestep where every station is left out yields `None`.
pub fn spatial_average_with<I: Imputation + ?Sized>(
    series_set: &[StationSeries],
    imputation: &I,
) -> AggregationResult<Vec<Option<f64>>> {
    let n_data = timeline_len(series_set)?;
    let matrix: Vec<Vec<f64>> = series_set
        .iter()
        .map(|s| s.data.iter().map(|v| v.unwrap_or(UNRESOLVED)).collect())
        .collect();
    let imputed = imputation.impute(&matrix);

    let avgs = (0..n_data)
        .map(|didx| {
            let data: Vec<f64> = imputed
                .iter()
                .filter_map(|row| row.get(didx).copied())
                .filter(|v| *v >= 0.0)
                .collect();
            if data.is_empty() {
                None
            } else {
                Some(data.iter().sum::<f64>() / data.len() as f64)
            }
        })
        .collect();
    Ok(avgs)
}

/// Route-level total per timestep, skipping non-numeric samples.
pub fn spatial_total(series_set: &[StationSeries]) -> AggregationResult<Vec<f64>> {
    let n_data = timeline_len(series_set)?;
    Ok((0..n_data)
        .map(|didx| series_set.iter().filter_map(|s| s.data[didx]).sum())
        .collect())
}
