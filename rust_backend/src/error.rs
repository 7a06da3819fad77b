//! Failure signals of the calculator and the recompute engine.

use thiserror::Error;

use crate::aggregation::AggregationError;
use crate::db::RepositoryError;
use crate::models::RouteId;
use crate::moe::ComputationFailure;
use crate::snapshot::MetaDataError;

pub type CalculationResult<T> = Result<T, CalculationError>;

/// Why a route/period run did not complete.
///
/// Side effects applied before the failure (a committed delete, committed
/// inserts) are not rolled back; a failed run must be redone as a whole.
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("Failed to delete existing travel time data of route {route_id}: {source}")]
    DeleteFailed {
        route_id: RouteId,
        #[source]
        source: RepositoryError,
    },

    #[error("Failed to load existing travel time data of route {route_id}: {source}")]
    LoadFailed {
        route_id: RouteId,
        #[source]
        source: RepositoryError,
    },

    #[error("Failed to list routes: {0}")]
    RouteCatalog(#[source] RepositoryError),

    #[error(transparent)]
    Computation(#[from] ComputationFailure),

    #[error("No travel time series for route {route_id}")]
    MissingTravelTime { route_id: RouteId },

    #[error("Failed to aggregate {measure} of route {route_id}: {source}")]
    Aggregation {
        route_id: RouteId,
        measure: &'static str,
        #[source]
        source: AggregationError,
    },

    #[error("{measure} of route {route_id} has {actual} samples, the period has {expected}")]
    Misaligned {
        route_id: RouteId,
        measure: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    MetaData(#[from] MetaDataError),

    #[error("Failed to insert travel time data of route {route_id}: {source}")]
    InsertFailed {
        route_id: RouteId,
        /// Records updated by the same run despite the failed insert.
        updated: Vec<i64>,
        #[source]
        source: RepositoryError,
    },

    #[error("Failed to update {failed} travel time record(s) of route {route_id}: {source}")]
    UpdateFailed {
        route_id: RouteId,
        /// Records durably written by the same run.
        written: Vec<i64>,
        failed: usize,
        #[source]
        source: RepositoryError,
    },
}
