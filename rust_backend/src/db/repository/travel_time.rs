//! Travel-time record store.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::error::RepositoryResult;
use crate::models::{NewTravelTime, Period, RouteId, TravelTimeRecord, TravelTimeUpdate};

/// Repository trait for the per-year travel-time tables.
///
/// Writes are visible to later reads through the same repository and become
/// durable on [`commit`](TravelTimeRepository::commit). Writers are expected
/// to hold the engine's write lock around every mutating sequence.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TravelTimeRepository: Send + Sync {
    /// List the records of `route_id` whose time falls inside `period`,
    /// ordered by time.
    async fn list_by_period(
        &self,
        route_id: RouteId,
        period: &Period,
    ) -> RepositoryResult<Vec<TravelTimeRecord>>;

    /// Delete the records of `route_id` with `start <= time < end`.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows deleted
    /// * `Err(RepositoryError)` - If the operation fails
    async fn delete_range(
        &self,
        route_id: RouteId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<usize>;

    /// Insert `rows` as one batch.
    ///
    /// The batch is rejected as a whole when any `(route_id, time)` key
    /// already exists or repeats inside the batch.
    ///
    /// # Returns
    /// * `Ok(Vec<i64>)` - Identifiers assigned to the rows, in input order
    /// * `Err(RepositoryError)` - If the operation fails
    async fn bulk_insert(&self, rows: &[NewTravelTime]) -> RepositoryResult<Vec<i64>>;

    /// Apply a field-level update to the record `id`.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the record doesn't exist
    async fn update(&self, id: i64, update: &TravelTimeUpdate) -> RepositoryResult<()>;

    /// Make pending writes durable.
    async fn commit(&self) -> RepositoryResult<()>;

    /// Discard pending writes.
    async fn rollback(&self) -> RepositoryResult<()>;
}
