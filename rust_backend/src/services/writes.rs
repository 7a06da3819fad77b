//! Guarded write sequences shared by the calculator and the recompute engine.

use log::warn;

use crate::db::{RepositoryError, TravelTimeRepository};
use crate::models::{NewTravelTime, TravelTimeUpdate};

/// Result of applying a set of updates followed by one commit.
#[derive(Debug, Default)]
pub(crate) struct UpdateOutcome {
    /// Records durably updated.
    pub applied: Vec<i64>,
    pub failed: usize,
    pub error: Option<RepositoryError>,
}

/// Discard uncommitted writes after a failure. Best effort.
pub(crate) async fn discard<R: TravelTimeRepository + ?Sized>(repo: &R) {
    if let Err(e) = repo.rollback().await {
        warn!("fail to roll back pending travel time writes: {}", e);
    }
}

/// Insert `rows` as one batch and commit. The caller holds the write lock.
pub(crate) async fn insert_batch<R: TravelTimeRepository + ?Sized>(
    repo: &R,
    rows: &[NewTravelTime],
) -> Result<Vec<i64>, RepositoryError> {
    let result: Result<Vec<i64>, RepositoryError> = async {
        let ids = repo.bulk_insert(rows).await?;
        repo.commit().await?;
        Ok(ids)
    }
    .await;
    if result.is_err() {
        discard(repo).await;
    }
    result
}

/// Apply `updates` one record at a time, then commit once. The caller holds
/// the write lock.
///
/// A failing update does not stop the others; a failing commit loses all of
/// them.
pub(crate) async fn apply_updates<R: TravelTimeRepository + ?Sized>(
    repo: &R,
    updates: &[(i64, TravelTimeUpdate)],
) -> UpdateOutcome {
    let mut outcome = UpdateOutcome::default();
    for (id, update) in updates {
        match repo.update(*id, update).await {
            Ok(()) => outcome.applied.push(*id),
            Err(e) => {
                warn!("fail to update travel time record {}: {}", id, e);
                outcome.failed += 1;
                outcome.error = Some(e);
            }
        }
    }
    if let Err(e) = repo.commit().await {
        warn!("fail to commit travel time updates: {}", e);
        discard(repo).await;
        outcome.failed = updates.len();
        outcome.applied.clear();
        outcome.error = Some(e);
    }
    outcome
}
