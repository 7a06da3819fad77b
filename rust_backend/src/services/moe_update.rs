//! Incremental recompute of threshold-dependent measures.
//!
//! When a route gets new thresholds, CM/CMH and LVMT/UVMT of its stored
//! records are recomputed from their metadata snapshots instead of from the
//! sensor layer. Only values that actually change are written back.

use log::{debug, info, warn};

use super::writes::apply_updates;
use crate::config::EngineConfig;
use crate::db::TravelTimeRepository;
use crate::error::{CalculationError, CalculationResult};
use crate::lock::WriteLock;
use crate::models::{MoeThresholds, Period, RouteId, TravelTimeRecord, TravelTimeUpdate};
use crate::moe::DynamicMoe;
use crate::snapshot::{MetaData, MetaDataError};

/// What one recompute run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeSummary {
    /// Records loaded for the period.
    pub examined: usize,
    /// Records written back.
    pub updated: Vec<i64>,
    /// Records left alone because their snapshot could not be parsed.
    pub skipped_unparsable: usize,
}

fn stage(slot: &mut Option<f64>, old: f64, new: f64) {
    if old != new {
        *slot = Some(new);
    }
}

/// Changes `new` thresholds imply for `record`.
///
/// The returned update is empty when nothing changed. Once any measure is
/// recomputed the snapshot is re-serialized with the new thresholds.
pub fn stage_changes(
    record: &TravelTimeRecord,
    dynamic: &DynamicMoe,
    new: &MoeThresholds,
) -> Result<TravelTimeUpdate, MetaDataError> {
    let mut meta = MetaData::from_json(&record.meta_data)?;
    let old = meta.thresholds();
    let values = &record.values;
    let mut update = TravelTimeUpdate::default();
    let mut recomputed = false;

    if old.speed_input_differs(new) {
        let speed = new.congestion_threshold_speed;
        stage(&mut update.cm, values.cm, dynamic.cm(&meta, speed));
        stage(&mut update.cmh, values.cmh, dynamic.cmh(&meta, speed));
        meta.moe_congestion_threshold_speed = speed;
        recomputed = true;
    }

    if old.density_inputs_differ(new) {
        let (kc, cap) = (new.critical_density, new.lane_capacity);
        stage(&mut update.lvmt, values.lvmt, dynamic.lvmt(&meta, kc, cap));
        stage(&mut update.uvmt, values.uvmt, dynamic.uvmt(&meta, kc, cap));
        meta.moe_critical_density = kc;
        meta.moe_lane_capacity = cap;
        recomputed = true;
    }

    if recomputed {
        update.meta_data = Some(meta.to_json()?);
    }
    Ok(update)
}

/// Recompute the stored records of `route_id` in `period` for `new_thresholds`.
///
/// Records whose snapshot cannot be parsed are logged and skipped. Updates
/// are applied under `lock` and committed once.
pub async fn update_moe_values_a_route<R: TravelTimeRepository + ?Sized>(
    repo: &R,
    config: &EngineConfig,
    period: &Period,
    route_id: RouteId,
    new_thresholds: &MoeThresholds,
    lock: &WriteLock,
) -> CalculationResult<RecomputeSummary> {
    info!("updating MOE values of route {} : {}", route_id, period);
    let records = repo
        .list_by_period(route_id, period)
        .await
        .map_err(|source| {
            warn!("fail to load travel time data for MOE update: {}", source);
            CalculationError::LoadFailed { route_id, source }
        })?;

    let dynamic = config.dynamic_moe(period.interval());
    let mut summary = RecomputeSummary {
        examined: records.len(),
        ..Default::default()
    };
    let mut staged = Vec::new();
    for record in &records {
        match stage_changes(record, &dynamic, new_thresholds) {
            Ok(update) if update.is_empty() => {}
            Ok(update) => {
                debug!("record {} ({}): {:?}", record.id, record.time, update.fields());
                staged.push((record.id, update));
            }
            Err(e) => {
                warn!("skip record {} with unreadable meta data: {}", record.id, e);
                summary.skipped_unparsable += 1;
            }
        }
    }

    if staged.is_empty() {
        info!("no MOE value of route {} changed", route_id);
        return Ok(summary);
    }

    let outcome = {
        let _guard = lock.acquire().await;
        apply_updates(repo, &staged).await
    };
    if let Some(source) = outcome.error {
        return Err(CalculationError::UpdateFailed {
            route_id,
            written: outcome.applied,
            failed: outcome.failed,
            source,
        });
    }
    info!("updated {} records of route {}", outcome.applied.len(), route_id);
    summary.updated = outcome.applied;
    Ok(summary)
}
