//! Route-period travel-time calculation.
//!
//! Runs once per route per period: resolves the thresholds of the route,
//! computes every measure through the sensor layer, aggregates them to route
//! level, attaches a metadata snapshot to each timestep and reconciles the
//! rows with what is already stored.

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::collections::HashMap;

use super::writes::{apply_updates, discard, insert_batch};
use crate::aggregation::{spatial_average, spatial_total, AggregationResult};
use crate::config::EngineConfig;
use crate::db::{FullRepository, MoeParameterRepository, TravelTimeRepository};
use crate::error::{CalculationError, CalculationResult};
use crate::lock::WriteLock;
use crate::models::{
    MoeThresholds, MoeValues, NewTravelTime, Period, RouteId, RouteInfo, StationSeries,
    TravelTimeUpdate,
};
use crate::moe::{self, MetricBundle, MoeProvider, RouteConfigurator};
use crate::snapshot;

/// Everything a calculation needs besides its arguments.
pub struct EngineContext<'a, R: ?Sized> {
    pub repo: &'a R,
    pub moe: &'a dyn MoeProvider,
    pub configurator: &'a dyn RouteConfigurator,
    pub config: &'a EngineConfig,
}

impl<'a, R: ?Sized> EngineContext<'a, R> {
    pub fn new(
        repo: &'a R,
        moe: &'a dyn MoeProvider,
        configurator: &'a dyn RouteConfigurator,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            repo,
            moe,
            configurator,
            config,
        }
    }
}

/// How computed rows are reconciled with stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalculationMode {
    /// Delete the stored rows of the period first, then insert everything.
    #[default]
    Replace,
    /// Update rows whose `(route_id, time)` already exists, insert the rest.
    CreateOrUpdate,
}

/// Result of one route within [`calculate_all_routes`].
#[derive(Debug)]
pub struct RouteOutcome {
    pub route_id: RouteId,
    pub route_name: String,
    pub result: CalculationResult<Vec<i64>>,
}

impl RouteOutcome {
    pub fn is_done(&self) -> bool {
        self.result.is_ok()
    }
}

/// Thresholds for `route_id`: its latest override, else the system defaults.
///
/// A failing parameter store is logged and treated as "no override".
pub async fn resolve_thresholds<R: MoeParameterRepository + ?Sized>(
    repo: &R,
    defaults: &MoeThresholds,
    route_id: RouteId,
) -> MoeThresholds {
    match repo.get_latest_override(route_id).await {
        Ok(Some(params)) => params.thresholds,
        Ok(None) => *defaults,
        Err(e) => {
            warn!(
                "fail to fetch the latest MOE parameter for route {}, using defaults: {}",
                route_id, e
            );
            *defaults
        }
    }
}

/// Run the calculator for every route in the catalog (replace mode).
///
/// A failing route is recorded in its outcome and does not stop the loop.
pub async fn calculate_all_routes<R: FullRepository + ?Sized>(
    ctx: &EngineContext<'_, R>,
    period: &Period,
    lock: &WriteLock,
) -> CalculationResult<Vec<RouteOutcome>> {
    info!("calculating travel time : {}", period);
    let routes = ctx
        .repo
        .list_routes()
        .await
        .map_err(CalculationError::RouteCatalog)?;

    let total = routes.len();
    let mut outcomes = Vec::with_capacity(total);
    for (ridx, ttri) in routes.iter().enumerate() {
        info!(
            "({}/{}) calculating travel time for {}({}) : {}",
            ridx + 1,
            total,
            ttri.name,
            ttri.id,
            period
        );
        let result = calculate_a_route(ctx, period, ttri, CalculationMode::Replace, lock).await;
        outcomes.push(RouteOutcome {
            route_id: ttri.id,
            route_name: ttri.name.clone(),
            result,
        });
    }
    Ok(outcomes)
}

/// Compute and store the travel-time rows of one route over `period`.
///
/// # Returns
/// * `Ok(ids)` - Records inserted or updated; empty when nothing was written
/// * `Err(CalculationError)` - The run failed; see the variant for which
///   side effects were already applied
pub async fn calculate_a_route<R: FullRepository + ?Sized>(
    ctx: &EngineContext<'_, R>,
    period: &Period,
    ttri: &RouteInfo,
    mode: CalculationMode,
    lock: &WriteLock,
) -> CalculationResult<Vec<i64>> {
    let repo = ctx.repo;
    let route_id = ttri.id;

    let existing = match mode {
        CalculationMode::CreateOrUpdate => load_existing(repo, route_id, period).await?,
        CalculationMode::Replace => {
            let _guard = lock.acquire().await;
            clear_period(repo, route_id, period).await?;
            HashMap::new()
        }
    };

    let thresholds = resolve_thresholds(repo, &ctx.config.moe, route_id).await;
    info!(
        "calculating travel time for route '{}' with critical density {}, lane capacity {}, congestion threshold speed {}",
        ttri.name,
        thresholds.critical_density,
        thresholds.lane_capacity,
        thresholds.congestion_threshold_speed
    );

    let bundle = moe::compute(ctx.moe, ctx.configurator, &ttri.route, period, &thresholds)
        .map_err(|e| {
            warn!("fail to calculate travel time: {}", e);
            CalculationError::from(e)
        })?;
    let rows = build_rows(route_id, period, &bundle, &thresholds)?;

    let mut creatable = Vec::new();
    let mut updatable = Vec::new();
    for row in rows {
        match existing.get(&(row.route_id, row.time)) {
            Some(id) => updatable.push((*id, TravelTimeUpdate::from_row(&row))),
            None => creatable.push(row),
        }
    }
    debug!(
        "route {}: {} rows to insert, {} rows to update",
        route_id,
        creatable.len(),
        updatable.len()
    );

    let mut inserted = Vec::new();
    let mut insert_error = None;
    if !creatable.is_empty() {
        let _guard = lock.acquire().await;
        match insert_batch(repo, &creatable).await {
            Ok(ids) => inserted = ids,
            Err(e) => {
                warn!("fail to insert the calculated travel time into database: {}", e);
                insert_error = Some(e);
            }
        }
    }

    let mut updated = Vec::new();
    if !updatable.is_empty() {
        let outcome = {
            let _guard = lock.acquire().await;
            apply_updates(repo, &updatable).await
        };
        if let Some(source) = outcome.error {
            if insert_error.is_none() {
                let mut written = inserted;
                written.extend(outcome.applied);
                return Err(CalculationError::UpdateFailed {
                    route_id,
                    written,
                    failed: outcome.failed,
                    source,
                });
            }
        }
        updated = outcome.applied;
    }

    if let Some(source) = insert_error {
        return Err(CalculationError::InsertFailed {
            route_id,
            updated,
            source,
        });
    }

    inserted.extend(updated);
    Ok(inserted)
}

/// Existing record ids of the period, keyed by `(route_id, time)`.
async fn load_existing<R: TravelTimeRepository + ?Sized>(
    repo: &R,
    route_id: RouteId,
    period: &Period,
) -> CalculationResult<HashMap<(RouteId, NaiveDateTime), i64>> {
    let rows = repo
        .list_by_period(route_id, period)
        .await
        .map_err(|source| {
            warn!("fail to load the existing travel time data: {}", source);
            CalculationError::LoadFailed { route_id, source }
        })?;
    Ok(rows.into_iter().map(|r| (r.key(), r.id)).collect())
}

/// Delete and commit the stored rows of the period. The caller holds the
/// write lock.
async fn clear_period<R: TravelTimeRepository + ?Sized>(
    repo: &R,
    route_id: RouteId,
    period: &Period,
) -> CalculationResult<()> {
    let result = match repo.delete_range(route_id, period.start(), period.end()).await {
        Ok(deleted) => {
            debug!("deleted {} existing rows of route {}", deleted, route_id);
            repo.commit().await
        }
        Err(e) => Err(e),
    };
    if let Err(source) = result {
        warn!("fail to delete the existing travel time data: {}", source);
        discard(repo).await;
        return Err(CalculationError::DeleteFailed { route_id, source });
    }
    Ok(())
}

fn aggregate<T>(
    route_id: RouteId,
    measure: &'static str,
    expected: usize,
    series: &[StationSeries],
    reduce: impl Fn(&[StationSeries]) -> AggregationResult<Vec<T>>,
) -> CalculationResult<Vec<T>> {
    let values = reduce(series).map_err(|source| CalculationError::Aggregation {
        route_id,
        measure,
        source,
    })?;
    if values.len() != expected {
        return Err(CalculationError::Misaligned {
            route_id,
            measure,
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

/// One output row per timestep of `period`.
pub fn build_rows(
    route_id: RouteId,
    period: &Period,
    bundle: &MetricBundle,
    thresholds: &MoeThresholds,
) -> CalculationResult<Vec<NewTravelTime>> {
    let timeline = period.timeline();
    let n = timeline.len();

    let travel_time = bundle
        .route_travel_time()
        .ok_or(CalculationError::MissingTravelTime { route_id })?;
    if travel_time.len() != n {
        return Err(CalculationError::Misaligned {
            route_id,
            measure: "tt",
            expected: n,
            actual: travel_time.len(),
        });
    }

    let speed = aggregate(route_id, "speed", n, &bundle.speed, spatial_average)?;
    let vmt = aggregate(route_id, "vmt", n, &bundle.vmt, spatial_total)?;
    let vht = aggregate(route_id, "vht", n, &bundle.vht, spatial_total)?;
    let dvh = aggregate(route_id, "dvh", n, &bundle.dvh, spatial_total)?;
    let lvmt = aggregate(route_id, "lvmt", n, &bundle.lvmt, spatial_total)?;
    let uvmt = aggregate(route_id, "uvmt", n, &bundle.uvmt, spatial_total)?;
    let cm = aggregate(route_id, "cm", n, &bundle.cm, spatial_total)?;
    let cmh = aggregate(route_id, "cmh", n, &bundle.cmh, spatial_total)?;
    let acceleration = aggregate(route_id, "acceleration", n, &bundle.acceleration, spatial_average)?;

    let inputs = bundle.snapshot_inputs();
    timeline
        .into_iter()
        .enumerate()
        .map(|(index, time)| -> CalculationResult<NewTravelTime> {
            let meta_data = snapshot::build(&inputs, thresholds, index).to_json()?;
            Ok(NewTravelTime {
                route_id,
                time,
                values: MoeValues {
                    tt: travel_time.at(index),
                    speed: speed[index],
                    vmt: vmt[index],
                    vht: vht[index],
                    dvh: dvh[index],
                    lvmt: lvmt[index],
                    uvmt: uvmt[index],
                    cm: cm[index],
                    cmh: cmh[index],
                    acceleration: acceleration[index],
                },
                meta_data,
            })
        })
        .collect()
}
