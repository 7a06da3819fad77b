//! Computes every measure of a route for one period in a single pass.

use log::{debug, warn};
use thiserror::Error;

use super::provider::{MoeError, MoeProvider, MoeResult, RouteConfigurator};
use crate::models::{MergeFlow, MoeThresholds, Period, Route, Sample, StationSeries};
use crate::snapshot::SnapshotInputs;

/// A measure could not be obtained; nothing from the bundle is usable.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to compute {measure} for route '{route}': {source}")]
pub struct ComputationFailure {
    pub route: String,
    pub measure: &'static str,
    #[source]
    pub source: MoeError,
}

/// Per-station results for every measure, plus the raw virtual-node data
/// snapshots are cut from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricBundle {
    pub tt: Vec<StationSeries>,
    pub speed: Vec<StationSeries>,
    pub vmt: Vec<StationSeries>,
    pub vht: Vec<StationSeries>,
    pub dvh: Vec<StationSeries>,
    pub lvmt: Vec<StationSeries>,
    pub uvmt: Vec<StationSeries>,
    pub cm: Vec<StationSeries>,
    pub cmh: Vec<StationSeries>,
    pub acceleration: Vec<StationSeries>,
    pub raw_flow: Vec<Vec<Sample>>,
    pub raw_speed: Vec<Vec<Sample>>,
    pub raw_density: Vec<Vec<Sample>>,
    pub raw_lanes: Vec<f64>,
    pub mrf: Vec<MergeFlow>,
}

impl MetricBundle {
    /// Route travel time: the cumulative series of the last station.
    pub fn route_travel_time(&self) -> Option<&StationSeries> {
        self.tt.last()
    }

    pub fn snapshot_inputs(&self) -> SnapshotInputs<'_> {
        SnapshotInputs {
            raw_flow: &self.raw_flow,
            raw_speed: &self.raw_speed,
            raw_density: &self.raw_density,
            raw_lanes: &self.raw_lanes,
            station_speeds: &self.speed,
            merge_flows: &self.mrf,
        }
    }
}

/// Copy `route` and apply the current lane configuration to the copy.
///
/// A failed rebuild is not fatal; the unmodified copy is used.
fn working_route<C: RouteConfigurator + ?Sized>(configurator: &C, route: &Route) -> Route {
    let mut working = route.clone();
    match configurator.rebuild_lane_configuration(&working) {
        Ok(cfg) => working.config = Some(cfg),
        Err(e) => warn!(
            "Exception occurred while creating route config for route '{}': {}",
            route.name, e
        ),
    }
    working
}

/// Compute every measure of `route` over `period` with `thresholds`.
///
/// The canonical `route` is never modified.
pub fn compute<P, C>(
    provider: &P,
    configurator: &C,
    route: &Route,
    period: &Period,
    thresholds: &MoeThresholds,
) -> Result<MetricBundle, ComputationFailure>
where
    P: MoeProvider + ?Sized,
    C: RouteConfigurator + ?Sized,
{
    let r = working_route(configurator, route);
    let fail = |measure: &'static str| {
        let route = route.name.clone();
        move |source: MoeError| ComputationFailure {
            route,
            measure,
            source,
        }
    };
    let get = |measure: &'static str, res: MoeResult<Vec<StationSeries>>| res.map_err(fail(measure));

    debug!("computing measures for route '{}' over {}", r.name, period);
    let bundle = MetricBundle {
        tt: get("tt", provider.travel_time(&r, period))?,
        speed: get("speed", provider.speed(&r, period))?,
        vmt: get("vmt", provider.vmt(&r, period))?,
        vht: get("vht", provider.vht(&r, period))?,
        dvh: get("dvh", provider.dvh(&r, period))?,
        lvmt: get(
            "lvmt",
            provider.lvmt(&r, period, thresholds.critical_density, thresholds.lane_capacity),
        )?,
        uvmt: get(
            "uvmt",
            provider.uvmt(&r, period, thresholds.critical_density, thresholds.lane_capacity),
        )?,
        cm: get("cm", provider.cm(&r, period, thresholds.congestion_threshold_speed))?,
        cmh: get("cmh", provider.cmh(&r, period, thresholds.congestion_threshold_speed))?,
        acceleration: get("acceleration", provider.acceleration(&r, period))?,
        raw_flow: provider
            .total_flow_with_virtual_nodes(&r, period)
            .map_err(fail("raw_flow_data"))?,
        raw_speed: provider
            .speed_with_virtual_nodes(&r, period)
            .map_err(fail("raw_speed_data"))?,
        raw_density: provider
            .density_with_virtual_nodes(&r, period)
            .map_err(fail("raw_density_data"))?,
        raw_lanes: provider
            .lanes_with_virtual_nodes(&r, period)
            .map_err(fail("raw_lane_data"))?,
        mrf: provider.mrf(&r, period).map_err(fail("mrf"))?,
    };
    Ok(bundle)
}
