//! Interfaces consumed from the sensor/MOE and route configuration layers.

use thiserror::Error;

use crate::models::{MergeFlow, Period, Route, RouteConfig, Sample, StationSeries};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoeError {
    #[error("Sensor data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Route configuration failed: {0}")]
    Configuration(String),

    #[error("Computation error: {0}")]
    Computation(String),
}

pub type MoeResult<T> = Result<T, MoeError>;

/// Sensor-backed measures of effectiveness.
///
/// Every per-station result carries one sample per timestep of `period`.
/// The `*_with_virtual_nodes` extractors return one row per node of the
/// route including interpolated virtual nodes.
pub trait MoeProvider: Send + Sync {
    /// Cumulative travel time (minutes) from the route origin to each station.
    fn travel_time(&self, route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>>;

    fn speed(&self, route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>>;

    fn vmt(&self, route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>>;

    fn vht(&self, route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>>;

    fn dvh(&self, route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>>;

    fn acceleration(&self, route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>>;

    fn lvmt(
        &self,
        route: &Route,
        period: &Period,
        critical_density: f64,
        lane_capacity: f64,
    ) -> MoeResult<Vec<StationSeries>>;

    fn uvmt(
        &self,
        route: &Route,
        period: &Period,
        critical_density: f64,
        lane_capacity: f64,
    ) -> MoeResult<Vec<StationSeries>>;

    fn cm(
        &self,
        route: &Route,
        period: &Period,
        congestion_threshold_speed: f64,
    ) -> MoeResult<Vec<StationSeries>>;

    fn cmh(
        &self,
        route: &Route,
        period: &Period,
        congestion_threshold_speed: f64,
    ) -> MoeResult<Vec<StationSeries>>;

    /// Ramp flow at the route's merge points.
    fn mrf(&self, route: &Route, period: &Period) -> MoeResult<Vec<MergeFlow>>;

    fn total_flow_with_virtual_nodes(&self, route: &Route, period: &Period) -> MoeResult<Vec<Vec<Sample>>>;

    fn speed_with_virtual_nodes(&self, route: &Route, period: &Period) -> MoeResult<Vec<Vec<Sample>>>;

    fn density_with_virtual_nodes(&self, route: &Route, period: &Period) -> MoeResult<Vec<Vec<Sample>>>;

    /// Static lane count of each node.
    fn lanes_with_virtual_nodes(&self, route: &Route, period: &Period) -> MoeResult<Vec<f64>>;
}

/// Builds a lane configuration reflecting current lane closures.
pub trait RouteConfigurator: Send + Sync {
    fn rebuild_lane_configuration(&self, route: &Route) -> MoeResult<RouteConfig>;
}
