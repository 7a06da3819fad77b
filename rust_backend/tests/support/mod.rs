//! Shared fixtures: a scripted sensor layer and a small route.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::sync::Mutex;

use tetres_tt::config::EngineConfig;
use tetres_tt::models::{
    MergeFlow, Period, RNode, Route, RouteConfig, RouteInfo, Sample, StationSeries,
};
use tetres_tt::moe::{MoeError, MoeProvider, MoeResult, RouteConfigurator};

/// Speeds of the virtual nodes, constant over time.
pub const NODE_SPEEDS: [f64; 8] = [30.0, 35.0, 40.0, 42.0, 44.0, 50.0, 52.0, 60.0];
pub const NODE_DENSITIES: [f64; 8] = [50.0, 48.0, 45.0, 42.0, 38.0, 30.0, 25.0, 20.0];
pub const NODE_FLOWS: [f64; 8] = [3000.0, 3200.0, 3400.0, 3600.0, 3800.0, 3900.0, 3500.0, 3000.0];
pub const NODE_LANES: f64 = 2.0;

/// Station speeds and cumulative travel times.
pub const STATION_SPEEDS: [f64; 3] = [60.0, 50.0, 40.0];
pub const STATION_TT: [f64; 3] = [1.0, 2.5, 4.0];

pub fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

/// 08:00 to 09:00 in 5 minute steps: 12 timesteps.
pub fn morning_period() -> Period {
    Period::new(at(8, 0), at(9, 0), 300).unwrap()
}

pub fn route_info(id: i64, name: &str) -> RouteInfo {
    RouteInfo::new(
        id,
        Route::new(
            name,
            vec![
                RNode::station("S1", 3, 0.0),
                RNode::entrance("E1", 0.4),
                RNode::station("S2", 3, 0.8),
                RNode::exit("X1", 1.2),
                RNode::station("S3", 2, 1.6),
            ],
        ),
    )
}

/// Defaults with one mile between virtual nodes.
pub fn engine_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.travel_time.virtual_node_distance = 1.0;
    config
}

/// Sensor layer answering with constant per-node data.
///
/// Threshold-dependent measures follow the same per-node formulas the
/// snapshot recompute uses, so stored and recomputed values agree.
pub struct FakeMoeProvider {
    node_distance: f64,
    failing: Mutex<HashSet<&'static str>>,
    seen: Mutex<Vec<Route>>,
}

impl FakeMoeProvider {
    pub fn new() -> Self {
        Self {
            node_distance: 1.0,
            failing: Mutex::new(HashSet::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Make the named measure fail.
    pub fn fail_measure(&self, measure: &'static str) {
        self.failing.lock().unwrap().insert(measure);
    }

    /// Routes the provider was called with, one entry per travel-time call.
    pub fn seen_routes(&self) -> Vec<Route> {
        self.seen.lock().unwrap().clone()
    }

    fn check(&self, measure: &'static str) -> MoeResult<()> {
        if self.failing.lock().unwrap().contains(measure) {
            return Err(MoeError::DataUnavailable(format!("no {} data", measure)));
        }
        Ok(())
    }

    fn hours(period: &Period) -> f64 {
        period.interval_hours()
    }

    fn constant(label: &str, value: f64, period: &Period) -> StationSeries {
        StationSeries::new(label, vec![Some(value); period.len()])
    }

    fn per_station(values: &[f64], period: &Period) -> Vec<StationSeries> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Self::constant(&format!("S{}", i + 1), *v, period))
            .collect()
    }

    fn per_node(&self, period: &Period, value: impl Fn(usize) -> f64) -> Vec<StationSeries> {
        (0..NODE_SPEEDS.len())
            .map(|i| Self::constant(&format!("V{}", i), value(i), period))
            .collect()
    }

    fn node_rows(values: &[f64], period: &Period) -> Vec<Vec<Sample>> {
        values.iter().map(|v| vec![Some(*v); period.len()]).collect()
    }

    fn gap(&self, i: usize, lane_capacity: f64, period: &Period) -> f64 {
        (lane_capacity * NODE_LANES - NODE_FLOWS[i]).max(0.0) * self.node_distance * Self::hours(period)
    }
}

impl MoeProvider for FakeMoeProvider {
    fn travel_time(&self, route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>> {
        self.check("tt")?;
        self.seen.lock().unwrap().push(route.clone());
        Ok(Self::per_station(&STATION_TT, period))
    }

    fn speed(&self, _route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>> {
        self.check("speed")?;
        Ok(Self::per_station(&STATION_SPEEDS, period))
    }

    fn vmt(&self, _route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>> {
        self.check("vmt")?;
        Ok(Self::per_station(&[100.0, 120.0, 80.0], period))
    }

    fn vht(&self, _route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>> {
        self.check("vht")?;
        Ok(Self::per_station(&[2.0, 2.5, 2.0], period))
    }

    fn dvh(&self, _route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>> {
        self.check("dvh")?;
        Ok(Self::per_station(&[0.0, 0.5, 1.0], period))
    }

    fn acceleration(&self, _route: &Route, period: &Period) -> MoeResult<Vec<StationSeries>> {
        self.check("acceleration")?;
        Ok(Self::per_station(&[0.0, 1.5, 3.0], period))
    }

    fn lvmt(
        &self,
        _route: &Route,
        period: &Period,
        critical_density: f64,
        lane_capacity: f64,
    ) -> MoeResult<Vec<StationSeries>> {
        self.check("lvmt")?;
        Ok(self.per_node(period, |i| {
            if NODE_DENSITIES[i] > critical_density {
                self.gap(i, lane_capacity, period)
            } else {
                0.0
            }
        }))
    }

    fn uvmt(
        &self,
        _route: &Route,
        period: &Period,
        critical_density: f64,
        lane_capacity: f64,
    ) -> MoeResult<Vec<StationSeries>> {
        self.check("uvmt")?;
        Ok(self.per_node(period, |i| {
            if NODE_DENSITIES[i] <= critical_density {
                self.gap(i, lane_capacity, period)
            } else {
                0.0
            }
        }))
    }

    fn cm(
        &self,
        _route: &Route,
        period: &Period,
        congestion_threshold_speed: f64,
    ) -> MoeResult<Vec<StationSeries>> {
        self.check("cm")?;
        Ok(self.per_node(period, |i| {
            if NODE_SPEEDS[i] < congestion_threshold_speed {
                self.node_distance
            } else {
                0.0
            }
        }))
    }

    fn cmh(
        &self,
        _route: &Route,
        period: &Period,
        congestion_threshold_speed: f64,
    ) -> MoeResult<Vec<StationSeries>> {
        self.check("cmh")?;
        Ok(self.per_node(period, |i| {
            if NODE_SPEEDS[i] < congestion_threshold_speed {
                self.node_distance * Self::hours(period)
            } else {
                0.0
            }
        }))
    }

    fn mrf(&self, route: &Route, period: &Period) -> MoeResult<Vec<MergeFlow>> {
        self.check("mrf")?;
        Ok(route
            .rnodes
            .iter()
            .filter(|n| n.is_entrance() || n.is_exit())
            .map(|n| MergeFlow {
                rnode: Some(n.clone()),
                data: vec![Some(if n.is_entrance() { 40.0 } else { 25.0 }); period.len()],
            })
            .collect())
    }

    fn total_flow_with_virtual_nodes(&self, _route: &Route, period: &Period) -> MoeResult<Vec<Vec<Sample>>> {
        self.check("raw_flow")?;
        Ok(Self::node_rows(&NODE_FLOWS, period))
    }

    fn speed_with_virtual_nodes(&self, _route: &Route, period: &Period) -> MoeResult<Vec<Vec<Sample>>> {
        self.check("raw_speed")?;
        Ok(Self::node_rows(&NODE_SPEEDS, period))
    }

    fn density_with_virtual_nodes(&self, _route: &Route, period: &Period) -> MoeResult<Vec<Vec<Sample>>> {
        self.check("raw_density")?;
        Ok(Self::node_rows(&NODE_DENSITIES, period))
    }

    fn lanes_with_virtual_nodes(&self, _route: &Route, _period: &Period) -> MoeResult<Vec<f64>> {
        self.check("raw_lanes")?;
        Ok(vec![NODE_LANES; NODE_SPEEDS.len()])
    }
}

/// Lane configurator that either reports closures or fails.
pub struct FakeConfigurator {
    pub fail: bool,
}

impl FakeConfigurator {
    pub fn working() -> Self {
        Self { fail: false }
    }

    pub fn broken() -> Self {
        Self { fail: true }
    }
}

impl RouteConfigurator for FakeConfigurator {
    fn rebuild_lane_configuration(&self, route: &Route) -> MoeResult<RouteConfig> {
        if self.fail {
            return Err(MoeError::Configuration(format!("no lane data for '{}'", route.name)));
        }
        Ok(RouteConfig {
            lanes: route.rnodes.iter().map(|n| n.lanes.saturating_sub(1)).collect(),
        })
    }
}
