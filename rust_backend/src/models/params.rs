//! Tunable MOE thresholds.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::RouteId;

/// The three thresholds that threshold-dependent measures are computed with.
///
/// Missing fields take the system defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoeThresholds {
    /// Critical density in vehicles per mile per lane.
    pub critical_density: f64,
    /// Lane capacity in vehicles per hour per lane.
    pub lane_capacity: f64,
    /// Speed (mph) below which a segment counts as congested.
    pub congestion_threshold_speed: f64,
}

impl MoeThresholds {
    pub fn new(critical_density: f64, lane_capacity: f64, congestion_threshold_speed: f64) -> Self {
        Self {
            critical_density,
            lane_capacity,
            congestion_threshold_speed,
        }
    }

    /// Whether LVMT and UVMT must be recomputed when moving to `other`.
    pub fn density_inputs_differ(&self, other: &MoeThresholds) -> bool {
        self.critical_density != other.critical_density || self.lane_capacity != other.lane_capacity
    }

    /// Whether CM and CMH must be recomputed when moving to `other`.
    pub fn speed_input_differs(&self, other: &MoeThresholds) -> bool {
        self.congestion_threshold_speed != other.congestion_threshold_speed
    }
}

impl Default for MoeThresholds {
    fn default() -> Self {
        Self {
            critical_density: 40.0,
            lane_capacity: 2200.0,
            congestion_threshold_speed: 45.0,
        }
    }
}

/// A route-specific threshold override as registered in the parameter store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMoeParameters {
    pub id: i64,
    pub route_id: RouteId,
    pub thresholds: MoeThresholds,
    pub registered_at: NaiveDateTime,
}
