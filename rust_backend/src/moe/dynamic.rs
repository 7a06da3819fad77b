//! Threshold-dependent measures recomputed from a stored snapshot.
//!
//! Each virtual node stands for `node_distance` miles of road. Nodes with a
//! missing sample do not contribute.

use crate::snapshot::MetaData;

/// Snapshot-based formulas for CM, CMH, LVMT and UVMT.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicMoe {
    /// Length of the sampling interval in hours.
    pub interval_hours: f64,
    /// Spacing of virtual nodes in miles.
    pub node_distance: f64,
}

impl DynamicMoe {
    pub fn new(interval_seconds: i64, node_distance: f64) -> Self {
        Self {
            interval_hours: interval_seconds as f64 / 3600.0,
            node_distance,
        }
    }

    /// Congested miles: road length whose speed is below the threshold.
    pub fn cm(&self, meta: &MetaData, congestion_threshold_speed: f64) -> f64 {
        let congested = meta
            .speed
            .iter()
            .flatten()
            .filter(|u| **u < congestion_threshold_speed)
            .count();
        congested as f64 * self.node_distance
    }

    /// Congested mile-hours over one interval.
    pub fn cmh(&self, meta: &MetaData, congestion_threshold_speed: f64) -> f64 {
        self.cm(meta, congestion_threshold_speed) * self.interval_hours
    }

    /// VMT lost to congestion: capacity shortfall on nodes above critical density.
    pub fn lvmt(&self, meta: &MetaData, critical_density: f64, lane_capacity: f64) -> f64 {
        self.capacity_gap(meta, lane_capacity, |k| k > critical_density)
    }

    /// Unused capacity on nodes at or below critical density.
    pub fn uvmt(&self, meta: &MetaData, critical_density: f64, lane_capacity: f64) -> f64 {
        self.capacity_gap(meta, lane_capacity, |k| k <= critical_density)
    }

    fn capacity_gap(&self, meta: &MetaData, lane_capacity: f64, select: impl Fn(f64) -> bool) -> f64 {
        meta.flow
            .iter()
            .zip(&meta.density)
            .zip(&meta.lanes)
            .filter_map(|((q, k), lanes)| Some(((*q)?, (*k)?, *lanes)))
            .filter(|(_, k, _)| select(*k))
            .map(|(q, _, lanes)| (lane_capacity * lanes - q).max(0.0))
            .sum::<f64>()
            * self.node_distance
            * self.interval_hours
    }
}
