//! Service layer for travel-time calculation and MOE recompute.
//!
//! Services orchestrate repository calls around the metric computation and
//! own every write sequence, always under the caller's [`WriteLock`](crate::lock::WriteLock).

pub mod moe_update;
pub mod travel_time;
pub(crate) mod writes;

pub use moe_update::{stage_changes, update_moe_values_a_route, RecomputeSummary};
pub use travel_time::{
    build_rows, calculate_a_route, calculate_all_routes, resolve_thresholds, CalculationMode,
    EngineContext, RouteOutcome,
};
