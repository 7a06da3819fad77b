//! Travel-time and MOE (measures of effectiveness) computation for freeway
//! routes.
//!
//! For a route and a time period the crate computes, per timestep, travel
//! time, average speed, VMT, VHT, DVH, LVMT, UVMT, CM, CMH and acceleration,
//! attaches a metadata snapshot of the raw virtual-node samples and stores
//! the rows through a repository. When a route's thresholds change later,
//! the threshold-dependent measures are recomputed from the snapshots alone.
//!
//! ## Layout
//!
//! - [`aggregation`]: station series to route-level series
//! - [`moe`]: sensor-layer contract, measure computation, snapshot formulas
//! - [`snapshot`]: per-timestep metadata snapshots
//! - [`services`]: the route-period calculator and the recompute engine
//! - [`db`]: repository traits and the in-memory implementation
//! - [`config`]: TOML configuration
//! - [`lock`]: the write-exclusion scope shared by all writers

pub mod aggregation;
pub mod config;
pub mod db;
pub mod error;
pub mod lock;
pub mod models;
pub mod moe;
pub mod services;
pub mod snapshot;

pub use config::EngineConfig;
pub use error::{CalculationError, CalculationResult};
pub use lock::WriteLock;
pub use models::{MoeThresholds, Period, Route, RouteId, RouteInfo};
pub use services::{
    calculate_a_route, calculate_all_routes, update_moe_values_a_route, CalculationMode,
    EngineContext,
};
