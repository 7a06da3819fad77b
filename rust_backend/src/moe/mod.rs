//! Metric computation over the external sensor/MOE layer.
//!
//! - [`provider`]: traits the sensor layer and the route configuration layer implement
//! - [`engine`]: one-shot computation of every measure for a route and period
//! - [`dynamic`]: recomputation of threshold-dependent measures from a snapshot

pub mod dynamic;
pub mod engine;
pub mod provider;

pub use dynamic::DynamicMoe;
pub use engine::{compute, ComputationFailure, MetricBundle};
pub use provider::{MoeError, MoeProvider, MoeResult, RouteConfigurator};
