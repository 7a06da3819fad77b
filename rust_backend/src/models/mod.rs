pub mod params;
pub mod period;
pub mod route;
pub mod series;
pub mod travel_time;

pub use params::*;
pub use period::*;
pub use route::*;
pub use series::*;
pub use travel_time::*;

/// Identifier of a travel-time route in the route catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct RouteId(pub i64);

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RouteId {
    fn from(v: i64) -> Self {
        RouteId(v)
    }
}

impl From<RouteId> for i64 {
    fn from(r: RouteId) -> Self {
        r.0
    }
}
