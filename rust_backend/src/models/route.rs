//! Routes, their detector stations and lane configuration.

use serde::{Deserialize, Serialize};

use super::RouteId;

/// Role of a roadway node along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RNodeKind {
    Station,
    Entrance,
    Exit,
}

/// A roadway node (detector station, entrance or exit ramp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RNode {
    pub name: String,
    pub kind: RNodeKind,
    pub lanes: u32,
    /// Distance from the route origin in miles.
    pub offset: f64,
}

impl RNode {
    pub fn station(name: impl Into<String>, lanes: u32, offset: f64) -> Self {
        Self {
            name: name.into(),
            kind: RNodeKind::Station,
            lanes,
            offset,
        }
    }

    pub fn entrance(name: impl Into<String>, offset: f64) -> Self {
        Self {
            name: name.into(),
            kind: RNodeKind::Entrance,
            lanes: 1,
            offset,
        }
    }

    pub fn exit(name: impl Into<String>, offset: f64) -> Self {
        Self {
            name: name.into(),
            kind: RNodeKind::Exit,
            lanes: 1,
            offset,
        }
    }

    pub fn is_entrance(&self) -> bool {
        self.kind == RNodeKind::Entrance
    }

    pub fn is_exit(&self) -> bool {
        self.kind == RNodeKind::Exit
    }
}

/// Lane configuration derived from a route's nodes, e.g. after applying
/// lane closures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Open lanes per node, index-aligned with `Route::rnodes`.
    pub lanes: Vec<u32>,
}

/// Ordered sequence of roadway nodes with an optional lane configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub rnodes: Vec<RNode>,
    #[serde(default)]
    pub config: Option<RouteConfig>,
}

impl Route {
    pub fn new(name: impl Into<String>, rnodes: Vec<RNode>) -> Self {
        Self {
            name: name.into(),
            rnodes,
            config: None,
        }
    }

    /// Detector stations only, in route order.
    pub fn stations(&self) -> impl Iterator<Item = &RNode> {
        self.rnodes.iter().filter(|n| n.kind == RNodeKind::Station)
    }

    /// Route length in miles, from the first to the last node.
    pub fn length(&self) -> f64 {
        match (self.rnodes.first(), self.rnodes.last()) {
            (Some(first), Some(last)) => last.offset - first.offset,
            _ => 0.0,
        }
    }
}

/// A catalogued travel-time route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub id: RouteId,
    pub name: String,
    pub route: Route,
}

impl RouteInfo {
    pub fn new(id: impl Into<RouteId>, route: Route) -> Self {
        Self {
            id: id.into(),
            name: route.name.clone(),
            route,
        }
    }
}
