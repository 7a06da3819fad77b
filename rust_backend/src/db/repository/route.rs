//! Route catalog.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{RouteId, RouteInfo};

/// Read access to the catalog of travel-time routes.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// List every catalogued route.
    async fn list_routes(&self) -> RepositoryResult<Vec<RouteInfo>>;

    /// Get a single route.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the route doesn't exist
    async fn get_route(&self, route_id: RouteId) -> RepositoryResult<RouteInfo>;
}
