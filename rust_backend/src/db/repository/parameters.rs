//! Route-specific MOE parameter overrides.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{MoeThresholds, RouteId, RouteMoeParameters};

#[async_trait]
pub trait MoeParameterRepository: Send + Sync {
    /// The most recently registered override of `route_id`, if any.
    async fn get_latest_override(
        &self,
        route_id: RouteId,
    ) -> RepositoryResult<Option<RouteMoeParameters>>;

    /// Register a new override for `route_id`.
    async fn insert_override(
        &self,
        route_id: RouteId,
        thresholds: MoeThresholds,
    ) -> RepositoryResult<RouteMoeParameters>;
}
