//! Repository trait definitions for the stores the engine reads and writes.
//!
//! - [`error`]: Error types for repository operations
//! - [`travel_time`]: Travel-time records (per-year tables)
//! - [`route`]: Route catalog
//! - [`parameters`]: Route-specific MOE parameter overrides
//!
//! Functions that need every store use the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn recompute<R: FullRepository>(repo: &R, route_id: RouteId) -> RepositoryResult<()> {
//!     let params = repo.get_latest_override(route_id).await?;
//!     let rows = repo.list_by_period(route_id, &period).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod parameters;
pub mod route;
pub mod travel_time;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use parameters::MoeParameterRepository;
pub use route::RouteRepository;
pub use travel_time::TravelTimeRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type implementing all three traits.
pub trait FullRepository: TravelTimeRepository + RouteRepository + MoeParameterRepository {}

impl<T> FullRepository for T where T: TravelTimeRepository + RouteRepository + MoeParameterRepository {}
