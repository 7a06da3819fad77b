//! Persistence for travel-time records, the route catalog and MOE
//! parameter overrides.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Batch driver                                           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Services (services/) - Calculator, recompute engine    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! │  - TravelTimeRepository (per-year tables)               │
//! │  - RouteRepository (route catalog)                      │
//! │  - MoeParameterRepository (threshold overrides)         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! Repositories are passed explicitly to every service call; there is no
//! process-wide repository instance.

pub mod repositories;
pub mod repository;

#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
pub use repository::{
    ErrorContext, FullRepository, MoeParameterRepository, RepositoryError, RepositoryResult,
    RouteRepository, TravelTimeRepository,
};
