//! HTTP API for clincura-api
//!
//! One handler module per resource, a shared error mapper, and the actor
//! resolution middleware. Route wiring lives in [`crate::build_router`].

pub mod actor;
pub mod actors;
pub mod buildinfo;
pub mod curations;
pub mod error;
pub mod genes;
pub mod health;
pub mod memberships;
pub mod scopes;
pub mod workflow_pairs;

pub use actor::actor_middleware;
pub use buildinfo::get_build_info;
pub use error::ApiError;
pub use health::health_routes;
