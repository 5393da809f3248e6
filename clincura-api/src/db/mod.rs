//! Database access layer for clincura-api
//!
//! One module per entity. All functions take a pool (or an open transaction
//! for multi-statement flows) and return the shared typed `Result`; enum
//! columns round-trip through the `as_str`/`from_str` pairs on the shared
//! enums, timestamps through the RFC 3339 helpers in `clincura_common::time`.

pub mod actors;
pub mod curations;
pub mod genes;
pub mod memberships;
pub mod scopes;
pub mod workflow_pairs;
