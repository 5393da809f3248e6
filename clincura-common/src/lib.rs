//! # ClinCura Common Library
//!
//! Shared code for the ClinCura curation platform:
//! - Database schema, models and migrations
//! - Evidence data model and the clinical validity scoring engine
//! - Curation workflow states and transition rules
//! - Scope role definitions
//! - Configuration loading
//! - Error taxonomy

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod evidence;
pub mod models;
pub mod roles;
pub mod scoring;
pub mod time;
pub mod workflow;

pub use error::{Error, LockConflict, Result};
pub use roles::ScopeRole;
pub use workflow::{CurationStatus, WorkflowStage};
