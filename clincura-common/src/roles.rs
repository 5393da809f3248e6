//! Scope role hierarchy
//!
//! Roles are strictly ordered: each role carries every capability of the
//! roles below it. Authorization checks therefore reduce to a single
//! "at least this role" comparison instead of per-capability lookups.

use serde::{Deserialize, Serialize};

/// Role held by an actor within one scope.
///
/// Ordering (derived from declaration order) is the capability order:
/// `Viewer < Reviewer < Curator < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeRole {
    /// Read-only access to the scope's curations
    Viewer,
    /// Viewer plus review actions (start review, approve, reject)
    Reviewer,
    /// Reviewer plus create/edit/submit/archive of curations
    Curator,
    /// Curator plus scope administration (members, settings)
    Admin,
}

impl ScopeRole {
    /// Parse a role from its database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(ScopeRole::Viewer),
            "reviewer" => Some(ScopeRole::Reviewer),
            "curator" => Some(ScopeRole::Curator),
            "admin" => Some(ScopeRole::Admin),
            _ => None,
        }
    }

    /// Canonical database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeRole::Viewer => "viewer",
            ScopeRole::Reviewer => "reviewer",
            ScopeRole::Curator => "curator",
            ScopeRole::Admin => "admin",
        }
    }

    /// Human-readable name for UI display
    pub fn display_name(&self) -> &'static str {
        match self {
            ScopeRole::Viewer => "Viewer",
            ScopeRole::Reviewer => "Reviewer",
            ScopeRole::Curator => "Curator",
            ScopeRole::Admin => "Admin",
        }
    }

    /// True when this role grants at least the capabilities of `required`
    pub fn at_least(&self, required: ScopeRole) -> bool {
        *self >= required
    }

    /// All roles in ascending capability order
    pub fn all_variants() -> Vec<ScopeRole> {
        vec![
            ScopeRole::Viewer,
            ScopeRole::Reviewer,
            ScopeRole::Curator,
            ScopeRole::Admin,
        ]
    }
}
