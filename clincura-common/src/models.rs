//! Database models
//!
//! Plain row structs shared by the services. Enum-valued columns are stored
//! as TEXT and parsed through the enums' `from_str`/`as_str` pairs; the
//! evidence payload and computed score breakdown stay as raw JSON values so
//! the store remains schema-agnostic (the scoring engine parses the payload
//! into its typed tree on demand).

use crate::roles::ScopeRole;
use crate::workflow::{CurationStatus, WorkflowStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A registered platform identity.
///
/// Authentication/token issuance is external; the services resolve the
/// upstream-supplied actor id against this table. `is_admin` marks
/// application-level administrators, who bypass scope membership checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub guid: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Local registry row for a curatable gene.
///
/// Ontology lookup services are external; creates validate gene references
/// against this table so failures produce a clean client-facing error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gene {
    pub guid: Uuid,
    pub symbol: String,
    pub hgnc_id: Option<String>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A precuration/curation schema pair.
///
/// Only the pair's identity matters to this core; schema content is rendered
/// by the form UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPair {
    pub guid: Uuid,
    pub name: String,
    pub precuration_schema: String,
    pub curation_schema: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Scope visibility flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeVisibility {
    /// Readable by any known actor, membership required only for writes
    Public,
    /// Readable and writable by members only
    Private,
}

impl ScopeVisibility {
    /// Parse visibility from its database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(ScopeVisibility::Public),
            "private" => Some(ScopeVisibility::Private),
            _ => None,
        }
    }

    /// Canonical database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeVisibility::Public => "public",
            ScopeVisibility::Private => "private",
        }
    }
}

/// A tenant boundary. All curations and memberships hang off a scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub visibility: ScopeVisibility,
    pub active: bool,
    /// When set, every curation created in this scope must use this pair
    pub default_workflow_pair_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership acceptance state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Invited,
    Accepted,
}

impl MembershipStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "invited" => Some(MembershipStatus::Invited),
            "accepted" => Some(MembershipStatus::Accepted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Invited => "invited",
            MembershipStatus::Accepted => "accepted",
        }
    }
}

/// The (actor, scope, role) relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeMembership {
    pub guid: Uuid,
    pub scope_id: Uuid,
    pub actor_id: Uuid,
    pub role: ScopeRole,
    pub status: MembershipStatus,
    pub active: bool,
    pub invited_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopeMembership {
    /// A membership grants scope access only when active and accepted.
    /// Every access check goes through this predicate.
    pub fn grants_access(&self) -> bool {
        self.active && self.status == MembershipStatus::Accepted
    }
}

/// A precuration or curation record.
///
/// Records at `workflow_stage = precuration` are precurations; records at
/// `curation`/`review` are curations (optionally linked to the precuration
/// they were spawned from via `precuration_id`). The computed fields are
/// derived by the scoring engine and never writable by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curation {
    pub guid: Uuid,
    pub gene_id: Uuid,
    pub scope_id: Uuid,
    pub workflow_pair_id: Uuid,
    pub precuration_id: Option<Uuid>,
    pub disease_name: String,
    pub mode_of_inheritance: Option<String>,
    /// Opaque structured evidence payload, stored as JSON
    pub evidence_data: Value,
    pub status: CurationStatus,
    pub workflow_stage: WorkflowStage,
    pub is_draft: bool,
    /// Optimistic-lock version counter, starts at 0 and only increases
    pub lock_version: i64,
    pub computed_scores: Option<Value>,
    pub computed_verdict: Option<String>,
    pub computed_summary: Option<String>,
    pub auto_saved_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
}

impl Curation {
    /// Whether the record is a precuration (vs. a full curation)
    pub fn is_precuration(&self) -> bool {
        self.workflow_stage == WorkflowStage::Precuration
    }
}
