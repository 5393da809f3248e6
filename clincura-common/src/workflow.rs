//! Curation workflow state machine
//!
//! A record moves through: draft → submitted → in_review → approved/rejected,
//! with reopen (rejected → draft) and archive as the exits. The machine is a
//! pure transition table; persistence and authorization live in the API layer.
//!
//! Status and stage always change together through [`transition`]. No other
//! code path writes either column.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a precuration or curation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurationStatus {
    /// Editable working copy
    Draft,
    /// Handed off for review, frozen for the submitter
    Submitted,
    /// A reviewer has picked it up
    InReview,
    /// Review passed
    Approved,
    /// Review failed; may be reopened
    Rejected,
    /// Removed from active work; terminal
    Archived,
}

impl CurationStatus {
    /// Parse a status from its database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CurationStatus::Draft),
            "submitted" => Some(CurationStatus::Submitted),
            "in_review" => Some(CurationStatus::InReview),
            "approved" => Some(CurationStatus::Approved),
            "rejected" => Some(CurationStatus::Rejected),
            "archived" => Some(CurationStatus::Archived),
            _ => None,
        }
    }

    /// Canonical database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CurationStatus::Draft => "draft",
            CurationStatus::Submitted => "submitted",
            CurationStatus::InReview => "in_review",
            CurationStatus::Approved => "approved",
            CurationStatus::Rejected => "rejected",
            CurationStatus::Archived => "archived",
        }
    }

    /// Human-readable name for UI display
    pub fn display_name(&self) -> &'static str {
        match self {
            CurationStatus::Draft => "Draft",
            CurationStatus::Submitted => "Submitted",
            CurationStatus::InReview => "In Review",
            CurationStatus::Approved => "Approved",
            CurationStatus::Rejected => "Rejected",
            CurationStatus::Archived => "Archived",
        }
    }

    /// All statuses in lifecycle order
    pub fn all_variants() -> Vec<CurationStatus> {
        vec![
            CurationStatus::Draft,
            CurationStatus::Submitted,
            CurationStatus::InReview,
            CurationStatus::Approved,
            CurationStatus::Rejected,
            CurationStatus::Archived,
        ]
    }

    /// Content edits (strict update, auto-save) are allowed only on drafts
    pub fn is_editable(&self) -> bool {
        matches!(self, CurationStatus::Draft)
    }

    /// Archived records accept no further actions
    pub fn is_terminal(&self) -> bool {
        matches!(self, CurationStatus::Archived)
    }
}

/// Which half of the workflow pair a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Gene/disease entity framing, pre-evidence
    Precuration,
    /// Active evidence collection
    Curation,
    /// Submitted evidence under review
    Review,
}

impl WorkflowStage {
    /// Parse a stage from its database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "precuration" => Some(WorkflowStage::Precuration),
            "curation" => Some(WorkflowStage::Curation),
            "review" => Some(WorkflowStage::Review),
            _ => None,
        }
    }

    /// Canonical database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Precuration => "precuration",
            WorkflowStage::Curation => "curation",
            WorkflowStage::Review => "review",
        }
    }

    /// Human-readable name for UI display
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkflowStage::Precuration => "Precuration",
            WorkflowStage::Curation => "Curation",
            WorkflowStage::Review => "Review",
        }
    }
}

/// Action requested against a record's workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Submit,
    StartReview,
    Approve,
    Reject,
    Reopen,
    Archive,
}

impl WorkflowAction {
    /// Canonical string, used in log fields and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Submit => "submit",
            WorkflowAction::StartReview => "start_review",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::Reopen => "reopen",
            WorkflowAction::Archive => "archive",
        }
    }

    /// Who may perform this action within the record's scope
    pub fn authority(&self) -> ActionAuthority {
        match self {
            WorkflowAction::Submit | WorkflowAction::Reopen | WorkflowAction::Archive => {
                ActionAuthority::CreatorOrScopeAdmin
            }
            WorkflowAction::StartReview | WorkflowAction::Approve | WorkflowAction::Reject => {
                ActionAuthority::ReviewerOrAbove
            }
        }
    }
}

/// Authorization class of a workflow action.
///
/// Ownership actions stay with the record's creator (or a scope admin acting
/// on their behalf); review actions belong to the scope's review bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionAuthority {
    /// The record's creator, or an admin of the owning scope
    CreatorOrScopeAdmin,
    /// Any scope member of at least Reviewer rank
    ReviewerOrAbove,
}

/// Whether a (status, stage) pair is representable at rest.
///
/// Precuration records cycle entirely within the precuration stage. Curation
/// records sit at `curation` while drafted and at `review` from submission
/// onward. Archiving freezes whatever stage the record was in.
pub fn pairing_is_legal(status: CurationStatus, stage: WorkflowStage) -> bool {
    match status {
        CurationStatus::Draft => matches!(
            stage,
            WorkflowStage::Precuration | WorkflowStage::Curation
        ),
        CurationStatus::Submitted
        | CurationStatus::InReview
        | CurationStatus::Approved
        | CurationStatus::Rejected => matches!(
            stage,
            WorkflowStage::Precuration | WorkflowStage::Review
        ),
        CurationStatus::Archived => true,
    }
}

/// The transition table.
///
/// Returns the (status, stage) the record moves to, or `None` when the action
/// is not legal from the current state. Stage-specific preconditions (e.g.
/// minimum evidence before submit) are checked by the executor after this
/// lookup, never inside it.
pub fn transition(
    action: WorkflowAction,
    status: CurationStatus,
    stage: WorkflowStage,
) -> Option<(CurationStatus, WorkflowStage)> {
    use CurationStatus::*;
    use WorkflowAction::*;
    use WorkflowStage::*;

    match (action, status, stage) {
        (Submit, Draft, Curation) => Some((Submitted, Review)),
        (Submit, Draft, Precuration) => Some((Submitted, Precuration)),
        (StartReview, Submitted, s) => Some((InReview, s)),
        (Approve, InReview, s) => Some((Approved, s)),
        (Reject, InReview, s) => Some((Rejected, s)),
        (Reopen, Rejected, Review) => Some((Draft, Curation)),
        (Reopen, Rejected, Precuration) => Some((Draft, Precuration)),
        (Archive, Draft, s) => Some((Archived, s)),
        _ => None,
    }
}

/// Application-admin archive override: any non-archived record may be
/// archived in place, preserving its stage.
pub fn admin_archive(
    status: CurationStatus,
    stage: WorkflowStage,
) -> Option<(CurationStatus, WorkflowStage)> {
    if status.is_terminal() {
        None
    } else {
        Some((CurationStatus::Archived, stage))
    }
}
