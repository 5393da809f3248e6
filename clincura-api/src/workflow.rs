//! Workflow transition executor and draft persistence flows
//!
//! A transition request runs through a fixed validation order: (1) the
//! actor's authority for the action, (2) legality of the transition from the
//! record's current (status, stage), (3) stage-specific preconditions. Only
//! then is the write attempted, through the optimistic-lock compare-and-swap;
//! a lost race surfaces as a Conflict carrying the winner's persisted state.
//! The server never merges and never retries.

use clincura_common::evidence::EvidenceData;
use clincura_common::models::{Actor, Curation};
use clincura_common::scoring::{self, ScoreResult};
use clincura_common::workflow::{admin_archive, transition, ActionAuthority, WorkflowAction};
use clincura_common::{time, CurationStatus, Error, Result, ScopeRole, WorkflowStage};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{self, EffectiveRole};
use crate::db;

/// A workflow action request against one curation
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub action: WorkflowAction,
    /// Client-held version; required for submit, ignored elsewhere
    pub lock_version: Option<i64>,
    /// Free-text note recorded on the record when present
    pub notes: Option<String>,
    /// On approving a precuration: spawn the follow-on draft curation
    pub create_curation: bool,
}

/// The applied transition, plus the spawned curation when approval asked for one
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub curation: Curation,
    pub spawned: Option<Curation>,
}

/// Strict draft edit payload
#[derive(Debug, Clone)]
pub struct DraftUpdate {
    pub evidence_data: Value,
    pub disease_name: Option<String>,
    pub mode_of_inheritance: Option<String>,
    pub lock_version: i64,
}

/// Recompute the record's derived fields from its evidence payload.
///
/// Scoring warnings are non-fatal; they are logged here and returned to the
/// caller inside the breakdown so clients can surface them.
pub fn apply_score(rec: &mut Curation) -> Result<ScoreResult> {
    let result = scoring::score_value(&rec.evidence_data);

    for w in &result.warnings {
        warn!(
            curation = %rec.guid,
            bucket = %w.bucket,
            index = w.index,
            "scoring warning: {}",
            w.message
        );
    }

    rec.computed_scores = Some(serde_json::to_value(&result)?);
    rec.computed_verdict = Some(result.classification.as_str().to_string());
    rec.computed_summary = Some(result.summary());
    Ok(result)
}

/// Whether the actor may perform ownership actions on the record:
/// they created it (and still hold standing in the scope), or they are an
/// admin of the owning scope.
fn is_creator_or_scope_admin(
    actor: &Actor,
    rec: &Curation,
    role: Option<EffectiveRole>,
) -> bool {
    let creator = rec.created_by == actor.guid && role.is_some();
    let scope_admin = role.map_or(false, |r| r.at_least(ScopeRole::Admin));
    creator || scope_admin
}

/// Execute a workflow action end to end.
pub async fn execute(
    pool: &SqlitePool,
    actor: &Actor,
    guid: &Uuid,
    req: WorkflowRequest,
) -> Result<WorkflowOutcome> {
    let rec = db::curations::get_curation(pool, guid)
        .await?
        .ok_or_else(|| access::not_visible(actor, "curation"))?;

    // 1. Authority
    let role = access::effective_role(pool, actor, &rec.scope_id).await?;
    let authorized = match req.action.authority() {
        ActionAuthority::CreatorOrScopeAdmin => is_creator_or_scope_admin(actor, &rec, role),
        ActionAuthority::ReviewerOrAbove => {
            role.map_or(false, |r| r.at_least(ScopeRole::Reviewer))
        }
    };
    if !authorized {
        return Err(Error::Forbidden);
    }

    // 2. Transition legality. Application admins may archive from any
    // non-archived state; everyone else follows the table.
    let (new_status, new_stage) = match transition(req.action, rec.status, rec.workflow_stage) {
        Some(next) => next,
        None if req.action == WorkflowAction::Archive && actor.is_admin => {
            admin_archive(rec.status, rec.workflow_stage).ok_or_else(|| {
                Error::Validation("record is already archived".to_string())
            })?
        }
        None => {
            return Err(Error::Validation(format!(
                "cannot {} a {} record at the {} stage",
                req.action.as_str(),
                rec.status.as_str(),
                rec.workflow_stage.as_str()
            )));
        }
    };

    // 3. Preconditions
    let expected_version = match req.action {
        WorkflowAction::Submit => req.lock_version.ok_or_else(|| {
            Error::Validation("lock_version is required to submit".to_string())
        })?,
        _ => rec.lock_version,
    };

    if req.action == WorkflowAction::Submit && rec.workflow_stage == WorkflowStage::Curation {
        // An unparseable payload qualifies nothing
        let qualifies = EvidenceData::from_value(&rec.evidence_data)
            .map(|d| d.has_qualifying_genetic_evidence())
            .unwrap_or(false);
        if !qualifies {
            return Err(Error::Validation(
                "at least one genetic evidence item is required before submission".to_string(),
            ));
        }
    }

    let now = time::now();
    let mut updated = rec.clone();
    updated.status = new_status;
    updated.workflow_stage = new_stage;
    updated.is_draft = new_status == CurationStatus::Draft;
    updated.updated_by = Some(actor.guid);
    updated.updated_at = now;
    updated.lock_version = expected_version + 1;
    if let Some(notes) = &req.notes {
        updated.review_notes = Some(notes.clone());
    }

    match req.action {
        WorkflowAction::Submit => {
            updated.submitted_by = Some(actor.guid);
            updated.submitted_at = Some(now);
            // Relaxed auto-saves may have changed the evidence since the last
            // strict write, so the score is refreshed at submission
            apply_score(&mut updated)?;
        }
        WorkflowAction::Approve => {
            updated.approved_by = Some(actor.guid);
            updated.approved_at = Some(now);
        }
        _ => {}
    }

    let mut tx = pool.begin().await?;
    let won =
        db::curations::persist_with_version_check(&mut tx, &updated, expected_version).await?;
    if !won {
        tx.rollback().await?;
        return match db::curations::get_curation(pool, guid).await? {
            Some(current) => Err(Error::lock_conflict(current, expected_version)),
            None => Err(access::not_visible(actor, "curation")),
        };
    }

    let spawned = if req.action == WorkflowAction::Approve
        && rec.workflow_stage == WorkflowStage::Precuration
        && req.create_curation
    {
        let mut child = Curation {
            guid: Uuid::new_v4(),
            gene_id: rec.gene_id,
            scope_id: rec.scope_id,
            workflow_pair_id: rec.workflow_pair_id,
            precuration_id: Some(rec.guid),
            disease_name: rec.disease_name.clone(),
            mode_of_inheritance: rec.mode_of_inheritance.clone(),
            evidence_data: rec.evidence_data.clone(),
            status: CurationStatus::Draft,
            workflow_stage: WorkflowStage::Curation,
            is_draft: true,
            lock_version: 0,
            computed_scores: None,
            computed_verdict: None,
            computed_summary: None,
            auto_saved_at: None,
            created_by: actor.guid,
            created_at: now,
            updated_by: None,
            updated_at: now,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            review_notes: None,
        };
        apply_score(&mut child)?;
        db::curations::insert_curation_tx(&mut tx, &child).await?;
        Some(child)
    } else {
        None
    };

    tx.commit().await?;

    info!(
        curation = %updated.guid,
        action = req.action.as_str(),
        from_status = rec.status.as_str(),
        to_status = updated.status.as_str(),
        stage = updated.workflow_stage.as_str(),
        lock_version = updated.lock_version,
        spawned = spawned.is_some(),
        "workflow transition applied"
    );

    Ok(WorkflowOutcome {
        curation: updated,
        spawned,
    })
}

/// Strict draft edit: full payload replacement under the optimistic lock,
/// with scores recomputed on success.
pub async fn update_draft(
    pool: &SqlitePool,
    actor: &Actor,
    guid: &Uuid,
    upd: DraftUpdate,
) -> Result<Curation> {
    let rec = db::curations::get_curation(pool, guid)
        .await?
        .ok_or_else(|| access::not_visible(actor, "curation"))?;

    let role = access::effective_role(pool, actor, &rec.scope_id).await?;
    if !is_creator_or_scope_admin(actor, &rec, role) {
        return Err(Error::Forbidden);
    }

    // Submitted and later records are read-only outside workflow actions
    if rec.status != CurationStatus::Draft {
        return Err(Error::Validation(format!(
            "only draft records can be edited ({} is {})",
            rec.guid,
            rec.status.as_str()
        )));
    }

    let mut updated = rec.clone();
    updated.evidence_data = upd.evidence_data;
    if let Some(disease_name) = upd.disease_name {
        updated.disease_name = disease_name;
    }
    if let Some(moi) = upd.mode_of_inheritance {
        updated.mode_of_inheritance = Some(moi);
    }
    apply_score(&mut updated)?;
    updated.updated_by = Some(actor.guid);
    updated.updated_at = time::now();
    updated.lock_version = upd.lock_version + 1;

    let mut tx = pool.begin().await?;
    let won =
        db::curations::persist_with_version_check(&mut tx, &updated, upd.lock_version).await?;
    if !won {
        tx.rollback().await?;
        return match db::curations::get_curation(pool, guid).await? {
            Some(current) => Err(Error::lock_conflict(current, upd.lock_version)),
            None => Err(access::not_visible(actor, "curation")),
        };
    }
    tx.commit().await?;

    Ok(updated)
}

/// Relaxed auto-save: the evidence always lands on a draft, whether or not
/// the client's version is current.
///
/// With a matching version this behaves like a strict write (version bump);
/// with a stale or omitted version the payload is still persisted and
/// `auto_saved_at` stamped, but the version counter stays put. Scores are
/// never recomputed here since the payload may be mid-edit.
pub async fn save_draft(
    pool: &SqlitePool,
    actor: &Actor,
    guid: &Uuid,
    evidence_data: Value,
    lock_version: Option<i64>,
) -> Result<Curation> {
    let rec = db::curations::get_curation(pool, guid)
        .await?
        .ok_or_else(|| access::not_visible(actor, "curation"))?;

    let role = access::effective_role(pool, actor, &rec.scope_id).await?;
    if !is_creator_or_scope_admin(actor, &rec, role) {
        return Err(Error::Forbidden);
    }

    if rec.status != CurationStatus::Draft {
        return Err(Error::Validation(
            "only draft records accept auto-save".to_string(),
        ));
    }

    let now = time::now();

    if let Some(version) = lock_version {
        let won = db::curations::save_draft_versioned(
            pool,
            guid,
            &evidence_data,
            &actor.guid,
            &now,
            version,
        )
        .await?;
        if won {
            return reload(pool, actor, guid).await;
        }
        // Version went stale between read and write, or was stale to begin
        // with; fall through to the unversioned save
    }

    let saved =
        db::curations::save_draft_unversioned(pool, guid, &evidence_data, &actor.guid, &now)
            .await?;
    if !saved {
        // The record left draft (or vanished) between read and write
        return match db::curations::get_curation(pool, guid).await? {
            Some(_) => Err(Error::Validation(
                "only draft records accept auto-save".to_string(),
            )),
            None => Err(access::not_visible(actor, "curation")),
        };
    }

    reload(pool, actor, guid).await
}

async fn reload(pool: &SqlitePool, actor: &Actor, guid: &Uuid) -> Result<Curation> {
    db::curations::get_curation(pool, guid)
        .await?
        .ok_or_else(|| access::not_visible(actor, "curation"))
}
