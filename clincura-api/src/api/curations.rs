//! Curation endpoints
//!
//! Creation validates every reference explicitly (gene, scope, workflow
//! pair, parent precuration) so clients get a clean 422 instead of a raw
//! foreign-key failure. Reads pass the tenant gate; strict edits and
//! workflow actions run through the executor in `crate::workflow`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use clincura_common::models::{Actor, Curation};
use clincura_common::scoring::ScoreResult;
use clincura_common::workflow::WorkflowAction;
use clincura_common::{time, CurationStatus, Error, ScopeRole, WorkflowStage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db::{self, curations::CurationFilters};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::workflow::{self, DraftUpdate, WorkflowRequest};
use crate::{access, AppState};

/// POST /curations request body
#[derive(Debug, Deserialize)]
pub struct CreateCuration {
    pub gene_id: Uuid,
    pub scope_id: Uuid,
    pub workflow_pair_id: Option<Uuid>,
    pub precuration_id: Option<Uuid>,
    pub disease_name: String,
    pub mode_of_inheritance: Option<String>,
    pub evidence_data: Option<Value>,
    pub workflow_stage: WorkflowStage,
}

/// PUT /curations/:id request body (strict path)
#[derive(Debug, Deserialize)]
pub struct UpdateCuration {
    pub evidence_data: Value,
    pub disease_name: Option<String>,
    pub mode_of_inheritance: Option<String>,
    pub lock_version: i64,
}

/// PUT /curations/:id/draft request body (relaxed path)
#[derive(Debug, Deserialize)]
pub struct SaveDraft {
    pub evidence_data: Value,
    pub lock_version: Option<i64>,
}

/// POST /curations/:id/submit request body
#[derive(Debug, Deserialize)]
pub struct SubmitCuration {
    pub lock_version: Option<i64>,
    pub notes: Option<String>,
}

/// Optional note payload for start-review and reopen
#[derive(Debug, Deserialize, Default)]
pub struct TransitionNote {
    pub notes: Option<String>,
}

/// Review outcome selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// POST /curations/:id/review request body
#[derive(Debug, Deserialize)]
pub struct ReviewDecision {
    pub decision: Decision,
    pub notes: Option<String>,
    #[serde(default)]
    pub create_curation: bool,
}

/// Review response: the decided record, plus the spawned draft curation when
/// approving a precuration with `create_curation` set
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub curation: Curation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawned_curation: Option<Curation>,
}

/// POST /curations/:id/score response
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub curation: Curation,
    pub score: ScoreResult,
}

/// GET /curations query parameters
#[derive(Debug, Deserialize)]
pub struct CurationListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub scope_id: Option<Uuid>,
    pub gene_id: Option<Uuid>,
    pub status: Option<String>,
    pub curator_id: Option<Uuid>,
}

fn default_page() -> i64 {
    1
}

/// GET /curations response
#[derive(Debug, Serialize)]
pub struct CurationListResponse {
    pub curations: Vec<Curation>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// POST /curations
///
/// Creates a draft record at the requested stage with scores computed from
/// the initial evidence payload. Requires curator rank in the owning scope.
pub async fn create_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateCuration>,
) -> Result<(StatusCode, Json<Curation>), ApiError> {
    let scope = db::scopes::get_scope(&state.db, &body.scope_id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "scope"))?;

    access::authorize(&state.db, &actor, &scope.guid, ScopeRole::Curator).await?;

    if body.workflow_stage == WorkflowStage::Review {
        return Err(Error::Validation(
            "new records start at the precuration or curation stage".to_string(),
        )
        .into());
    }

    if db::genes::get_gene(&state.db, &body.gene_id).await?.is_none() {
        return Err(Error::InvalidReference(format!(
            "gene {} does not exist",
            body.gene_id
        ))
        .into());
    }

    // Workflow pair: the scope's pinned pair wins; an explicit request must
    // agree with it
    let pair_id = match (scope.default_workflow_pair_id, body.workflow_pair_id) {
        (Some(pinned), None) => pinned,
        (Some(pinned), Some(requested)) if requested == pinned => pinned,
        (Some(pinned), Some(_)) => {
            return Err(Error::Validation(format!(
                "scope {} pins workflow pair {}",
                scope.guid, pinned
            ))
            .into());
        }
        (None, Some(requested)) => requested,
        (None, None) => {
            return Err(Error::Validation(
                "workflow_pair_id is required (scope has no default workflow pair)".to_string(),
            )
            .into());
        }
    };
    let pair = db::workflow_pairs::get_workflow_pair(&state.db, &pair_id)
        .await?
        .ok_or_else(|| {
            Error::InvalidReference(format!("workflow pair {} does not exist", pair_id))
        })?;
    if !pair.active {
        return Err(Error::Validation(format!(
            "workflow pair {} is retired",
            pair.guid
        ))
        .into());
    }

    if let Some(parent_id) = body.precuration_id {
        let valid = db::curations::get_curation(&state.db, &parent_id)
            .await?
            .map(|p| p.scope_id == scope.guid && p.is_precuration())
            .unwrap_or(false);
        if !valid {
            return Err(Error::InvalidReference(format!(
                "precuration {} does not exist in scope {}",
                parent_id, scope.guid
            ))
            .into());
        }
    }

    let now = time::now();
    let mut rec = Curation {
        guid: Uuid::new_v4(),
        gene_id: body.gene_id,
        scope_id: scope.guid,
        workflow_pair_id: pair.guid,
        precuration_id: body.precuration_id,
        disease_name: body.disease_name,
        mode_of_inheritance: body.mode_of_inheritance,
        evidence_data: body.evidence_data.unwrap_or_else(|| json!({})),
        status: CurationStatus::Draft,
        workflow_stage: body.workflow_stage,
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
    workflow::apply_score(&mut rec)?;

    db::curations::insert_curation(&state.db, &rec).await?;

    info!(
        curation = %rec.guid,
        scope = %rec.scope_id,
        gene = %rec.gene_id,
        stage = rec.workflow_stage.as_str(),
        "curation created"
    );

    Ok((StatusCode::CREATED, Json(rec)))
}

/// GET /curations/:id
pub async fn get_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Curation>, ApiError> {
    let rec = db::curations::get_curation(&state.db, &id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "curation"))?;

    let scope = db::scopes::get_scope(&state.db, &rec.scope_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("scope row missing for curation {}", rec.guid)))?;
    access::authorize_read(&state.db, &actor, &scope).await?;

    Ok(Json(rec))
}

/// GET /curations
///
/// Results are always intersected with the actor's visible scopes; no filter
/// can widen that.
pub async fn list_curations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<CurationListQuery>,
) -> Result<Json<CurationListResponse>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            CurationStatus::from_str(s)
                .ok_or_else(|| Error::Validation(format!("unknown status filter: {}", s)))
        })
        .transpose()?;

    let filters = CurationFilters {
        scope_id: query.scope_id,
        gene_id: query.gene_id,
        status,
        curator_id: query.curator_id,
    };

    let total = db::curations::count_curations(&state.db, &actor, &filters).await?;
    let pagination = calculate_pagination(total, query.page);
    let curations =
        db::curations::list_curations(&state.db, &actor, &filters, PAGE_SIZE, pagination.offset)
            .await?;

    Ok(Json(CurationListResponse {
        curations,
        total,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
    }))
}

/// PUT /curations/:id
///
/// Strict optimistic-lock edit; drafts only.
pub async fn update_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCuration>,
) -> Result<Json<Curation>, ApiError> {
    let updated = workflow::update_draft(
        &state.db,
        &actor,
        &id,
        DraftUpdate {
            evidence_data: body.evidence_data,
            disease_name: body.disease_name,
            mode_of_inheritance: body.mode_of_inheritance,
            lock_version: body.lock_version,
        },
    )
    .await?;

    Ok(Json(updated))
}

/// PUT /curations/:id/draft
///
/// Relaxed auto-save; the payload lands whether or not the client's version
/// is current.
pub async fn save_curation_draft(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<SaveDraft>,
) -> Result<Json<Curation>, ApiError> {
    let saved =
        workflow::save_draft(&state.db, &actor, &id, body.evidence_data, body.lock_version)
            .await?;

    Ok(Json(saved))
}

/// POST /curations/:id/submit
pub async fn submit_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<SubmitCuration>,
) -> Result<Json<Curation>, ApiError> {
    let outcome = workflow::execute(
        &state.db,
        &actor,
        &id,
        WorkflowRequest {
            action: WorkflowAction::Submit,
            lock_version: body.lock_version,
            notes: body.notes,
            create_curation: false,
        },
    )
    .await?;

    Ok(Json(outcome.curation))
}

/// POST /curations/:id/review/start
pub async fn start_curation_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Option<Json<TransitionNote>>,
) -> Result<Json<Curation>, ApiError> {
    let notes = body.and_then(|Json(b)| b.notes);
    let outcome = workflow::execute(
        &state.db,
        &actor,
        &id,
        WorkflowRequest {
            action: WorkflowAction::StartReview,
            lock_version: None,
            notes,
            create_curation: false,
        },
    )
    .await?;

    Ok(Json(outcome.curation))
}

/// POST /curations/:id/review
pub async fn review_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewDecision>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let action = match body.decision {
        Decision::Approve => WorkflowAction::Approve,
        Decision::Reject => WorkflowAction::Reject,
    };

    let outcome = workflow::execute(
        &state.db,
        &actor,
        &id,
        WorkflowRequest {
            action,
            lock_version: None,
            notes: body.notes,
            create_curation: body.create_curation,
        },
    )
    .await?;

    Ok(Json(ReviewResponse {
        curation: outcome.curation,
        spawned_curation: outcome.spawned,
    }))
}

/// POST /curations/:id/reopen
pub async fn reopen_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Option<Json<TransitionNote>>,
) -> Result<Json<Curation>, ApiError> {
    let notes = body.and_then(|Json(b)| b.notes);
    let outcome = workflow::execute(
        &state.db,
        &actor,
        &id,
        WorkflowRequest {
            action: WorkflowAction::Reopen,
            lock_version: None,
            notes,
            create_curation: false,
        },
    )
    .await?;

    Ok(Json(outcome.curation))
}

/// DELETE /curations/:id
///
/// Soft delete: archives the record in place. Drafts for the creator or a
/// scope admin; any non-archived state for an application admin.
pub async fn delete_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Curation>, ApiError> {
    let outcome = workflow::execute(
        &state.db,
        &actor,
        &id,
        WorkflowRequest {
            action: WorkflowAction::Archive,
            lock_version: None,
            notes: None,
            create_curation: false,
        },
    )
    .await?;

    Ok(Json(outcome.curation))
}

/// POST /curations/:id/score
///
/// Recomputes the derived fields from the stored evidence and persists them,
/// returning the full breakdown with warnings. The lock version is not
/// advanced: recomputation is idempotent and writes no curator-authored
/// state.
pub async fn score_curation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let rec = db::curations::get_curation(&state.db, &id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "curation"))?;

    access::authorize(&state.db, &actor, &rec.scope_id, ScopeRole::Curator).await?;

    let mut updated = rec;
    let result = workflow::apply_score(&mut updated)?;
    let now = time::now();
    updated.updated_by = Some(actor.guid);
    updated.updated_at = now;

    let scores_value = serde_json::to_value(&result).map_err(Error::from)?;
    db::curations::update_computed_fields(
        &state.db,
        &updated.guid,
        &scores_value,
        result.classification.as_str(),
        &result.summary(),
        &actor.guid,
        &now,
    )
    .await?;

    Ok(Json(ScoreResponse {
        curation: updated,
        score: result,
    }))
}
