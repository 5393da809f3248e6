//! Scope endpoints
//!
//! Scope creation writes the scope and the creator's admin membership in one
//! transaction, so every scope has an admin from the moment it exists.
//! Updates use replace semantics: the body carries the full mutable state
//! and omitted optional fields clear their columns.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use clincura_common::models::{
    Actor, MembershipStatus, Scope, ScopeMembership, ScopeVisibility,
};
use clincura_common::{time, Error, ScopeRole};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db;
use crate::{access, AppState};

/// POST /scopes request body
#[derive(Debug, Deserialize)]
pub struct CreateScope {
    pub name: String,
    pub description: Option<String>,
    pub visibility: ScopeVisibility,
    pub default_workflow_pair_id: Option<Uuid>,
}

/// PUT /scopes/:id request body (replace semantics)
#[derive(Debug, Deserialize)]
pub struct UpdateScope {
    pub description: Option<String>,
    pub visibility: ScopeVisibility,
    pub active: bool,
    pub default_workflow_pair_id: Option<Uuid>,
}

/// GET /scopes response
#[derive(Debug, Serialize)]
pub struct ScopeListResponse {
    pub scopes: Vec<Scope>,
}

/// DELETE /scopes/:id query parameters
#[derive(Debug, Deserialize)]
pub struct DeleteScopeQuery {
    #[serde(default)]
    pub confirm_cascade: bool,
}

/// DELETE /scopes/:id response
#[derive(Debug, Serialize)]
pub struct DeleteScopeResponse {
    pub deleted: bool,
    pub curations_deleted: i64,
}

async fn validate_default_pair(
    state: &AppState,
    pair_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(pair_id) = pair_id {
        if db::workflow_pairs::get_workflow_pair(&state.db, &pair_id)
            .await?
            .is_none()
        {
            return Err(Error::InvalidReference(format!(
                "workflow pair {} does not exist",
                pair_id
            ))
            .into());
        }
    }
    Ok(())
}

/// POST /scopes
///
/// Any known actor may create a scope; they become its first admin.
pub async fn create_scope(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateScope>,
) -> Result<(StatusCode, Json<Scope>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("scope name must not be empty".to_string()).into());
    }
    if db::scopes::get_scope_by_name(&state.db, name).await?.is_some() {
        return Err(Error::Validation(format!("scope name already in use: {}", name)).into());
    }
    validate_default_pair(&state, body.default_workflow_pair_id).await?;

    let now = time::now();
    let scope = Scope {
        guid: Uuid::new_v4(),
        name: name.to_string(),
        description: body.description,
        visibility: body.visibility,
        active: true,
        default_workflow_pair_id: body.default_workflow_pair_id,
        created_by: actor.guid,
        created_at: now,
        updated_at: now,
    };
    let membership = ScopeMembership {
        guid: Uuid::new_v4(),
        scope_id: scope.guid,
        actor_id: actor.guid,
        role: ScopeRole::Admin,
        status: MembershipStatus::Accepted,
        active: true,
        invited_at: now,
        accepted_at: Some(now),
        invited_by: None,
        created_at: now,
        updated_at: now,
    };

    db::scopes::create_scope_with_admin(&state.db, &scope, &membership).await?;

    info!(scope = %scope.guid, name = %scope.name, creator = %actor.guid, "scope created");

    Ok((StatusCode::CREATED, Json(scope)))
}

/// GET /scopes
///
/// Public scopes plus the actor's member scopes; application admins see all.
pub async fn list_scopes(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ScopeListResponse>, ApiError> {
    let scopes = db::scopes::list_scopes_visible(&state.db, &actor).await?;
    Ok(Json(ScopeListResponse { scopes }))
}

/// GET /scopes/:id
pub async fn get_scope(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Scope>, ApiError> {
    let scope = db::scopes::get_scope(&state.db, &id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "scope"))?;
    access::authorize_read(&state.db, &actor, &scope).await?;

    Ok(Json(scope))
}

/// PUT /scopes/:id
///
/// Scope admin only. Name and creator are immutable.
pub async fn update_scope(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateScope>,
) -> Result<Json<Scope>, ApiError> {
    let mut scope = db::scopes::get_scope(&state.db, &id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "scope"))?;
    access::authorize(&state.db, &actor, &scope.guid, ScopeRole::Admin).await?;
    validate_default_pair(&state, body.default_workflow_pair_id).await?;

    scope.description = body.description;
    scope.visibility = body.visibility;
    scope.active = body.active;
    scope.default_workflow_pair_id = body.default_workflow_pair_id;
    scope.updated_at = time::now();

    db::scopes::update_scope(&state.db, &scope).await?;

    Ok(Json(scope))
}

/// DELETE /scopes/:id?confirm_cascade=true
///
/// Hard delete of the scope, its memberships, and its curations. Refused
/// without the confirmation flag while curations exist.
pub async fn delete_scope(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteScopeQuery>,
) -> Result<Json<DeleteScopeResponse>, ApiError> {
    let scope = db::scopes::get_scope(&state.db, &id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "scope"))?;
    access::authorize(&state.db, &actor, &scope.guid, ScopeRole::Admin).await?;

    let curation_count = db::scopes::count_curations_in_scope(&state.db, &scope.guid).await?;
    if curation_count > 0 && !query.confirm_cascade {
        return Err(Error::Validation(format!(
            "scope holds {} curation record(s); pass confirm_cascade=true to delete them",
            curation_count
        ))
        .into());
    }

    db::scopes::delete_scope_cascade(&state.db, &scope.guid).await?;

    info!(
        scope = %scope.guid,
        name = %scope.name,
        curations_deleted = curation_count,
        "scope deleted"
    );

    Ok(Json(DeleteScopeResponse {
        deleted: true,
        curations_deleted: curation_count,
    }))
}
