//! Scope membership endpoints
//!
//! Invitations are two-step: a scope admin invites, the invited actor
//! accepts. Role changes and deactivation guard the no-adminless-scope
//! invariant: the last accepted, active admin can neither be demoted nor
//! deactivated.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use clincura_common::models::{Actor, MembershipStatus, ScopeMembership};
use clincura_common::{time, Error, ScopeRole};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db;
use crate::{access, AppState};

/// POST /scopes/:id/members request body
#[derive(Debug, Deserialize)]
pub struct InviteMember {
    pub actor_id: Uuid,
    pub role: ScopeRole,
}

/// PUT /scopes/:id/members/:actor_id request body (replace semantics)
#[derive(Debug, Deserialize)]
pub struct UpdateMember {
    pub role: ScopeRole,
    pub active: bool,
}

/// GET /scopes/:id/members response
#[derive(Debug, Serialize)]
pub struct MemberListResponse {
    pub members: Vec<ScopeMembership>,
}

/// POST /scopes/:id/members
///
/// Scope admin invites an actor. Re-inviting a deactivated or lapsed member
/// resets their row to a fresh pending invite.
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(scope_id): Path<Uuid>,
    Json(body): Json<InviteMember>,
) -> Result<(StatusCode, Json<ScopeMembership>), ApiError> {
    let scope = db::scopes::get_scope(&state.db, &scope_id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "scope"))?;
    access::authorize(&state.db, &actor, &scope.guid, ScopeRole::Admin).await?;

    let invitee = db::actors::get_active_actor(&state.db, &body.actor_id)
        .await?
        .ok_or_else(|| {
            Error::InvalidReference(format!("actor {} does not exist", body.actor_id))
        })?;

    if let Some(existing) = db::memberships::get_membership(&state.db, &scope.guid, &invitee.guid).await? {
        if existing.grants_access() {
            return Err(Error::Validation(format!(
                "actor {} is already a member of the scope",
                invitee.guid
            ))
            .into());
        }
    }

    let now = time::now();
    let invite = ScopeMembership {
        guid: Uuid::new_v4(),
        scope_id: scope.guid,
        actor_id: invitee.guid,
        role: body.role,
        status: MembershipStatus::Invited,
        active: true,
        invited_at: now,
        accepted_at: None,
        invited_by: Some(actor.guid),
        created_at: now,
        updated_at: now,
    };
    db::memberships::upsert_invite(&state.db, &invite).await?;

    // Reload: on re-invite the original row (and guid) survives the upsert
    let stored = db::memberships::get_membership(&state.db, &scope.guid, &invitee.guid)
        .await?
        .ok_or_else(|| Error::Internal("invitation row missing after upsert".to_string()))?;

    info!(
        scope = %scope.guid,
        invitee = %invitee.guid,
        role = body.role.as_str(),
        "member invited"
    );

    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /scopes/:id/members/accept
///
/// The invited actor accepts their own pending invitation.
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(scope_id): Path<Uuid>,
) -> Result<Json<ScopeMembership>, ApiError> {
    let accepted =
        db::memberships::accept_invite(&state.db, &scope_id, &actor.guid, &time::now()).await?;
    if !accepted {
        // Same answer whether the scope is unknown, the invite was revoked,
        // or none ever existed
        return Err(Error::Validation(
            "no pending invitation for this scope".to_string(),
        )
        .into());
    }

    let membership = db::memberships::get_membership(&state.db, &scope_id, &actor.guid)
        .await?
        .ok_or_else(|| Error::Internal("membership row missing after accept".to_string()))?;

    info!(scope = %scope_id, member = %actor.guid, "invitation accepted");

    Ok(Json(membership))
}

/// PUT /scopes/:id/members/:actor_id
///
/// Scope admin changes a member's role or deactivates the grant.
pub async fn update_member(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((scope_id, member_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateMember>,
) -> Result<Json<ScopeMembership>, ApiError> {
    let scope = db::scopes::get_scope(&state.db, &scope_id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "scope"))?;
    access::authorize(&state.db, &actor, &scope.guid, ScopeRole::Admin).await?;

    let existing = db::memberships::get_membership(&state.db, &scope.guid, &member_id)
        .await?
        .ok_or_else(|| Error::NotFound("membership".to_string()))?;

    // No-adminless-scope invariant
    let losing_admin =
        existing.role == ScopeRole::Admin && (body.role != ScopeRole::Admin || !body.active);
    if existing.grants_access() && losing_admin {
        let others =
            db::memberships::count_other_active_admins(&state.db, &scope.guid, &member_id).await?;
        if others == 0 {
            return Err(Error::Validation(
                "cannot demote or deactivate the last admin of the scope".to_string(),
            )
            .into());
        }
    }

    let changed = db::memberships::set_member_role_and_active(
        &state.db,
        &scope.guid,
        &member_id,
        body.role,
        body.active,
        &time::now(),
    )
    .await?;
    if !changed {
        return Err(Error::NotFound("membership".to_string()).into());
    }

    let membership = db::memberships::get_membership(&state.db, &scope.guid, &member_id)
        .await?
        .ok_or_else(|| Error::Internal("membership row missing after update".to_string()))?;

    info!(
        scope = %scope.guid,
        member = %member_id,
        role = body.role.as_str(),
        active = body.active,
        "membership updated"
    );

    Ok(Json(membership))
}

/// GET /scopes/:id/members
///
/// Member list, visible to any member of the scope.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(scope_id): Path<Uuid>,
) -> Result<Json<MemberListResponse>, ApiError> {
    let scope = db::scopes::get_scope(&state.db, &scope_id)
        .await?
        .ok_or_else(|| access::not_visible(&actor, "scope"))?;
    access::authorize(&state.db, &actor, &scope.guid, ScopeRole::Viewer).await?;

    let members = db::memberships::list_members(&state.db, &scope.guid).await?;
    Ok(Json(MemberListResponse { members }))
}
