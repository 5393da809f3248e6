//! Tenant access gate
//!
//! Every handler that touches a scope-owned entity resolves the caller's
//! *effective role* here before doing anything else; nothing downstream
//! re-checks. Application admins resolve to `Admin` in every scope, so this
//! is the single point where that capability is granted. All denials are the
//! same uniform `Forbidden`, so a caller cannot distinguish "no such record"
//! in a hidden scope from "insufficient role".

use clincura_common::models::{Actor, Scope, ScopeVisibility};
use clincura_common::{Error, Result, ScopeRole};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::memberships;

/// The caller's resolved capability within one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveRole {
    /// Application admin, treated as scope admin everywhere
    AppAdmin,
    /// Role held through an accepted, active membership
    Scoped(ScopeRole),
}

impl EffectiveRole {
    /// Whether this capability meets the required scope role
    pub fn at_least(&self, required: ScopeRole) -> bool {
        match self {
            EffectiveRole::AppAdmin => true,
            EffectiveRole::Scoped(role) => role.at_least(required),
        }
    }
}

/// Resolve the actor's effective role in a scope, if they have one.
///
/// None means the actor has no standing in the scope at all (no membership,
/// pending invite, or deactivated grant).
pub async fn effective_role(
    pool: &SqlitePool,
    actor: &Actor,
    scope_id: &Uuid,
) -> Result<Option<EffectiveRole>> {
    if actor.is_admin {
        return Ok(Some(EffectiveRole::AppAdmin));
    }

    match memberships::get_membership(pool, scope_id, &actor.guid).await? {
        Some(m) if m.grants_access() => Ok(Some(EffectiveRole::Scoped(m.role))),
        _ => Ok(None),
    }
}

/// Require at least `required` in the scope, returning the resolved role.
pub async fn authorize(
    pool: &SqlitePool,
    actor: &Actor,
    scope_id: &Uuid,
    required: ScopeRole,
) -> Result<EffectiveRole> {
    match effective_role(pool, actor, scope_id).await? {
        Some(role) if role.at_least(required) => Ok(role),
        _ => Err(Error::Forbidden),
    }
}

/// Require read access to a scope-owned entity.
///
/// Membership grants reads at any role; public scopes are additionally
/// readable by every known actor.
pub async fn authorize_read(pool: &SqlitePool, actor: &Actor, scope: &Scope) -> Result<()> {
    if scope.visibility == ScopeVisibility::Public {
        return Ok(());
    }

    match effective_role(pool, actor, &scope.guid).await? {
        Some(_) => Ok(()),
        None => Err(Error::Forbidden),
    }
}

/// The error for a record the caller cannot see.
///
/// Admins see everything, so a miss is an honest NotFound; for everyone else
/// the answer is the same Forbidden a hidden record would produce, keeping
/// unknown ids and hidden ids indistinguishable.
pub fn not_visible(actor: &Actor, what: &str) -> Error {
    if actor.is_admin {
        Error::NotFound(what.to_string())
    } else {
        Error::Forbidden
    }
}
