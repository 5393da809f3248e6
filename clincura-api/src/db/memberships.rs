//! Scope membership queries
//!
//! A membership grants access only when `status = accepted` and `active = 1`;
//! everything else (pending invites, deactivated grants) is invisible to the
//! access gate. The `(scope_id, actor_id)` pair is unique, so re-inviting a
//! previously deactivated member reuses the existing row.

use clincura_common::models::{MembershipStatus, ScopeMembership};
use clincura_common::{time, Error, Result, ScopeRole};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Map a database row to a ScopeMembership
pub fn membership_from_row(row: &SqliteRow) -> Result<ScopeMembership> {
    let guid: String = row.get("guid");
    let scope_id: String = row.get("scope_id");
    let actor_id: String = row.get("actor_id");
    let role: String = row.get("role");
    let status: String = row.get("status");
    let invited_at: String = row.get("invited_at");
    let accepted_at: Option<String> = row.get("accepted_at");
    let invited_by: Option<String> = row.get("invited_by");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(ScopeMembership {
        guid: Uuid::parse_str(&guid)?,
        scope_id: Uuid::parse_str(&scope_id)?,
        actor_id: Uuid::parse_str(&actor_id)?,
        role: ScopeRole::from_str(&role)
            .ok_or_else(|| Error::Internal(format!("Unknown scope role in database: {}", role)))?,
        status: MembershipStatus::from_str(&status).ok_or_else(|| {
            Error::Internal(format!("Unknown membership status in database: {}", status))
        })?,
        active: row.get("active"),
        invited_at: time::parse_db(&invited_at)?,
        accepted_at: time::parse_db_opt(accepted_at.as_deref())?,
        invited_by: invited_by.as_deref().map(Uuid::parse_str).transpose()?,
        created_at: time::parse_db(&created_at)?,
        updated_at: time::parse_db(&updated_at)?,
    })
}

/// Insert a membership inside an open transaction.
///
/// Used by scope creation, which must write the scope row and the creator's
/// admin membership atomically.
pub async fn insert_membership_tx(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    membership: &ScopeMembership,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scope_memberships
            (guid, scope_id, actor_id, role, status, active,
             invited_at, accepted_at, invited_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(membership.guid.to_string())
    .bind(membership.scope_id.to_string())
    .bind(membership.actor_id.to_string())
    .bind(membership.role.as_str())
    .bind(membership.status.as_str())
    .bind(membership.active)
    .bind(time::to_db(&membership.invited_at))
    .bind(membership.accepted_at.as_ref().map(time::to_db))
    .bind(membership.invited_by.map(|g| g.to_string()))
    .bind(time::to_db(&membership.created_at))
    .bind(time::to_db(&membership.updated_at))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Load the membership linking an actor to a scope, if any
pub async fn get_membership(
    pool: &SqlitePool,
    scope_id: &Uuid,
    actor_id: &Uuid,
) -> Result<Option<ScopeMembership>> {
    let row = sqlx::query("SELECT * FROM scope_memberships WHERE scope_id = ? AND actor_id = ?")
        .bind(scope_id.to_string())
        .bind(actor_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(membership_from_row).transpose()
}

/// Insert or refresh an invitation.
///
/// If a row already exists for the pair (previously deactivated or an older
/// invite), it is reset to a fresh pending invite at the given role.
pub async fn upsert_invite(pool: &SqlitePool, membership: &ScopeMembership) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scope_memberships
            (guid, scope_id, actor_id, role, status, active,
             invited_at, accepted_at, invited_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)
        ON CONFLICT(scope_id, actor_id) DO UPDATE SET
            role = excluded.role,
            status = 'invited',
            active = excluded.active,
            invited_at = excluded.invited_at,
            accepted_at = NULL,
            invited_by = excluded.invited_by,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(membership.guid.to_string())
    .bind(membership.scope_id.to_string())
    .bind(membership.actor_id.to_string())
    .bind(membership.role.as_str())
    .bind(membership.status.as_str())
    .bind(membership.active)
    .bind(time::to_db(&membership.invited_at))
    .bind(membership.invited_by.map(|g| g.to_string()))
    .bind(time::to_db(&membership.created_at))
    .bind(time::to_db(&membership.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Accept a pending invitation.
///
/// Returns false when no acceptable invite exists for the pair (already
/// accepted, administratively deactivated, or never invited). The `active`
/// flag is an administrative kill-switch and is left untouched; acceptance
/// makes the grant effective through `ScopeMembership::grants_access`.
pub async fn accept_invite(
    pool: &SqlitePool,
    scope_id: &Uuid,
    actor_id: &Uuid,
    now: &DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scope_memberships
        SET status = 'accepted', accepted_at = ?, updated_at = ?
        WHERE scope_id = ? AND actor_id = ? AND status = 'invited' AND active = 1
        "#,
    )
    .bind(time::to_db(now))
    .bind(time::to_db(now))
    .bind(scope_id.to_string())
    .bind(actor_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Overwrite a member's role and active flag.
///
/// Returns false when the pair has no membership row.
pub async fn set_member_role_and_active(
    pool: &SqlitePool,
    scope_id: &Uuid,
    actor_id: &Uuid,
    role: ScopeRole,
    active: bool,
    now: &DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scope_memberships
        SET role = ?, active = ?, updated_at = ?
        WHERE scope_id = ? AND actor_id = ?
        "#,
    )
    .bind(role.as_str())
    .bind(active)
    .bind(time::to_db(now))
    .bind(scope_id.to_string())
    .bind(actor_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// List all memberships of a scope, admins first
pub async fn list_members(pool: &SqlitePool, scope_id: &Uuid) -> Result<Vec<ScopeMembership>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM scope_memberships
        WHERE scope_id = ?
        ORDER BY CASE role
            WHEN 'admin' THEN 0
            WHEN 'curator' THEN 1
            WHEN 'reviewer' THEN 2
            ELSE 3
        END, created_at ASC
        "#,
    )
    .bind(scope_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(membership_from_row).collect()
}

/// Count the scope's accepted, active admins other than the given actor.
///
/// The no-adminless-scope invariant: demoting or deactivating a member is
/// refused when this count is zero and the member is the last such admin.
pub async fn count_other_active_admins(
    pool: &SqlitePool,
    scope_id: &Uuid,
    excluding_actor: &Uuid,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM scope_memberships
        WHERE scope_id = ?
          AND actor_id != ?
          AND role = 'admin'
          AND status = 'accepted'
          AND active = 1
        "#,
    )
    .bind(scope_id.to_string())
    .bind(excluding_actor.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count)
}
