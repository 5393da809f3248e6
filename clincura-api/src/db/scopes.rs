//! Scope queries
//!
//! Scopes are the tenant boundary. Creation writes the scope row and the
//! creator's admin membership in one transaction so no scope can exist
//! without an admin, and cascade deletion removes the scope's curations in
//! the same transaction (memberships follow via ON DELETE CASCADE).

use clincura_common::models::{Actor, Scope, ScopeMembership, ScopeVisibility};
use clincura_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::memberships::insert_membership_tx;

/// Map a database row to a Scope
pub fn scope_from_row(row: &SqliteRow) -> Result<Scope> {
    let guid: String = row.get("guid");
    let visibility: String = row.get("visibility");
    let default_pair: Option<String> = row.get("default_workflow_pair_id");
    let created_by: String = row.get("created_by");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Scope {
        guid: Uuid::parse_str(&guid)?,
        name: row.get("name"),
        description: row.get("description"),
        visibility: ScopeVisibility::from_str(&visibility).ok_or_else(|| {
            Error::Internal(format!("Unknown scope visibility in database: {}", visibility))
        })?,
        active: row.get("active"),
        default_workflow_pair_id: default_pair.as_deref().map(Uuid::parse_str).transpose()?,
        created_by: Uuid::parse_str(&created_by)?,
        created_at: time::parse_db(&created_at)?,
        updated_at: time::parse_db(&updated_at)?,
    })
}

/// Insert a scope row inside an open transaction
pub async fn insert_scope_tx(tx: &mut sqlx::Transaction<'_, Sqlite>, scope: &Scope) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scopes
            (guid, name, description, visibility, active,
             default_workflow_pair_id, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(scope.guid.to_string())
    .bind(&scope.name)
    .bind(&scope.description)
    .bind(scope.visibility.as_str())
    .bind(scope.active)
    .bind(scope.default_workflow_pair_id.map(|g| g.to_string()))
    .bind(scope.created_by.to_string())
    .bind(time::to_db(&scope.created_at))
    .bind(time::to_db(&scope.updated_at))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Create a scope together with its creator's admin membership.
///
/// Both rows commit or neither does; a failed membership insert rolls the
/// scope back.
pub async fn create_scope_with_admin(
    pool: &SqlitePool,
    scope: &Scope,
    admin_membership: &ScopeMembership,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    insert_scope_tx(&mut tx, scope).await?;
    insert_membership_tx(&mut tx, admin_membership).await?;

    tx.commit().await?;
    Ok(())
}

/// Load a scope by guid
pub async fn get_scope(pool: &SqlitePool, guid: &Uuid) -> Result<Option<Scope>> {
    let row = sqlx::query("SELECT * FROM scopes WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(scope_from_row).transpose()
}

/// Load a scope by name
pub async fn get_scope_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Scope>> {
    let row = sqlx::query("SELECT * FROM scopes WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(scope_from_row).transpose()
}

/// Persist mutable scope fields (description, visibility, active, default pair)
pub async fn update_scope(pool: &SqlitePool, scope: &Scope) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE scopes
        SET description = ?, visibility = ?, active = ?,
            default_workflow_pair_id = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&scope.description)
    .bind(scope.visibility.as_str())
    .bind(scope.active)
    .bind(scope.default_workflow_pair_id.map(|g| g.to_string()))
    .bind(time::to_db(&scope.updated_at))
    .bind(scope.guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// List scopes visible to the actor, alphabetically.
///
/// Application admins see every scope; everyone else sees public scopes plus
/// the scopes where they hold an accepted, active membership.
pub async fn list_scopes_visible(pool: &SqlitePool, actor: &Actor) -> Result<Vec<Scope>> {
    let rows = if actor.is_admin {
        sqlx::query("SELECT * FROM scopes ORDER BY name ASC")
            .fetch_all(pool)
            .await?
    } else {
        sqlx::query(
            r#"
            SELECT * FROM scopes s
            WHERE s.visibility = 'public'
               OR EXISTS (
                    SELECT 1 FROM scope_memberships m
                    WHERE m.scope_id = s.guid
                      AND m.actor_id = ?
                      AND m.status = 'accepted'
                      AND m.active = 1
               )
            ORDER BY s.name ASC
            "#,
        )
        .bind(actor.guid.to_string())
        .fetch_all(pool)
        .await?
    };

    rows.iter().map(scope_from_row).collect()
}

/// Count curations belonging to a scope
pub async fn count_curations_in_scope(pool: &SqlitePool, scope_id: &Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM curations WHERE scope_id = ?")
        .bind(scope_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Delete a scope and everything it owns.
///
/// Curations are deleted explicitly in the same transaction; memberships
/// follow through the foreign-key cascade on the scope row.
pub async fn delete_scope_cascade(pool: &SqlitePool, scope_id: &Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM curations WHERE scope_id = ?")
        .bind(scope_id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM scopes WHERE guid = ?")
        .bind(scope_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
