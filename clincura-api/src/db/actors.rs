//! Actor registry queries
//!
//! Actors are platform registration records; credential management lives in
//! an external identity provider. The request middleware resolves the
//! upstream-supplied actor id against this table on every call.

use clincura_common::models::Actor;
use clincura_common::{time, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Map a database row to an Actor
pub fn actor_from_row(row: &SqliteRow) -> Result<Actor> {
    let guid: String = row.get("guid");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Actor {
        guid: Uuid::parse_str(&guid)?,
        display_name: row.get("display_name"),
        email: row.get("email"),
        is_admin: row.get("is_admin"),
        active: row.get("active"),
        created_at: time::parse_db(&created_at)?,
        updated_at: time::parse_db(&updated_at)?,
    })
}

/// Insert a new actor record
pub async fn insert_actor(pool: &SqlitePool, actor: &Actor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO actors (guid, display_name, email, is_admin, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor.guid.to_string())
    .bind(&actor.display_name)
    .bind(&actor.email)
    .bind(actor.is_admin)
    .bind(actor.active)
    .bind(time::to_db(&actor.created_at))
    .bind(time::to_db(&actor.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load an actor by guid
pub async fn get_actor(pool: &SqlitePool, guid: &Uuid) -> Result<Option<Actor>> {
    let row = sqlx::query("SELECT * FROM actors WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(actor_from_row).transpose()
}

/// Load an actor by guid, filtering out deactivated accounts.
///
/// Used by the request middleware: a deactivated actor is treated the same
/// as an unknown one.
pub async fn get_active_actor(pool: &SqlitePool, guid: &Uuid) -> Result<Option<Actor>> {
    let row = sqlx::query("SELECT * FROM actors WHERE guid = ? AND active = 1")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(actor_from_row).transpose()
}

/// Check whether an email is already registered
pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actors WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}
