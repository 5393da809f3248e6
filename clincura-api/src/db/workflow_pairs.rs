//! Workflow pair registry queries
//!
//! A workflow pair bundles the precuration and curation form schemas a
//! curation is authored against. Only the pair's identity matters here;
//! schema content is opaque JSON rendered by the form UI layer.

use clincura_common::models::WorkflowPair;
use clincura_common::{time, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Map a database row to a WorkflowPair
pub fn workflow_pair_from_row(row: &SqliteRow) -> Result<WorkflowPair> {
    let guid: String = row.get("guid");
    let created_at: String = row.get("created_at");

    Ok(WorkflowPair {
        guid: Uuid::parse_str(&guid)?,
        name: row.get("name"),
        precuration_schema: row.get("precuration_schema"),
        curation_schema: row.get("curation_schema"),
        active: row.get("active"),
        created_at: time::parse_db(&created_at)?,
    })
}

/// Insert a new workflow pair
pub async fn insert_workflow_pair(pool: &SqlitePool, pair: &WorkflowPair) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO workflow_pairs (guid, name, precuration_schema, curation_schema, active, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(pair.guid.to_string())
    .bind(&pair.name)
    .bind(&pair.precuration_schema)
    .bind(&pair.curation_schema)
    .bind(pair.active)
    .bind(time::to_db(&pair.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a workflow pair by guid
pub async fn get_workflow_pair(pool: &SqlitePool, guid: &Uuid) -> Result<Option<WorkflowPair>> {
    let row = sqlx::query("SELECT * FROM workflow_pairs WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(workflow_pair_from_row).transpose()
}

/// Load a workflow pair by name
pub async fn get_workflow_pair_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<WorkflowPair>> {
    let row = sqlx::query("SELECT * FROM workflow_pairs WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(workflow_pair_from_row).transpose()
}

/// List workflow pairs, active first then by name
pub async fn list_workflow_pairs(pool: &SqlitePool) -> Result<Vec<WorkflowPair>> {
    let rows = sqlx::query("SELECT * FROM workflow_pairs ORDER BY active DESC, name ASC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(workflow_pair_from_row).collect()
}
