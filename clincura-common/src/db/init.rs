//! Database initialization
//!
//! Creates the database on first run and upgrades existing ones in place.
//! All `create_*_table` functions use CREATE TABLE IF NOT EXISTS and are safe
//! to call repeatedly; column additions for older databases live in
//! [`crate::db::migrations`].

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Well-known bootstrap actor. Seeded as an application admin so a fresh
/// install can provision genes, workflow pairs, and real actors.
pub const SYSTEM_ADMIN_GUID: &str = "00000000-0000-0000-0000-000000000001";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_connection(&pool).await?;
    create_tables(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;
    seed_system_admin(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema. Test use only; production always
/// goes through [`init_database`].
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    create_tables(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;
    seed_system_admin(&pool).await?;

    Ok(pool)
}

async fn configure_connection(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create all tables. Idempotent.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_actors_table(pool).await?;
    create_genes_table(pool).await?;
    create_workflow_pairs_table(pool).await?;
    create_scopes_table(pool).await?;
    create_scope_memberships_table(pool).await?;
    create_curations_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the actors table
///
/// Platform identities. Authentication is external; this table is the local
/// registry the trusted actor header resolves against.
pub async fn create_actors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actors (
            guid TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            email TEXT UNIQUE,
            is_admin INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the genes table
pub async fn create_genes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genes (
            guid TEXT PRIMARY KEY,
            symbol TEXT NOT NULL UNIQUE,
            hgnc_id TEXT UNIQUE,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the workflow_pairs table
pub async fn create_workflow_pairs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflow_pairs (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            precuration_schema TEXT NOT NULL,
            curation_schema TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the scopes table
pub async fn create_scopes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scopes (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            visibility TEXT NOT NULL DEFAULT 'private' CHECK (visibility IN ('public', 'private')),
            active INTEGER NOT NULL DEFAULT 1,
            default_workflow_pair_id TEXT REFERENCES workflow_pairs(guid),
            created_by TEXT NOT NULL REFERENCES actors(guid),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the scope_memberships table
///
/// One membership row per (scope, actor) pair; re-inviting an actor updates
/// the existing row rather than inserting a second one.
pub async fn create_scope_memberships_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scope_memberships (
            guid TEXT PRIMARY KEY,
            scope_id TEXT NOT NULL REFERENCES scopes(guid) ON DELETE CASCADE,
            actor_id TEXT NOT NULL REFERENCES actors(guid) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('viewer', 'reviewer', 'curator', 'admin')),
            status TEXT NOT NULL DEFAULT 'invited' CHECK (status IN ('invited', 'accepted')),
            active INTEGER NOT NULL DEFAULT 1,
            invited_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            accepted_at TIMESTAMP,
            invited_by TEXT REFERENCES actors(guid),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (scope_id, actor_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_memberships_scope_id ON scope_memberships(scope_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_memberships_actor_id ON scope_memberships(actor_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the curations table
///
/// Holds both precurations and curations, distinguished by `workflow_stage`.
/// Computed columns are derived by the scoring engine; clients never write
/// them directly.
pub async fn create_curations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS curations (
            guid TEXT PRIMARY KEY,
            gene_id TEXT NOT NULL REFERENCES genes(guid),
            scope_id TEXT NOT NULL REFERENCES scopes(guid),
            workflow_pair_id TEXT NOT NULL REFERENCES workflow_pairs(guid),
            precuration_id TEXT REFERENCES curations(guid),
            disease_name TEXT NOT NULL,
            mode_of_inheritance TEXT,
            evidence_data TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'submitted', 'in_review', 'approved', 'rejected', 'archived')),
            workflow_stage TEXT NOT NULL CHECK (workflow_stage IN ('precuration', 'curation', 'review')),
            is_draft INTEGER NOT NULL DEFAULT 1,
            lock_version INTEGER NOT NULL DEFAULT 0,
            computed_scores TEXT,
            computed_verdict TEXT,
            computed_summary TEXT,
            auto_saved_at TIMESTAMP,
            created_by TEXT NOT NULL REFERENCES actors(guid),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_by TEXT REFERENCES actors(guid),
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            submitted_by TEXT REFERENCES actors(guid),
            submitted_at TIMESTAMP,
            approved_by TEXT REFERENCES actors(guid),
            approved_at TIMESTAMP,
            review_notes TEXT,
            CHECK (lock_version >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_curations_scope_id ON curations(scope_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_curations_gene_id ON curations(gene_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_curations_scope_status ON curations(scope_id, status)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_curations_precuration_id ON curations(precuration_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the bootstrap admin actor if missing
async fn seed_system_admin(pool: &SqlitePool) -> Result<()> {
    // Timestamps are bound explicitly; the column defaults use SQLite's
    // CURRENT_TIMESTAMP format, which the RFC 3339 row mappers reject
    let now = crate::time::to_db(&crate::time::now());
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO actors (guid, display_name, is_admin, active, created_at, updated_at)
        VALUES (?, 'System Administrator', 1, 1, ?, ?)
        "#,
    )
    .bind(SYSTEM_ADMIN_GUID)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}
