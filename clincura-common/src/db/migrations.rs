//! Database schema migrations
//!
//! Versioned schema migrations so existing databases upgrade in place without
//! manual intervention or data loss.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - They must remain stable for users upgrading from older versions
//! 2. **Always add new migrations** - Create a new migration function for each schema change
//! 3. **Test migrations** - Verify they work on databases with the old schema
//! 4. **Use ALTER TABLE** - Prefer ALTER TABLE over DROP/CREATE to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Set schema version in database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations. Idempotent; safe to call on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Migration v1: Add auto_saved_at column to curations table
///
/// **Background:** The curations table originally tracked all edits through
/// `updated_at`. The background auto-save path needs its own timestamp so a
/// relaxed save is distinguishable from a strict update. New databases get
/// the column at CREATE TABLE time; this adds it to older ones.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: Add auto_saved_at column to curations");

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='curations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        info!("  Curations table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('curations') WHERE name = 'auto_saved_at'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  auto_saved_at column already exists - skipping");
        return Ok(());
    }

    sqlx::query("ALTER TABLE curations ADD COLUMN auto_saved_at TIMESTAMP")
        .execute(pool)
        .await?;

    info!("  ✓ Added auto_saved_at column to curations table");
    Ok(())
}

/// Migration v2: Add review_notes column to curations table
///
/// **Background:** Reviewer decisions originally carried no free-text
/// rationale. Approve/reject now accept optional notes which are stamped on
/// the record alongside the decision.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: Add review_notes column to curations");

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='curations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        info!("  Curations table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('curations') WHERE name = 'review_notes'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  review_notes column already exists - skipping");
        return Ok(());
    }

    sqlx::query("ALTER TABLE curations ADD COLUMN review_notes TEXT")
        .execute(pool)
        .await?;

    info!("  ✓ Added review_notes column to curations table");
    Ok(())
}
