//! Gene registry queries
//!
//! Curations reference genes by guid; creates validate against this table so
//! a bad reference produces a clean client-facing error instead of a raw
//! foreign-key failure.

use clincura_common::models::Gene;
use clincura_common::{time, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Map a database row to a Gene
pub fn gene_from_row(row: &SqliteRow) -> Result<Gene> {
    let guid: String = row.get("guid");
    let created_at: String = row.get("created_at");

    Ok(Gene {
        guid: Uuid::parse_str(&guid)?,
        symbol: row.get("symbol"),
        hgnc_id: row.get("hgnc_id"),
        name: row.get("name"),
        created_at: time::parse_db(&created_at)?,
    })
}

/// Insert a new gene record
pub async fn insert_gene(pool: &SqlitePool, gene: &Gene) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO genes (guid, symbol, hgnc_id, name, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(gene.guid.to_string())
    .bind(&gene.symbol)
    .bind(&gene.hgnc_id)
    .bind(&gene.name)
    .bind(time::to_db(&gene.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a gene by guid
pub async fn get_gene(pool: &SqlitePool, guid: &Uuid) -> Result<Option<Gene>> {
    let row = sqlx::query("SELECT * FROM genes WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(gene_from_row).transpose()
}

/// Load a gene by symbol (case-insensitive)
pub async fn get_gene_by_symbol(pool: &SqlitePool, symbol: &str) -> Result<Option<Gene>> {
    let row = sqlx::query("SELECT * FROM genes WHERE symbol = ? COLLATE NOCASE")
        .bind(symbol)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(gene_from_row).transpose()
}

/// List genes alphabetically by symbol, optionally narrowed to a symbol prefix
pub async fn list_genes(
    pool: &SqlitePool,
    symbol_prefix: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Gene>> {
    let rows = match symbol_prefix {
        Some(prefix) => {
            sqlx::query(
                r#"
                SELECT * FROM genes
                WHERE symbol LIKE ? COLLATE NOCASE
                ORDER BY symbol ASC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(format!("{}%", prefix))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT * FROM genes ORDER BY symbol ASC LIMIT ? OFFSET ?")
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(gene_from_row).collect()
}

/// Count genes, with the same optional symbol-prefix filter as `list_genes`
pub async fn count_genes(pool: &SqlitePool, symbol_prefix: Option<&str>) -> Result<i64> {
    let count: i64 = match symbol_prefix {
        Some(prefix) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM genes WHERE symbol LIKE ? COLLATE NOCASE")
                .bind(format!("{}%", prefix))
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM genes")
                .fetch_one(pool)
                .await?
        }
    };

    Ok(count)
}
