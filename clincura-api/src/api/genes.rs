//! Gene registry endpoints
//!
//! Writes are restricted to application admins; reads are open to any known
//! actor (the registry carries no tenant-owned data).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use clincura_common::models::{Actor, Gene};
use clincura_common::{time, Error};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// POST /genes request body
#[derive(Debug, Deserialize)]
pub struct CreateGene {
    pub symbol: String,
    pub hgnc_id: Option<String>,
    pub name: String,
}

/// GET /genes query parameters
#[derive(Debug, Deserialize)]
pub struct GeneListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    /// Case-insensitive symbol prefix filter
    pub symbol: Option<String>,
}

fn default_page() -> i64 {
    1
}

/// GET /genes response
#[derive(Debug, Serialize)]
pub struct GeneListResponse {
    pub genes: Vec<Gene>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// POST /genes
pub async fn create_gene(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateGene>,
) -> Result<(StatusCode, Json<Gene>), ApiError> {
    if !actor.is_admin {
        return Err(Error::Forbidden.into());
    }

    let symbol = body.symbol.trim();
    if symbol.is_empty() {
        return Err(Error::Validation("gene symbol must not be empty".to_string()).into());
    }
    if db::genes::get_gene_by_symbol(&state.db, symbol).await?.is_some() {
        return Err(Error::Validation(format!(
            "gene symbol already registered: {}",
            symbol
        ))
        .into());
    }

    let gene = Gene {
        guid: Uuid::new_v4(),
        symbol: symbol.to_string(),
        hgnc_id: body.hgnc_id,
        name: body.name,
        created_at: time::now(),
    };
    db::genes::insert_gene(&state.db, &gene).await?;

    info!(gene = %gene.guid, symbol = %gene.symbol, "gene registered");

    Ok((StatusCode::CREATED, Json(gene)))
}

/// GET /genes
pub async fn list_genes(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
    Query(query): Query<GeneListQuery>,
) -> Result<Json<GeneListResponse>, ApiError> {
    let prefix = query.symbol.as_deref();
    let total = db::genes::count_genes(&state.db, prefix).await?;
    let pagination = calculate_pagination(total, query.page);
    let genes = db::genes::list_genes(&state.db, prefix, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(GeneListResponse {
        genes,
        total,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
    }))
}

/// GET /genes/:id
pub async fn get_gene(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Gene>, ApiError> {
    let gene = db::genes::get_gene(&state.db, &id)
        .await?
        .ok_or_else(|| Error::NotFound("gene".to_string()))?;

    Ok(Json(gene))
}
