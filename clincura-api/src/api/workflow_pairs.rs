//! Workflow pair registry endpoints
//!
//! Schema documents are stored verbatim; their structure is owned by the
//! form UI layer and never interpreted here.

use axum::{extract::State, http::StatusCode, Extension, Json};
use clincura_common::models::{Actor, WorkflowPair};
use clincura_common::{time, Error};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db;
use crate::AppState;

/// POST /workflow_pairs request body
#[derive(Debug, Deserialize)]
pub struct CreateWorkflowPair {
    pub name: String,
    /// Opaque schema document; defaults to an empty object
    pub precuration_schema: Option<String>,
    pub curation_schema: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// GET /workflow_pairs response
#[derive(Debug, Serialize)]
pub struct WorkflowPairListResponse {
    pub workflow_pairs: Vec<WorkflowPair>,
}

/// POST /workflow_pairs
pub async fn create_workflow_pair(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateWorkflowPair>,
) -> Result<(StatusCode, Json<WorkflowPair>), ApiError> {
    if !actor.is_admin {
        return Err(Error::Forbidden.into());
    }

    let name = body.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("workflow pair name must not be empty".to_string()).into());
    }
    if db::workflow_pairs::get_workflow_pair_by_name(&state.db, name)
        .await?
        .is_some()
    {
        return Err(Error::Validation(format!(
            "workflow pair name already in use: {}",
            name
        ))
        .into());
    }

    let pair = WorkflowPair {
        guid: Uuid::new_v4(),
        name: name.to_string(),
        precuration_schema: body.precuration_schema.unwrap_or_else(|| "{}".to_string()),
        curation_schema: body.curation_schema.unwrap_or_else(|| "{}".to_string()),
        active: body.active,
        created_at: time::now(),
    };
    db::workflow_pairs::insert_workflow_pair(&state.db, &pair).await?;

    info!(pair = %pair.guid, name = %pair.name, "workflow pair registered");

    Ok((StatusCode::CREATED, Json(pair)))
}

/// GET /workflow_pairs
pub async fn list_workflow_pairs(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
) -> Result<Json<WorkflowPairListResponse>, ApiError> {
    let workflow_pairs = db::workflow_pairs::list_workflow_pairs(&state.db).await?;
    Ok(Json(WorkflowPairListResponse { workflow_pairs }))
}
