//! Actor registry endpoints
//!
//! Platform registration records only; authentication and credential
//! management stay with the upstream identity provider.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use clincura_common::models::Actor;
use clincura_common::{time, Error};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db;
use crate::AppState;

/// POST /actors request body
#[derive(Debug, Deserialize)]
pub struct CreateActor {
    pub display_name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// POST /actors
///
/// Application admin registers a platform identity.
pub async fn create_actor(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateActor>,
) -> Result<(StatusCode, Json<Actor>), ApiError> {
    if !actor.is_admin {
        return Err(Error::Forbidden.into());
    }

    let display_name = body.display_name.trim();
    if display_name.is_empty() {
        return Err(Error::Validation("display name must not be empty".to_string()).into());
    }
    if let Some(email) = body.email.as_deref() {
        if db::actors::email_exists(&state.db, email).await? {
            return Err(Error::Validation(format!(
                "email already registered: {}",
                email
            ))
            .into());
        }
    }

    let now = time::now();
    let new_actor = Actor {
        guid: Uuid::new_v4(),
        display_name: display_name.to_string(),
        email: body.email,
        is_admin: body.is_admin,
        active: true,
        created_at: now,
        updated_at: now,
    };
    db::actors::insert_actor(&state.db, &new_actor).await?;

    info!(
        actor = %new_actor.guid,
        admin = new_actor.is_admin,
        "actor registered"
    );

    Ok((StatusCode::CREATED, Json(new_actor)))
}

/// GET /actors/:id
pub async fn get_actor(
    State(state): State<AppState>,
    Extension(_actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Actor>, ApiError> {
    let found = db::actors::get_actor(&state.db, &id)
        .await?
        .ok_or_else(|| Error::NotFound("actor".to_string()))?;

    Ok(Json(found))
}
