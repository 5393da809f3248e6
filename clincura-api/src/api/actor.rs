//! Actor resolution middleware
//!
//! Authentication happens upstream; this service trusts the `X-Actor-Id`
//! header, resolves it against the actors table, and injects the loaded
//! record as a request extension. A missing, malformed, unknown, or
//! deactivated actor id is rejected with the same uniform Forbidden.
//!
//! Applied to every route except `/health` and `/build_info`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use clincura_common::Error;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db;
use crate::AppState;

/// Header carrying the upstream-authenticated actor id
pub const ACTOR_HEADER: &str = "X-Actor-Id";

/// Resolve the request's actor and stash it as an extension
pub async fn actor_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::Forbidden)?;

    let actor_id = Uuid::parse_str(header).map_err(|_| Error::Forbidden)?;

    let actor = db::actors::get_active_actor(&state.db, &actor_id)
        .await?
        .ok_or(Error::Forbidden)?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
