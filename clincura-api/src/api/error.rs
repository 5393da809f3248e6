//! HTTP error mapping
//!
//! One wrapper turns the shared error taxonomy into HTTP responses so every
//! handler reports failures the same way: a JSON body with an `error` field,
//! plus the lock-conflict payload (both versions and the authoritative
//! current record) on 409 so clients can drive a merge UI.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clincura_common::Error;
use serde_json::json;
use tracing::error;

/// Wrapper so the shared error type can implement axum's IntoResponse
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::NotFound(what) => {
                let body = Json(json!({ "error": format!("{} not found", what) }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            Error::Forbidden => {
                // Deliberately uniform: no hint whether the target exists
                let body = Json(json!({ "error": "not authorized" }));
                (StatusCode::FORBIDDEN, body).into_response()
            }
            Error::Validation(msg) => {
                let body = Json(json!({ "error": msg }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            Error::InvalidReference(msg) => {
                let body = Json(json!({ "error": msg }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            Error::Conflict(conflict) => {
                let body = Json(json!({
                    "error": format!(
                        "lock conflict: submitted version {} but current version is {}",
                        conflict.your_lock_version, conflict.current_lock_version
                    ),
                    "current_lock_version": conflict.current_lock_version,
                    "your_lock_version": conflict.your_lock_version,
                    "current": conflict.current,
                }));
                (StatusCode::CONFLICT, body).into_response()
            }
            other => {
                error!("internal error handling request: {}", other);
                let body = Json(json!({ "error": format!("Internal error: {}", other) }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
