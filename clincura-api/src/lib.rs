//! clincura-api library - the curation service
//!
//! Hosts the REST boundary for scopes, memberships, the gene and workflow
//! pair registries, and the curation records themselves. Every route except
//! `/health` and `/build_info` runs behind the actor resolution middleware;
//! tenant authorization happens per handler through [`access`].

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub mod access;
pub mod api;
pub mod db;
pub mod pagination;
pub mod workflow;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // Every route below requires a resolved actor
    let protected = Router::new()
        .route("/actors", post(api::actors::create_actor))
        .route("/actors/:id", get(api::actors::get_actor))
        .route("/genes", post(api::genes::create_gene).get(api::genes::list_genes))
        .route("/genes/:id", get(api::genes::get_gene))
        .route(
            "/workflow_pairs",
            post(api::workflow_pairs::create_workflow_pair)
                .get(api::workflow_pairs::list_workflow_pairs),
        )
        .route(
            "/scopes",
            post(api::scopes::create_scope).get(api::scopes::list_scopes),
        )
        .route(
            "/scopes/:id",
            get(api::scopes::get_scope)
                .put(api::scopes::update_scope)
                .delete(api::scopes::delete_scope),
        )
        .route(
            "/scopes/:id/members",
            post(api::memberships::invite_member).get(api::memberships::list_members),
        )
        .route("/scopes/:id/members/accept", post(api::memberships::accept_invite))
        .route(
            "/scopes/:id/members/:actor_id",
            put(api::memberships::update_member),
        )
        .route(
            "/curations",
            post(api::curations::create_curation).get(api::curations::list_curations),
        )
        .route(
            "/curations/:id",
            get(api::curations::get_curation)
                .put(api::curations::update_curation)
                .delete(api::curations::delete_curation),
        )
        .route("/curations/:id/draft", put(api::curations::save_curation_draft))
        .route("/curations/:id/submit", post(api::curations::submit_curation))
        .route(
            "/curations/:id/review/start",
            post(api::curations::start_curation_review),
        )
        .route("/curations/:id/review", post(api::curations::review_curation))
        .route("/curations/:id/reopen", post(api::curations::reopen_curation))
        .route("/curations/:id/score", post(api::curations::score_curation))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::actor_middleware,
        ));

    // Monitoring routes, no actor required
    let public = Router::new()
        .route("/build_info", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
