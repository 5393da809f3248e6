//! Integration tests for clincura-api endpoints
//!
//! Tests cover:
//! - Health and build info endpoints (no actor header required)
//! - Actor resolution middleware
//! - Registry endpoints (genes, workflow pairs, actors)
//! - Scope creation and cascade deletion
//! - Curation lifecycle: create, strict update, auto-save, submit, review
//! - Optimistic-lock conflict payloads
//! - Scoring recomputation and classification
//!
//! Every test runs against a fresh in-memory database seeded with the
//! bootstrap admin, driving the real router through tower's oneshot.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use clincura_api::{build_router, AppState};
use clincura_common::db::{init_memory_database, SYSTEM_ADMIN_GUID};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: fresh app over an in-memory database
async fn setup_app() -> (axum::Router, SqlitePool) {
    let pool = init_memory_database()
        .await
        .expect("Should create in-memory database");
    let app = build_router(AppState::new(pool.clone()));
    (app, pool)
}

/// Test helper: build a request, optionally with actor header and JSON body
fn request(method: &str, uri: &str, actor: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("X-Actor-Id", actor);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: run a request and return (status, parsed JSON body)
async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

/// Registered fixtures most curation tests need
struct Fixture {
    app: axum::Router,
    gene_id: String,
    pair_id: String,
    curator_id: String,
    reviewer_id: String,
    scope_id: String,
}

/// Seed a gene, a workflow pair, a curator and a reviewer, and a private
/// scope created by the curator with the reviewer accepted as a member.
async fn fixture() -> Fixture {
    let (app, _pool) = setup_app().await;
    let admin = SYSTEM_ADMIN_GUID;

    let (status, gene) = send(
        &app,
        request(
            "POST",
            "/genes",
            Some(admin),
            Some(json!({"symbol": "SCN1A", "name": "sodium voltage-gated channel alpha subunit 1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, pair) = send(
        &app,
        request(
            "POST",
            "/workflow_pairs",
            Some(admin),
            Some(json!({"name": "standard", "active": true})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, curator) = send(
        &app,
        request(
            "POST",
            "/actors",
            Some(admin),
            Some(json!({"display_name": "Curator"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let curator_id = curator["guid"].as_str().unwrap().to_string();

    let (status, reviewer) = send(
        &app,
        request(
            "POST",
            "/actors",
            Some(admin),
            Some(json!({"display_name": "Reviewer"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reviewer_id = reviewer["guid"].as_str().unwrap().to_string();

    let (status, scope) = send(
        &app,
        request(
            "POST",
            "/scopes",
            Some(&curator_id),
            Some(json!({"name": "Epilepsy Panel", "visibility": "private"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let scope_id = scope["guid"].as_str().unwrap().to_string();

    // Bring the reviewer in: admin-of-scope invites, reviewer accepts
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/scopes/{}/members", scope_id),
            Some(&curator_id),
            Some(json!({"actor_id": reviewer_id, "role": "reviewer"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/scopes/{}/members/accept", scope_id),
            Some(&reviewer_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    Fixture {
        app,
        gene_id: gene["guid"].as_str().unwrap().to_string(),
        pair_id: pair["guid"].as_str().unwrap().to_string(),
        curator_id,
        reviewer_id,
        scope_id,
    }
}

impl Fixture {
    /// Create a draft record at the given stage, returning its JSON
    async fn create_record(&self, stage: &str, evidence: Value) -> Value {
        let (status, body) = send(
            &self.app,
            request(
                "POST",
                "/curations",
                Some(&self.curator_id),
                Some(json!({
                    "gene_id": self.gene_id,
                    "scope_id": self.scope_id,
                    "workflow_pair_id": self.pair_id,
                    "disease_name": "Dravet syndrome",
                    "workflow_stage": stage,
                    "evidence_data": evidence,
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body
    }
}

/// Evidence payload that passes the submission gate
fn qualifying_evidence() -> Value {
    json!({
        "genetic": {
            "case_level": {
                "autosomal_dominant": {
                    "other_variant_type": [{"label": "PMID:11111", "points": 5}]
                }
            },
            "segregation": [{"label": "Family A", "points": 2}]
        }
    })
}

// =============================================================================
// Health and build info (no actor header)
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_actor_required() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(&app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "clincura-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_build_info_no_actor_required() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(&app, request("GET", "/build_info", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].is_string());
}

// =============================================================================
// Actor resolution middleware
// =============================================================================

#[tokio::test]
async fn test_missing_actor_header_rejected() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(&app, request("GET", "/scopes", None, None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not authorized");
}

#[tokio::test]
async fn test_unknown_and_malformed_actor_rejected_uniformly() {
    let (app, _pool) = setup_app().await;

    let unknown = uuid::Uuid::new_v4().to_string();
    let (status, body) = send(&app, request("GET", "/scopes", Some(&unknown), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not authorized");

    let (status, body) =
        send(&app, request("GET", "/scopes", Some("not-a-uuid"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not authorized");
}

// =============================================================================
// Registries
// =============================================================================

#[tokio::test]
async fn test_gene_registration_requires_app_admin() {
    let fx = fixture().await;

    let (status, _) = send(
        &fx.app,
        request(
            "POST",
            "/genes",
            Some(&fx.curator_id),
            Some(json!({"symbol": "PCDH19", "name": "protocadherin 19"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Reads are open to any known actor
    let (status, body) = send(
        &fx.app,
        request("GET", "/genes?symbol=SC", Some(&fx.curator_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["genes"][0]["symbol"], "SCN1A");
    assert_eq!(body["page_size"], 50);
}

#[tokio::test]
async fn test_duplicate_gene_symbol_rejected() {
    let fx = fixture().await;

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            "/genes",
            Some(SYSTEM_ADMIN_GUID),
            Some(json!({"symbol": "SCN1A", "name": "duplicate"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("SCN1A"));
}

// =============================================================================
// Scopes and memberships
// =============================================================================

#[tokio::test]
async fn test_scope_creator_becomes_admin() {
    let fx = fixture().await;

    let (status, body) = send(
        &fx.app,
        request(
            "GET",
            &format!("/scopes/{}/members", fx.scope_id),
            Some(&fx.curator_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let members = body["members"].as_array().unwrap();
    let creator = members
        .iter()
        .find(|m| m["actor_id"] == fx.curator_id.as_str())
        .expect("creator membership missing");
    assert_eq!(creator["role"], "admin");
    assert_eq!(creator["status"], "accepted");
    assert_eq!(creator["active"], true);
}

#[tokio::test]
async fn test_last_admin_cannot_be_demoted() {
    let fx = fixture().await;

    let (status, body) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/scopes/{}/members/{}", fx.scope_id, fx.curator_id),
            Some(&fx.curator_id),
            Some(json!({"role": "curator", "active": true})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("last admin"));
}

#[tokio::test]
async fn test_scope_delete_requires_cascade_confirmation() {
    let fx = fixture().await;
    fx.create_record("curation", json!({})).await;

    let (status, body) = send(
        &fx.app,
        request(
            "DELETE",
            &format!("/scopes/{}", fx.scope_id),
            Some(&fx.curator_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("confirm_cascade"));

    let (status, body) = send(
        &fx.app,
        request(
            "DELETE",
            &format!("/scopes/{}?confirm_cascade=true", fx.scope_id),
            Some(&fx.curator_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
    assert_eq!(body["curations_deleted"], 1);
}

// =============================================================================
// Curation creation and reference validation
// =============================================================================

#[tokio::test]
async fn test_create_curation_starts_as_scored_draft() {
    let fx = fixture().await;

    let rec = fx.create_record("curation", json!({})).await;

    assert_eq!(rec["status"], "draft");
    assert_eq!(rec["workflow_stage"], "curation");
    assert_eq!(rec["is_draft"], true);
    assert_eq!(rec["lock_version"], 0);
    // Empty evidence scores to zero, never errors
    assert_eq!(rec["computed_verdict"], "no_known_disease_relationship");
    assert_eq!(rec["computed_scores"]["total_score"], 0.0);
}

#[tokio::test]
async fn test_create_curation_unknown_gene_rejected() {
    let fx = fixture().await;
    let ghost = uuid::Uuid::new_v4().to_string();

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            "/curations",
            Some(&fx.curator_id),
            Some(json!({
                "gene_id": ghost,
                "scope_id": fx.scope_id,
                "workflow_pair_id": fx.pair_id,
                "disease_name": "Dravet syndrome",
                "workflow_stage": "curation",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("does not exist"));
}

#[tokio::test]
async fn test_scope_pinned_workflow_pair_enforced() {
    let fx = fixture().await;

    // Pin the scope to its pair, then ask for a different one
    let (status, _) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/scopes/{}", fx.scope_id),
            Some(&fx.curator_id),
            Some(json!({
                "visibility": "private",
                "active": true,
                "default_workflow_pair_id": fx.pair_id,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, other_pair) = send(
        &fx.app,
        request(
            "POST",
            "/workflow_pairs",
            Some(SYSTEM_ADMIN_GUID),
            Some(json!({"name": "alternate", "active": true})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            "/curations",
            Some(&fx.curator_id),
            Some(json!({
                "gene_id": fx.gene_id,
                "scope_id": fx.scope_id,
                "workflow_pair_id": other_pair["guid"],
                "disease_name": "Dravet syndrome",
                "workflow_stage": "curation",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("pins workflow pair"));

    // Omitting the pair uses the pinned one
    let (status, rec) = send(
        &fx.app,
        request(
            "POST",
            "/curations",
            Some(&fx.curator_id),
            Some(json!({
                "gene_id": fx.gene_id,
                "scope_id": fx.scope_id,
                "disease_name": "Dravet syndrome",
                "workflow_stage": "curation",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rec["workflow_pair_id"], fx.pair_id.as_str());
}

// =============================================================================
// Strict updates and the optimistic lock
// =============================================================================

#[tokio::test]
async fn test_strict_update_bumps_version_and_rescores() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", json!({})).await;
    let id = rec["guid"].as_str().unwrap();

    let (status, updated) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/curations/{}", id),
            Some(&fx.curator_id),
            Some(json!({
                "evidence_data": qualifying_evidence(),
                "lock_version": 0,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["lock_version"], 1);
    // 5 case-level + 2 segregation = 7, the Strong lower boundary
    assert_eq!(updated["computed_scores"]["total_score"], 7.0);
    assert_eq!(updated["computed_verdict"], "strong");
}

#[tokio::test]
async fn test_stale_update_conflicts_with_winner_state() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", json!({})).await;
    let id = rec["guid"].as_str().unwrap();

    // Client A wins the race from version 0
    let (status, _) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/curations/{}", id),
            Some(&fx.curator_id),
            Some(json!({"evidence_data": qualifying_evidence(), "lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Client B, still holding version 0, must get the full conflict payload
    let (status, body) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/curations/{}", id),
            Some(&fx.curator_id),
            Some(json!({"evidence_data": {}, "lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["current_lock_version"], 1);
    assert_eq!(body["your_lock_version"], 0);
    assert_eq!(body["current"]["guid"], id);
    assert_eq!(body["current"]["computed_verdict"], "strong");

    // The loser's payload never landed
    let (_, current) = send(
        &fx.app,
        request("GET", &format!("/curations/{}", id), Some(&fx.curator_id), None),
    )
    .await;
    assert_eq!(current["lock_version"], 1);
    assert_eq!(current["computed_verdict"], "strong");
}

#[tokio::test]
async fn test_autosave_accepts_stale_version_without_bump() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", json!({})).await;
    let id = rec["guid"].as_str().unwrap();

    // Advance to version 1 through the strict path
    let (status, _) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/curations/{}", id),
            Some(&fx.curator_id),
            Some(json!({"evidence_data": {}, "lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Auto-save with a stale version still lands, version stays put
    let (status, saved) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/curations/{}/draft", id),
            Some(&fx.curator_id),
            Some(json!({
                "evidence_data": {"genetic": {"segregation": [{"points": 1}]}},
                "lock_version": 0,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["lock_version"], 1);
    assert!(saved["auto_saved_at"].is_string());
    assert_eq!(
        saved["evidence_data"]["genetic"]["segregation"][0]["points"],
        1
    );

    // Matching version behaves like a strict write
    let (status, saved) = send(
        &fx.app,
        request(
            "PUT",
            &format!("/curations/{}/draft", id),
            Some(&fx.curator_id),
            Some(json!({"evidence_data": {}, "lock_version": 1})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["lock_version"], 2);
}

// =============================================================================
// Submission and review workflow
// =============================================================================

#[tokio::test]
async fn test_submit_without_qualifying_evidence_rejected() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", json!({})).await;
    let id = rec["guid"].as_str().unwrap();

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/submit", id),
            Some(&fx.curator_id),
            Some(json!({"lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("genetic evidence"));

    // Nothing moved
    let (_, current) = send(
        &fx.app,
        request("GET", &format!("/curations/{}", id), Some(&fx.curator_id), None),
    )
    .await;
    assert_eq!(current["status"], "draft");
    assert_eq!(current["lock_version"], 0);
}

#[tokio::test]
async fn test_submit_requires_lock_version() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", qualifying_evidence()).await;
    let id = rec["guid"].as_str().unwrap();

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/submit", id),
            Some(&fx.curator_id),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("lock_version"));
}

#[tokio::test]
async fn test_full_review_cycle() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", qualifying_evidence()).await;
    let id = rec["guid"].as_str().unwrap();

    let (status, submitted) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/submit", id),
            Some(&fx.curator_id),
            Some(json!({"lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "submitted");
    assert_eq!(submitted["workflow_stage"], "review");
    assert_eq!(submitted["is_draft"], false);
    assert_eq!(submitted["lock_version"], 1);
    assert_eq!(submitted["submitted_by"], fx.curator_id.as_str());

    let (status, in_review) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/review/start", id),
            Some(&fx.reviewer_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(in_review["status"], "in_review");

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/review", id),
            Some(&fx.reviewer_id),
            Some(json!({"decision": "approve", "notes": "evidence is convincing"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let approved = &body["curation"];
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], fx.reviewer_id.as_str());
    assert_eq!(approved["review_notes"], "evidence is convincing");
    assert!(body.get("spawned_curation").is_none());
}

#[tokio::test]
async fn test_reject_and_reopen_cycle() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", qualifying_evidence()).await;
    let id = rec["guid"].as_str().unwrap();

    let (status, _) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/submit", id),
            Some(&fx.curator_id),
            Some(json!({"lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/review/start", id),
            Some(&fx.reviewer_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/review", id),
            Some(&fx.reviewer_id),
            Some(json!({"decision": "reject", "notes": "segregation data is thin"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["curation"]["status"], "rejected");

    // Rejection is not terminal: the creator reopens into a fresh draft cycle
    let (status, reopened) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/reopen", id),
            Some(&fx.curator_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reopened["status"], "draft");
    assert_eq!(reopened["workflow_stage"], "curation");
    assert_eq!(reopened["is_draft"], true);
}

#[tokio::test]
async fn test_illegal_transition_rejected_without_mutation() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", qualifying_evidence()).await;
    let id = rec["guid"].as_str().unwrap();

    // Review decision straight from draft
    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/review", id),
            Some(&fx.reviewer_id),
            Some(json!({"decision": "approve"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("cannot approve"));

    let (_, current) = send(
        &fx.app,
        request("GET", &format!("/curations/{}", id), Some(&fx.curator_id), None),
    )
    .await;
    assert_eq!(current["status"], "draft");
}

#[tokio::test]
async fn test_approving_precuration_spawns_draft_curation() {
    let fx = fixture().await;
    let rec = fx.create_record("precuration", json!({})).await;
    let id = rec["guid"].as_str().unwrap();

    // Precuration submission has no evidence gate
    let (status, submitted) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/submit", id),
            Some(&fx.curator_id),
            Some(json!({"lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["workflow_stage"], "precuration");

    let (status, _) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/review/start", id),
            Some(&fx.reviewer_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/review", id),
            Some(&fx.reviewer_id),
            Some(json!({"decision": "approve", "create_curation": true})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["curation"]["status"], "approved");

    let spawned = &body["spawned_curation"];
    assert_eq!(spawned["status"], "draft");
    assert_eq!(spawned["workflow_stage"], "curation");
    assert_eq!(spawned["precuration_id"], id);
    assert_eq!(spawned["lock_version"], 0);
    assert_eq!(spawned["gene_id"], fx.gene_id.as_str());
}

// =============================================================================
// Archival
// =============================================================================

#[tokio::test]
async fn test_delete_archives_draft_in_place() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", json!({})).await;
    let id = rec["guid"].as_str().unwrap();

    let (status, archived) = send(
        &fx.app,
        request(
            "DELETE",
            &format!("/curations/{}", id),
            Some(&fx.curator_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["status"], "archived");

    // The record survives as a readable soft-deleted row
    let (status, current) = send(
        &fx.app,
        request("GET", &format!("/curations/{}", id), Some(&fx.curator_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["status"], "archived");
}

#[tokio::test]
async fn test_only_app_admin_archives_past_draft() {
    let fx = fixture().await;
    let rec = fx.create_record("curation", qualifying_evidence()).await;
    let id = rec["guid"].as_str().unwrap();

    let (status, _) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/submit", id),
            Some(&fx.curator_id),
            Some(json!({"lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Creator cannot archive a submitted record
    let (status, _) = send(
        &fx.app,
        request(
            "DELETE",
            &format!("/curations/{}", id),
            Some(&fx.curator_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // The application admin can
    let (status, archived) = send(
        &fx.app,
        request(
            "DELETE",
            &format!("/curations/{}", id),
            Some(SYSTEM_ADMIN_GUID),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["status"], "archived");
}

// =============================================================================
// Scoring endpoint
// =============================================================================

#[tokio::test]
async fn test_score_endpoint_returns_breakdown_and_warnings() {
    let fx = fixture().await;
    let rec = fx
        .create_record(
            "curation",
            json!({
                "genetic": {
                    "segregation": [{"points": 2}, {"points": "not a number"}]
                }
            }),
        )
        .await;
    let id = rec["guid"].as_str().unwrap();

    let (status, body) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/score", id),
            Some(&fx.curator_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let score = &body["score"];
    assert_eq!(score["genetic_total"], 2.0);
    assert_eq!(score["total_score"], 2.0);
    assert_eq!(score["classification"], "moderate");
    // Malformed point values are counted as zero and reported, never fatal
    let warnings = score["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["bucket"], "genetic.segregation");

    // Recomputation is idempotent and does not advance the lock
    assert_eq!(body["curation"]["lock_version"], 0);
}

#[tokio::test]
async fn test_contradictory_evidence_forces_disputed() {
    let fx = fixture().await;
    let rec = fx
        .create_record(
            "curation",
            json!({
                "genetic": {
                    "case_level": {
                        "autosomal_dominant": {"other_variant_type": [{"points": 12}]}
                    }
                },
                "experimental": {
                    "model_systems": {"cell_culture": [{"points": 2}]}
                },
                "contradictory": [{"label": "conflicting cohort"}]
            }),
        )
        .await;

    // Numeric total clears the Definitive threshold, but the override wins
    assert!(rec["computed_scores"]["total_score"].as_f64().unwrap() >= 12.0);
    assert_eq!(rec["computed_verdict"], "disputed");
}

// =============================================================================
// Listing and filtering
// =============================================================================

#[tokio::test]
async fn test_list_curations_filters_by_status() {
    let fx = fixture().await;
    let first = fx.create_record("curation", qualifying_evidence()).await;
    fx.create_record("curation", json!({})).await;

    let id = first["guid"].as_str().unwrap();
    let (status, _) = send(
        &fx.app,
        request(
            "POST",
            &format!("/curations/{}/submit", id),
            Some(&fx.curator_id),
            Some(json!({"lock_version": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &fx.app,
        request("GET", "/curations?status=submitted", Some(&fx.curator_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["curations"][0]["guid"], id);

    let (status, body) = send(
        &fx.app,
        request("GET", "/curations?status=nonsense", Some(&fx.curator_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("status"));
}
