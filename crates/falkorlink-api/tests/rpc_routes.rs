//! Router tests: the REST surface end to end over an in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use falkorlink_api::build_router;
use falkorlink_core::FalkorInstance;
use falkorlink_fleet::{AdminToken, FleetDirectory, FleetError, FleetResult, UserToken};
use falkorlink_link::Reconciler;
use falkorlink_state::StateStore;
use serde_json::{Value, json};
use tower::ServiceExt;

struct StaticFleet {
    instances: Vec<FalkorInstance>,
}

#[async_trait]
impl FleetDirectory for StaticFleet {
    async fn admin_token(&self) -> FleetResult<AdminToken> {
        Ok(AdminToken::new("admin"))
    }

    async fn user_token(
        &self,
        _admin: &AdminToken,
        _email: &str,
        password: &str,
    ) -> FleetResult<UserToken> {
        if password == "account-pw" {
            Ok(UserToken::new("user"))
        } else {
            Err(FleetError::Auth {
                message: "sign-in returned HTTP 401".to_string(),
                source: None,
            })
        }
    }

    async fn list_all_instances(
        &self,
        _admin: &AdminToken,
        _user: &UserToken,
    ) -> FleetResult<Vec<FalkorInstance>> {
        Ok(self.instances.clone())
    }
}

fn instance(id: &str) -> FalkorInstance {
    FalkorInstance {
        id: id.to_string(),
        name: format!("{id}-graph"),
        cloud_provider: "aws".to_string(),
        region: "us-east-1".to_string(),
        status: "RUNNING".to_string(),
        username: "falkordb".to_string(),
        hostname: Some(format!("{id}.db.example.com")),
        port: Some(6379),
    }
}

fn setup() -> (Router, StateStore) {
    let store = StateStore::open_in_memory().unwrap();
    let fleet = Arc::new(StaticFleet {
        instances: vec![instance("i-1"), instance("i-2")],
    });
    let reconciler = Reconciler::with_store(fleet, store.clone());
    (build_router(Arc::new(reconciler)), store)
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-team-id", "team-1")
        .header("x-site-id", "site-1");
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn save_account(router: &Router) {
    let (status, _) = send(
        router,
        request(
            "PUT",
            "/api/v1/site-settings",
            Some(json!({ "email": "owner@example.com", "password": "account-pw" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn attach_body(id: &str) -> Value {
    json!({ "instanceId": id, "username": "app", "password": "secret" })
}

#[tokio::test]
async fn healthz_without_headers() {
    let (router, _) = setup();
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn missing_context_headers_is_bad_request() {
    let (router, _) = setup();
    let req = Request::builder()
        .uri("/api/v1/site-settings")
        .header("x-team-id", "team-1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("siteId"));
}

#[tokio::test]
async fn settings_start_empty() {
    let (router, _) = setup();
    let (status, body) = send(&router, request("GET", "/api/v1/site-settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], Value::Null);
}

#[tokio::test]
async fn bad_account_credentials_are_rejected() {
    let (router, store) = setup();
    let (status, body) = send(
        &router,
        request(
            "PUT",
            "/api/v1/site-settings",
            Some(json!({ "email": "owner@example.com", "password": "nope" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid FalkorDB credentials");
    assert!(store.get_site_config("team-1", "site-1").unwrap().is_none());
}

#[tokio::test]
async fn list_instances_requires_account() {
    let (router, _) = setup();
    let (status, _) = send(&router, request("GET", "/api/v1/falkordb-instances", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    save_account(&router).await;
    let (status, body) = send(&router, request("GET", "/api/v1/falkordb-instances", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["cloudProvider"], "aws");
}

#[tokio::test]
async fn attach_detach_lifecycle() {
    let (router, store) = setup();
    save_account(&router).await;

    let (status, body) = send(&router, request("POST", "/api/v1/instances", Some(attach_body("i-1")))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["idx"], 0);
    assert!(body["data"].get("password").is_none());

    let (status, _) = send(&router, request("POST", "/api/v1/instances", Some(attach_body("i-1")))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&router, request("POST", "/api/v1/instances", Some(attach_body("i-2")))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["idx"], 1);

    let (status, body) = send(&router, request("GET", "/api/v1/site-settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "owner@example.com");
    assert_eq!(body["data"]["instances"].as_array().unwrap().len(), 2);
    assert!(body["data"]["instances"][0].get("password").is_none());

    let (status, body) = send(&router, request("GET", "/api/v1/instances/i-2/client-code", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["code"].as_str().unwrap().contains("FALKORDB_1_USERNAME"));

    let (status, _) = send(&router, request("DELETE", "/api/v1/instances/i-1", None)).await;
    assert_eq!(status, StatusCode::OK);
    let remaining = store.list_env_vars("team-1", "site-1").unwrap();
    assert_eq!(remaining.len(), 4);
    assert!(remaining.iter().all(|v| v.name.starts_with("FALKORDB_1_")));

    let (status, _) = send(&router, request("DELETE", "/api/v1/instances/i-1", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attach_unknown_instance_is_not_found() {
    let (router, _) = setup();
    save_account(&router).await;
    let (status, _) = send(&router, request("POST", "/api/v1/instances", Some(attach_body("ghost")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_account_removes_settings() {
    let (router, store) = setup();
    save_account(&router).await;

    let (status, _) = send(&router, request("DELETE", "/api/v1/site-settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.get_site_config("team-1", "site-1").unwrap().is_none());
}

#[tokio::test]
async fn separator_in_site_header_is_bad_request() {
    let (router, _) = setup();
    let req = Request::builder()
        .uri("/api/v1/site-settings")
        .header("x-team-id", "team")
        .header("x-site-id", "site/x")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_body_uses_error_envelope() {
    let (router, store) = setup();
    let req = Request::builder()
        .method("PUT")
        .uri("/api/v1/site-settings")
        .header("x-team-id", "team-1")
        .header("x-site-id", "site-1")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert!(store.get_site_config("team-1", "site-1").unwrap().is_none());

    save_account(&router).await;
    let (status, body) = send(
        &router,
        request("POST", "/api/v1/instances", Some(json!({ "instanceId": "i-1" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
}
