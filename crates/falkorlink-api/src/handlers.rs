//! REST API handlers.
//!
//! Each handler resolves the site context from headers, calls the
//! reconciler, and returns JSON responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use falkorlink_link::{AttachRequest, ErrorKind, LinkError, SiteContext};
use tracing::warn;

use crate::ApiState;

pub const TEAM_HEADER: &str = "x-team-id";
pub const SITE_HEADER: &str = "x-site-id";

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// HTTP status for a reconciler error.
pub fn status_for(err: &LinkError) -> StatusCode {
    match err.kind() {
        ErrorKind::MissingContext
        | ErrorKind::InvalidContext
        | ErrorKind::Auth
        | ErrorKind::InvalidConfig => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Duplicate => StatusCode::CONFLICT,
        ErrorKind::Upstream | ErrorKind::Normalization => StatusCode::BAD_GATEWAY,
        ErrorKind::EnvSyncFailed | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn link_error(err: LinkError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!(error = ?err, %status, "request failed");
    }
    error_response(&err.to_string(), status).into_response()
}

/// Site context from the team/site headers.
pub fn site_context(headers: &HeaderMap) -> Result<SiteContext, LinkError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    SiteContext::new(header(TEAM_HEADER), header(SITE_HEADER))
}

macro_rules! context_or_bail {
    ($headers:expr) => {
        match site_context(&$headers) {
            Ok(ctx) => ctx,
            Err(e) => return link_error(e),
        }
    };
}

/// Unwrap a JSON body, answering rejections with the error envelope.
macro_rules! body_or_bail {
    ($body:expr) => {
        match $body {
            Ok(Json(body)) => body,
            Err(rejection) => return json_rejection(rejection),
        }
    };
}

fn json_rejection(rejection: JsonRejection) -> Response {
    error_response(&rejection.body_text(), rejection.status()).into_response()
}

// ── Site settings ──────────────────────────────────────────────

/// Account credentials body.
#[derive(serde::Deserialize)]
pub struct AccountRequest {
    pub email: String,
    pub password: String,
}

/// GET /api/v1/site-settings
pub async fn query_settings(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let ctx = context_or_bail!(headers);
    match state.reconciler.query_settings(&ctx).await {
        Ok(summary) => ApiResponse::ok(summary).into_response(),
        Err(e) => link_error(e),
    }
}

/// PUT /api/v1/site-settings
pub async fn set_account(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<AccountRequest>, JsonRejection>,
) -> Response {
    let ctx = context_or_bail!(headers);
    let req = body_or_bail!(body);
    match state
        .reconciler
        .set_account(&ctx, &req.email, &req.password)
        .await
    {
        Ok(summary) => ApiResponse::ok(summary).into_response(),
        Err(e) => link_error(e),
    }
}

/// DELETE /api/v1/site-settings
pub async fn delete_account(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let ctx = context_or_bail!(headers);
    match state.reconciler.delete_account(&ctx).await {
        Ok(()) => ApiResponse::ok("deleted").into_response(),
        Err(e) => link_error(e),
    }
}

// ── Discovery ──────────────────────────────────────────────────

/// GET /api/v1/falkordb-instances
pub async fn list_falkordb_instances(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Response {
    let ctx = context_or_bail!(headers);
    match state.reconciler.list_instances(&ctx).await {
        Ok(instances) => ApiResponse::ok(instances).into_response(),
        Err(e) => link_error(e),
    }
}

// ── Attachment ─────────────────────────────────────────────────

/// POST /api/v1/instances
pub async fn attach_instance(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<AttachRequest>, JsonRejection>,
) -> Response {
    let ctx = context_or_bail!(headers);
    let req = body_or_bail!(body);
    match state.reconciler.attach(&ctx, &req).await {
        Ok(attached) => (StatusCode::CREATED, ApiResponse::ok(attached)).into_response(),
        Err(e) => link_error(e),
    }
}

/// DELETE /api/v1/instances/{id}
pub async fn detach_instance(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let ctx = context_or_bail!(headers);
    match state.reconciler.detach(&ctx, &id).await {
        Ok(removed) => ApiResponse::ok(removed).into_response(),
        Err(e) => link_error(e),
    }
}

/// GET /api/v1/instances/{id}/client-code
pub async fn client_code(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let ctx = context_or_bail!(headers);
    match state.reconciler.client_code(&ctx, &id).await {
        Ok(code) => ApiResponse::ok(serde_json::json!({ "code": code })).into_response(),
        Err(e) => link_error(e),
    }
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}
