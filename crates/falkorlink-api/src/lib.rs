//! falkorlink-api — REST API for FalkorLink.
//!
//! Thin axum layer over the `Reconciler`. The calling team and site are
//! taken from the `x-team-id` and `x-site-id` request headers.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/site-settings` | Stored account and attached instances |
//! | PUT | `/api/v1/site-settings` | Validate and store account credentials |
//! | DELETE | `/api/v1/site-settings` | Delete the site configuration |
//! | GET | `/api/v1/falkordb-instances` | Running instances for the account |
//! | POST | `/api/v1/instances` | Attach an instance |
//! | DELETE | `/api/v1/instances/{id}` | Detach an instance |
//! | GET | `/api/v1/instances/{id}/client-code` | Connection snippet |
//! | GET | `/healthz` | Liveness |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use falkorlink_link::Reconciler;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub reconciler: Arc<Reconciler>,
}

/// Build the complete API router.
pub fn build_router(reconciler: Arc<Reconciler>) -> Router {
    let api_state = ApiState { reconciler };

    let api_routes = Router::new()
        .route(
            "/site-settings",
            get(handlers::query_settings)
                .put(handlers::set_account)
                .delete(handlers::delete_account),
        )
        .route("/falkordb-instances", get(handlers::list_falkordb_instances))
        .route("/instances", post(handlers::attach_instance))
        .route("/instances/{id}", delete(handlers::detach_instance))
        .route("/instances/{id}/client-code", get(handlers::client_code))
        .with_state(api_state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
