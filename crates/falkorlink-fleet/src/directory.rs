//! `FleetDirectory` — the discovery seam the reconciler depends on.

use async_trait::async_trait;
use falkorlink_core::FalkorInstance;

use crate::auth::{AdminToken, UserToken};
use crate::client::FleetClient;
use crate::error::FleetResult;

/// Token exchange and instance discovery, as seen by the reconciler.
#[async_trait]
pub trait FleetDirectory: Send + Sync {
    async fn admin_token(&self) -> FleetResult<AdminToken>;

    async fn user_token(
        &self,
        admin: &AdminToken,
        email: &str,
        password: &str,
    ) -> FleetResult<UserToken>;

    async fn list_all_instances(
        &self,
        admin: &AdminToken,
        user: &UserToken,
    ) -> FleetResult<Vec<FalkorInstance>>;
}

#[async_trait]
impl FleetDirectory for FleetClient {
    async fn admin_token(&self) -> FleetResult<AdminToken> {
        FleetClient::admin_token(self).await
    }

    async fn user_token(
        &self,
        admin: &AdminToken,
        email: &str,
        password: &str,
    ) -> FleetResult<UserToken> {
        FleetClient::user_token(self, admin, email, password).await
    }

    async fn list_all_instances(
        &self,
        admin: &AdminToken,
        user: &UserToken,
    ) -> FleetResult<Vec<FalkorInstance>> {
        FleetClient::list_all_instances(self, admin, user).await
    }
}
