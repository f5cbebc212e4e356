//! Instance aggregator — fan out over every subscription of an account.

use falkorlink_core::FalkorInstance;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::auth::{AdminToken, UserToken};
use crate::client::FleetClient;
use crate::error::FleetResult;

impl FleetClient {
    /// List running instances across all of the account's subscriptions.
    ///
    /// Subscriptions are queried concurrently and every call is awaited
    /// before results are flattened in subscription order. Any single
    /// failure fails the whole listing; there are no partial results.
    pub async fn list_all_instances(
        &self,
        admin: &AdminToken,
        user: &UserToken,
    ) -> FleetResult<Vec<FalkorInstance>> {
        let subscriptions = self.list_subscriptions(user).await?;

        let results = join_all(
            subscriptions
                .iter()
                .map(|id| self.list_instances_for_subscription(admin, id)),
        )
        .await;

        let mut instances = Vec::new();
        for (subscription_id, result) in subscriptions.iter().zip(results) {
            match result {
                Ok(found) => instances.extend(found),
                Err(e) => {
                    warn!(%subscription_id, error = %e, "instance discovery failed");
                    return Err(e);
                }
            }
        }

        info!(
            subscriptions = subscriptions.len(),
            instances = instances.len(),
            "instance discovery complete"
        );
        Ok(instances)
    }
}
