//! Per-subscription instance listing.

use falkorlink_core::FalkorInstance;
use tracing::debug;

use crate::auth::AdminToken;
use crate::client::FleetClient;
use crate::error::{FleetError, FleetResult};
use crate::normalize::{InstanceListing, normalize_instances};

impl FleetClient {
    /// Fetch and normalize the running instances of one subscription.
    pub async fn list_instances_for_subscription(
        &self,
        admin: &AdminToken,
        subscription_id: &str,
    ) -> FleetResult<Vec<FalkorInstance>> {
        let url = self.api_url(&format!(
            "fleet/service/{}/environment/{}/instances",
            self.config.service_id, self.config.environment_id
        ));

        let resp = self
            .http
            .get(&url)
            .bearer_auth(admin.as_str())
            .query(&[("SubscriptionId", subscription_id)])
            .send()
            .await
            .map_err(|e| FleetError::upstream("instance listing request failed", Some(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FleetError::upstream(
                format!("instance listing for {subscription_id} returned HTTP {status}: {body}"),
                None,
            ));
        }

        let listing: InstanceListing = resp
            .json()
            .await
            .map_err(|e| FleetError::upstream("unexpected instance listing response", Some(e)))?;
        let records = listing.resource_instances.unwrap_or_default();
        let total = records.len();
        let instances = normalize_instances(records, &self.config.reserved_resource_prefix)?;
        debug!(
            subscription_id,
            total,
            running = instances.len(),
            "instances listed"
        );
        Ok(instances)
    }
}
