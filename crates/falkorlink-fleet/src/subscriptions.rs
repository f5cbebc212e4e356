//! Subscription enumeration for a customer account.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::UserToken;
use crate::client::FleetClient;
use crate::error::{FleetError, FleetResult};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionAction<'a> {
    endpoint: &'a str,
    method: &'a str,
    query_params: SubscriptionFilter<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionFilter<'a> {
    environment_type: &'a str,
}

#[derive(Deserialize)]
struct SubscriptionIds {
    #[serde(default)]
    ids: Option<Vec<String>>,
}

impl FleetClient {
    /// List subscription ids owned by the account, filtered to the configured environment class.
    ///
    /// An account with no subscriptions yields an empty list.
    pub async fn list_subscriptions(&self, user: &UserToken) -> FleetResult<Vec<String>> {
        let action = SubscriptionAction {
            endpoint: "/subscription",
            method: "GET",
            query_params: SubscriptionFilter {
                environment_type: &self.config.environment_type,
            },
        };

        let resp = self
            .http
            .post(&self.config.subscription_action_url)
            .bearer_auth(user.as_str())
            .json(&action)
            .send()
            .await
            .map_err(|e| FleetError::upstream("subscription request failed", Some(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FleetError::upstream(
                format!("subscription listing returned HTTP {status}: {body}"),
                None,
            ));
        }

        let body: SubscriptionIds = resp
            .json()
            .await
            .map_err(|e| FleetError::upstream("unexpected subscription response", Some(e)))?;
        let ids = body.ids.unwrap_or_default();
        debug!(count = ids.len(), "subscriptions listed");
        Ok(ids)
    }
}
