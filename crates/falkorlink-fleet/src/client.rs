//! HTTP client handle shared by all fleet calls.

use std::sync::Arc;

use falkorlink_core::FleetConfig;

/// Cheaply cloneable client for the fleet-management API.
#[derive(Clone)]
pub struct FleetClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: Arc<FleetConfig>,
}

impl FleetClient {
    pub fn new(config: FleetConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: FleetConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
