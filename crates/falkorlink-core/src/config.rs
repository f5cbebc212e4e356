//! falkorlink.toml configuration parser.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required fleet setting: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Deployment parameters for the fleet-management API.
#[derive(Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Admin-token issuance endpoint (GET, API-key header).
    #[serde(default = "default_auth_token_url")]
    pub auth_token_url: String,
    /// Versioned fleet API root; sign-in and instance listing hang off it.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Subscription listing action endpoint.
    #[serde(default = "default_subscription_action_url")]
    pub subscription_action_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub environment_id: String,
    /// Environment class subscriptions are filtered to.
    #[serde(default = "default_environment_type")]
    pub environment_type: String,
    /// Topology entries whose resource name starts with this are control-plane endpoints.
    #[serde(default = "default_reserved_resource_prefix")]
    pub reserved_resource_prefix: String,
}

fn default_port() -> u16 {
    8443
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/falkorlink")
}

fn default_auth_token_url() -> String {
    "https://auth-425012726186.europe-west1.run.app/omnistrate/token".to_string()
}

fn default_api_base_url() -> String {
    "https://api.omnistrate.cloud/2022-09-01-00".to_string()
}

fn default_subscription_action_url() -> String {
    "https://app.falkordb.cloud/api/action?endpoint=%2Fsubscription".to_string()
}

fn default_environment_type() -> String {
    "PROD".to_string()
}

fn default_reserved_resource_prefix() -> String {
    "Omnistrate".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            auth_token_url: default_auth_token_url(),
            api_base_url: default_api_base_url(),
            subscription_action_url: default_subscription_action_url(),
            api_key: String::new(),
            service_id: String::new(),
            environment_id: String::new(),
            environment_type: default_environment_type(),
            reserved_resource_prefix: default_reserved_resource_prefix(),
        }
    }
}

impl fmt::Debug for FleetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetConfig")
            .field("auth_token_url", &self.auth_token_url)
            .field("api_base_url", &self.api_base_url)
            .field("subscription_action_url", &self.subscription_action_url)
            .field("api_key", &"<redacted>")
            .field("service_id", &self.service_id)
            .field("environment_id", &self.environment_id)
            .field("environment_type", &self.environment_type)
            .field("reserved_resource_prefix", &self.reserved_resource_prefix)
            .finish()
    }
}

impl FleetConfig {
    /// Point every endpoint at one base URL (used with local mock servers).
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_token_url: format!("{base}/omnistrate/token"),
            api_base_url: base.to_string(),
            subscription_action_url: format!("{base}/api/action?endpoint=%2Fsubscription"),
            ..Self::default()
        }
    }

    /// Check that the deployment parameters needed at runtime are set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.service_id.is_empty() {
            return Err(ConfigError::Missing("service_id"));
        }
        if self.environment_id.is_empty() {
            return Err(ConfigError::Missing("environment_id"));
        }
        // Every resource name starts with "", which would hide all endpoints.
        if self.reserved_resource_prefix.is_empty() {
            return Err(ConfigError::Missing("reserved_resource_prefix"));
        }
        Ok(())
    }
}

impl LinkConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LinkConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
