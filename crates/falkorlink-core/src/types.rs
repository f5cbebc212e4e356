//! Shared types used across FalkorLink crates.

use serde::{Deserialize, Serialize};

/// Opaque instance identifier assigned by the fleet API.
pub type InstanceId = String;

/// Status string the fleet API reports for a serving instance.
pub const RUNNING_STATUS: &str = "RUNNING";

/// A database instance as discovered through the fleet API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FalkorInstance {
    pub id: InstanceId,
    pub name: String,
    pub cloud_provider: String,
    pub region: String,
    pub status: String,
    /// Service-assigned username (informational).
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// An instance attached to a site, as persisted in the site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedInstance {
    pub id: InstanceId,
    pub name: String,
    pub cloud_provider: String,
    pub region: String,
    /// Username the site connects with.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Slot number used to derive environment-variable names.
    pub idx: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AttachedInstance {
    /// Merge a discovered instance with the per-instance credentials and slot.
    pub fn from_discovered(
        instance: FalkorInstance,
        username: &str,
        password: &str,
        idx: u32,
    ) -> Self {
        Self {
            id: instance.id,
            name: instance.name,
            cloud_provider: instance.cloud_provider,
            region: instance.region,
            username: username.to_string(),
            hostname: instance.hostname,
            port: instance.port,
            idx,
            password: Some(password.to_string()),
        }
    }

    /// Copy without the stored password.
    pub fn redacted(&self) -> Self {
        Self {
            password: None,
            ..self.clone()
        }
    }
}
