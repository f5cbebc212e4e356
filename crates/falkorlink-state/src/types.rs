//! Record types for the FalkorLink state store.

use serde::{Deserialize, Serialize};

/// A stored site configuration.
///
/// `config` is kept as raw JSON; its shape is validated by readers, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfigRecord {
    pub team_id: String,
    pub site_id: String,
    pub config: serde_json::Value,
    /// Incremented on every update.
    pub version: u64,
    /// Unix timestamp (seconds) when the record was created.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last update.
    pub updated_at: u64,
}

/// A single environment variable for a site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvVar {
    pub account_id: String,
    pub site_id: String,
    pub name: String,
    pub value: String,
    pub is_secret: bool,
    pub updated_at: u64,
}

/// Joins the parts of composite table keys. Ids must not contain it.
pub const KEY_SEPARATOR: char = '/';

pub fn site_key(team_id: &str, site_id: &str) -> String {
    format!("{team_id}{KEY_SEPARATOR}{site_id}")
}

pub fn env_key(account_id: &str, site_id: &str, name: &str) -> String {
    format!("{account_id}{KEY_SEPARATOR}{site_id}{KEY_SEPARATOR}{name}")
}

impl SiteConfigRecord {
    /// Build the composite key for the site configs table.
    pub fn table_key(&self) -> String {
        site_key(&self.team_id, &self.site_id)
    }
}

impl EnvVar {
    /// Build the composite key for the env vars table.
    pub fn table_key(&self) -> String {
        env_key(&self.account_id, &self.site_id, &self.name)
    }
}
