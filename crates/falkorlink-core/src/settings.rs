//! Per-site settings record and its schema checks.
//!
//! The record is persisted as camelCase JSON. `SiteSettings::from_value`
//! is the single entry point for reading a stored record: it deserializes
//! and then enforces the rules serde cannot express (email shape,
//! non-empty password). Records written by the old length-based slot rule
//! may repeat an `idx`; they are accepted as-is.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::AttachedInstance;

static EMAIL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});

/// Reasons a settings record fails validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed settings record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("no environment-variable slots left after {0}")]
    SlotsExhausted(u32),
}

/// Account credentials and attached instances for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub email: String,
    pub password: String,
    /// Attached instances in attachment order.
    #[serde(default)]
    pub instances: Vec<AttachedInstance>,
    /// Next slot to hand out. Absent in records written before the counter existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_idx: Option<u32>,
}

impl SiteSettings {
    /// Build fresh settings from account credentials.
    pub fn new(email: &str, password: &str) -> Result<Self, SchemaError> {
        let settings = Self {
            email: email.trim().to_string(),
            password: password.to_string(),
            instances: Vec::new(),
            next_idx: None,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate a stored record.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SchemaError> {
        let settings: SiteSettings = serde_json::from_value(value.clone())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, SchemaError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if !EMAIL_REGEX.is_match(&self.email) {
            return Err(SchemaError::InvalidEmail(self.email.clone()));
        }
        if self.password.is_empty() {
            return Err(SchemaError::EmptyPassword);
        }
        Ok(())
    }

    /// Replace the account credentials, keeping attached instances.
    pub fn with_credentials(mut self, email: &str, password: &str) -> Result<Self, SchemaError> {
        self.email = email.trim().to_string();
        self.password = password.to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn find_instance(&self, id: &str) -> Option<&AttachedInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn contains_instance(&self, id: &str) -> bool {
        self.find_instance(id).is_some()
    }

    /// The slot the next attachment will receive.
    ///
    /// Never lower than one past the highest slot in use, so records that
    /// predate the counter cannot hand out a live slot twice.
    pub fn next_index(&self) -> Result<u32, SchemaError> {
        let mut next = self.next_idx.unwrap_or(0);
        for inst in &self.instances {
            let after = inst
                .idx
                .checked_add(1)
                .ok_or(SchemaError::SlotsExhausted(inst.idx))?;
            next = next.max(after);
        }
        Ok(next)
    }

    /// Reserve the next slot and advance the counter.
    pub fn allocate_index(&mut self) -> Result<u32, SchemaError> {
        let idx = self.next_index()?;
        let after = idx.checked_add(1).ok_or(SchemaError::SlotsExhausted(idx))?;
        self.next_idx = Some(after);
        Ok(idx)
    }

    /// Remove an instance by id, returning its list position and record.
    pub fn detach(&mut self, id: &str) -> Option<(usize, AttachedInstance)> {
        let pos = self.instances.iter().position(|i| i.id == id)?;
        Some((pos, self.instances.remove(pos)))
    }

    /// Client-facing view without any stored passwords.
    pub fn summary(&self) -> SettingsSummary {
        SettingsSummary {
            email: Some(self.email.clone()),
            instances: self.instances.iter().map(AttachedInstance::redacted).collect(),
        }
    }
}

/// Overlay account credentials on a stored record, keeping every other field.
///
/// A record that is not a JSON object is replaced by the credentials alone.
pub fn merge_credentials(
    stored: &serde_json::Value,
    email: &str,
    password: &str,
) -> serde_json::Value {
    let mut record = match stored {
        serde_json::Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    record.insert("email".to_string(), email.into());
    record.insert("password".to_string(), password.into());
    serde_json::Value::Object(record)
}

/// What a settings query returns to callers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSummary {
    pub email: Option<String>,
    #[serde(default)]
    pub instances: Vec<AttachedInstance>,
}
