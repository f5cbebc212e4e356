//! Storage collaborators the reconciler writes through.
//!
//! The configuration store and the environment-variable store are
//! independent; there is no transaction spanning both.

use std::collections::BTreeMap;

use async_trait::async_trait;
use falkorlink_state::StateStore;

/// Per-site configuration records (raw JSON).
#[async_trait]
pub trait SiteConfigurations: Send + Sync {
    async fn get_site_configuration(
        &self,
        team_id: &str,
        site_id: &str,
    ) -> anyhow::Result<Option<serde_json::Value>>;

    async fn create_site_configuration(
        &self,
        team_id: &str,
        site_id: &str,
        config: &serde_json::Value,
    ) -> anyhow::Result<()>;

    async fn update_site_configuration(
        &self,
        team_id: &str,
        site_id: &str,
        config: &serde_json::Value,
    ) -> anyhow::Result<()>;

    async fn delete_site_configuration(&self, team_id: &str, site_id: &str) -> anyhow::Result<()>;
}

/// A batch of variables to create or overwrite.
#[derive(Debug, Clone)]
pub struct VariableUpdate {
    pub account_id: String,
    pub site_id: String,
    pub variables: BTreeMap<String, String>,
    pub is_secret: bool,
}

/// A batch of variable names to delete.
#[derive(Debug, Clone)]
pub struct VariableDeletion {
    pub account_id: String,
    pub site_id: String,
    pub variables: Vec<String>,
}

/// Per-site environment variables.
#[async_trait]
pub trait EnvironmentVariables: Send + Sync {
    async fn create_or_update_variables(&self, update: VariableUpdate) -> anyhow::Result<()>;

    async fn delete_environment_variables(&self, deletion: VariableDeletion) -> anyhow::Result<()>;
}

#[async_trait]
impl SiteConfigurations for StateStore {
    async fn get_site_configuration(
        &self,
        team_id: &str,
        site_id: &str,
    ) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(self
            .get_site_config(team_id, site_id)?
            .map(|record| record.config))
    }

    async fn create_site_configuration(
        &self,
        team_id: &str,
        site_id: &str,
        config: &serde_json::Value,
    ) -> anyhow::Result<()> {
        self.create_site_config(team_id, site_id, config)?;
        Ok(())
    }

    async fn update_site_configuration(
        &self,
        team_id: &str,
        site_id: &str,
        config: &serde_json::Value,
    ) -> anyhow::Result<()> {
        self.update_site_config(team_id, site_id, config)?;
        Ok(())
    }

    async fn delete_site_configuration(&self, team_id: &str, site_id: &str) -> anyhow::Result<()> {
        self.delete_site_config(team_id, site_id)?;
        Ok(())
    }
}

#[async_trait]
impl EnvironmentVariables for StateStore {
    async fn create_or_update_variables(&self, update: VariableUpdate) -> anyhow::Result<()> {
        self.put_env_vars(
            &update.account_id,
            &update.site_id,
            &update.variables,
            update.is_secret,
        )?;
        Ok(())
    }

    async fn delete_environment_variables(&self, deletion: VariableDeletion) -> anyhow::Result<()> {
        self.delete_env_vars(&deletion.account_id, &deletion.site_id, &deletion.variables)?;
        Ok(())
    }
}
