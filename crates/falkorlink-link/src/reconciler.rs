//! Reconciler — drives attach/detach between fleet discovery and site storage.
//!
//! Attach: load config → validate → duplicate check → tokens → discovery →
//! allocate slot → persist config → write variables. Detach mirrors it with
//! the slot stored on the record. The two stores share no transaction, so a
//! failed variable write is compensated by restoring the previous config.

use std::sync::Arc;

use falkorlink_core::{
    AttachedInstance, FalkorInstance, SettingsSummary, SiteSettings, client_snippet,
    connection_variables, env_var_names, merge_credentials,
};
use falkorlink_fleet::{AdminToken, FleetDirectory, UserToken};
use falkorlink_state::StateStore;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::collaborators::{
    EnvironmentVariables, SiteConfigurations, VariableDeletion, VariableUpdate,
};
use crate::context::SiteContext;
use crate::error::{LinkError, LinkResult};

/// Input for attaching an instance to a site.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub instance_id: String,
    pub username: String,
    pub password: String,
}

/// Orchestrates settings, discovery, and attachment for sites.
pub struct Reconciler {
    fleet: Arc<dyn FleetDirectory>,
    configs: Arc<dyn SiteConfigurations>,
    env: Arc<dyn EnvironmentVariables>,
}

impl Reconciler {
    pub fn new(
        fleet: Arc<dyn FleetDirectory>,
        configs: Arc<dyn SiteConfigurations>,
        env: Arc<dyn EnvironmentVariables>,
    ) -> Self {
        Self { fleet, configs, env }
    }

    /// Use one `StateStore` for both configuration and variables.
    pub fn with_store(fleet: Arc<dyn FleetDirectory>, store: StateStore) -> Self {
        let store = Arc::new(store);
        Self::new(fleet, store.clone(), store)
    }

    // ── Site settings ──────────────────────────────────────────────

    /// Current account and attached instances; empty when nothing is stored.
    pub async fn query_settings(&self, ctx: &SiteContext) -> LinkResult<SettingsSummary> {
        let Some(raw) = self.load_raw(ctx).await? else {
            return Ok(SettingsSummary::default());
        };
        match SiteSettings::from_value(&raw) {
            Ok(settings) => Ok(settings.summary()),
            Err(e) => {
                warn!(team_id = %ctx.team_id, site_id = %ctx.site_id, error = %e, "failed to parse site settings");
                Ok(SettingsSummary::default())
            }
        }
    }

    /// Validate account credentials upstream, then store them.
    ///
    /// Existing attachments and the slot counter are kept.
    pub async fn set_account(
        &self,
        ctx: &SiteContext,
        email: &str,
        password: &str,
    ) -> LinkResult<SettingsSummary> {
        let fresh = SiteSettings::new(email, password).map_err(LinkError::InvalidConfig)?;
        self.resolve_tokens(&fresh).await?;

        // Credentials are merged over whatever is stored so unknown or
        // unreadable fields (including attachments) survive the update.
        let merged = match self.load_raw(ctx).await? {
            None => fresh.to_value().map_err(LinkError::InvalidConfig)?,
            Some(raw) => merge_credentials(&raw, &fresh.email, &fresh.password),
        };

        let summary = match SiteSettings::from_value(&merged) {
            Ok(settings) => {
                self.persist(ctx, &settings).await?;
                settings.summary()
            }
            Err(e) => {
                warn!(team_id = %ctx.team_id, site_id = %ctx.site_id, error = %e, "site settings still unreadable after credential update");
                self.persist_value(ctx, &merged).await?;
                SettingsSummary {
                    email: Some(fresh.email.clone()),
                    instances: Vec::new(),
                }
            }
        };
        info!(team_id = %ctx.team_id, site_id = %ctx.site_id, "account saved");
        Ok(summary)
    }

    /// Delete the site's configuration record.
    ///
    /// Variables of still-attached instances are left in place.
    pub async fn delete_account(&self, ctx: &SiteContext) -> LinkResult<()> {
        let orphaned: Vec<String> = match self.load_raw(ctx).await? {
            Some(raw) => SiteSettings::from_value(&raw)
                .map(|s| s.instances.iter().flat_map(|i| env_var_names(i.idx)).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if !orphaned.is_empty() {
            warn!(
                team_id = %ctx.team_id,
                site_id = %ctx.site_id,
                ?orphaned,
                "deleting account with attached instances; their variables are kept"
            );
        }

        self.configs
            .delete_site_configuration(&ctx.team_id, &ctx.site_id)
            .await
            .map_err(|e| LinkError::storage("Failed to delete site configuration", e))?;
        info!(team_id = %ctx.team_id, site_id = %ctx.site_id, "account deleted");
        Ok(())
    }

    // ── Discovery ──────────────────────────────────────────────────

    /// Running instances visible to the stored account.
    pub async fn list_instances(&self, ctx: &SiteContext) -> LinkResult<Vec<FalkorInstance>> {
        let settings = self.load_settings(ctx).await?;
        let (admin, user) = self.resolve_tokens(&settings).await?;
        self.fleet
            .list_all_instances(&admin, &user)
            .await
            .map_err(LinkError::discovery)
    }

    // ── Attachment ─────────────────────────────────────────────────

    /// Attach a discovered instance and publish its variables.
    pub async fn attach(
        &self,
        ctx: &SiteContext,
        req: &AttachRequest,
    ) -> LinkResult<AttachedInstance> {
        let mut settings = self.load_settings(ctx).await?;
        if settings.contains_instance(&req.instance_id) {
            return Err(LinkError::Duplicate(req.instance_id.clone()));
        }

        let (admin, user) = self.resolve_tokens(&settings).await?;
        let discovered = self
            .fleet
            .list_all_instances(&admin, &user)
            .await
            .map_err(LinkError::discovery)?;
        let instance = discovered
            .into_iter()
            .find(|i| i.id == req.instance_id)
            .ok_or_else(|| LinkError::NotFound(format!("instance {}", req.instance_id)))?;

        let previous = settings.clone();
        let idx = settings.allocate_index().map_err(LinkError::InvalidConfig)?;
        let attached =
            AttachedInstance::from_discovered(instance, &req.username, &req.password, idx);
        settings.instances.push(attached.clone());
        self.persist(ctx, &settings).await?;

        let update = VariableUpdate {
            account_id: ctx.team_id.clone(),
            site_id: ctx.site_id.clone(),
            variables: connection_variables(&attached),
            is_secret: true,
        };
        if let Err(e) = self.env.create_or_update_variables(update).await {
            error!(team_id = %ctx.team_id, site_id = %ctx.site_id, instance_id = %attached.id, error = %e, "failed to set environment variables");
            return Err(self
                .compensate(ctx, &previous, "Failed to set environment variables", e)
                .await);
        }

        info!(
            team_id = %ctx.team_id,
            site_id = %ctx.site_id,
            instance_id = %attached.id,
            idx,
            "instance attached"
        );
        Ok(attached.redacted())
    }

    /// Detach an instance and delete its variables.
    pub async fn detach(&self, ctx: &SiteContext, instance_id: &str) -> LinkResult<AttachedInstance> {
        let mut settings = self.load_settings(ctx).await?;
        let previous = settings.clone();
        let (_, removed) = settings
            .detach(instance_id)
            .ok_or_else(|| LinkError::NotFound(format!("instance {instance_id}")))?;
        self.persist(ctx, &settings).await?;

        let deletion = VariableDeletion {
            account_id: ctx.team_id.clone(),
            site_id: ctx.site_id.clone(),
            variables: env_var_names(removed.idx),
        };
        if let Err(e) = self.env.delete_environment_variables(deletion).await {
            error!(team_id = %ctx.team_id, site_id = %ctx.site_id, %instance_id, error = %e, "failed to delete environment variables");
            return Err(self
                .compensate(ctx, &previous, "Failed to delete environment variables", e)
                .await);
        }

        info!(
            team_id = %ctx.team_id,
            site_id = %ctx.site_id,
            %instance_id,
            idx = removed.idx,
            "instance detached"
        );
        Ok(removed.redacted())
    }

    /// Connection snippet for an attached instance.
    pub async fn client_code(&self, ctx: &SiteContext, instance_id: &str) -> LinkResult<String> {
        let settings = self.load_settings(ctx).await?;
        let instance = settings
            .find_instance(instance_id)
            .ok_or_else(|| LinkError::NotFound(format!("instance {instance_id}")))?;
        Ok(client_snippet(instance.idx))
    }

    // ── Internals ──────────────────────────────────────────────────

    async fn load_raw(&self, ctx: &SiteContext) -> LinkResult<Option<serde_json::Value>> {
        self.configs
            .get_site_configuration(&ctx.team_id, &ctx.site_id)
            .await
            .map_err(|e| LinkError::storage("Failed to load site configuration", e))
    }

    async fn load_settings(&self, ctx: &SiteContext) -> LinkResult<SiteSettings> {
        let raw = self
            .load_raw(ctx)
            .await?
            .ok_or_else(|| LinkError::NotFound("site configuration".to_string()))?;
        SiteSettings::from_value(&raw).map_err(|e| {
            warn!(team_id = %ctx.team_id, site_id = %ctx.site_id, error = %e, "invalid site configuration");
            LinkError::InvalidConfig(e)
        })
    }

    /// Upsert-or-create the settings record.
    async fn persist(&self, ctx: &SiteContext, settings: &SiteSettings) -> LinkResult<()> {
        let value = settings.to_value().map_err(LinkError::InvalidConfig)?;
        self.persist_value(ctx, &value).await?;
        debug!(team_id = %ctx.team_id, site_id = %ctx.site_id, instances = settings.instances.len(), "site settings persisted");
        Ok(())
    }

    async fn persist_value(&self, ctx: &SiteContext, value: &serde_json::Value) -> LinkResult<()> {
        let result = if self.load_raw(ctx).await?.is_some() {
            self.configs
                .update_site_configuration(&ctx.team_id, &ctx.site_id, value)
                .await
        } else {
            self.configs
                .create_site_configuration(&ctx.team_id, &ctx.site_id, value)
                .await
        };
        result.map_err(|e| LinkError::storage("Failed to save site configuration", e))
    }

    /// Admin token, then user token for the stored account.
    async fn resolve_tokens(&self, settings: &SiteSettings) -> LinkResult<(AdminToken, UserToken)> {
        let admin = self
            .fleet
            .admin_token()
            .await
            .map_err(LinkError::invalid_credentials)?;
        let user = self
            .fleet
            .user_token(&admin, &settings.email, &settings.password)
            .await
            .map_err(LinkError::invalid_credentials)?;
        Ok((admin, user))
    }

    /// Restore `previous` after a failed variable write and build the error to surface.
    async fn compensate(
        &self,
        ctx: &SiteContext,
        previous: &SiteSettings,
        message: &str,
        cause: anyhow::Error,
    ) -> LinkError {
        match self.persist(ctx, previous).await {
            Ok(()) => {
                warn!(team_id = %ctx.team_id, site_id = %ctx.site_id, "site configuration reverted");
                LinkError::EnvSyncFailed {
                    message: message.to_string(),
                    source: cause,
                }
            }
            Err(revert) => {
                error!(team_id = %ctx.team_id, site_id = %ctx.site_id, error = %revert, "failed to revert site configuration");
                LinkError::EnvSyncFailed {
                    message: format!("{message}; reverting the site configuration also failed"),
                    source: cause,
                }
            }
        }
    }
}
