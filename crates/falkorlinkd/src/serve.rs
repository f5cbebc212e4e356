//! `serve` mode: open the store, build the fleet client and reconciler,
//! and run the REST API until Ctrl-C.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use falkorlink_core::LinkConfig;
use falkorlink_fleet::FleetClient;
use falkorlink_link::Reconciler;
use falkorlink_state::StateStore;
use tracing::{info, warn};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Configuration file (TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port to listen on. Overrides `[server] port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Data directory for persistent state. Overrides `[state] data_dir`.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Fleet API key.
    #[arg(long, env = "FALKORDB_AUTH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Fleet service id.
    #[arg(long, env = "FALKORDB_SERVICE_ID")]
    pub service_id: Option<String>,

    /// Fleet environment id.
    #[arg(long, env = "FALKORDB_ENVIRONMENT_ID")]
    pub environment_id: Option<String>,
}

/// Load a config file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LinkConfig> {
    match path {
        Some(path) => LinkConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(LinkConfig::default()),
    }
}

/// Apply command-line and environment overrides on top of the file config.
pub fn resolve_config(args: &ServeArgs) -> anyhow::Result<LinkConfig> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = &args.data_dir {
        config.state.data_dir = dir.clone();
    }
    if let Some(key) = &args.api_key {
        config.fleet.api_key = key.clone();
    }
    if let Some(id) = &args.service_id {
        config.fleet.service_id = id.clone();
    }
    if let Some(id) = &args.environment_id {
        config.fleet.environment_id = id.clone();
    }

    config.fleet.validate()?;
    Ok(config)
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    info!(fleet = ?config.fleet, "FalkorLink daemon starting");

    // State store.
    std::fs::create_dir_all(&config.state.data_dir)?;
    let db_path = config.state.data_dir.join("falkorlink.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    // Fleet client + reconciler.
    let fleet = Arc::new(FleetClient::new(config.fleet.clone()));
    let reconciler = Arc::new(Reconciler::with_store(fleet, store));

    // ── Start API server ───────────────────────────────────────

    let router = falkorlink_api::build_router(reconciler);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("FalkorLink daemon stopped");
    Ok(())
}
