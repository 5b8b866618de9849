//! # pushgate-agent
//!
//! Gateway binary: loads settings, opens the token registry, loads the APNs
//! signing identity and serves the HTTP front end until Ctrl-C.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pushgate_core::SystemClock;
use pushgate_core::logging::init_subscriber;
use pushgate_platform::apns::{ApnsClient, PollSettings, ReqwestTransport};
use pushgate_server::{
    DeliveryEngine, DeliveryOrchestrator, GatewayServer, ServerConfig, ShutdownCoordinator,
};
use pushgate_settings::{GatewaySettings, load_settings_from_path, settings_path};
use pushgate_store::{ConnectionConfig, TokenRegistry, new_file};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Upper bound on waiting for in-flight deliveries at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// APNs push gateway.
#[derive(Parser, Debug)]
#[command(name = "pushgate", about = "APNs push gateway")]
struct Cli {
    /// Settings file (default `~/.pushgate/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` token database (overrides settings).
    #[arg(long)]
    db_path: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, settings: &mut GatewaySettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(path) = &self.db_path {
            settings.storage.db_path = Some(path.to_string_lossy().into_owned());
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn open_registry(db_path: &Path) -> Result<TokenRegistry> {
    ensure_parent_dir(db_path)?;
    let pool = new_file(&db_path.to_string_lossy(), &ConnectionConfig::default())
        .context("Failed to open token database")?;
    TokenRegistry::new(pool).context("Failed to run token database migrations")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let path = args.settings.clone().unwrap_or_else(settings_path);
    let mut settings = load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    args.apply(&mut settings);

    init_subscriber(&settings.logging.level);
    info!(path = %path.display(), "settings loaded");

    let db_path = settings.storage.resolved_db_path();
    let registry = open_registry(&db_path)?;
    info!(path = %db_path.display(), "token registry ready");

    let identity = settings
        .apns
        .load_identity()
        .context("Failed to load APNs identity")?;
    info!(
        team_id = %identity.team_id,
        key_id = %identity.key_id,
        topic = %identity.topic,
        environment = %identity.default_environment,
        "APNs identity loaded"
    );

    let transport = ReqwestTransport::new().context("Failed to build APNs HTTP/2 client")?;
    let poll = PollSettings::from_budget(
        Duration::from_secs(settings.apns.request_timeout_secs),
        Duration::from_millis(settings.apns.poll_interval_ms),
    );
    let client = ApnsClient::new(Arc::new(transport), poll);

    let shutdown = Arc::new(ShutdownCoordinator::new());
    let orchestrator = DeliveryOrchestrator::new(
        identity,
        registry.clone(),
        DeliveryEngine::new(client),
        Arc::new(SystemClock),
        shutdown.clone(),
    );

    let config = ServerConfig::from_settings(&settings);
    if !config.credentials.is_configured() {
        warn!("auth credentials not configured, authenticated routes will answer 401");
    }
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    let server = GatewayServer::new(config, registry, orchestrator, shutdown.clone());

    let signal_shutdown = shutdown.clone();
    let _signal = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, shutting down");
                signal_shutdown.shutdown();
            }
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    server.serve(listener).await.context("HTTP server failed")?;
    shutdown.drain(Some(DRAIN_TIMEOUT)).await;
    info!("pushgate stopped");
    Ok(())
}
