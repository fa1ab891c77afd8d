//! Rating Editor (pitchside-re) - Main entry point
//!
//! Loads the roster and rating snapshot of the configured scope from the league
//! backend and serves the rating editor over HTTP until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pitchside_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use pitchside_re::api::{self, AppContext};
use pitchside_re::backend::{ActorRole, EditorPorts, HttpBackend, StaticGate};
use pitchside_re::editor::WeightedMean;
use pitchside_re::RatingEditor;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for pitchside-re
#[derive(Parser, Debug)]
#[command(name = "pitchside-re")]
#[command(about = "Athlete rating editor service for Pitchside")]
#[command(version)]
struct Args {
    /// Path to pitchside.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "PITCHSIDE_RE_PORT")]
    port: Option<u16>,

    /// Backend API base URL (overrides config)
    #[arg(long, env = "PITCHSIDE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Scope whose roster is edited (overrides config)
    #[arg(long, env = "PITCHSIDE_SCOPE")]
    scope: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let mut config = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    // Optional log file alongside stderr
    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "pitchside_re={0},pitchside_common={0},tower_http=info",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    if let Some(url) = args.backend_url {
        config.backend.base_url = url;
    }
    if let Some(scope) = args.scope {
        config.backend.scope = scope;
    }
    let port = args.port.unwrap_or(config.server.port);

    info!("Starting Pitchside rating editor on port {}", port);
    info!(
        "Backend: {} (scope {})",
        config.backend.base_url, config.backend.scope
    );

    let role: ActorRole = config
        .editor
        .role
        .parse()
        .context("Invalid editor.role")?;
    let policy = WeightedMean::try_from(config.editor.composite)
        .context("Invalid editor.composite weights")?;
    let backend = Arc::new(HttpBackend::new(&config.backend).context("Failed to build backend client")?);
    let editor = RatingEditor::new(
        EditorPorts::from_backend(backend),
        Arc::new(StaticGate::for_role(role)),
        Arc::new(policy),
        config.editor.clone(),
    )
    .context("Failed to create rating editor")?;

    editor
        .load()
        .await
        .context("Failed to load roster and ratings")?;

    let ctx = AppContext {
        editor: editor.clone(),
    };
    api::run(ctx, port, shutdown_signal())
        .await
        .context("Server error")?;

    editor.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
