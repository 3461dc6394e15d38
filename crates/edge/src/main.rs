mod app;
mod cache;
mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod prompts;
mod state;
mod upstream;

use crate::app::build_router;
use crate::cli::Args;
use crate::config::{load_edge_config, EdgeConfig, Secrets};
use crate::logging::init_tracing;
use crate::state::build_app_state;
use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref(), args.log_to_stderr)?;

    info!(
        listen_addr = %args.listen_addr,
        config = ?args.config,
        "edge functions starting"
    );
    let config = match &args.config {
        Some(path) => load_edge_config(path)?,
        None => EdgeConfig::default(),
    };
    let secrets = Secrets::from_env();
    secrets.warn_missing();
    let shutdown = CancellationToken::new();
    let state = build_app_state(&config, secrets, shutdown.clone())?;
    let app = build_router(state);

    let listener = TcpListener::bind(&args.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_addr))?;
    info!(addr = %args.listen_addr, "edge functions listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown.clone()))
        .await?;
    info!("edge functions shutting down");
    shutdown.cancel();
    Ok(())
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    shutdown.cancel();
}
