use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{config::Settings, router, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// passgate authentication server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (defaults to ./passgate.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }

    init_tracing(&config.log_level, cli.json_logs);

    let state = Arc::new(AppState::from_settings(&config)?);
    let app = router::create_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
