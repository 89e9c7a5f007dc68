use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use triton::config::{Config, VirtualHosts};
use triton::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_file(path)?,
        None => Config::load()?,
    };

    let hosts = VirtualHosts::load(&cfg.virtual_hosts).context("Invalid virtual host setup")?;
    if hosts.is_empty() {
        tracing::warn!("No virtual hosts configured, every request will get 400");
    } else {
        tracing::info!(count = hosts.len(), "Loaded virtual hosts");
    }

    tokio::select! {
        res = server::listener::run(&cfg.listen_addr, Arc::new(hosts), cfg.idle_timeout()) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
