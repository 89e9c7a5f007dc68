use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::VirtualHosts;
use crate::http::connection::handle_connection;

pub async fn run(
    listen_addr: &str,
    hosts: Arc<VirtualHosts>,
    idle_timeout: Duration,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, hosts, idle_timeout).await
}

/// Accepts connections forever, one task per socket.
pub async fn serve(
    listener: TcpListener,
    hosts: Arc<VirtualHosts>,
    idle_timeout: Duration,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let hosts = hosts.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, hosts, idle_timeout).await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
