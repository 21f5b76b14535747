use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use crate::client::handle_client;
use crate::client::registry::{ConnId, Registry};
use crate::config::ServerConfig;
use crate::error::ChatServerError;
use crate::protocol::messages;

pub struct Server {
    registry: Arc<Registry>,
    listener: TcpListener,
    config: ServerConfig,
    conn_seq: AtomicU64,
}

impl Server {
    /// Binds the listener and prepares the shared registry.
    pub async fn new(config: ServerConfig) -> Result<Self, ChatServerError> {
        let addr = config.socket_addr();

        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!("Server bound to {}", addr);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", addr, e);
                return Err(e.into());
            }
        };

        Ok(Self {
            registry: Arc::new(Registry::new()),
            listener,
            config,
            conn_seq: AtomicU64::new(1),
        })
    }

    /// Runs the accept loop. Does not return under normal operation.
    pub async fn start(&self) {
        info!(
            "Chat relay listening on {} (max {} clients)",
            self.config.socket_addr(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((mut stream, addr)) => {
                    info!("New connection from {}", addr);

                    // Capacity counts registered clients; turn the
                    // connection away before it starts negotiating.
                    if self.registry.len().await >= self.config.max_clients {
                        warn!("Rejecting {}: server at capacity", addr);
                        let _ = stream.write_all(messages::SERVER_FULL.as_bytes()).await;
                        continue;
                    }

                    let conn_id = ConnId::new(self.conn_seq.fetch_add(1, Ordering::Relaxed));
                    let registry = Arc::clone(&self.registry);

                    // Spawn a task per client so the accept loop doesn't block
                    tokio::spawn(async move {
                        handle_client(stream, conn_id, addr, registry).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    /// Address the listener is bound to. Useful when configured with port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
