//! Client session handler
//!
//! Drives one connection through the username negotiation and active chat
//! phases, and guarantees cleanup runs exactly once when the connection
//! closes, whichever phase it was in.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;

use crate::chat::broadcast;
use crate::client::Identity;
use crate::client::registry::{ConnId, Registry};
use crate::protocol::messages;

/// Bound on each connection's outbound delivery queue
const OUTBOUND_QUEUE_SIZE: usize = 64;

/// Handles one client connection from accept to disconnect.
///
/// All bytes to this client flow through its outbound queue, drained by a
/// dedicated writer task, so broadcasts from other connections never block
/// on this client's socket.
pub async fn handle_client(
    stream: TcpStream,
    conn_id: ConnId,
    client_addr: SocketAddr,
    registry: Arc<Registry>,
) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let (outbound_tx, outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_SIZE);
    let writer = tokio::spawn(write_outbound(outbound_rx, write_half, client_addr));

    if let Err(e) = run_session(&mut reader, conn_id, client_addr, &outbound_tx, &registry).await {
        warn!("Connection {} from {} failed: {}", conn_id, client_addr, e);
    }

    // Cleanup is exactly-once: the entry can only be removed here, and a
    // departure is only announced for a name that actually joined.
    if let Some(identity) = registry.unregister(conn_id).await {
        broadcast(&registry, &messages::left(identity.name()), None).await;
    }

    drop(outbound_tx);
    let _ = writer.await;

    info!("Client {} disconnected", client_addr);
}

/// Runs the two session phases. Returns `Ok` on a clean disconnect (EOF)
/// and `Err` on a transport failure; either way the caller performs the
/// same cleanup.
async fn run_session(
    reader: &mut BufReader<OwnedReadHalf>,
    conn_id: ConnId,
    client_addr: SocketAddr,
    outbound: &mpsc::Sender<String>,
    registry: &Registry,
) -> io::Result<()> {
    let identity = match negotiate_username(reader, conn_id, client_addr, outbound, registry).await?
    {
        Some(identity) => identity,
        // Disconnected before ever registering: nothing joined, nothing to announce
        None => return Ok(()),
    };

    broadcast(registry, &messages::joined(identity.name()), None).await;

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Connection closed by client {}", client_addr);
                return Ok(());
            }
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']);

                // Blank and single-character lines are keep-alive noise
                if trimmed.len() <= 1 {
                    continue;
                }

                match registry.identity_of(conn_id).await {
                    Some(identity) => {
                        broadcast(
                            registry,
                            &messages::chat_line(identity.name(), trimmed),
                            Some(conn_id),
                        )
                        .await;
                    }
                    None => {
                        error!("Connection {} has no registry entry, dropping it", conn_id);
                        return Ok(());
                    }
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Repeatedly prompts for a username until one registers successfully.
///
/// Rejections go to this connection only; the connection stays invisible
/// to broadcast until registration succeeds. Returns `None` when the
/// client disconnects before completing negotiation.
async fn negotiate_username(
    reader: &mut BufReader<OwnedReadHalf>,
    conn_id: ConnId,
    client_addr: SocketAddr,
    outbound: &mpsc::Sender<String>,
    registry: &Registry,
) -> io::Result<Option<Identity>> {
    let mut line = String::new();

    loop {
        queue_message(outbound, messages::USERNAME_PROMPT.to_string()).await?;

        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }

        let name = line.trim_end_matches(['\r', '\n']);

        match registry.register(conn_id, name, outbound.clone()).await {
            Ok(identity) => {
                info!(
                    "Connection {} from {} registered as {}",
                    conn_id,
                    client_addr,
                    identity.name()
                );
                return Ok(Some(identity));
            }
            Err(e) => {
                warn!("Connection {} rejected username {:?}: {}", conn_id, name, e);
                queue_message(outbound, messages::name_rejection(&e)).await?;
            }
        }
    }
}

/// Queues a line for this session's own client.
///
/// A closed queue means the writer task is gone, which the session treats
/// as a dead connection.
async fn queue_message(outbound: &mpsc::Sender<String>, message: String) -> io::Result<()> {
    outbound
        .send(message)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "outbound writer closed"))
}

/// Drains a connection's outbound queue onto its socket.
///
/// Exits when the queue closes or a write fails; a write failure surfaces
/// to the session as a dead connection on its next read or send.
async fn write_outbound(
    mut outbound_rx: mpsc::Receiver<String>,
    mut write_half: OwnedWriteHalf,
    client_addr: SocketAddr,
) {
    while let Some(message) = outbound_rx.recv().await {
        if let Err(e) = write_half.write_all(message.as_bytes()).await {
            error!("Failed to write to {}: {}", client_addr, e);
            break;
        }
    }
}
