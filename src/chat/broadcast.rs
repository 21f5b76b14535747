//! Broadcast fan-out
//!
//! Delivers one message to every registered connection, optionally
//! excluding a single sender.

use log::{info, warn};

use crate::client::registry::{ConnId, Registry};

/// Delivers `message` to every registered connection except `exclude`.
///
/// `exclude` is keyed by connection handle: `None` means nobody is
/// excluded, as used for join and leave announcements. The registry lock
/// is only held while taking the snapshot; each recipient is then written
/// independently, and a failed delivery is logged without aborting the
/// remaining recipients.
pub async fn broadcast(registry: &Registry, message: &str, exclude: Option<ConnId>) {
    info!("[CHAT] {}", message.trim_end());

    for (handle, peer) in registry.snapshot_excluding(exclude).await {
        if let Err(e) = peer.send(message.to_string()) {
            warn!(
                "Failed to deliver to {} ({}): {}",
                peer.identity().name(),
                handle,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn register_peer(
        registry: &Registry,
        handle: ConnId,
        name: &str,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(8);
        registry
            .register(handle, name, tx)
            .await
            .expect("registration should succeed");
        rx
    }

    #[tokio::test]
    async fn test_sender_is_excluded_from_its_own_chat_line() {
        let registry = Registry::new();
        let mut alice_rx = register_peer(&registry, ConnId::new(1), "alice").await;
        let mut bobby_rx = register_peer(&registry, ConnId::new(2), "bobby").await;

        broadcast(&registry, "alice: hi\n", Some(ConnId::new(1))).await;

        assert_eq!(bobby_rx.try_recv().unwrap(), "alice: hi\n");
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_announcements_reach_everyone() {
        let registry = Registry::new();
        let mut alice_rx = register_peer(&registry, ConnId::new(1), "alice").await;
        let mut bobby_rx = register_peer(&registry, ConnId::new(2), "bobby").await;

        broadcast(&registry, "carol joined the chat\n", None).await;

        assert_eq!(alice_rx.try_recv().unwrap(), "carol joined the chat\n");
        assert_eq!(bobby_rx.try_recv().unwrap(), "carol joined the chat\n");
    }

    #[tokio::test]
    async fn test_one_failed_delivery_does_not_abort_the_rest() {
        let registry = Registry::new();

        // alice's writer is already gone; deliveries to her fail
        let alice_rx = register_peer(&registry, ConnId::new(1), "alice").await;
        drop(alice_rx);
        let mut bobby_rx = register_peer(&registry, ConnId::new(2), "bobby").await;
        let mut carol_rx = register_peer(&registry, ConnId::new(3), "carol").await;

        broadcast(&registry, "daveh joined the chat\n", None).await;

        assert_eq!(bobby_rx.try_recv().unwrap(), "daveh joined the chat\n");
        assert_eq!(carol_rx.try_recv().unwrap(), "daveh joined the chat\n");
    }
}
