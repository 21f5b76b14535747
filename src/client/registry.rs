//! Client registry
//!
//! The authoritative mapping from live connections to registered
//! identities. Owns the username invariants: names are unique
//! (case-sensitive) and within length bounds. All operations run inside a
//! single mutual-exclusion domain, so the uniqueness check and the insert
//! in [`Registry::register`] form one atomic unit, and a snapshot never
//! observes a half-applied mutation.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::client::Identity;
use crate::error::NameError;

/// Minimum accepted username length, in bytes
pub const MIN_NAME_LEN: usize = 3;

/// Maximum accepted username length, in bytes
pub const MAX_NAME_LEN: usize = 16;

/// Opaque token identifying one live connection.
///
/// Issued by the server when a connection is accepted and never reused for
/// the lifetime of the process. Equality is by token, not by the identity
/// registered under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

impl ConnId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One registered connection as seen through a registry snapshot.
#[derive(Clone)]
pub struct Peer {
    identity: Identity,
    outbound: mpsc::Sender<String>,
}

impl Peer {
    /// Returns the identity registered for this connection.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Queues a message for this peer's writer task.
    ///
    /// Best-effort: fails when the peer's outbound queue is full or its
    /// writer has already shut down.
    pub fn send(&self, message: String) -> Result<(), TrySendError<String>> {
        self.outbound.try_send(message)
    }
}

/// Registry of connections that have completed username negotiation.
///
/// An entry exists for a connection iff it has registered a name and has
/// not yet disconnected; mid-negotiation connections are invisible here.
pub struct Registry {
    peers: Mutex<HashMap<ConnId, Peer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `name` for `handle`, storing `outbound` as the delivery
    /// queue for broadcasts.
    ///
    /// The length checks and the uniqueness check-then-insert happen under
    /// one lock acquisition, so of two concurrent calls with the same name
    /// at most one can succeed. Returns the identity that was inserted.
    pub async fn register(
        &self,
        handle: ConnId,
        name: &str,
        outbound: mpsc::Sender<String>,
    ) -> Result<Identity, NameError> {
        if name.len() < MIN_NAME_LEN {
            return Err(NameError::TooShort(name.to_string()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong(name.to_string()));
        }

        let mut peers = self.peers.lock().await;

        if peers.values().any(|peer| peer.identity.name() == name) {
            return Err(NameError::Taken(name.to_string()));
        }

        let identity = Identity::new(name.to_string());
        peers.insert(
            handle,
            Peer {
                identity: identity.clone(),
                outbound,
            },
        );

        Ok(identity)
    }

    /// Removes the entry for `handle`, returning the identity it held.
    ///
    /// Safe to call for a handle that never completed negotiation or was
    /// already removed; both cases return `None`.
    pub async fn unregister(&self, handle: ConnId) -> Option<Identity> {
        self.peers.lock().await.remove(&handle).map(|peer| peer.identity)
    }

    /// Looks up the identity registered for `handle`.
    pub async fn identity_of(&self, handle: ConnId) -> Option<Identity> {
        self.peers
            .lock()
            .await
            .get(&handle)
            .map(|peer| peer.identity.clone())
    }

    /// Returns every current entry, omitting `exclude` when given.
    ///
    /// The returned snapshot reflects a single consistent instant of the
    /// registry; callers iterate it after the lock is released, so delivery
    /// I/O never runs inside the critical section.
    pub async fn snapshot_excluding(&self, exclude: Option<ConnId>) -> Vec<(ConnId, Peer)> {
        self.peers
            .lock()
            .await
            .iter()
            .filter(|(handle, _)| Some(**handle) != exclude)
            .map(|(handle, peer)| (*handle, peer.clone()))
            .collect()
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Registry tests never deliver anything, a dangling sender is enough
    fn outbound() -> mpsc::Sender<String> {
        mpsc::channel(8).0
    }

    #[tokio::test]
    async fn test_register_length_bounds() {
        let registry = Registry::new();

        assert!(matches!(
            registry.register(ConnId::new(1), "ab", outbound()).await,
            Err(NameError::TooShort(_))
        ));
        assert!(matches!(
            registry
                .register(ConnId::new(1), &"a".repeat(17), outbound())
                .await,
            Err(NameError::TooLong(_))
        ));

        // Boundary lengths are accepted
        assert!(registry.register(ConnId::new(1), "abc", outbound()).await.is_ok());
        assert!(
            registry
                .register(ConnId::new(2), &"a".repeat(16), outbound())
                .await
                .is_ok()
        );
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let registry = Registry::new();

        registry
            .register(ConnId::new(1), "alice", outbound())
            .await
            .expect("first registration should succeed");

        assert!(matches!(
            registry.register(ConnId::new(2), "alice", outbound()).await,
            Err(NameError::Taken(_))
        ));

        // Uniqueness is case-sensitive
        assert!(
            registry
                .register(ConnId::new(2), "Alice", outbound())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_name_free_again_after_unregister() {
        let registry = Registry::new();

        registry
            .register(ConnId::new(1), "alice", outbound())
            .await
            .expect("registration should succeed");
        registry.unregister(ConnId::new(1)).await;

        assert!(
            registry
                .register(ConnId::new(2), "alice", outbound())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent_and_safe_mid_negotiation() {
        let registry = Registry::new();

        // Never registered: a no-op, not an error
        assert_eq!(registry.unregister(ConnId::new(7)).await, None);

        registry
            .register(ConnId::new(1), "alice", outbound())
            .await
            .expect("registration should succeed");

        let removed = registry.unregister(ConnId::new(1)).await;
        assert_eq!(removed.map(|i| i.name().to_string()), Some("alice".to_string()));
        assert_eq!(registry.unregister(ConnId::new(1)).await, None);
        assert_eq!(registry.identity_of(ConnId::new(1)).await, None);
    }

    #[tokio::test]
    async fn test_identity_of_registered_handle() {
        let registry = Registry::new();

        registry
            .register(ConnId::new(1), "alice", outbound())
            .await
            .expect("registration should succeed");

        let identity = registry
            .identity_of(ConnId::new(1))
            .await
            .expect("identity should exist");
        assert_eq!(identity.name(), "alice");
        assert!(!identity.is_privileged());
    }

    #[tokio::test]
    async fn test_snapshot_excluding_omits_only_the_excluded_handle() {
        let registry = Registry::new();

        registry.register(ConnId::new(1), "alice", outbound()).await.unwrap();
        registry.register(ConnId::new(2), "bobby", outbound()).await.unwrap();
        registry.register(ConnId::new(3), "carol", outbound()).await.unwrap();

        let all = registry.snapshot_excluding(None).await;
        assert_eq!(all.len(), 3);

        let without_bobby = registry.snapshot_excluding(Some(ConnId::new(2))).await;
        assert_eq!(without_bobby.len(), 2);
        assert!(
            without_bobby
                .iter()
                .all(|(handle, _)| *handle != ConnId::new(2))
        );
    }

    #[tokio::test]
    async fn test_concurrent_registers_with_same_name() {
        let registry = Arc::new(Registry::new());

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry.register(ConnId::new(i), "samename", outbound()).await
                })
            })
            .collect();

        let mut accepted = 0;
        let mut taken = 0;
        for task in tasks {
            match task.await.expect("task should not panic") {
                Ok(_) => accepted += 1,
                Err(NameError::Taken(_)) => taken += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(taken, 7);
        assert_eq!(registry.len().await, 1);
    }
}
