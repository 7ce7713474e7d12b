use std::collections::HashMap;

use parking_lot::RwLock;

use crate::crypto::{CodecError, PublicKey, SecretKey, SharedKey};

/// Cache key: a peer together with the exact public key agreed with
///
/// Keying on the public key as well as the peer means a peer who rotates
/// their key pair gets a fresh agreement instead of a stale secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    peer_id: String,
    public_key: String,
}

/// Derived shared keys, memoized for the lifetime of a session
///
/// Lookups and inserts take the lock briefly; derivation happens outside
/// it. Two concurrent misses on the same key both derive and the second
/// insert overwrites the first with an identical key.
#[derive(Debug, Default)]
pub struct SharedSecretCache {
    entries: RwLock<HashMap<CacheKey, SharedKey>>,
}

impl SharedSecretCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared key for `(peer_id, peer_public_key)`, deriving it on
    /// a miss
    ///
    /// # Errors
    ///
    /// Returns an error if `peer_public_key` is not a valid Base64 P-256 key.
    /// Nothing is cached in that case.
    pub fn get_or_derive(
        &self,
        local: &SecretKey,
        peer_public_key: &str,
        peer_id: &str,
    ) -> Result<SharedKey, CodecError> {
        let key = CacheKey {
            peer_id: peer_id.to_string(),
            public_key: peer_public_key.to_string(),
        };

        if let Some(shared) = self.entries.read().get(&key) {
            return Ok(shared.clone());
        }

        let peer = PublicKey::from_base64(peer_public_key)?;
        let shared = SharedKey::derive(local, &peer);
        tracing::debug!(peer_id, "derived shared key");

        self.entries.write().insert(key, shared.clone());
        Ok(shared)
    }

    /// Drop every cached key
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        tracing::debug!(entries = entries.len(), "clearing shared key cache");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
