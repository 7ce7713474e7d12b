//! Device-local persistence of the key pair
//!
//! The key pair lives in two string slots: the private key as JWK JSON and
//! the public key as Base64. A [`KeyStore`] only knows about slots; the
//! [`KeyPairManager`] decides what goes in them.

mod file;
mod manager;
mod memory;

pub use file::FileKeyStore;
pub use manager::{Initialized, KeyLoadFailure, KeyOrigin, KeyPairManager, ManagerError};
pub use memory::MemoryKeyStore;

/// Slot holding the JSON-serialized private key record
pub const PRIVATE_KEY_SLOT: &str = "e2e_private_key";
/// Slot holding the Base64 public key
pub const PUBLIC_KEY_SLOT: &str = "e2e_public_key";

#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("key store error: {0}")]
    Internal(String),
}

/// String-valued slot storage
///
/// Writes to a single slot must be atomic: a reader sees either the old or
/// the new value, never a mix. Nothing is promised across slots.
pub trait KeyStore: Send + Sync + std::fmt::Debug {
    /// Read a slot, returning `None` if it was never written or was removed
    fn read(&self, slot: &str) -> Result<Option<String>, KeyStoreError>;

    /// Write a slot, replacing any previous value
    fn write(&self, slot: &str, value: &str) -> Result<(), KeyStoreError>;

    /// Remove a slot. Removing an empty slot is not an error.
    fn remove(&self, slot: &str) -> Result<(), KeyStoreError>;
}
