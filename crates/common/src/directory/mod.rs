//! The directory collaborator: where public keys and backups are kept
//!
//! Peers find each other's public keys here, and users park their encrypted
//! private key backups here. The directory never sees a private key or a
//! password; everything it stores is either public or opaque.

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::BackupPayload;

pub use memory::MemoryDirectory;

/// A stored backup together with the optional hint shown at restore time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub payload: BackupPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hint: Option<String>,
}

#[async_trait]
pub trait Directory: Send + Sync + std::fmt::Debug + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publish (or replace) the public key for a user
    ///
    /// # Arguments
    /// * `user_id` - The user the key belongs to
    /// * `public_key` - Base64 of the raw public key bytes
    async fn publish(&self, user_id: &str, public_key: &str) -> Result<(), Self::Error>;

    /// Fetch the current public key for a user
    ///
    /// # Returns
    /// * `Ok(None)` - The user has never published a key
    async fn fetch(&self, user_id: &str) -> Result<Option<String>, Self::Error>;

    /// Store (or replace) a user's private key backup
    async fn store_backup(&self, user_id: &str, record: BackupRecord) -> Result<(), Self::Error>;

    /// Fetch a user's private key backup
    async fn fetch_backup(&self, user_id: &str) -> Result<Option<BackupRecord>, Self::Error>;
}
