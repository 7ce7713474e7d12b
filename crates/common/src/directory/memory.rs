use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{BackupRecord, Directory};

/// In-memory directory using HashMaps
///
/// Clones share state, so several sessions in one process can talk to the
/// same directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<RwLock<MemoryDirectoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryDirectoryInner {
    /// user_id -> base64 public key
    keys: HashMap<String, String>,
    /// user_id -> backup
    backups: HashMap<String, BackupRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    type Error = Infallible;

    async fn publish(&self, user_id: &str, public_key: &str) -> Result<(), Self::Error> {
        self.inner
            .write()
            .keys
            .insert(user_id.to_string(), public_key.to_string());
        Ok(())
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.inner.read().keys.get(user_id).cloned())
    }

    async fn store_backup(&self, user_id: &str, record: BackupRecord) -> Result<(), Self::Error> {
        self.inner
            .write()
            .backups
            .insert(user_id.to_string(), record);
        Ok(())
    }

    async fn fetch_backup(&self, user_id: &str) -> Result<Option<BackupRecord>, Self::Error> {
        Ok(self.inner.read().backups.get(user_id).cloned())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::BackupPayload;

    #[tokio::test]
    async fn test_publish_fetch_replace() {
        let directory = MemoryDirectory::new();
        assert_eq!(directory.fetch("alice").await.unwrap(), None);

        directory.publish("alice", "key-1").await.unwrap();
        directory.publish("alice", "key-2").await.unwrap();
        assert_eq!(
            directory.fetch("alice").await.unwrap().as_deref(),
            Some("key-2")
        );
        assert_eq!(directory.fetch("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_backups_are_per_user() {
        let directory = MemoryDirectory::new();
        let record = BackupRecord {
            payload: BackupPayload {
                version: 1,
                ciphertext: "AA==".to_string(),
                iv: "AA==".to_string(),
                salt: "AA==".to_string(),
            },
            password_hint: Some("pet".to_string()),
        };
        directory
            .clone()
            .store_backup("alice", record.clone())
            .await
            .unwrap();

        assert_eq!(directory.fetch_backup("alice").await.unwrap(), Some(record));
        assert_eq!(directory.fetch_backup("bob").await.unwrap(), None);
    }
}
