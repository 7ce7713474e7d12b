use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use common::directory::{BackupRecord, Directory};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// One lock per directory file, shared by every handle in this process
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<parking_lot::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
        OnceLock::new();
    LOCKS
        .get_or_init(Default::default)
        .lock()
        .entry(path.to_path_buf())
        .or_default()
        .clone()
}

#[derive(Debug, thiserror::Error)]
pub enum FileDirectoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    keys: BTreeMap<String, String>,
    #[serde(default)]
    backups: BTreeMap<String, BackupRecord>,
}

/// Directory kept in a local JSON file
///
/// Stands in for a directory server: it holds this user's own published
/// key, peer keys added by hand, and backups. Keys added here are trusted
/// as-is.
#[derive(Debug, Clone)]
pub struct FileDirectory {
    path: PathBuf,
    // serializes read-modify-write cycles on `path` within this process
    lock: Arc<Mutex<()>>,
}

impl FileDirectory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            lock: lock_for(&path),
            path,
        }
    }

    /// All known user ids and their public keys
    pub async fn entries(&self) -> Result<BTreeMap<String, String>, FileDirectoryError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.keys)
    }

    async fn read(&self) -> Result<DirectoryFile, FileDirectoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DirectoryFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, file: &DirectoryFile) -> Result<(), FileDirectoryError> {
        let json = serde_json::to_vec_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Directory for FileDirectory {
    type Error = FileDirectoryError;

    async fn publish(&self, user_id: &str, public_key: &str) -> Result<(), Self::Error> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;
        file.keys.insert(user_id.to_string(), public_key.to_string());
        self.write(&file).await
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<String>, Self::Error> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.keys.remove(user_id))
    }

    async fn store_backup(&self, user_id: &str, record: BackupRecord) -> Result<(), Self::Error> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;
        file.backups.insert(user_id.to_string(), record);
        self.write(&file).await
    }

    async fn fetch_backup(&self, user_id: &str) -> Result<Option<BackupRecord>, Self::Error> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.backups.remove(user_id))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::crypto::BackupPayload;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let directory = FileDirectory::new(temp.path().join("directory.json"));
        assert_eq!(directory.fetch("alice").await.unwrap(), None);
        assert!(directory.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("directory.json");

        let directory = FileDirectory::new(&path);
        directory.publish("alice", "a-key").await.unwrap();
        directory
            .store_backup(
                "alice",
                BackupRecord {
                    payload: BackupPayload {
                        version: 1,
                        ciphertext: "AA==".to_string(),
                        iv: "AA==".to_string(),
                        salt: "AA==".to_string(),
                    },
                    password_hint: None,
                },
            )
            .await
            .unwrap();

        let reopened = FileDirectory::new(&path);
        assert_eq!(
            reopened.fetch("alice").await.unwrap().as_deref(),
            Some("a-key")
        );
        assert!(reopened.fetch_backup("alice").await.unwrap().is_some());
        assert_eq!(reopened.entries().await.unwrap().len(), 1);
    }

    #[test]
    fn test_handles_to_one_file_share_a_lock() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("directory.json");

        let first = FileDirectory::new(&path);
        let second = FileDirectory::new(&path);
        assert!(Arc::ptr_eq(&first.lock, &second.lock));

        let other = FileDirectory::new(temp.path().join("other.json"));
        assert!(!Arc::ptr_eq(&first.lock, &other.lock));
    }

    #[tokio::test]
    async fn test_concurrent_handles_do_not_lose_writes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("directory.json");

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let directory = FileDirectory::new(&path);
                tokio::spawn(async move {
                    directory
                        .publish(&format!("user-{}", i), "key")
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(FileDirectory::new(&path).entries().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("directory.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            FileDirectory::new(&path).fetch("alice").await,
            Err(FileDirectoryError::Json(_))
        ));
    }
}
