//! Shared test utilities for session integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::directory::{BackupRecord, Directory, MemoryDirectory};
use common::keystore::MemoryKeyStore;
use common::session::Session;

pub type TestSession = Session<MemoryDirectory, MemoryKeyStore>;

/// Start a session for `user_id` on a fresh device against `directory`
pub async fn new_device(user_id: &str, directory: &MemoryDirectory) -> (TestSession, MemoryKeyStore) {
    let store = MemoryKeyStore::new();
    let session = Session::start(user_id, store.clone(), directory.clone())
        .await
        .unwrap();
    (session, store)
}

/// Two users, each on their own device, sharing one directory
pub async fn alice_and_bob() -> (TestSession, TestSession, MemoryDirectory) {
    let directory = MemoryDirectory::new();
    let (alice, _) = new_device("alice", &directory).await;
    let (bob, _) = new_device("bob", &directory).await;
    (alice, bob, directory)
}

/// Directory whose `publish` fails while `fail_publish` is set
#[derive(Debug, Clone, Default)]
pub struct FlakyDirectory {
    pub inner: MemoryDirectory,
    pub fail_publish: Arc<AtomicBool>,
}

#[async_trait]
impl Directory for FlakyDirectory {
    type Error = std::io::Error;

    async fn publish(&self, user_id: &str, public_key: &str) -> Result<(), Self::Error> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("directory unavailable"));
        }
        self.inner
            .publish(user_id, public_key)
            .await
            .map_err(|never| match never {})
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<String>, Self::Error> {
        self.inner.fetch(user_id).await.map_err(|never| match never {})
    }

    async fn store_backup(&self, user_id: &str, record: BackupRecord) -> Result<(), Self::Error> {
        self.inner
            .store_backup(user_id, record)
            .await
            .map_err(|never| match never {})
    }

    async fn fetch_backup(&self, user_id: &str) -> Result<Option<BackupRecord>, Self::Error> {
        self.inner
            .fetch_backup(user_id)
            .await
            .map_err(|never| match never {})
    }
}
