//! Integration tests for the session context

mod common;

use std::sync::atomic::Ordering;

use ::common::crypto::{BackupError, CipherError, EncryptedPayload};
use ::common::directory::{BackupRecord, Directory, MemoryDirectory};
use ::common::keystore::{KeyOrigin, KeyStore, MemoryKeyStore, PRIVATE_KEY_SLOT, PUBLIC_KEY_SLOT};
use ::common::session::{Session, SessionError};

#[tokio::test]
async fn test_start_publishes_new_key() {
    let (alice, _bob, directory) = common::alice_and_bob().await;
    assert_eq!(alice.origin(), &KeyOrigin::Generated);
    assert_eq!(
        directory.fetch("alice").await.unwrap(),
        Some(alice.public_key_base64())
    );
}

#[tokio::test]
async fn test_restart_keeps_existing_directory_entry() {
    let directory = ::common::directory::MemoryDirectory::new();
    let (first, store) = common::new_device("alice", &directory).await;
    let published = first.public_key_base64();

    // something else takes over the directory entry; a loaded key must not clobber it
    directory.publish("alice", "sentinel").await.unwrap();

    let second = Session::start("alice", store, directory.clone()).await.unwrap();
    assert_eq!(second.origin(), &KeyOrigin::Loaded);
    assert_eq!(second.public_key_base64(), published);
    assert_eq!(
        directory.fetch("alice").await.unwrap().as_deref(),
        Some("sentinel")
    );
}

#[tokio::test]
async fn test_restart_publishes_key_missing_from_directory() {
    let (first, store) = common::new_device("alice", &MemoryDirectory::new()).await;

    let empty = MemoryDirectory::new();
    let second = Session::start("alice", store, empty.clone()).await.unwrap();
    assert_eq!(second.origin(), &KeyOrigin::Loaded);
    assert_eq!(
        empty.fetch("alice").await.unwrap(),
        Some(first.public_key_base64())
    );
}

#[tokio::test]
async fn test_failed_publish_is_retried_on_next_start() {
    let directory = common::FlakyDirectory::default();
    let store = MemoryKeyStore::new();

    directory.fail_publish.store(true, Ordering::SeqCst);
    let failed = Session::start("alice", store.clone(), directory.clone()).await;
    assert!(matches!(failed, Err(SessionError::Directory(_))));
    // the generated pair was already persisted
    assert!(store.read(PRIVATE_KEY_SLOT).unwrap().is_some());

    directory.fail_publish.store(false, Ordering::SeqCst);
    let alice = Session::start("alice", store, directory.clone()).await.unwrap();
    assert_eq!(alice.origin(), &KeyOrigin::Loaded);
    assert_eq!(
        directory.fetch("alice").await.unwrap(),
        Some(alice.public_key_base64())
    );

    // peers can now reach the key
    let (bob, _) = common::new_device("bob", &directory.inner).await;
    let payload = bob.encrypt_for("alice", "found you").await.unwrap();
    assert_eq!(alice.decrypt_from("bob", &payload).await.unwrap(), "found you");
}

#[tokio::test]
async fn test_alice_to_bob() {
    let (alice, bob, _directory) = common::alice_and_bob().await;

    let payload = alice.encrypt_for("bob", "hello").await.unwrap();
    assert_eq!(bob.decrypt_from("alice", &payload).await.unwrap(), "hello");

    let reply = bob.encrypt_for("alice", "hi alice").await.unwrap();
    assert_eq!(alice.decrypt_from("bob", &reply).await.unwrap(), "hi alice");

    assert_eq!(alice.cache().len(), 1);
    assert_eq!(bob.cache().len(), 1);
}

#[tokio::test]
async fn test_unknown_peer() {
    let (alice, _bob, _directory) = common::alice_and_bob().await;
    let result = alice.encrypt_for("carol", "anyone there?").await;
    assert!(matches!(result, Err(SessionError::PeerKeyNotFound(peer)) if peer == "carol"));
}

#[tokio::test]
async fn test_third_party_cannot_read() {
    let (alice, _bob, directory) = common::alice_and_bob().await;
    let (carol, _) = common::new_device("carol", &directory).await;

    let payload = alice.encrypt_for("bob", "for bob only").await.unwrap();
    let result = carol.decrypt_from("alice", &payload).await;
    assert!(matches!(
        result,
        Err(SessionError::Cipher(CipherError::Decryption))
    ));
}

#[tokio::test]
async fn test_peer_rotation_invalidates_cached_secret() {
    let (alice, mut bob, _directory) = common::alice_and_bob().await;

    let before = alice.encrypt_for("bob", "old key").await.unwrap();
    assert_eq!(bob.decrypt_from("alice", &before).await.unwrap(), "old key");

    bob.rotate().await.unwrap();
    assert!(bob.cache().is_empty());

    // alice picks up bob's new key instead of reusing the cached secret
    let after = alice.encrypt_for("bob", "new key").await.unwrap();
    assert_eq!(bob.decrypt_from("alice", &after).await.unwrap(), "new key");
    assert_eq!(alice.cache().len(), 2);

    // and bob can no longer read what was sealed to his old key
    assert!(bob.decrypt_from("alice", &before).await.is_err());
}

#[tokio::test]
async fn test_tampered_payload() {
    let (alice, bob, _directory) = common::alice_and_bob().await;
    let payload = alice.encrypt_for("bob", "integrity").await.unwrap();

    let mut ciphertext = ::common::crypto::codec::decode(&payload.ciphertext).unwrap();
    ciphertext[0] ^= 0x80;
    let tampered = EncryptedPayload {
        ciphertext: ::common::crypto::codec::encode(&ciphertext),
        iv: payload.iv.clone(),
    };
    assert!(matches!(
        bob.decrypt_from("alice", &tampered).await,
        Err(SessionError::Cipher(CipherError::Decryption))
    ));
}

#[tokio::test]
async fn test_backup_and_restore_on_new_device() {
    let (alice, bob, directory) = common::alice_and_bob().await;
    alice
        .backup("open sesame", Some("the cave".to_string()))
        .await
        .unwrap();
    let sealed = bob.encrypt_for("alice", "read me later").await.unwrap();

    // alice signs in on a second device, which starts with a fresh key
    let (mut laptop, laptop_store) = common::new_device("alice", &directory).await;
    assert_ne!(laptop.public_key_base64(), alice.public_key_base64());
    assert_eq!(
        laptop.backup_hint().await.unwrap().as_deref(),
        Some("the cave")
    );

    laptop.restore("open sesame").await.unwrap();
    assert_eq!(laptop.public_key_base64(), alice.public_key_base64());
    assert_eq!(
        directory.fetch("alice").await.unwrap(),
        Some(alice.public_key_base64())
    );
    assert_eq!(
        laptop_store.read(PUBLIC_KEY_SLOT).unwrap(),
        Some(alice.public_key_base64())
    );
    assert_eq!(
        laptop.decrypt_from("bob", &sealed).await.unwrap(),
        "read me later"
    );
}

#[tokio::test]
async fn test_restore_with_wrong_password_changes_nothing() {
    let (alice, _bob, directory) = common::alice_and_bob().await;
    alice.backup("right", None).await.unwrap();

    let (mut laptop, _) = common::new_device("alice", &directory).await;
    let before = laptop.public_key_base64();

    let result = laptop.restore("wrong").await;
    assert!(matches!(
        result,
        Err(SessionError::Backup(BackupError::Authentication))
    ));
    assert_eq!(laptop.public_key_base64(), before);
}

#[tokio::test]
async fn test_import_backup_replaces_stored_record_only_on_success() {
    let (alice, _bob, directory) = common::alice_and_bob().await;
    alice.backup("current", Some("real".to_string())).await.unwrap();
    let stored = directory.fetch_backup("alice").await.unwrap().unwrap();

    // a record sealed under another password, e.g. an old export
    let stale = BackupRecord {
        payload: ::common::crypto::backup::backup(alice.key_pair().secret(), "old").unwrap(),
        password_hint: Some("stale".to_string()),
    };

    let (mut laptop, _) = common::new_device("alice", &directory).await;
    let before = laptop.public_key_base64();
    assert!(matches!(
        laptop.import_backup(stale.clone(), "current").await,
        Err(SessionError::Backup(BackupError::Authentication))
    ));
    assert_eq!(laptop.public_key_base64(), before);
    assert_eq!(directory.fetch_backup("alice").await.unwrap(), Some(stored));

    laptop.import_backup(stale.clone(), "old").await.unwrap();
    assert_eq!(laptop.public_key_base64(), alice.public_key_base64());
    assert_eq!(directory.fetch_backup("alice").await.unwrap(), Some(stale));
}

#[tokio::test]
async fn test_restore_without_backup() {
    let (mut alice, _bob, _directory) = common::alice_and_bob().await;
    assert!(matches!(
        alice.restore("anything").await,
        Err(SessionError::BackupNotFound(user)) if user == "alice"
    ));
}

#[tokio::test]
async fn test_logout_clears_cache_and_slots() {
    let directory = ::common::directory::MemoryDirectory::new();
    let (alice, store) = common::new_device("alice", &directory).await;
    let (_bob, _) = common::new_device("bob", &directory).await;
    alice.encrypt_for("bob", "bye").await.unwrap();

    alice.logout().unwrap();
    assert_eq!(store.read(PRIVATE_KEY_SLOT).unwrap(), None);
    assert_eq!(store.read(PUBLIC_KEY_SLOT).unwrap(), None);

    let again = Session::start("alice", store, directory).await.unwrap();
    assert_eq!(again.origin(), &KeyOrigin::Generated);
    assert!(again.cache().is_empty());
}
