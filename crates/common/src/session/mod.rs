//! A signed-in user's encryption context
//!
//! A [`Session`] ties together the device key pair, the directory and the
//! per-peer shared key cache. Everything a session derives lives inside it,
//! so dropping or logging out of a session leaves no key material behind in
//! process-wide state.

mod cache;

use crate::crypto::{
    BackupError, BackupPayload, CipherError, CodecError, EncryptedPayload, KeyPair, SharedKey,
};
use crate::directory::{BackupRecord, Directory};
use crate::keystore::{KeyOrigin, KeyPairManager, KeyStore, KeyStoreError, ManagerError};

pub use cache::SharedSecretCache;

#[derive(Debug, thiserror::Error)]
pub enum SessionError<E> {
    #[error("no public key published for peer {0}")]
    PeerKeyNotFound(String),
    #[error("no backup stored for user {0}")]
    BackupNotFound(String),
    #[error("directory error: {0}")]
    Directory(E),
    #[error("key manager error: {0}")]
    Manager(#[from] ManagerError),
    #[error("key store error: {0}")]
    Store(#[from] KeyStoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("backup error: {0}")]
    Backup(#[from] BackupError),
}

#[derive(Debug)]
pub struct Session<D, S> {
    user_id: String,
    keys: KeyPairManager<S>,
    key_pair: KeyPair,
    origin: KeyOrigin,
    cache: SharedSecretCache,
    directory: D,
}

impl<D, S> Session<D, S>
where
    D: Directory,
    S: KeyStore,
{
    /// Start a session for `user_id`
    ///
    /// Loads the device key pair from `store`, generating one if needed. A
    /// newly generated public key is published to the directory before the
    /// session is returned, as is a loaded key the directory has no entry
    /// for. An existing entry for a loaded key is left alone.
    ///
    /// Callers should check [`origin`](Self::origin):
    /// [`KeyOrigin::Regenerated`] means earlier messages are now unreadable.
    pub async fn start(
        user_id: impl Into<String>,
        store: S,
        directory: D,
    ) -> Result<Self, SessionError<D::Error>> {
        let user_id = user_id.into();
        let keys = KeyPairManager::new(store);
        let init = keys.initialize()?;

        // a loaded pair may never have reached the directory if an earlier
        // start failed to publish it
        let publish = init.is_new()
            || directory
                .fetch(&user_id)
                .await
                .map_err(SessionError::Directory)?
                .is_none();

        if publish {
            directory
                .publish(&user_id, &init.public_key_base64)
                .await
                .map_err(SessionError::Directory)?;
            tracing::info!(user_id = %user_id, new = init.is_new(), "published public key");
        }

        Ok(Self {
            user_id,
            keys,
            key_pair: init.key_pair,
            origin: init.origin,
            cache: SharedSecretCache::new(),
            directory,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn origin(&self) -> &KeyOrigin {
        &self.origin
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn public_key_base64(&self) -> String {
        self.key_pair.public().to_base64()
    }

    pub fn cache(&self) -> &SharedSecretCache {
        &self.cache
    }

    /// Fetch a peer's current public key from the directory
    pub async fn peer_key(&self, peer_id: &str) -> Result<String, SessionError<D::Error>> {
        self.directory
            .fetch(peer_id)
            .await
            .map_err(SessionError::Directory)?
            .ok_or_else(|| SessionError::PeerKeyNotFound(peer_id.to_string()))
    }

    /// Shared key for a peer's current public key, from the cache if possible
    pub async fn shared_key(&self, peer_id: &str) -> Result<SharedKey, SessionError<D::Error>> {
        let peer_key = self.peer_key(peer_id).await?;
        Ok(self
            .cache
            .get_or_derive(self.key_pair.secret(), &peer_key, peer_id)?)
    }

    /// Seal a message for a peer
    pub async fn encrypt_for(
        &self,
        peer_id: &str,
        plaintext: &str,
    ) -> Result<EncryptedPayload, SessionError<D::Error>> {
        let shared = self.shared_key(peer_id).await?;
        Ok(shared.encrypt(plaintext)?)
    }

    /// Open a message received from a peer
    pub async fn decrypt_from(
        &self,
        peer_id: &str,
        payload: &EncryptedPayload,
    ) -> Result<String, SessionError<D::Error>> {
        let shared = self.shared_key(peer_id).await?;
        Ok(shared.decrypt_payload(payload)?)
    }

    /// Back up the private key under `password` and hand it to the directory
    pub async fn backup(
        &self,
        password: &str,
        password_hint: Option<String>,
    ) -> Result<BackupPayload, SessionError<D::Error>> {
        let payload = crate::crypto::backup::backup(self.key_pair.secret(), password)?;
        let record = BackupRecord {
            payload: payload.clone(),
            password_hint,
        };
        self.directory
            .store_backup(&self.user_id, record)
            .await
            .map_err(SessionError::Directory)?;
        Ok(payload)
    }

    /// Password hint stored alongside this user's backup, if any
    pub async fn backup_hint(&self) -> Result<Option<String>, SessionError<D::Error>> {
        Ok(self.fetch_backup().await?.password_hint)
    }

    /// Replace this device's key pair with the one in the user's backup
    ///
    /// On success the restored pair is persisted, republished and every
    /// cached shared key is dropped. A wrong password changes nothing.
    pub async fn restore(&mut self, password: &str) -> Result<(), SessionError<D::Error>> {
        let record = self.fetch_backup().await?;
        let secret = record.payload.restore(password)?;
        self.install(secret.into()).await?;
        tracing::info!(user_id = %self.user_id, "restored key pair from backup");
        Ok(())
    }

    /// Restore from a backup record obtained outside the directory
    ///
    /// The record only replaces the user's stored backup once it has been
    /// opened with `password`. A wrong password, or a record that does not
    /// hold a valid key, leaves the device and the directory untouched.
    pub async fn import_backup(
        &mut self,
        record: BackupRecord,
        password: &str,
    ) -> Result<(), SessionError<D::Error>> {
        let secret = record.payload.restore(password)?;
        self.install(secret.into()).await?;
        self.directory
            .store_backup(&self.user_id, record)
            .await
            .map_err(SessionError::Directory)?;
        tracing::info!(user_id = %self.user_id, "restored key pair from imported backup");
        Ok(())
    }

    /// Explicitly replace this device's key pair with a fresh one
    ///
    /// Messages sealed to the old key become unreadable on this device.
    pub async fn rotate(&mut self) -> Result<(), SessionError<D::Error>> {
        let key_pair = KeyPairManager::<S>::generate_key_pair().map_err(ManagerError::from)?;
        self.install(key_pair).await?;
        tracing::info!(user_id = %self.user_id, "rotated key pair");
        Ok(())
    }

    /// End the session: drop cached shared keys and forget the stored pair
    pub fn logout(self) -> Result<(), SessionError<D::Error>> {
        self.cache.clear();
        self.keys.clear()?;
        tracing::info!(user_id = %self.user_id, "logged out");
        Ok(())
    }

    async fn fetch_backup(&self) -> Result<BackupRecord, SessionError<D::Error>> {
        self.directory
            .fetch_backup(&self.user_id)
            .await
            .map_err(SessionError::Directory)?
            .ok_or_else(|| SessionError::BackupNotFound(self.user_id.clone()))
    }

    async fn install(&mut self, key_pair: KeyPair) -> Result<(), SessionError<D::Error>> {
        self.keys.store(&key_pair)?;
        self.directory
            .publish(&self.user_id, &key_pair.public().to_base64())
            .await
            .map_err(SessionError::Directory)?;
        self.key_pair = key_pair;
        self.cache.clear();
        Ok(())
    }
}
