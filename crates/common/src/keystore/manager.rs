use crate::crypto::{codec, CodecError, KeyError, KeyPair, PublicKey, SecretKey};

use super::{KeyStore, KeyStoreError, PRIVATE_KEY_SLOT, PUBLIC_KEY_SLOT};

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("key store error: {0}")]
    Store(#[from] KeyStoreError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Why stored key material could not be used
///
/// Any of these leads to a fresh key pair being generated. Messages sealed
/// to the old key can no longer be decrypted on this device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyLoadFailure {
    #[error("only one of the two key slots is present")]
    Partial,
    #[error("stored private key is unreadable: {0}")]
    MalformedPrivateKey(String),
    #[error("stored public key is unreadable: {0}")]
    MalformedPublicKey(String),
    #[error("stored public key does not belong to the stored private key")]
    Mismatch,
}

/// Where the key pair returned by [`KeyPairManager::initialize`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Read back from the store
    Loaded,
    /// Nothing was stored; this is the device's first key pair
    Generated,
    /// Stored material was unusable and has been replaced
    Regenerated(KeyLoadFailure),
}

/// Result of [`KeyPairManager::initialize`]
#[derive(Debug, Clone)]
pub struct Initialized {
    pub key_pair: KeyPair,
    pub public_key_base64: String,
    pub origin: KeyOrigin,
}

impl Initialized {
    /// Whether the pair was freshly generated and still needs publishing
    pub fn is_new(&self) -> bool {
        !matches!(self.origin, KeyOrigin::Loaded)
    }
}

enum Stored {
    Present(KeyPair),
    Absent,
    Corrupt(KeyLoadFailure),
}

/// Owns the device identity: generates, persists and reloads the key pair
#[derive(Debug, Clone)]
pub struct KeyPairManager<S> {
    store: S,
}

impl<S: KeyStore> KeyPairManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the stored key pair, or generate and persist a new one
    ///
    /// Unreadable stored material is not an error: it is replaced and the
    /// reason is reported through [`KeyOrigin::Regenerated`]. Only failures
    /// of the store itself, or of key generation, are returned as errors.
    pub fn initialize(&self) -> Result<Initialized, ManagerError> {
        let (key_pair, origin) = match self.load()? {
            Stored::Present(key_pair) => {
                tracing::debug!("loaded stored key pair");
                (key_pair, KeyOrigin::Loaded)
            }
            Stored::Absent => {
                let key_pair = Self::generate_key_pair()?;
                self.store(&key_pair)?;
                tracing::debug!("generated first key pair");
                (key_pair, KeyOrigin::Generated)
            }
            Stored::Corrupt(failure) => {
                tracing::warn!(
                    reason = %failure,
                    "stored key pair unusable, regenerating; older messages will be unreadable"
                );
                let key_pair = Self::generate_key_pair()?;
                self.store(&key_pair)?;
                (key_pair, KeyOrigin::Regenerated(failure))
            }
        };

        Ok(Initialized {
            public_key_base64: key_pair.public().to_base64(),
            key_pair,
            origin,
        })
    }

    /// Generate a new key pair without touching the store
    pub fn generate_key_pair() -> Result<KeyPair, KeyError> {
        KeyPair::generate()
    }

    /// Persist a key pair, replacing whatever was stored
    ///
    /// The public slot is written first. If the private write then fails the
    /// store is left with a mismatched pair, which the next
    /// [`initialize`](Self::initialize) treats as corrupt.
    pub fn store(&self, key_pair: &KeyPair) -> Result<(), ManagerError> {
        let private_json = codec::export_private_key(key_pair.secret()).to_json()?;
        let public_b64 = key_pair.public().to_base64();

        self.store.write(PUBLIC_KEY_SLOT, &public_b64)?;
        self.store.write(PRIVATE_KEY_SLOT, &private_json)?;
        Ok(())
    }

    /// Remove both slots
    pub fn clear(&self) -> Result<(), KeyStoreError> {
        self.store.remove(PRIVATE_KEY_SLOT)?;
        self.store.remove(PUBLIC_KEY_SLOT)?;
        Ok(())
    }

    fn load(&self) -> Result<Stored, KeyStoreError> {
        let private_json = self.store.read(PRIVATE_KEY_SLOT)?;
        let public_b64 = self.store.read(PUBLIC_KEY_SLOT)?;

        let (private_json, public_b64) = match (private_json, public_b64) {
            (Some(private_json), Some(public_b64)) => (private_json, public_b64),
            (None, None) => return Ok(Stored::Absent),
            _ => return Ok(Stored::Corrupt(KeyLoadFailure::Partial)),
        };

        let secret = match SecretKey::from_jwk_json(&private_json) {
            Ok(secret) => secret,
            Err(e) => {
                return Ok(Stored::Corrupt(KeyLoadFailure::MalformedPrivateKey(
                    e.to_string(),
                )))
            }
        };
        let public = match PublicKey::from_base64(public_b64.trim()) {
            Ok(public) => public,
            Err(e) => {
                return Ok(Stored::Corrupt(KeyLoadFailure::MalformedPublicKey(
                    e.to_string(),
                )))
            }
        };
        if secret.public() != public {
            return Ok(Stored::Corrupt(KeyLoadFailure::Mismatch));
        }

        Ok(Stored::Present(secret.into()))
    }
}
