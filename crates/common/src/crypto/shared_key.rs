//! Per-peer shared keys and message encryption using AES-256-GCM
//!
//! A [`SharedKey`] is agreed between two device key pairs with ECDH and then
//! used to seal message bodies. Every call to [`SharedKey::encrypt`] draws a
//! fresh 12-byte nonce; the nonce travels next to the ciphertext in an
//! [`EncryptedPayload`].

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::codec::{self, CodecError};
use super::keys::{PublicKey, SecretKey};

/// Size of an AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of an AES-256-GCM key in bytes
pub const SHARED_KEY_SIZE: usize = 32;
/// Size of the AES-GCM authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// Wrong key, tampered ciphertext or wrong nonce. These are
    /// deliberately not told apart.
    #[error("decryption failed")]
    Decryption,
    #[error("encryption failed")]
    Encryption,
    #[error("failed to gather randomness: {0}")]
    Rng(#[from] getrandom::Error),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("decrypted message is not valid utf-8")]
    InvalidUtf8,
}

/// A sealed message as carried by the transport
///
/// Both fields are standard Base64. The payload is transient: built by one
/// encrypt call, consumed by one decrypt call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub ciphertext: String,
    pub iv: String,
}

/// A 256-bit symmetric key shared with exactly one peer key
///
/// The key bytes never leave the crate; the only things a caller can do with
/// a `SharedKey` are encrypt and decrypt.
///
/// # Examples
///
/// ```ignore
/// let alice = KeyPair::generate()?;
/// let bob = KeyPair::generate()?;
///
/// let alice_key = SharedKey::derive(alice.secret(), bob.public());
/// let bob_key = SharedKey::derive(bob.secret(), alice.public());
///
/// let payload = alice_key.encrypt("hello")?;
/// assert_eq!(bob_key.decrypt_payload(&payload)?, "hello");
/// ```
#[derive(Clone)]
pub struct SharedKey(Zeroizing<[u8; SHARED_KEY_SIZE]>);

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

impl SharedKey {
    /// Agree a shared key between a local private key and a peer public key
    ///
    /// The ECDH x-coordinate is used directly as the AES-256-GCM key. The
    /// agreement itself is deterministic: the same two keys always yield the
    /// same shared key, from either side.
    pub fn derive(local: &SecretKey, peer: &PublicKey) -> Self {
        let shared = p256::ecdh::diffie_hellman(local.0.to_nonzero_scalar(), peer.0.as_affine());
        let mut bytes = Zeroizing::new([0u8; SHARED_KEY_SIZE]);
        bytes.copy_from_slice(&shared.raw_secret_bytes()[..]);
        Self(bytes)
    }

    /// Encrypt a UTF-8 message under a fresh random nonce
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails (should be rare, only on system RNG failure).
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedPayload, CipherError> {
        let mut iv = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut iv)?;
        let ciphertext = seal(&self.0, &iv, plaintext.as_bytes())?;
        Ok(EncryptedPayload {
            ciphertext: codec::encode(&ciphertext),
            iv: codec::encode(&iv),
        })
    }

    /// Decrypt a Base64 ciphertext and nonce back into the original message
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either input is not valid Base64, or the nonce is not 12 bytes
    /// - Authentication fails (wrong key, tampered ciphertext, wrong nonce)
    /// - The recovered bytes are not UTF-8
    pub fn decrypt(&self, ciphertext: &str, iv: &str) -> Result<String, CipherError> {
        let iv: [u8; NONCE_SIZE] = codec::decode_array(iv, "iv")?;
        let ciphertext = codec::decode(ciphertext)?;
        let plaintext = open(&self.0, &iv, &ciphertext)?;
        String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::InvalidUtf8)
    }

    /// Decrypt an [`EncryptedPayload`]
    pub fn decrypt_payload(&self, payload: &EncryptedPayload) -> Result<String, CipherError> {
        self.decrypt(&payload.ciphertext, &payload.iv)
    }
}

/// AES-256-GCM seal; output is `ciphertext || tag`
pub(crate) fn seal(
    key: &[u8; SHARED_KEY_SIZE],
    iv: &[u8; NONCE_SIZE],
    data: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(*key));
    cipher
        .encrypt(&Nonce::from(*iv), data)
        .map_err(|_| CipherError::Encryption)
}

/// AES-256-GCM open; any authentication failure is reported as
/// [`CipherError::Decryption`]
pub(crate) fn open(
    key: &[u8; SHARED_KEY_SIZE],
    iv: &[u8; NONCE_SIZE],
    data: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    let cipher = Aes256Gcm::new(&Key::<Aes256Gcm>::from(*key));
    cipher
        .decrypt(&Nonce::from(*iv), data)
        .map(Zeroizing::new)
        .map_err(|_| CipherError::Decryption)
}
