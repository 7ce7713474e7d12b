//! Cryptographic primitives for end-to-end encrypted direct messages
//!
//! - **Identity**: one P-256 key pair per device (`SecretKey`/`PublicKey`)
//! - **Agreement**: ECDH between a local private key and a peer public key
//!   yields a per-peer AES-256-GCM `SharedKey`
//! - **Messages**: each message is sealed under the shared key with a fresh
//!   12-byte nonce
//! - **Backup**: the private key can be sealed under a password (PBKDF2 +
//!   AES-256-GCM) to move an identity between devices
//!
//! # Trust Model
//!
//! Peer public keys are trusted on first use. Nothing in this module checks
//! that a fetched key really belongs to the peer it was fetched for; a
//! directory that lies about keys can read messages sent to the keys it
//! hands out.
//!
//! There is no ratchet: a pair of device keys shares one static secret
//! until either side rotates its key pair.

pub mod backup;
pub mod codec;
mod keys;
mod shared_key;

pub use backup::{BackupError, BackupPayload};
pub use codec::{CodecError, PrivateKeyRecord};
pub use keys::{KeyError, KeyPair, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use shared_key::{
    CipherError, EncryptedPayload, SharedKey, NONCE_SIZE, SHARED_KEY_SIZE, TAG_SIZE,
};
