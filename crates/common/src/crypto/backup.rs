//! Password-protected private key backups
//!
//! A backup lets a user carry their device identity to a new device. The
//! private key is exported to its JWK record, and the JSON is sealed with
//! AES-256-GCM under a key stretched from the user's password with
//! PBKDF2-HMAC-SHA256.
//!
//! # Format
//!
//! ```text
//! salt  = random(16)
//! key   = PBKDF2-HMAC-SHA256(password, salt, 100_000 iterations, 32 bytes)
//! iv    = random(12)
//! blob  = AES-256-GCM(key, iv, jwk_json)
//! ```
//!
//! All three byte strings are Base64 encoded in a [`BackupPayload`]. The KDF
//! parameters are fixed per `version`; a payload from an unknown version is
//! refused rather than guessed at.

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::codec::{self, CodecError, PrivateKeyRecord};
use super::keys::SecretKey;
use super::shared_key::{self, CipherError, NONCE_SIZE, SHARED_KEY_SIZE};

/// Current backup format version
pub const BACKUP_VERSION: u8 = 1;
/// PBKDF2 iteration count for version 1 backups
pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Size of the PBKDF2 salt in bytes
pub const SALT_SIZE: usize = 16;

/// Errors that can occur while creating or restoring a backup
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Wrong password, or the ciphertext, nonce or salt were altered
    #[error("backup authentication failed")]
    Authentication,
    #[error("unsupported backup version {0}")]
    UnsupportedVersion(u8),
    /// Authenticated decryption succeeded but the contents are not a key
    #[error("backup does not contain a valid private key: {0}")]
    MalformedKey(CodecError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("cipher error: {0}")]
    Cipher(CipherError),
}

impl From<CipherError> for BackupError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Decryption => BackupError::Authentication,
            CipherError::Codec(e) => BackupError::Codec(e),
            other => BackupError::Cipher(other),
        }
    }
}

/// An encrypted private key, opaque to whoever stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPayload {
    /// Payloads written before versioning existed are version 1
    #[serde(default = "first_version")]
    pub version: u8,
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
}

fn first_version() -> u8 {
    1
}

impl BackupPayload {
    /// Restore the private key held in this payload
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::UnsupportedVersion`] before any cryptography
    /// is attempted if the payload's version is unknown.
    pub fn restore(&self, password: &str) -> Result<SecretKey, BackupError> {
        if self.version != BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion(self.version));
        }
        restore(&self.ciphertext, password, &self.iv, &self.salt)
    }
}

/// Encrypt a private key under a password
///
/// A fresh salt and nonce are drawn for every backup, so backing up the same
/// key twice with the same password yields unrelated payloads.
pub fn backup(secret: &SecretKey, password: &str) -> Result<BackupPayload, BackupError> {
    let _span = tracing::debug_span!("backup").entered();

    let json = codec::export_private_key(secret).to_json()?;

    let mut salt = [0u8; SALT_SIZE];
    getrandom::getrandom(&mut salt).map_err(CipherError::from)?;
    let mut iv = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut iv).map_err(CipherError::from)?;

    let key = derive_backup_key(password, &salt);
    let ciphertext = shared_key::seal(&key, &iv, json.as_bytes())?;

    tracing::debug!(version = BACKUP_VERSION, "private key backup created");
    Ok(BackupPayload {
        version: BACKUP_VERSION,
        ciphertext: codec::encode(&ciphertext),
        iv: codec::encode(&iv),
        salt: codec::encode(&salt),
    })
}

/// Decrypt a version 1 backup back into a private key
///
/// # Errors
///
/// Returns an error if:
/// - Any input is not valid Base64, or the nonce/salt have the wrong length
/// - Authentication fails ([`BackupError::Authentication`]): wrong password
///   or tampered data. No partial recovery is attempted.
/// - The decrypted record is not a valid P-256 private key
pub fn restore(
    ciphertext: &str,
    password: &str,
    iv: &str,
    salt: &str,
) -> Result<SecretKey, BackupError> {
    let _span = tracing::debug_span!("restore").entered();

    let ciphertext = codec::decode(ciphertext)?;
    let iv: [u8; NONCE_SIZE] = codec::decode_array(iv, "iv")?;
    let salt: [u8; SALT_SIZE] = codec::decode_array(salt, "salt")?;

    let key = derive_backup_key(password, &salt);
    let json = shared_key::open(&key, &iv, &ciphertext)?;

    let json = std::str::from_utf8(&json)
        .map_err(|e| BackupError::MalformedKey(CodecError::InvalidPrivateKey(e.to_string())))?;
    let record = PrivateKeyRecord::from_json(json).map_err(BackupError::MalformedKey)?;
    codec::import_private_key(&record).map_err(BackupError::MalformedKey)
}

fn derive_backup_key(password: &str, salt: &[u8; SALT_SIZE]) -> Zeroizing<[u8; SHARED_KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; SHARED_KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, key.as_mut_slice());
    key
}
