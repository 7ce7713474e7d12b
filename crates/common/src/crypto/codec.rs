//! Encodings between key material and transport-safe strings
//!
//! No cryptographic decisions live here. Byte buffers travel as standard,
//! padded Base64; public keys as the Base64 of their uncompressed SEC1 point;
//! private keys as a JWK record serialized to JSON.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::elliptic_curve::JwkEcKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::keys::{PublicKey, SecretKey};

/// Errors raised while decoding caller-supplied material
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid {what} length, expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid public key bytes")]
    InvalidPublicKey,
    #[error("invalid private key record: {0}")]
    InvalidPrivateKey(String),
}

/// Encode bytes as standard padded Base64
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard padded Base64
///
/// Whitespace, the URL-safe alphabet and missing padding are all rejected.
pub fn decode(input: &str) -> Result<Vec<u8>, CodecError> {
    Ok(STANDARD.decode(input)?)
}

/// Decode Base64 into a fixed-size array, rejecting any other length
pub fn decode_array<const N: usize>(input: &str, what: &'static str) -> Result<[u8; N], CodecError> {
    let bytes = decode(input)?;
    if bytes.len() != N {
        return Err(CodecError::InvalidLength {
            what,
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Export a public key as the Base64 of its raw (uncompressed SEC1) bytes
pub fn export_public_key(key: &PublicKey) -> String {
    encode(&key.to_bytes())
}

/// Import a public key from the Base64 of its raw bytes
pub fn import_public_key(input: &str) -> Result<PublicKey, CodecError> {
    let bytes = decode(input)?;
    PublicKey::from_bytes(&bytes)
}

/// Export a private key into its portable structured record
pub fn export_private_key(key: &SecretKey) -> PrivateKeyRecord {
    PrivateKeyRecord(key.0.to_jwk())
}

/// Import a private key from its portable structured record
pub fn import_private_key(record: &PrivateKeyRecord) -> Result<SecretKey, CodecError> {
    p256::SecretKey::from_jwk(&record.0)
        .map(SecretKey)
        .map_err(|e| CodecError::InvalidPrivateKey(e.to_string()))
}

/// JWK representation of a P-256 private key
///
/// Carries the private scalar `d` alongside the public coordinates, so it is
/// as sensitive as the key itself. The JSON form is handed out wrapped in
/// [`Zeroizing`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKeyRecord(JwkEcKey);

impl std::fmt::Debug for PrivateKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyRecord")
            .field("crv", &self.0.crv())
            .finish_non_exhaustive()
    }
}

impl PrivateKeyRecord {
    /// Serialize the record to JSON
    pub fn to_json(&self) -> Result<Zeroizing<String>, CodecError> {
        serde_json::to_string(&self.0)
            .map(Zeroizing::new)
            .map_err(|e| CodecError::InvalidPrivateKey(e.to_string()))
    }

    /// Parse a record from JSON
    ///
    /// This only checks the shape of the record; [`import_private_key`]
    /// validates the key itself.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str::<JwkEcKey>(json)
            .map(Self)
            .map_err(|e| CodecError::InvalidPrivateKey(e.to_string()))
    }
}
