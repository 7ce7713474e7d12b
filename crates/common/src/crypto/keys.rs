use p256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroize;

use super::codec::{self, CodecError};

/// Size of a P-256 private scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of an uncompressed SEC1 P-256 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 65;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to gather randomness: {0}")]
    Rng(#[from] getrandom::Error),
}

/// Public half of a device key pair
///
/// A thin wrapper around a P-256 public key. This is what gets published to
/// the directory and fetched for peers; its transport form is the Base64 of
/// the 65-byte uncompressed point.
///
/// # Examples
///
/// ```ignore
/// let public_key = SecretKey::generate()?.public();
///
/// let encoded = public_key.to_base64();
/// let recovered = PublicKey::from_base64(&encoded)?;
/// assert_eq!(public_key, recovered);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(pub(crate) p256::PublicKey);

impl From<p256::PublicKey> for PublicKey {
    fn from(key: p256::PublicKey) -> Self {
        PublicKey(key)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CodecError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl PublicKey {
    /// Parse a public key from raw SEC1 bytes
    ///
    /// Only the uncompressed form is accepted, so that a key survives an
    /// import/export round trip byte for byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(CodecError::InvalidLength {
                what: "public key",
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        p256::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CodecError::InvalidPublicKey)
    }

    /// Convert public key to its raw uncompressed SEC1 bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Parse a public key from its Base64 transport form
    pub fn from_base64(input: &str) -> Result<Self, CodecError> {
        codec::import_public_key(input)
    }

    /// Convert public key to its Base64 transport form
    pub fn to_base64(&self) -> String {
        codec::export_public_key(self)
    }
}

/// Private half of a device key pair
///
/// Never leaves the device in raw form. It is persisted as a JWK record and
/// travels off-device only inside a password-encrypted backup.
#[derive(Debug, Clone)]
pub struct SecretKey(pub(crate) p256::SecretKey);

impl SecretKey {
    /// Generate a new random secret key using the OS RNG
    ///
    /// Candidates outside the scalar field are rejected and redrawn; the
    /// chance of that happening is around 2^-32.
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        loop {
            getrandom::getrandom(&mut bytes)?;
            let candidate = p256::SecretKey::from_slice(&bytes);
            bytes.zeroize();
            if let Ok(key) = candidate {
                return Ok(Self(key));
            }
        }
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    /// Parse a secret key from the JSON form of its JWK record
    pub fn from_jwk_json(json: &str) -> Result<Self, CodecError> {
        let record = codec::PrivateKeyRecord::from_json(json)?;
        codec::import_private_key(&record)
    }
}

/// A device's asymmetric key pair
///
/// The public half is always the one derived from the private half; there is
/// no way to build a pair from two unrelated keys.
#[derive(Debug, Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl From<SecretKey> for KeyPair {
    fn from(secret: SecretKey) -> Self {
        let public = secret.public();
        Self { secret, public }
    }
}

impl KeyPair {
    /// Generate a fresh P-256 key pair
    pub fn generate() -> Result<Self, KeyError> {
        Ok(SecretKey::generate()?.into())
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let pair = KeyPair::generate().unwrap();
        assert_eq!(pair.public(), &pair.secret().public());

        let other = KeyPair::generate().unwrap();
        assert_ne!(pair.public(), other.public());
    }

    #[test]
    fn test_public_key_bytes_roundtrip() {
        let public_key = SecretKey::generate().unwrap().public();
        let bytes = public_key.to_bytes();
        assert_eq!(bytes.len(), PUBLIC_KEY_SIZE);
        assert_eq!(bytes[0], 0x04);

        let recovered = PublicKey::try_from(bytes.as_slice()).unwrap();
        assert_eq!(recovered.to_bytes(), bytes);
    }

    #[test]
    fn test_public_key_rejects_compressed_form() {
        let public_key = SecretKey::generate().unwrap().public();
        let compressed = public_key.0.to_encoded_point(true);
        assert!(matches!(
            PublicKey::from_bytes(compressed.as_bytes()),
            Err(CodecError::InvalidLength { actual: 33, .. })
        ));
    }

    #[test]
    fn test_secret_key_jwk_roundtrip() {
        let secret_key = SecretKey::generate().unwrap();
        let json = codec::export_private_key(&secret_key).to_json().unwrap();
        let recovered = SecretKey::from_jwk_json(&json).unwrap();
        assert_eq!(secret_key.public(), recovered.public());
    }
}
