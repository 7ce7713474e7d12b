/**
 * Cryptographic types and operations.
 *  - P-256 device key pairs and their encodings
 *  - Per-peer shared keys and message sealing
 *  - Password-protected private key backups
 */
pub mod crypto;
/**
 * The public key / backup directory that peers
 *  share. Only an interface plus an in-memory
 *  implementation live here.
 */
pub mod directory;
/**
 * Device-local persistence of the key pair
 *  and the manager that loads, generates and
 *  replaces it.
 */
pub mod keystore;
/**
 * Per-user session context owning the key pair
 *  and the shared key cache.
 */
pub mod session;

pub mod prelude {
    pub use crate::crypto::{
        BackupError, BackupPayload, CipherError, CodecError, EncryptedPayload, KeyPair, PublicKey,
        SecretKey, SharedKey,
    };
    pub use crate::directory::{BackupRecord, Directory, MemoryDirectory};
    pub use crate::keystore::{
        FileKeyStore, KeyLoadFailure, KeyOrigin, KeyPairManager, KeyStore, MemoryKeyStore,
    };
    pub use crate::session::{Session, SessionError, SharedSecretCache};
}
