pub mod backup;
pub mod decrypt;
pub mod encrypt;
pub mod init;
pub mod key;
pub mod logout;
pub mod peer;
pub mod version;

pub use backup::Backup;
pub use decrypt::Decrypt;
pub use encrypt::Encrypt;
pub use init::Init;
pub use key::Key;
pub use logout::Logout;
pub use peer::Peer;
pub use version::Version;
