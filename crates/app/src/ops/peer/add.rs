use clap::Args;
use common::crypto::{CodecError, PublicKey};
use common::directory::Directory;

use crate::directory::FileDirectoryError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Peer user id
    pub peer_id: String,

    /// Peer public key, Base64 of the uncompressed P-256 point
    pub public_key: String,

    /// Replace a different key already on record for this peer
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error("peer add failed: {0}")]
    State(#[from] StateError),
    #[error("peer add failed: {0}")]
    Directory(#[from] FileDirectoryError),
    #[error("peer add failed: invalid public key: {0}")]
    InvalidKey(#[from] CodecError),
    #[error("peer {0} already has a different key on record; pass --force to replace it")]
    KeyChanged(String),
}

#[async_trait::async_trait]
impl crate::op::Op for Add {
    type Error = AddError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let public_key = PublicKey::from_base64(self.public_key.trim())?;
        let public_key = public_key.to_base64();

        let directory = ctx.state()?.directory();
        match directory.fetch(&self.peer_id).await? {
            Some(existing) if existing == public_key => {
                return Ok(format!("Peer {} already has this key", self.peer_id));
            }
            Some(_) if !self.force => return Err(AddError::KeyChanged(self.peer_id.clone())),
            Some(_) => {
                tracing::warn!(peer_id = %self.peer_id, "replacing peer public key");
            }
            None => {}
        }

        directory.publish(&self.peer_id, &public_key).await?;
        Ok(format!("Added peer {}", self.peer_id))
    }
}
