use clap::Args;

use crate::state::{AppSessionError, StateError};

#[derive(Args, Debug, Clone)]
pub struct Encrypt {
    /// Peer to encrypt for
    pub peer_id: String,

    /// Message to encrypt
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
    #[error("encrypt failed: {0}")]
    State(#[from] StateError),
    #[error("encrypt failed: {0}")]
    Session(#[from] AppSessionError),
    #[error("encrypt failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Encrypt {
    type Error = EncryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.state()?.open_session().await?;
        let payload = session.encrypt_for(&self.peer_id, &self.message).await?;
        tracing::debug!(peer_id = %self.peer_id, "message encrypted");
        Ok(serde_json::to_string_pretty(&payload)?)
    }
}
