use clap::Args;

use crate::state::{AppSessionError, StateError};

#[derive(Args, Debug, Clone)]
pub struct Rotate {
    /// Confirm that messages sealed to the current key will become unreadable
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RotateError {
    #[error("key rotate failed: {0}")]
    State(#[from] StateError),
    #[error("key rotate failed: {0}")]
    Session(#[from] AppSessionError),
    #[error("rotating discards the current key pair; pass --yes to confirm")]
    NotConfirmed,
}

#[async_trait::async_trait]
impl crate::op::Op for Rotate {
    type Error = RotateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if !self.yes {
            return Err(RotateError::NotConfirmed);
        }

        let mut session = ctx.state()?.open_session().await?;
        let old = session.public_key_base64();
        session.rotate().await?;

        Ok(format!(
            "Rotated key pair\n- Old: {}\n- New: {}",
            old,
            session.public_key_base64()
        ))
    }
}
