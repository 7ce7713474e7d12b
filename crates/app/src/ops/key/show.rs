use clap::Args;
use common::keystore::KeyOrigin;

use crate::state::{AppSessionError, StateError};

#[derive(Args, Debug, Clone)]
pub struct Show;

#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    #[error("key show failed: {0}")]
    State(#[from] StateError),
    #[error("key show failed: {0}")]
    Session(#[from] AppSessionError),
}

#[async_trait::async_trait]
impl crate::op::Op for Show {
    type Error = ShowError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.state()?.open_session().await?;

        let mut output = session.public_key_base64();
        if let KeyOrigin::Regenerated(reason) = session.origin() {
            output.push_str(&format!(
                "\n(stored key pair was replaced: {}; earlier messages cannot be decrypted)",
                reason
            ));
        }
        Ok(output)
    }
}
