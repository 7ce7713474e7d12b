use clap::Args;

use crate::state::{AppSessionError, StateError};

#[derive(Args, Debug, Clone)]
pub struct Logout;

#[derive(Debug, thiserror::Error)]
pub enum LogoutError {
    #[error("logout failed: {0}")]
    State(#[from] StateError),
    #[error("logout failed: {0}")]
    Session(#[from] AppSessionError),
}

#[async_trait::async_trait]
impl crate::op::Op for Logout {
    type Error = LogoutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let session = state.open_session().await?;
        let user_id = session.user_id().to_string();
        session.logout()?;

        Ok(format!(
            "Logged out {}; device keys removed from {}",
            user_id,
            state.keys_path.display()
        ))
    }
}
