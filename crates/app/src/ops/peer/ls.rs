use clap::Args;

use crate::directory::FileDirectoryError;
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Ls;

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("peer ls failed: {0}")]
    State(#[from] StateError),
    #[error("peer ls failed: {0}")]
    Directory(#[from] FileDirectoryError),
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let entries = state.directory().entries().await?;

        if entries.is_empty() {
            return Ok("No keys on record".to_string());
        }

        let lines: Vec<String> = entries
            .iter()
            .map(|(user_id, public_key)| {
                let marker = if *user_id == state.config.user_id {
                    " (you)"
                } else {
                    ""
                };
                format!("{}{}\t{}", user_id, marker, public_key)
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
