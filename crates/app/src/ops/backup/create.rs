use std::path::PathBuf;

use clap::Args;
use common::directory::BackupRecord;

use crate::state::{AppSessionError, StateError};

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Password the backup is sealed under
    #[arg(long)]
    pub password: String,

    /// Hint stored next to the backup
    #[arg(long)]
    pub hint: Option<String>,

    /// Also write the backup record to this file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("backup failed: {0}")]
    State(#[from] StateError),
    #[error("backup failed: {0}")]
    Session(#[from] AppSessionError),
    #[error("backup failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backup failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("backup password must not be empty")]
    EmptyPassword,
}

#[async_trait::async_trait]
impl crate::op::Op for Create {
    type Error = CreateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.password.is_empty() {
            return Err(CreateError::EmptyPassword);
        }

        let session = ctx.state()?.open_session().await?;
        let payload = session.backup(&self.password, self.hint.clone()).await?;

        let mut output = format!("Backed up key pair for {}", session.user_id());
        if let Some(path) = &self.out {
            let record = BackupRecord {
                payload,
                password_hint: self.hint.clone(),
            };
            tokio::fs::write(path, serde_json::to_vec_pretty(&record)?).await?;
            output.push_str(&format!("\n- Written to: {}", path.display()));
        }
        Ok(output)
    }
}
