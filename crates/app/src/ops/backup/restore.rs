use std::path::PathBuf;

use clap::Args;
use common::crypto::BackupError;
use common::directory::BackupRecord;
use common::session::SessionError;

use crate::state::{AppSessionError, StateError};

#[derive(Args, Debug, Clone)]
pub struct Restore {
    /// Password the backup was sealed under
    #[arg(long)]
    pub password: String,

    /// Restore from a backup record written by `backup create --out`; it
    /// replaces the stored backup only if the password opens it
    #[arg(long)]
    pub from: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("restore failed: {0}")]
    State(#[from] StateError),
    #[error("restore failed: {0}")]
    Session(#[from] AppSessionError),
    #[error("restore failed: invalid backup file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("restore failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("restore failed: wrong password{}", hint_suffix(.0))]
    WrongPassword(Option<String>),
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(" (hint: {})", hint),
        None => String::new(),
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Restore {
    type Error = RestoreError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;

        // an imported record must open before it may replace the stored one
        let imported = match &self.from {
            Some(path) => {
                let bytes = tokio::fs::read(path).await?;
                Some(serde_json::from_slice::<BackupRecord>(&bytes)?)
            }
            None => None,
        };

        let mut session = state.open_session().await?;
        let result = match imported {
            Some(record) => {
                let hint = record.password_hint.clone();
                session
                    .import_backup(record, &self.password)
                    .await
                    .map_err(|e| (e, Some(hint)))
            }
            None => session.restore(&self.password).await.map_err(|e| (e, None)),
        };

        match result {
            Ok(()) => {}
            Err((SessionError::Backup(BackupError::Authentication), imported_hint)) => {
                let hint = match imported_hint {
                    Some(hint) => hint,
                    None => match session.backup_hint().await {
                        Ok(hint) => hint,
                        Err(e) => {
                            tracing::debug!(error = %e, "could not fetch backup hint");
                            None
                        }
                    },
                };
                return Err(RestoreError::WrongPassword(hint));
            }
            Err((e, _)) => return Err(e.into()),
        }

        Ok(format!(
            "Restored key pair for {}\n- Public key: {}",
            session.user_id(),
            session.public_key_base64()
        ))
    }
}
