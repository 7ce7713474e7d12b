use std::path::PathBuf;

use clap::Args;
use common::keystore::KeyOrigin;

use crate::state::{AppConfig, AppSessionError, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// User id this device signs in as
    #[arg(long)]
    pub user_id: String,

    /// Default log level written to the config
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Directory for log files (logs go to stderr only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
    #[error("init failed: {0}")]
    Session(#[from] AppSessionError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            user_id: self.user_id.clone(),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), config)?;
        let session = state.open_session().await?;

        let key_status = match session.origin() {
            KeyOrigin::Loaded => "existing key pair reused",
            KeyOrigin::Generated => "new key pair generated and published",
            KeyOrigin::Regenerated(_) => "stored key pair was unusable; new key pair generated",
        };

        let output = format!(
            "Initialized dmseal directory at: {}\n\
             - User: {}\n\
             - Keys: {}\n\
             - Directory: {}\n\
             - Config: {}\n\
             - Key pair: {}\n\
             - Public key: {}",
            state.dmseal_dir.display(),
            state.config.user_id,
            state.keys_path.display(),
            state.directory_path.display(),
            state.config_path.display(),
            key_status,
            session.public_key_base64()
        );

        Ok(output)
    }
}
