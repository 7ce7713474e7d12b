use std::{fs, path::PathBuf};

use common::keystore::FileKeyStore;
use common::session::{Session, SessionError};
use serde::{Deserialize, Serialize};

use crate::directory::{FileDirectory, FileDirectoryError};

pub const APP_NAME: &str = "dmseal";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYS_DIR_NAME: &str = "keys";
pub const DIRECTORY_FILE_NAME: &str = "directory.json";

pub type AppSession = Session<FileDirectory, FileKeyStore>;
pub type AppSessionError = SessionError<FileDirectoryError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity this device signs in as
    pub user_id: String,
    /// Default log level, overridable with RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files (optional, logs to stderr only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.dmseal)
    pub dmseal_dir: PathBuf,
    /// Path to the key slots directory
    pub keys_path: PathBuf,
    /// Path to the file-backed directory of public keys and backups
    pub directory_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.dmseal)
    pub fn dmseal_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(custom_path: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let dmseal_dir = Self::dmseal_dir(custom_path)?;

        if dmseal_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }
        if config.user_id.trim().is_empty() {
            return Err(StateError::InvalidConfig("user_id is empty".to_string()));
        }

        fs::create_dir_all(&dmseal_dir)?;

        let keys_path = dmseal_dir.join(KEYS_DIR_NAME);
        fs::create_dir_all(&keys_path)?;

        let config_path = dmseal_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            directory_path: dmseal_dir.join(DIRECTORY_FILE_NAME),
            dmseal_dir,
            keys_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let dmseal_dir = Self::dmseal_dir(custom_path)?;
        let config_path = dmseal_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            keys_path: dmseal_dir.join(KEYS_DIR_NAME),
            directory_path: dmseal_dir.join(DIRECTORY_FILE_NAME),
            dmseal_dir,
            config_path,
            config,
        })
    }

    pub fn directory(&self) -> FileDirectory {
        FileDirectory::new(&self.directory_path)
    }

    /// Start a session for the configured user against this device's stores
    pub async fn open_session(&self) -> Result<AppSession, AppSessionError> {
        let store = FileKeyStore::open(&self.keys_path)?;
        Session::start(self.config.user_id.clone(), store, self.directory()).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("dmseal directory not initialized. Run 'dmseal init' first")]
    NotInitialized,

    #[error("dmseal directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
