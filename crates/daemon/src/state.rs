use std::{fs, path::PathBuf};

use common::config::Config;
use common::crypto::SecretKey;
use common::profile::Profile;
use common::repo::{FsRepo, RepoError};

pub const APP_NAME: &str = "strata";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const REPO_DIR_NAME: &str = "repo";

/// On-disk layout of a peer:
///
/// ```text
/// ~/.strata/config.toml
/// ~/.strata/key.pem
/// ~/.strata/repo/
/// ```
#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the strata directory (~/.strata)
    pub strata_dir: PathBuf,
    /// Path to the identity key PEM file
    pub key_path: PathBuf,
    /// Path to the dataset repo
    pub repo_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: Config,
}

impl AppState {
    /// Get the strata directory path (custom or default ~/.strata)
    pub fn strata_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new strata state directory
    pub fn init(custom_path: Option<PathBuf>, config: Option<Config>) -> Result<Self, StateError> {
        let strata_dir = Self::strata_dir(custom_path)?;

        if strata_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&strata_dir)?;

        let repo_path = strata_dir.join(REPO_DIR_NAME);
        fs::create_dir_all(&repo_path)?;

        let key = SecretKey::generate();
        let key_path = strata_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = strata_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            strata_dir,
            key_path,
            repo_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the strata directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let strata_dir = Self::strata_dir(custom_path)?;

        if !strata_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = strata_dir.join(KEY_FILE_NAME);
        let repo_path = strata_dir.join(REPO_DIR_NAME);
        let config_path = strata_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !repo_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", REPO_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&config_toml)?;

        Ok(Self {
            strata_dir,
            key_path,
            repo_path,
            config_path,
            config,
        })
    }

    /// Load the secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// Open the dataset repo, creating its profile from `key` on first use
    pub async fn open_repo(&self, key: &SecretKey) -> Result<FsRepo, StateError> {
        Ok(FsRepo::open(&self.repo_path, default_profile(key)).await?)
    }
}

/// Profile for a fresh repo: the peer id plus a peername derived from it
pub fn default_profile(key: &SecretKey) -> Profile {
    let id = key.peer_id();
    let peername = format!("peer_{}", &id[..8]);
    Profile::new(id, peername)
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("strata directory not initialized. Run 'strata init' first")]
    NotInitialized,

    #[error("strata directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("repo error: {0}")]
    Repo(#[from] RepoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
