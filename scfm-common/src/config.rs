//! Configuration loading and root folder resolution
//!
//! Every setting has a compiled default. A missing config file is logged and
//! the defaults are used; a malformed one is an error.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SCFM_ROOT_FOLDER";
/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "SCFM_CONFIG";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder for the database and uploaded assets
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Accounts registered with one of these emails become admins
    #[serde(default)]
    pub admin_emails: Vec<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub distribution: DistributionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Repository adapter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(Error::Config(format!("unknown storage backend '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Relative paths are resolved against the root folder
    #[serde(default = "default_database_file")]
    pub database_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_file: default_database_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_artists")]
    pub max_artists_per_user: usize,
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: u64,
    #[serde(default = "default_max_artwork_bytes")]
    pub max_artwork_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_artists_per_user: default_max_artists(),
            max_audio_bytes: default_max_audio_bytes(),
            max_artwork_bytes: default_max_artwork_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionConfig {
    /// Multiplier on the simulated pipeline delays; 0 makes every step immediate
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5740
}

fn default_database_file() -> PathBuf {
    PathBuf::from("scfm.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_artists() -> usize {
    3
}

fn default_max_audio_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_max_artwork_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_time_scale() -> f64 {
    1.0
}

impl TomlConfig {
    /// Whether `email` is configured as an admin address
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = crate::models::user::normalize_email(email);
        self.admin_emails
            .iter()
            .any(|candidate| crate::models::user::normalize_email(candidate) == email)
    }

    /// Absolute database path under `root_folder`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        if self.storage.database_file.is_absolute() {
            self.storage.database_file.clone()
        } else {
            root_folder.join(&self.storage.database_file)
        }
    }
}

/// Load `path`, falling back to defaults when the file does not exist
pub fn load_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    if !config.distribution.time_scale.is_finite() || config.distribution.time_scale < 0.0 {
        return Err(Error::Config(format!(
            "distribution.time_scale must be >= 0, got {}",
            config.distribution.time_scale
        )));
    }
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Config file location: CLI, then `SCFM_CONFIG`, then the platform config dir
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|d| d.join("scfm").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("scfm-config.toml"))
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `SCFM_ROOT_FOLDER`
/// 3. `root_folder` in the TOML config
/// 4. OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.root_folder {
        return path.clone();
    }
    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scfm"))
        .unwrap_or_else(|| PathBuf::from("./scfm_data"))
}
