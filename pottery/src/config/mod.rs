//! User configuration file.
//!
//! Settings live in an INI file at `<config dir>/pottery/config.ini`:
//!
//! ```ini
//! [repository]
//! url = https://repo1.maven.org/maven2
//! timeout = 30
//!
//! [resolver]
//! workers = 4
//! cache_dir = .pottery/m2
//! ```
//!
//! Missing keys fall back to the defaults of [`ResolverConfig`]. CLI
//! arguments override file values.

mod keys;

pub use keys::ConfigKey;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::resolver::{
    ResolverConfig, DEFAULT_CACHE_DIR, DEFAULT_REPOSITORY_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_WORKERS,
};

const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: ini::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// `[repository]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySettings {
    pub url: String,
    /// HTTP timeout in seconds.
    pub timeout: u64,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_REPOSITORY_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[resolver]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub workers: usize,
    pub cache_dir: PathBuf,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub repository: RepositorySettings,
    pub resolver: ResolverSettings,
}

/// Directory holding the configuration file.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pottery")
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = ConfigFile::default();
        if !path.exists() {
            return Ok(config);
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        ini.write_to_file(path).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolver settings from this file.
    pub fn to_resolver_config(&self) -> ResolverConfig {
        ResolverConfig::new(self.resolver.cache_dir.clone())
            .with_repository(self.repository.url.clone())
            .with_workers(self.resolver.workers)
            .with_timeout(Duration::from_secs(self.repository.timeout))
    }
}

/// Format a size in bytes as a human-readable string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
