//! Settable configuration keys.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};

/// A `section.key` setting of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    RepositoryUrl,
    RepositoryTimeout,
    ResolverWorkers,
    ResolverCacheDir,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::RepositoryUrl,
    ConfigKey::RepositoryTimeout,
    ConfigKey::ResolverWorkers,
    ConfigKey::ResolverCacheDir,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    /// Full name, e.g. `repository.url`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::RepositoryUrl | ConfigKey::RepositoryTimeout => "repository",
            ConfigKey::ResolverWorkers | ConfigKey::ResolverCacheDir => "resolver",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::RepositoryUrl => "url",
            ConfigKey::RepositoryTimeout => "timeout",
            ConfigKey::ResolverWorkers => "workers",
            ConfigKey::ResolverCacheDir => "cache_dir",
        }
    }

    /// Current value as written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::RepositoryUrl => config.repository.url.clone(),
            ConfigKey::RepositoryTimeout => config.repository.timeout.to_string(),
            ConfigKey::ResolverWorkers => config.resolver.workers.to_string(),
            ConfigKey::ResolverCacheDir => config.resolver.cache_dir.display().to_string(),
        }
    }

    /// Validate and store `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::RepositoryUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(self.invalid(value, "expected an http:// or https:// URL"));
                }
                config.repository.url = value.to_string();
            }
            ConfigKey::RepositoryTimeout => {
                config.repository.timeout = match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => return Err(self.invalid(value, "expected a positive number of seconds")),
                };
            }
            ConfigKey::ResolverWorkers => {
                config.resolver.workers = match value.parse::<usize>() {
                    Ok(workers) if workers > 0 => workers,
                    _ => return Err(self.invalid(value, "expected a positive integer")),
                };
            }
            ConfigKey::ResolverCacheDir => {
                if value.is_empty() {
                    return Err(self.invalid(value, "path must not be empty"));
                }
                config.resolver.cache_dir = PathBuf::from(value);
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}
