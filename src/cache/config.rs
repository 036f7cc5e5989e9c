//! Compilation cache configuration

use crate::error::{JitError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Compilation cache configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether compiled artifacts are cached at all
    pub enabled: bool,

    /// Maximum number of compiled artifacts kept before LRU eviction
    pub max_entries: usize,

    /// Allow at most one compilation in flight per cache key
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: super::DEFAULT_MAX_ENTRIES,
            single_flight: true,
        }
    }
}

/// Config file layout; only the `[cache]` table is read
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    cache: CacheConfig,
}

impl CacheConfig {
    /// Create a new cache configuration with custom settings
    pub fn new(enabled: bool, max_entries: usize, single_flight: bool) -> Self {
        Self {
            enabled,
            max_entries,
            single_flight,
        }
    }

    /// Create configuration from cache options
    pub fn from_options(options: CacheOptions) -> Self {
        let mut config = Self::default();
        config.apply(options);
        config
    }

    /// Apply runtime overrides on top of this configuration
    pub fn apply(&mut self, options: CacheOptions) {
        if let Some(enabled) = options.enabled {
            self.enabled = enabled;
        }

        if let Some(max_entries) = options.max_entries {
            self.max_entries = max_entries;
        }

        if let Some(single_flight) = options.single_flight {
            self.single_flight = single_flight;
        }
    }

    /// Load configuration from ~/.gql-jit/config.toml
    ///
    /// Returns defaults when the file does not exist.
    pub fn load_from_file() -> Result<Self> {
        let config_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(super::DEFAULT_CONFIG_FILE);

        Self::load_from_path(&config_path)
    }

    /// Load the `[cache]` table of a TOML file
    ///
    /// Missing keys keep their defaults; a missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&contents)?;
        file.cache.validate()?;

        Ok(file.cache)
    }

    /// Check that the configuration can back a cache
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(JitError::InvalidConfig(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runtime cache options that can override configuration
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Override the enabled setting
    pub enabled: Option<bool>,

    /// Override the max_entries setting
    pub max_entries: Option<usize>,

    /// Override the single_flight setting
    pub single_flight: Option<bool>,
}

impl CacheOptions {
    /// Create new cache options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the capacity
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Set the single-flight flag
    pub fn with_single_flight(mut self, single_flight: bool) -> Self {
        self.single_flight = Some(single_flight);
        self
    }
}

mod dirs {
    use std::path::PathBuf;

    /// Get the home directory
    pub fn home_dir() -> Option<PathBuf> {
        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home));
        }

        #[cfg(windows)]
        {
            if let Some(user_profile) = std::env::var_os("USERPROFILE") {
                return Some(PathBuf::from(user_profile));
            }
        }

        None
    }
}
