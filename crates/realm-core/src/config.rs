//! Configuration loading and typed config structures for the Realm server.
//!
//! The canonical configuration lives in `realm-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure, and
//! provides a loader that reads the file. Every field has a default, so an
//! empty document is a valid configuration.

use std::path::Path;
use std::time::Duration;

use realm_world::PopulationConfig;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RealmConfig {
    /// Region store and lifecycle settings.
    #[serde(default)]
    pub regions: RegionsConfig,

    /// Built-in terrain provider settings.
    #[serde(default)]
    pub terrain: TerrainConfig,

    /// Initial population parameters.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Process-level settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl RealmConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `REALM_LOG` environment variable overrides `logging.level`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// Region store and lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionsConfig {
    /// Seconds without a keep-alive before a region is evicted.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Capacity of the store worker's request queue.
    #[serde(default = "default_request_queue_capacity")]
    pub request_queue_capacity: usize,

    /// Per-entity inbound event buffer for server-driven entities.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

impl RegionsConfig {
    /// The idle window as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            request_queue_capacity: default_request_queue_capacity(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

/// Built-in terrain provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TerrainConfig {
    /// Region width in tiles.
    #[serde(default = "default_terrain_side")]
    pub width: usize,

    /// Region height in tiles.
    #[serde(default = "default_terrain_side")]
    pub height: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: default_terrain_side(),
            height: default_terrain_side(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Override the level with `REALM_LOG` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("REALM_LOG") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Canonical region ids created at boot.
    #[serde(default = "default_warm_regions")]
    pub warm_regions: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            warm_regions: default_warm_regions(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_ttl_seconds() -> u64 {
    120
}

const fn default_request_queue_capacity() -> usize {
    64
}

const fn default_inbox_capacity() -> usize {
    256
}

const fn default_terrain_side() -> usize {
    100
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_warm_regions() -> Vec<String> {
    vec![String::from("overworld,field:0:0")]
}
