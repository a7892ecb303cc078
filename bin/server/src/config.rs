//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys use
//! a double underscore, e.g. `MESSENGER__ACCESS_TOKEN` or
//! `SESSION__IDLE_TTL_MINUTES`.

use fishbot_integration::{ClassifierConfig, GeocoderConfig, MessengerConfig};
use fishbot_integration::image_cache::DEFAULT_MAX_ENTRIES;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Messenger page credentials.
    pub messenger: MessengerConfig,

    /// Intent classifier credentials.
    pub classifier: ClassifierConfig,

    /// Reverse geocoder credentials.
    pub geocoder: GeocoderConfig,

    /// Conversation session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Reply image configuration.
    #[serde(default)]
    pub images: ImageConfig,
}

fn default_port() -> u16 {
    8000
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity after which a session is dropped.
    /// Zero keeps sessions for the life of the process.
    #[serde(default = "default_idle_ttl_minutes")]
    pub idle_ttl_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_idle_ttl_minutes() -> i64 {
    24 * 60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_minutes: default_idle_ttl_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl SessionConfig {
    /// Returns true if idle sessions should be evicted.
    #[must_use]
    pub fn eviction_enabled(&self) -> bool {
        self.idle_ttl_minutes > 0
    }
}

/// Reply image configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Directory served under `/img`.
    #[serde(default = "default_image_dir")]
    pub dir: String,

    /// Maximum number of image bodies kept in memory.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

fn default_image_dir() -> String {
    "img".to_string()
}

fn default_cache_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            dir: default_image_dir(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
