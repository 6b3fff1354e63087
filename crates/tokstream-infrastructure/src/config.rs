//! Application configuration.
//!
//! Values are layered, later layers winning:
//! built-in defaults < `config.toml` < environment variables < CLI flags.
//! The CLI layer is applied by the binary; everything else lives here.

use crate::paths::TokstreamPaths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokstream_core::TrailingLinePolicy;

pub const ENV_BACKEND: &str = "TOKSTREAM_BACKEND";
pub const ENV_ENDPOINT: &str = "TOKSTREAM_ENDPOINT";
pub const ENV_BIND: &str = "TOKSTREAM_BIND";

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/ai-search";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Errors raised while locating, reading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine configuration directory: {0}")]
    Path(#[from] crate::paths::PathError),

    #[error("Failed to access configuration file at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse configuration file at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Which token source answers queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Built-in producer with canned replies; needs no network.
    #[default]
    Synthetic,
    /// Remote endpoint speaking the token frame protocol.
    Http,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" | "mock" => Ok(BackendKind::Synthetic),
            "http" => Ok(BackendKind::Http),
            _ => Err(ConfigError::InvalidValue {
                key: "backend.kind".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Synthetic => f.write_str("synthetic"),
            BackendKind::Http => f.write_str("http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// URL the HTTP backend POSTs to.
    pub endpoint: String,
    /// Delay between frames of the synthetic producer.
    pub token_delay_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_delay_ms: 20,
        }
    }
}

impl BackendConfig {
    pub fn token_delay(&self) -> Duration {
        Duration::from_millis(self.token_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub trailing_line: TrailingLinePolicy,
    /// Send the whole conversation instead of only the latest query.
    pub send_history: bool,
    /// Deadline for obtaining the response byte stream.
    pub open_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            trailing_line: TrailingLinePolicy::default(),
            send_history: false,
            open_timeout_secs: 30,
        }
    }
}

impl StreamConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Root of `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub backend: BackendConfig,
    pub stream: StreamConfig,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            backend: BackendConfig::default(),
            stream: StreamConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Overrides fields from environment variables, looked up through
    /// `lookup` so callers and tests control the source.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup(ENV_BACKEND) {
            self.backend.kind = kind.parse()?;
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.backend.endpoint = endpoint;
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        Ok(())
    }
}

/// Loads [`AppConfig`] from a TOML file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default location, `~/.config/tokstream/config.toml`.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_path(TokstreamPaths::config_file()?))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file only. A missing file yields the defaults.
    pub fn load_file(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Reads the file, then applies the process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = self.load_file()?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Writes a config file populated with the defaults unless one exists.
    /// Returns `true` if a file was created.
    pub fn ensure_file(&self) -> Result<bool, ConfigError> {
        if self.path.exists() {
            return Ok(false);
        }

        let io_error = |e: std::io::Error| ConfigError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let template = toml::to_string_pretty(&AppConfig::default()).map_err(|e| {
            ConfigError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(&self.path, template).map_err(io_error)?;
        Ok(true)
    }
}
