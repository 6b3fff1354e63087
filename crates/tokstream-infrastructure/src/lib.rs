//! Configuration and filesystem concerns for tokstream.

pub mod config;
pub mod paths;

pub use config::{
    AppConfig, BackendConfig, BackendKind, ConfigError, ConfigService, ServerConfig, StreamConfig,
};
pub use paths::{PathError, TokstreamPaths};
