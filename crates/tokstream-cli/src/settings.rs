//! Command-line overrides on top of file and environment configuration.

use std::path::Path;
use tokstream_infrastructure::{AppConfig, BackendKind, ConfigError, ConfigService};

/// Values given as flags. They win over the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<BackendKind>,
    pub endpoint: Option<String>,
    pub bind: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(kind) = self.backend {
            config.backend.kind = kind;
        }
        if let Some(endpoint) = self.endpoint {
            config.backend.endpoint = endpoint;
        }
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
    }
}

pub fn config_service(path: Option<&Path>) -> Result<ConfigService, ConfigError> {
    match path {
        Some(path) => Ok(ConfigService::with_path(path)),
        None => ConfigService::new(),
    }
}
