use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Registry server configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Seconds a document survives without being re-registered
    #[serde(default = "default_document_ttl")]
    pub document_ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Glob of patch files applied to every registered document
    pub patches_glob: Option<String>,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            document_ttl_secs: default_document_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            patches_glob: None,
            enable_cors: default_enable_cors(),
        }
    }
}

impl RegistryConfig {
    pub fn document_ttl(&self) -> Result<chrono::TimeDelta, ConfigError> {
        i64::try_from(self.document_ttl_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "document_ttl_secs {} is out of range",
                    self.document_ttl_secs
                ))
            })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.document_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "document_ttl_secs must be greater than zero".to_string(),
            ));
        }
        self.document_ttl()?;
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 10567))
}

fn default_document_ttl() -> u64 {
    1200
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_enable_cors() -> bool {
    true
}

/// Registry agent configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct AgentConfig {
    /// Base URI of the registry, e.g. `http://localhost:10567`
    pub registry_uri: String,

    #[serde(default = "default_agent_interval")]
    pub interval_secs: u64,

    /// Glob of indicator documents to register
    pub documents_glob: String,
}

impl AgentConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry_uri.trim().is_empty() {
            return Err(ConfigError::Invalid("registry_uri is required".to_string()));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_agent_interval() -> u64 {
    300
}

/// Read a JSON configuration file
pub fn read_config_file<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + std::fmt::Debug,
{
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&file_content)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
        .inspect(|config| trace!("loaded config: {config:?}"))
}
