//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::gateway::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const ENV_API_KEY: &str = "NMI_API_KEY";
pub const ENV_API_URL: &str = "API_URL";
pub const ENV_DEBUG_MODE: &str = "DEBUG_MODE";
pub const ENV_PORT: &str = "PORT";
pub const ENV_TIMEOUT_SECS: &str = "GATEWAY_TIMEOUT_SECS";

/// Dotenv file read by [`GatewayConfig::from_env`], relative to the working directory
pub const ENV_FILE: &str = ".env";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Gateway credentials and service settings
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Merchant security key sent with every request
    #[serde(default)]
    pub security_key: String,

    /// Direct-post endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub debug_mode: bool,

    /// Port the HTTP surface listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bound on one gateway round trip, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            security_key: String::new(),
            api_url: default_api_url(),
            debug_mode: false,
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// Keeps the security key out of logs
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("security_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("debug_mode", &self.debug_mode)
            .field("port", &self.port)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment and `./.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_file(ENV_FILE)
    }

    /// Load configuration from the process environment, falling back to the
    /// variables of a dotenv file
    ///
    /// Process variables win over the file. A missing file is skipped.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = read_env_file(path.as_ref())?;
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Load configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();

        if let Some(key) = get(ENV_API_KEY) {
            config.security_key = key;
        }
        if let Some(url) = get(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(debug) = get(ENV_DEBUG_MODE) {
            config.debug_mode = parse_flag(&debug);
        }
        if let Some(port) = get(ENV_PORT) {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_PORT.to_string(),
                value: port.clone(),
                message: "expected a port number".to_string(),
            })?;
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            config.timeout_secs = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_TIMEOUT_SECS.to_string(),
                value: secs.clone(),
                message: "expected a whole number of seconds".to_string(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Security key and endpoint are mandatory, and the timeout must be positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: ENV_API_KEY.to_string(),
            });
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: ENV_API_URL.to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_TIMEOUT_SECS.to_string(),
                value: "0".to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Default tracing filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.debug_mode { "debug" } else { "info" }
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let entries = match dotenv::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "no env file, using process environment");
            return Ok(HashMap::new());
        }
        Err(e) => return Err(ConfigError::EnvFile(e.to_string())),
    };

    entries
        .map(|entry| entry.map_err(|e| ConfigError::EnvFile(e.to_string())))
        .collect()
}

/// Boolean flag; unrecognised values read as false
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "yes" | "on"
    )
}
