// SPDX-FileCopyrightText: 2026 ormstrap contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Strapper configuration module
//!
//! This module provides the single configuration object the strapper consumes,
//! covering the HTTP server surface, the per-backend skip flags and connection
//! settings, and validation of configuration parameters.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{StrapError, StrapResult};

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Create a safe default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Create a safe testing port (port 0)
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl Default for ServerPort {
    fn default() -> Self {
        Self::default_development()
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // Validated during configuration loading, once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Create a safe testing timeout (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl Default for Environment {
    fn default() -> Self {
        Self::Development
    }
}

/// Per-backend connection settings with a skip flag
///
/// Every backend is skipped unless explicitly enabled; an enabled backend
/// without a URL falls back to its environment variable at strap time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Do not initialize this backend at all
    pub skip: bool,
    /// Connection URL; when absent the backend's environment variable is consulted
    pub url: Option<String>,
    /// Database name (document store only)
    pub database: Option<String>,
    /// Maximum pool size (pooled backends only)
    pub max_connections: u32,
    /// Connect/acquire timeout in seconds
    pub connect_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            skip: true,
            url: None,
            database: None,
            max_connections: 5,
            connect_timeout_seconds: 5,
        }
    }
}

impl BackendConfig {
    /// Resolve the connection URL: explicit configuration first, then the
    /// given environment variable
    pub fn resolved_url(&self, env_key: &str) -> Option<String> {
        self.url
            .clone()
            .or_else(|| std::env::var(env_key).ok().filter(|v| !v.is_empty()))
    }
}

/// Skip flags and connection settings for all four backends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoresConfig {
    /// Key-value cache
    pub redis: BackendConfig,
    /// SQL pool
    pub postgres: BackendConfig,
    /// Second SQL pool
    pub mysql: BackendConfig,
    /// Document store
    pub mongo: BackendConfig,
}

/// Strapper configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrapConfig {
    /// Application name, used in logs
    pub app_name: String,
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Request timeout in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Root path prefix caller route groups are nested under
    pub root: String,
    /// Version string reported by the version routes
    pub version: String,
    /// Model names excluded from classification
    pub omit_models: Vec<String>,
    /// Build everything but never bind a socket
    pub skip_start: bool,
    /// Disable per-request trace logging
    pub skip_request_logging: bool,
    /// Do not mount the informational version routes
    pub skip_version_routes: bool,
    /// Per-backend settings
    pub datastores: DatastoresConfig,
}

impl Default for StrapConfig {
    fn default() -> Self {
        Self {
            app_name: "ormstrap".to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            root: "/api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            omit_models: Vec::new(),
            skip_start: false,
            skip_request_logging: true,
            skip_version_routes: true,
            datastores: DatastoresConfig::default(),
        }
    }
}

impl StrapConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `StrapError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> StrapResult<Self> {
        Self::load().map_err(|e| StrapError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with STRAP prefix (`__` separator for nesting)
    /// 5. The `PORT` environment variable, when set
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("STRAP")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut strap_config: Self = config.try_deserialize()?;

        // PORT is the conventional platform override for the listen port
        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|e| ConfigError::Message(format!("invalid PORT variable: {e}")))?;
            strap_config.port = ServerPort {
                port,
                environment: strap_config.environment,
            };
        }

        // Fix the ServerPort to have the correct environment context
        strap_config.port =
            ServerPort::new(strap_config.port.value(), strap_config.environment)
                .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        Ok(strap_config)
    }

    /// Create configuration optimized for testing: OS-assigned port, short
    /// timeouts, every backend skipped
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            ..Self::default()
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_validation() {
        assert!(TimeoutSeconds::new(0).is_err());
        assert!(TimeoutSeconds::new(400).is_err());

        assert!(TimeoutSeconds::new(30).is_ok());
        assert!(TimeoutSeconds::new(1).is_ok());
        assert!(TimeoutSeconds::new(300).is_ok());
    }

    #[test]
    fn server_port_validation() {
        // Port 0 should only be valid in testing environment
        assert!(ServerPort::new(0, Environment::Testing).is_ok());
        assert!(ServerPort::new(0, Environment::Development).is_err());
        assert!(ServerPort::new(0, Environment::Production).is_err());

        assert!(ServerPort::new(3000, Environment::Development).is_ok());
        assert!(ServerPort::new(443, Environment::Production).is_ok());
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Testing.to_string(), "testing");
    }

    #[test]
    fn every_backend_is_skipped_by_default() {
        let config = StrapConfig::default();
        assert!(config.datastores.redis.skip);
        assert!(config.datastores.postgres.skip);
        assert!(config.datastores.mysql.skip);
        assert!(config.datastores.mongo.skip);
    }

    #[test]
    fn default_surface_flags() {
        let config = StrapConfig::default();
        assert_eq!(config.root, "/api");
        assert!(config.skip_request_logging);
        assert!(config.skip_version_routes);
        assert!(!config.skip_start);
    }

    #[test]
    fn explicit_url_wins_over_environment() {
        let backend = BackendConfig {
            url: Some("redis://explicit:6379".to_string()),
            ..BackendConfig::default()
        };
        assert_eq!(
            backend.resolved_url("ORMSTRAP_TEST_UNSET_VAR").as_deref(),
            Some("redis://explicit:6379")
        );
    }

    #[test]
    fn unresolved_url_is_none() {
        let backend = BackendConfig::default();
        assert_eq!(backend.resolved_url("ORMSTRAP_TEST_UNSET_VAR"), None);
    }
}
