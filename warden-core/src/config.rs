//! Configuration management

use crate::error::{ErrorContext, WardenError, WardenResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub oauth2: OAuth2Config,
    pub problem: ProblemConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Resource-server settings. Exactly one of `public_key_path` (RS256) and
/// `jwt_secret` (HS256) must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2Config {
    pub public_key_path: Option<String>,
    pub jwt_secret: Option<String>,
    /// Clock skew tolerated when checking `exp`, in seconds
    pub leeway_secs: u64,
}

/// Problem-details settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    /// Prefix of every problem `type` URI, used verbatim
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/problems/".to_string(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> WardenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| WardenError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: WardenConfig = toml::from_str(&content).map_err(|e| WardenError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> WardenResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| WardenError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| WardenError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> WardenResult<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port must be greater than 0"));
        }

        if self.database.url.trim().is_empty() {
            return Err(invalid("database.url must not be empty"));
        }

        match (&self.oauth2.public_key_path, &self.oauth2.jwt_secret) {
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "oauth2.public_key_path and oauth2.jwt_secret are mutually exclusive",
                ))
            }
            (None, None) => {
                return Err(invalid(
                    "one of oauth2.public_key_path or oauth2.jwt_secret is required",
                ))
            }
            _ => {}
        }

        if self.problem.base_url.trim().is_empty() {
            return Err(invalid("problem.base_url must not be empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> WardenError {
    WardenError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config").with_operation("validate"),
    }
}
