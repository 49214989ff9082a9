//! The root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use turnstile_telemetry::{create_env_filter, LogFormat};

use crate::{ConfigError, ContractSection, LoggingSection, ServerSection};

/// Complete Turnstile configuration.
///
/// ```
/// use turnstile_config::TurnstileConfig;
///
/// let config = TurnstileConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TurnstileConfig {
    /// Transport and routing.
    #[serde(default)]
    pub server: ServerSection,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Contract source.
    #[serde(default)]
    pub contract: ContractSection,
}

impl TurnstileConfig {
    /// Local development preset: loopback address, debug level, pretty logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                ..ServerSection::default()
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
            },
            contract: ContractSection::default(),
        }
    }

    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        let base = &self.server.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(ConfigError::invalid_value(
                "server.base_path",
                "must start with `/` and not end with `/`",
            ));
        }

        if self.server.request_timeout_secs == Some(0) {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be positive; omit it to disable the deadline",
            ));
        }

        if self.server.max_body_bytes == Some(0) {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be positive; omit it to disable the limit",
            ));
        }

        if let Err(e) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        Ok(())
    }
}
