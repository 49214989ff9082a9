//! Configuration sections.

use serde::{Deserialize, Serialize};
use turnstile_telemetry::{LogConfig, LogFormat};

/// `[server]`: transport and routing settings.
///
/// ```
/// use turnstile_config::ServerSection;
///
/// let server = ServerSection {
///     base_path: "/api".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(server.http_addr, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Prefix prepended to every route, empty for none.
    #[serde(default)]
    pub base_path: String,

    /// Per-request deadline in seconds; absent disables it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: Option<u64>,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body in bytes; absent disables the limit.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: Option<usize>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            base_path: String::new(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_request_timeout() -> Option<u64> {
    Some(30)
}

fn default_shutdown_timeout() -> u64 {
    30
}

#[allow(clippy::unnecessary_wraps)]
fn default_max_body_bytes() -> Option<usize> {
    Some(16 * 1024 * 1024)
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts to the subscriber settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            level: self.level.clone(),
            file_line_info: self.include_location,
            ..base
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[contract]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContractSection {
    /// Contract file to load; absent uses the built-in contract.
    #[serde(default)]
    pub path: Option<String>,
}
