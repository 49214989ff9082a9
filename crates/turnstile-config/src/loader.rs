//! Layered configuration loading.
//!
//! Layers apply in order, later ones winning:
//!
//! 1. built-in defaults (or the development preset)
//! 2. a TOML or JSON file, chosen by extension
//! 3. environment variables under a prefix, optionally seeded from `.env`
//!
//! A file replaces the whole configuration; sections and fields it omits
//! take their defaults.

use std::env;
use std::fs;
use std::path::Path;

use turnstile_telemetry::LogFormat;

use crate::{ConfigError, TurnstileConfig};

/// Builds a [`TurnstileConfig`] from layered sources.
///
/// # Example
///
/// ```
/// use turnstile_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string("[server]\nbase_path = \"/api\"", "toml")
///     .unwrap()
///     .with_env_vars([("TURNSTILE_LOGGING_LEVEL", "debug")])
///     .load()
///     .unwrap();
///
/// assert_eq!(config.server.base_path, "/api");
/// assert_eq!(config.logging.level, "debug");
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: TurnstileConfig,
    env_prefix: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Prefix used by [`ConfigLoader::new`].
    pub const DEFAULT_ENV_PREFIX: &'static str = "TURNSTILE";

    /// Starts from defaults, reading `TURNSTILE_*` variables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TurnstileConfig::default(),
            env_prefix: Some(Self::DEFAULT_ENV_PREFIX.to_string()),
            env_vars: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TurnstileConfig::development();
        self
    }

    /// Loads a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, of another
    /// format, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read(path)?;
        self.config = parse(&content, &format_of(path)?)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text; `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Changes the environment prefix, e.g. `"CHECKIN"` reads
    /// `CHECKIN_SERVER_HTTP_ADDR`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Skips environment overrides.
    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Reads overrides from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Loads `.env` from the working directory into the process
    /// environment, if present. Existing variables are not overwritten.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // A missing .env is the common case.
        let _ = dotenvy::dotenv();
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if an override does not parse or validation fails.
    pub fn load(mut self) -> Result<TurnstileConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars = self
                .env_vars
                .take()
                .unwrap_or_else(|| env::vars().collect());
            for (key, value) in &vars {
                self.apply_env_var(&prefix, key, value)?;
            }
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TurnstileConfig {
        self.config
    }

    fn apply_env_var(&mut self, prefix: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let Some(name) = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            return Ok(());
        };

        let server = &mut self.config.server;
        match name {
            "SERVER_HTTP_ADDR" => server.http_addr = value.to_string(),
            "SERVER_BASE_PATH" => server.base_path = value.to_string(),
            "SERVER_REQUEST_TIMEOUT_SECS" => {
                server.request_timeout_secs = parse_optional(key, value)?;
            }
            "SERVER_SHUTDOWN_TIMEOUT_SECS" => {
                server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            "SERVER_MAX_BODY_BYTES" => {
                server.max_body_bytes = parse_optional(key, value)?;
            }
            "LOGGING_LEVEL" => self.config.logging.level = value.to_string(),
            "LOGGING_FORMAT" => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            "LOGGING_INCLUDE_LOCATION" => {
                self.config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            "CONTRACT_PATH" => {
                self.config.contract.path = (!value.is_empty()).then(|| value.to_string());
            }
            // Other variables under the prefix belong to the embedding process.
            _ => {}
        }
        Ok(())
    }
}

pub(crate) fn read(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::file_not_found(path));
    }
    fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))
}

pub(crate) fn format_of(path: &Path) -> Result<String, ConfigError> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))
}

pub(crate) fn parse<T: serde::de::DeserializeOwned>(
    content: &str,
    format: &str,
) -> Result<T, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_optional<T: std::str::FromStr>(key: &str, value: &str) -> Result<Option<T>, ConfigError> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer or 'none'"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> ConfigLoader {
        ConfigLoader::new().with_env_vars(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_defaults() {
        let config = no_env().load().unwrap();
        assert_eq!(config, TurnstileConfig::default());
    }

    #[test]
    fn test_development_preset() {
        let config = no_env().with_development().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.server.http_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_string_toml_and_json() {
        let config = no_env()
            .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"", "toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");

        let config = no_env()
            .with_string(r#"{"contract": {"path": "checkin.toml"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.contract.path.as_deref(), Some("checkin.toml"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = no_env().with_string("", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(f) if f == "yaml"));
    }

    #[test]
    fn test_file_layers() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nbase_path = \"/v1\"\nrequest_timeout_secs = 5\n\n[logging]\nformat = \"pretty\""
        )
        .unwrap();

        let config = no_env().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.base_path, "/v1");
        assert_eq!(config.server.request_timeout_secs, Some(5));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.server.shutdown_timeout_secs, 30);
    }

    #[test]
    fn test_file_unknown_field_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nkeep_alive_secs = 5").unwrap();
        assert!(matches!(
            no_env().with_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_missing_files() {
        assert!(matches!(
            no_env().with_file("/nonexistent/turnstile.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
        let config = no_env()
            .with_optional_file("/nonexistent/turnstile.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_vars([
                ("TURNSTILE_SERVER_HTTP_ADDR", "127.0.0.1:9000"),
                ("TURNSTILE_SERVER_BASE_PATH", "/api"),
                ("TURNSTILE_SERVER_REQUEST_TIMEOUT_SECS", "none"),
                ("TURNSTILE_SERVER_SHUTDOWN_TIMEOUT_SECS", "3"),
                ("TURNSTILE_LOGGING_LEVEL", "debug"),
                ("TURNSTILE_LOGGING_FORMAT", "PRETTY"),
                ("TURNSTILE_CONTRACT_PATH", "/etc/checkin.json"),
                ("TURNSTILE_UNRELATED", "ignored"),
                ("OTHER_SERVER_HTTP_ADDR", "ignored"),
            ])
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.server.base_path, "/api");
        assert_eq!(config.server.request_timeout_secs, None);
        assert_eq!(config.server.shutdown_timeout_secs, 3);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.contract.path.as_deref(), Some("/etc/checkin.json"));
    }

    #[test]
    fn test_custom_prefix() {
        let config = ConfigLoader::new()
            .with_env_prefix("checkin")
            .with_env_vars([
                ("CHECKIN_SERVER_BASE_PATH", "/c"),
                ("TURNSTILE_SERVER_BASE_PATH", "/t"),
            ])
            .load()
            .unwrap();
        assert_eq!(config.server.base_path, "/c");
    }

    #[test]
    fn test_env_parse_errors() {
        let err = ConfigLoader::new()
            .with_env_vars([("TURNSTILE_SERVER_SHUTDOWN_TIMEOUT_SECS", "soon")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));

        let err = ConfigLoader::new()
            .with_env_vars([("TURNSTILE_LOGGING_FORMAT", "xml")])
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("TURNSTILE_LOGGING_FORMAT"));
    }

    #[test]
    fn test_validation_runs_after_env() {
        let err = ConfigLoader::new()
            .with_env_vars([("TURNSTILE_SERVER_BASE_PATH", "api")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_without_env_and_unvalidated() {
        let config = ConfigLoader::new()
            .without_env()
            .with_string("[server]\nhttp_addr = \"nope\"", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.server.http_addr, "nope");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
