//! Wiring for the `turnstile-checkin` binary.

use std::time::Duration;

use anyhow::Context;
use turnstile_config::{load_contract, ServerSection, TurnstileConfig};
use turnstile_core::Contract;
use turnstile_middleware::stages::{RequestIdMiddleware, TracingMiddleware};
use turnstile_server::{Dispatcher, ServerConfig};

use crate::checkin::{self, StubCheckin};

/// Service name attached to request spans.
pub const SERVICE_NAME: &str = "turnstile-checkin";

/// The contract named by `[contract] path`, or the built-in check-in
/// contract when none is configured.
///
/// # Errors
///
/// Returns the loader error if the configured file cannot be read or parsed.
pub fn contract_for(config: &TurnstileConfig) -> anyhow::Result<Contract> {
    match &config.contract.path {
        Some(path) => {
            load_contract(path).with_context(|| format!("failed to load contract from {path}"))
        }
        None => Ok(checkin::contract()),
    }
}

/// Builds the check-in dispatcher with stub handlers, request ID and
/// tracing middleware, under the configured base path.
///
/// # Errors
///
/// Fails if the contract cannot be loaded or does not match the check-in
/// handlers.
pub fn build_dispatcher(config: &TurnstileConfig) -> anyhow::Result<Dispatcher> {
    let contract = contract_for(config)?;
    checkin::register_checkin(Dispatcher::builder(contract), StubCheckin)
        .base_path(config.server.base_path.clone())
        .middleware(RequestIdMiddleware::new())
        .middleware(TracingMiddleware::new(SERVICE_NAME))
        .build()
        .context("contract does not match the check-in handlers")
}

/// Maps the `[server]` section onto the transport settings.
#[must_use]
pub fn server_config(section: &ServerSection) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(section.http_addr.clone())
        .shutdown_timeout(Duration::from_secs(section.shutdown_timeout_secs))
        .request_timeout(section.request_timeout_secs.map(Duration::from_secs))
        .max_body_size(section.max_body_bytes)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_contract_by_default() {
        let contract = contract_for(&TurnstileConfig::default()).unwrap();
        assert_eq!(contract, checkin::contract());
    }

    #[test]
    fn test_contract_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let json = serde_json::to_string(&checkin::contract()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let mut config = TurnstileConfig::default();
        config.contract.path = Some(file.path().display().to_string());
        assert_eq!(contract_for(&config).unwrap(), checkin::contract());
    }

    #[test]
    fn test_missing_contract_file() {
        let mut config = TurnstileConfig::default();
        config.contract.path = Some("/nonexistent/contract.toml".into());
        let err = contract_for(&config).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/contract.toml"));
    }

    #[test]
    fn test_base_path_applies_to_routes() {
        let mut config = TurnstileConfig::default();
        config.server.base_path = "/api".into();
        let dispatcher = build_dispatcher(&config).unwrap();
        assert_eq!(
            dispatcher.routes()[0].template().to_string(),
            "/api/accounts/{accountId}/events"
        );
        assert_eq!(
            dispatcher.routes()[0].middleware(),
            vec!["request_id", "tracing"]
        );
    }

    #[test]
    fn test_contract_without_handler_fails() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[[operations]]
operation_id = "DeleteEvent"
method = "DELETE"
path = "/accounts/{accountId}/events/{eventId}"
"#,
        )
        .unwrap();

        let mut config = TurnstileConfig::default();
        config.contract.path = Some(file.path().display().to_string());
        assert!(build_dispatcher(&config).is_err());
    }

    #[test]
    fn test_server_config_mapping() {
        let section = ServerSection {
            http_addr: "127.0.0.1:9000".into(),
            request_timeout_secs: None,
            shutdown_timeout_secs: 5,
            max_body_bytes: Some(1024),
            ..ServerSection::default()
        };
        let config = server_config(&section);
        assert_eq!(config.http_addr(), "127.0.0.1:9000");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_body_size(), Some(1024));
    }
}
