//! Layered configuration for Turnstile services.
//!
//! - TOML and JSON configuration files, strict about unknown fields
//! - Environment overrides under a prefix (`TURNSTILE_SERVER_HTTP_ADDR`,
//!   `TURNSTILE_LOGGING_LEVEL`, `TURNSTILE_CONTRACT_PATH`, ...)
//! - `.env` loading through `dotenvy`
//! - Contract files via [`load_contract`]
//!
//! # Example
//!
//! ```no_run
//! use turnstile_config::{load_contract, ConfigLoader};
//!
//! # fn main() -> Result<(), turnstile_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .with_optional_file("turnstile.toml")?
//!     .load()?;
//!
//! if let Some(path) = &config.contract.path {
//!     let contract = load_contract(path)?;
//!     println!("{} operations", contract.operations.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! base_path = "/api"
//! request_timeout_secs = 30
//! shutdown_timeout_secs = 30
//! max_body_bytes = 16777216
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [contract]
//! path = "checkin.toml"
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod contract;
mod error;
mod loader;
mod schema;

pub use config::TurnstileConfig;
pub use contract::{load_contract, parse_contract};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ContractSection, LoggingSection, ServerSection};
