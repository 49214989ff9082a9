//! Contract files.
//!
//! A contract file is the serialized form of [`Contract`]: TOML or JSON,
//! chosen by extension, with unknown fields rejected.

use std::path::Path;

use turnstile_core::Contract;

use crate::loader::{format_of, parse, read};
use crate::ConfigError;

/// Reads a contract from a `.toml` or `.json` file.
///
/// Only the file format is checked here; operations are validated against
/// their templates when the dispatcher is built.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or malformed.
///
/// # Example
///
/// ```no_run
/// let contract = turnstile_config::load_contract("checkin.toml").unwrap();
/// for id in contract.operation_ids() {
///     println!("{id}");
/// }
/// ```
pub fn load_contract(path: impl AsRef<Path>) -> Result<Contract, ConfigError> {
    let path = path.as_ref();
    let content = read(path)?;
    parse(&content, &format_of(path)?)
}

/// Parses contract text; `format` is `"toml"` or `"json"`.
///
/// # Errors
///
/// Returns an error if the text does not parse.
pub fn parse_contract(content: &str, format: &str) -> Result<Contract, ConfigError> {
    parse(content, format)
}
