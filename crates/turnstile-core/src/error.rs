//! Error types for Turnstile.
//!
//! Request-time failures form one taxonomy, [`ErrorKind`]. Routing misses
//! and binding failures are both carried by [`DispatchError`], which is
//! the only thing an error reporter ever sees. [`ContractError`] covers
//! problems found while the route table is being built.

use std::fmt;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use turnstile_router::RouterError;

use crate::ParameterLocation;

/// Every way a request can be rejected before reaching a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No route matched the method and path.
    NotFound,
    /// A required parameter was absent.
    Required,
    /// A present value could not be coerced to its declared type.
    InvalidFormat,
    /// A single-valued parameter received several values.
    TooManyValues,
    /// A cookie value had a bad percent escape.
    UnescapeFailure,
    /// A JSON-typed parameter was not valid JSON.
    UnmarshalFailure,
}

impl ErrorKind {
    /// Status code used by the built-in reporters.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable code for error envelopes.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "ROUTE_NOT_FOUND",
            Self::Required => "REQUIRED_PARAMETER",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::TooManyValues => "TOO_MANY_VALUES",
            Self::UnescapeFailure => "UNESCAPE_FAILURE",
            Self::UnmarshalFailure => "UNMARSHAL_FAILURE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not_found",
            Self::Required => "required",
            Self::InvalidFormat => "invalid_format",
            Self::TooManyValues => "too_many_values",
            Self::UnescapeFailure => "unescape_failure",
            Self::UnmarshalFailure => "unmarshal_failure",
        })
    }
}

/// A parameter failed to bind.
///
/// Always names the parameter and where it was read from, so a custom
/// reporter can say exactly what was wrong.
///
/// # Example
///
/// ```rust
/// use turnstile_core::{BindingError, ErrorKind, ParameterLocation};
///
/// let err = BindingError::invalid_format(
///     ParameterLocation::Path,
///     "accountId",
///     "invalid digit found in string",
/// );
/// assert_eq!(err.kind(), ErrorKind::InvalidFormat);
/// assert_eq!(err.parameter(), "accountId");
/// assert_eq!(
///     err.to_string(),
///     "Invalid format for parameter accountId: invalid digit found in string"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingError {
    kind: ErrorKind,
    parameter: String,
    location: ParameterLocation,
    detail: Option<String>,
    count: usize,
}

impl BindingError {
    fn new(kind: ErrorKind, location: ParameterLocation, parameter: impl Into<String>) -> Self {
        Self {
            kind,
            parameter: parameter.into(),
            location,
            detail: None,
            count: 0,
        }
    }

    /// A required parameter was not supplied.
    #[must_use]
    pub fn required(location: ParameterLocation, parameter: impl Into<String>) -> Self {
        Self::new(ErrorKind::Required, location, parameter)
    }

    /// A value failed coercion.
    #[must_use]
    pub fn invalid_format(
        location: ParameterLocation,
        parameter: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(ErrorKind::InvalidFormat, location, parameter)
        }
    }

    /// `count` values arrived for a single-valued parameter.
    #[must_use]
    pub fn too_many_values(
        location: ParameterLocation,
        parameter: impl Into<String>,
        count: usize,
    ) -> Self {
        Self {
            count,
            ..Self::new(ErrorKind::TooManyValues, location, parameter)
        }
    }

    /// A cookie value could not be percent-decoded.
    #[must_use]
    pub fn unescape_failure(parameter: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::UnescapeFailure,
            ParameterLocation::Cookie,
            parameter,
        )
    }

    /// A JSON-typed value was malformed.
    #[must_use]
    pub fn unmarshal_failure(
        location: ParameterLocation,
        parameter: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(ErrorKind::UnmarshalFailure, location, parameter)
        }
    }

    /// The failure kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Name of the offending parameter.
    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Where the parameter was read from.
    #[must_use]
    pub const fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Underlying parse error text, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Number of values received, for [`ErrorKind::TooManyValues`].
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Always `400 Bad Request`.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Machine-readable code for error envelopes.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.detail.as_deref().unwrap_or_default();
        match self.kind {
            ErrorKind::Required => match self.location {
                ParameterLocation::Query => write!(
                    f,
                    "Query argument {} is required, but not found",
                    self.parameter
                ),
                ParameterLocation::Path => write!(
                    f,
                    "Path parameter {} is required, but not found",
                    self.parameter
                ),
                ParameterLocation::Header => write!(
                    f,
                    "Header parameter {} is required, but not found",
                    self.parameter
                ),
                ParameterLocation::Cookie => write!(
                    f,
                    "Cookie parameter {} is required, but not found",
                    self.parameter
                ),
                ParameterLocation::Multipart => write!(
                    f,
                    "Multipart field {} is required, but not found",
                    self.parameter
                ),
            },
            ErrorKind::InvalidFormat => write!(
                f,
                "Invalid format for parameter {}: {detail}",
                self.parameter
            ),
            ErrorKind::TooManyValues => write!(
                f,
                "Expected one value for {}, got {}",
                self.parameter, self.count
            ),
            ErrorKind::UnescapeFailure => write!(
                f,
                "error unescaping cookie parameter '{}'",
                self.parameter
            ),
            ErrorKind::UnmarshalFailure => write!(
                f,
                "Error unmarshaling parameter {} as JSON: {detail}",
                self.parameter
            ),
            ErrorKind::NotFound => write!(f, "parameter {} not found", self.parameter),
        }
    }
}

impl std::error::Error for BindingError {}

/// A request that was rejected before reaching its handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No route matched.
    #[error("no route matches {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path without the query string.
        path: String,
    },

    /// A parameter of the matched route failed to bind.
    #[error(transparent)]
    Binding(#[from] BindingError),
}

impl DispatchError {
    /// Shorthand for [`DispatchError::NotFound`].
    #[must_use]
    pub fn not_found(method: Method, path: impl Into<String>) -> Self {
        Self::NotFound {
            method,
            path: path.into(),
        }
    }

    /// The failure kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Binding(e) => e.kind(),
        }
    }

    /// The offending parameter, for binding failures.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::NotFound { .. } => None,
            Self::Binding(e) => Some(e.parameter()),
        }
    }

    /// Where the offending parameter lives, for binding failures.
    #[must_use]
    pub const fn location(&self) -> Option<ParameterLocation> {
        match self {
            Self::NotFound { .. } => None,
            Self::Binding(e) => Some(e.location()),
        }
    }

    /// `404` for routing misses, `400` for binding failures.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Machine-readable code for error envelopes.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.kind().code()
    }
}

/// A contract that can't be turned into a route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The path template is malformed or duplicates another route.
    #[error("operation `{operation_id}`: {source}")]
    Route {
        /// Operation being registered.
        operation_id: String,
        /// Router failure.
        #[source]
        source: RouterError,
    },

    /// The method string is not a valid HTTP method.
    #[error("operation `{operation_id}`: invalid HTTP method `{method}`")]
    InvalidMethod {
        /// Operation being registered.
        operation_id: String,
        /// The rejected method text.
        method: String,
    },

    /// Path descriptors and template placeholders disagree.
    #[error(
        "operation `{operation_id}`: path parameter `{name}` {problem} in template `{template}`"
    )]
    PathParameterMismatch {
        /// Operation being registered.
        operation_id: String,
        /// The parameter or placeholder name.
        name: String,
        /// What is wrong.
        problem: &'static str,
        /// The path template.
        template: String,
    },

    /// A path parameter was declared optional.
    #[error("operation `{operation_id}`: path parameter `{name}` must be required")]
    OptionalPathParameter {
        /// Operation being registered.
        operation_id: String,
        /// The parameter name.
        name: String,
    },

    /// The same name is declared twice in one location.
    #[error("operation `{operation_id}`: {location} parameter `{name}` declared twice")]
    DuplicateParameter {
        /// Operation being registered.
        operation_id: String,
        /// The parameter name.
        name: String,
        /// Where it was declared.
        location: ParameterLocation,
    },

    /// The style / location / type combination is not supported.
    #[error("operation `{operation_id}`: parameter `{name}`: {reason}")]
    UnsupportedParameter {
        /// Operation being registered.
        operation_id: String,
        /// The parameter name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two operations share an id.
    #[error("operation `{operation_id}` is declared more than once")]
    DuplicateOperation {
        /// The repeated id.
        operation_id: String,
    },

    /// A contract operation has no handler wired to it.
    #[error("operation `{operation_id}` has no handler")]
    MissingHandler {
        /// The unwired operation.
        operation_id: String,
    },

    /// A handler was wired to an id the contract doesn't declare.
    #[error("handler registered for unknown operation `{operation_id}`")]
    UnknownOperation {
        /// The stray id.
        operation_id: String,
    },
}
