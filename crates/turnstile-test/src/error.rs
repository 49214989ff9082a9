//! Test error types.

use thiserror::Error;

/// Errors raised while building a test request or reading its response.
#[derive(Debug, Error)]
pub enum TestError {
    /// The URI did not parse.
    #[error("invalid URI `{uri}`: {reason}")]
    InvalidUri {
        /// The URI as given.
        uri: String,
        /// Parser message.
        reason: String,
    },

    /// A header name or value was rejected.
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// A form body could not be encoded.
    #[error("form encoding failed: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body was not UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The request could not be assembled.
    #[error("request build error: {0}")]
    RequestBuild(#[from] http::Error),
}
