//! Binding outcomes.

use thiserror::Error;
use turnstile_core::BindingError;

/// Why binding stopped before producing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindAbort {
    /// A parameter failed to bind; reported to the client.
    #[error(transparent)]
    Invalid(#[from] BindingError),

    /// The request was cancelled while the body was being read.
    #[error("request cancelled during binding")]
    Cancelled,
}

impl BindAbort {
    /// Returns the binding error, if this isn't a cancellation.
    #[must_use]
    pub fn binding_error(&self) -> Option<&BindingError> {
        match self {
            Self::Invalid(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}
