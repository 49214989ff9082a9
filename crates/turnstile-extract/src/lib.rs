//! # Turnstile Extract
//!
//! Contract-driven parameter binding for the Turnstile HTTP layer.
//!
//! A [`Binder`] holds the parameter descriptors of one operation and turns
//! a matched request into [`BoundParams`](turnstile_core::BoundParams):
//! typed values keyed by parameter name, ready for a handler.
//!
//! ## Sources
//!
//! | Location | Read from | Styles |
//! |----------|-----------|--------|
//! | path | raw route captures, split before decoding | simple, label, matrix |
//! | query | decoded query pairs | form, spaceDelimited, pipeDelimited, deepObject |
//! | header | every line of the named header | simple |
//! | cookie | every `Cookie` header | form |
//! | multipart | `multipart/form-data` parts | n/a |
//!
//! Binding happens in that order and stops at the first failure, which is
//! returned as a [`BindingError`](turnstile_core::BindingError) wrapped in
//! [`BindAbort::Invalid`].
//!
//! ## Example
//!
//! ```rust
//! use turnstile_extract::{Binder, ExtractionContext, Params};
//! use turnstile_core::{CancellationToken, ErrorKind, ParamType, ParameterDescriptor};
//! use http::{HeaderMap, Method, Uri};
//! use bytes::Bytes;
//!
//! # tokio_test::block_on(async {
//! let binder = Binder::new([ParameterDescriptor::path("accountId", ParamType::INTEGER)]);
//!
//! let mut captures = Params::new();
//! captures.push("accountId", "abc");
//! let ctx = ExtractionContext::new(
//!     Method::POST,
//!     Uri::from_static("/accounts/abc/events"),
//!     HeaderMap::new(),
//!     Bytes::new(),
//!     captures,
//! );
//!
//! let err = binder.bind(&ctx, &CancellationToken::new()).await.unwrap_err();
//! assert_eq!(err.binding_error().unwrap().kind(), ErrorKind::InvalidFormat);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod context;
mod cookie;
mod error;
mod multipart;
mod query;
mod style;

pub use binder::{bind_parameter, Binder};
pub use context::ExtractionContext;
pub use cookie::{unescape_cookie, Cookies};
pub use error::BindAbort;
pub use multipart::{MultipartConfig, DEFAULT_MAX_FIELDS, DEFAULT_MAX_FIELD_SIZE};

// Re-export Params for convenience
pub use turnstile_router::Params;
