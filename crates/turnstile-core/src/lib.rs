//! # Turnstile Core
//!
//! Core types shared by every Turnstile crate:
//!
//! - [`Contract`] / [`OperationSpec`] - Declarative API contract
//! - [`ParameterDescriptor`] - Location, style, type and presence of one parameter
//! - [`BoundValue`] / [`BoundParams`] - Typed results of binding
//! - [`RequestContext`] - Per-request state: id, parameters, scopes, cancellation
//! - [`DispatchError`] / [`BindingError`] - Request-time error taxonomy
//! - [`ContractError`] - Registration-time failures

#![doc(html_root_url = "https://docs.rs/turnstile-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod contract;
mod descriptor;
mod error;
mod value;

pub use context::{RequestContext, RequestId, SecurityScopes};
pub use contract::{Contract, OperationSpec, SecurityRequirement};
pub use descriptor::{ParamType, ParameterDescriptor, ParameterLocation, ParameterStyle, ScalarType};
pub use error::{BindingError, ContractError, DispatchError, ErrorKind};
pub use value::{
    BoundParameter, BoundParams, BoundValue, FromBoundParams, FromBoundValue, ParamMismatch,
    UploadedFile,
};

pub use tokio_util::sync::CancellationToken;
