//! API contract model.
//!
//! A [`Contract`] lists the operations an API exposes. It is either built
//! in code or deserialized from a TOML/JSON contract file:
//!
//! ```toml
//! [[operations]]
//! operation_id = "CreateEvent"
//! method = "POST"
//! path = "/accounts/{accountId}/events"
//! security = [{ scheme = "bearerAuth", scopes = [] }]
//!
//! [[operations.parameters]]
//! name = "accountId"
//! in = "path"
//! type = "integer"
//! ```

use std::collections::HashSet;

use http::Method;
use serde::{Deserialize, Serialize};
use turnstile_router::PathTemplate;

use crate::{ContractError, ParamType, ParameterDescriptor, ParameterLocation, ParameterStyle};

/// A security scheme an operation requires, with the scopes it needs.
///
/// An empty scope list still marks the scheme as required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityRequirement {
    /// Scheme name, such as `bearerAuth`.
    pub scheme: String,
    /// Scopes required under that scheme.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl SecurityRequirement {
    /// Creates a requirement.
    #[must_use]
    pub fn new(scheme: impl Into<String>, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            scheme: scheme.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }
}

/// One operation of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationSpec {
    /// Unique operation id; handlers are wired by this name.
    pub operation_id: String,
    /// HTTP method, case-sensitive as on the wire.
    pub method: String,
    /// Path template with `{name}` placeholders.
    pub path: String,
    /// Parameter descriptors in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Security requirements.
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
}

impl OperationSpec {
    /// Creates an operation with no parameters or security.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, method: &Method, path: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            method: method.as_str().to_string(),
            path: path.into(),
            parameters: Vec::new(),
            security: Vec::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn param(mut self, descriptor: ParameterDescriptor) -> Self {
        self.parameters.push(descriptor);
        self
    }

    /// Adds a security requirement.
    #[must_use]
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    /// Parses the method string.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidMethod`] for an invalid token.
    pub fn http_method(&self) -> Result<Method, ContractError> {
        Method::from_bytes(self.method.as_bytes()).map_err(|_| ContractError::InvalidMethod {
            operation_id: self.operation_id.clone(),
            method: self.method.clone(),
        })
    }

    /// Checks the descriptors against each other and the path template.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContractError`] found.
    pub fn validate(&self, template: &PathTemplate) -> Result<(), ContractError> {
        let op = &self.operation_id;
        let mut seen = HashSet::new();

        for d in &self.parameters {
            if !seen.insert((d.location(), d.name())) {
                return Err(ContractError::DuplicateParameter {
                    operation_id: op.clone(),
                    name: d.name().to_string(),
                    location: d.location(),
                });
            }
            self.validate_descriptor(d)?;
        }

        for d in self.path_parameters() {
            if !template.param_names().any(|n| n == d.name()) {
                return Err(ContractError::PathParameterMismatch {
                    operation_id: op.clone(),
                    name: d.name().to_string(),
                    problem: "has no placeholder",
                    template: template.to_string(),
                });
            }
            if !d.is_required() {
                return Err(ContractError::OptionalPathParameter {
                    operation_id: op.clone(),
                    name: d.name().to_string(),
                });
            }
        }

        for name in template.param_names() {
            if !self.path_parameters().any(|d| d.name() == name) {
                return Err(ContractError::PathParameterMismatch {
                    operation_id: op.clone(),
                    name: name.to_string(),
                    problem: "has no descriptor",
                    template: template.to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_descriptor(&self, d: &ParameterDescriptor) -> Result<(), ContractError> {
        let unsupported = |reason: String| ContractError::UnsupportedParameter {
            operation_id: self.operation_id.clone(),
            name: d.name().to_string(),
            reason,
        };

        if !d.location().allowed_styles().contains(&d.style()) {
            return Err(unsupported(format!(
                "style `{}` is not allowed in {}",
                d.style(),
                d.location()
            )));
        }

        match (d.location(), d.ty()) {
            (ParameterLocation::Multipart, ParamType::File) => {}
            (ParameterLocation::Multipart, ty) => {
                return Err(unsupported(format!(
                    "multipart fields must be files, not {ty}"
                )))
            }
            (location, ParamType::File) => {
                return Err(unsupported(format!("files cannot be read from {location}")))
            }
            _ => {}
        }

        match (d.style(), d.ty()) {
            (ParameterStyle::DeepObject, ty) if ty != ParamType::Object => Err(unsupported(
                format!("deepObject style needs an object, not {ty}"),
            )),
            (ParameterStyle::SpaceDelimited | ParameterStyle::PipeDelimited, ty)
                if !matches!(ty, ParamType::Array(_)) =>
            {
                Err(unsupported(format!(
                    "{} style needs an array, not {ty}",
                    d.style()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Descriptors in binding order: grouped by location (path, query,
    /// header, cookie, multipart), declaration order within a group.
    #[must_use]
    pub fn binding_order(&self) -> Vec<ParameterDescriptor> {
        let mut ordered = self.parameters.clone();
        ordered.sort_by_key(ParameterDescriptor::location);
        ordered
    }

    fn path_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters
            .iter()
            .filter(|d| d.location() == ParameterLocation::Path)
    }
}

/// The full set of operations an API exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contract {
    /// Operations in registration order.
    #[serde(default)]
    pub operations: Vec<OperationSpec>,
}

impl Contract {
    /// Creates an empty contract.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    #[must_use]
    pub fn operation(mut self, operation: OperationSpec) -> Self {
        self.operations.push(operation);
        self
    }

    /// Looks up an operation by id.
    #[must_use]
    pub fn find(&self, operation_id: &str) -> Option<&OperationSpec> {
        self.operations
            .iter()
            .find(|o| o.operation_id == operation_id)
    }

    /// Operation ids in registration order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|o| o.operation_id.as_str())
    }
}
