//! Parameter descriptors.
//!
//! A [`ParameterDescriptor`] states where a parameter lives in the request,
//! how it is serialized, whether it must be present and what type it is
//! coerced to. Descriptors are fixed once a route is registered.
//!
//! In contract files a descriptor looks like:
//!
//! ```toml
//! name = "eventId"
//! in = "path"
//! type = "integer"
//! required = true
//! ```
//!
//! Arrays name their item type with `items`:
//!
//! ```toml
//! name = "tags"
//! in = "query"
//! type = "array"
//! items = "string"
//! explode = false
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a parameter is read from.
///
/// The declaration order is also the binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// A `{name}` capture in the path template.
    Path,
    /// The URL query string.
    Query,
    /// A request header (name is case-insensitive).
    Header,
    /// A cookie from the `Cookie` header.
    Cookie,
    /// A named part of a `multipart/form-data` body.
    Multipart,
}

impl ParameterLocation {
    /// The style used when a descriptor doesn't name one.
    #[must_use]
    pub const fn default_style(self) -> ParameterStyle {
        match self {
            Self::Path | Self::Header => ParameterStyle::Simple,
            Self::Query | Self::Cookie | Self::Multipart => ParameterStyle::Form,
        }
    }

    /// Styles this location accepts.
    #[must_use]
    pub const fn allowed_styles(self) -> &'static [ParameterStyle] {
        match self {
            Self::Path => &[
                ParameterStyle::Simple,
                ParameterStyle::Label,
                ParameterStyle::Matrix,
            ],
            Self::Query => &[
                ParameterStyle::Form,
                ParameterStyle::SpaceDelimited,
                ParameterStyle::PipeDelimited,
                ParameterStyle::DeepObject,
            ],
            Self::Header => &[ParameterStyle::Simple],
            Self::Cookie | Self::Multipart => &[ParameterStyle::Form],
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Multipart => "multipart",
        })
    }
}

/// OpenAPI serialization style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    /// `a,b,c`
    Simple,
    /// `name=a&name=b` or `name=a,b`
    Form,
    /// `.a.b.c`
    Label,
    /// `;name=a;name=b` or `;name=a,b`
    Matrix,
    /// `name=a%20b%20c`
    SpaceDelimited,
    /// `name=a|b|c`
    PipeDelimited,
    /// `name[key]=value`
    DeepObject,
}

impl fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple => "simple",
            Self::Form => "form",
            Self::Label => "label",
            Self::Matrix => "matrix",
            Self::SpaceDelimited => "spaceDelimited",
            Self::PipeDelimited => "pipeDelimited",
            Self::DeepObject => "deepObject",
        })
    }
}

/// Scalar coercion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Number,
    /// `true` or `false`.
    Boolean,
    /// Any text.
    String,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
        })
    }
}

/// The type a raw parameter value is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// A single scalar.
    Scalar(ScalarType),
    /// A list of scalars.
    Array(ScalarType),
    /// A flat string-to-string map.
    Object,
    /// A JSON document carried in the parameter value.
    Json,
    /// An uploaded file from a multipart body.
    File,
}

impl ParamType {
    /// Shorthand for `Scalar(Integer)`.
    pub const INTEGER: Self = Self::Scalar(ScalarType::Integer);
    /// Shorthand for `Scalar(Number)`.
    pub const NUMBER: Self = Self::Scalar(ScalarType::Number);
    /// Shorthand for `Scalar(Boolean)`.
    pub const BOOLEAN: Self = Self::Scalar(ScalarType::Boolean);
    /// Shorthand for `Scalar(String)`.
    pub const STRING: Self = Self::Scalar(ScalarType::String);

    /// Returns true if at most one raw value may be supplied.
    #[must_use]
    pub const fn is_single_valued(self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Json | Self::File)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => s.fmt(f),
            Self::Array(s) => write!(f, "array<{s}>"),
            Self::Object => f.write_str("object"),
            Self::Json => f.write_str("json"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Declarative description of one operation parameter.
///
/// # Example
///
/// ```
/// use turnstile_core::{ParameterDescriptor, ParameterLocation, ParameterStyle, ParamType};
///
/// let account = ParameterDescriptor::path("accountId", ParamType::INTEGER);
/// assert!(account.is_required());
/// assert_eq!(account.style(), ParameterStyle::Simple);
/// assert!(!account.explode());
///
/// let page = ParameterDescriptor::query("page", ParamType::INTEGER);
/// assert!(!page.is_required());
/// assert_eq!(page.location(), ParameterLocation::Query);
/// assert!(page.explode());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorDef", into = "DescriptorDef")]
pub struct ParameterDescriptor {
    name: String,
    location: ParameterLocation,
    style: ParameterStyle,
    explode: bool,
    required: bool,
    ty: ParamType,
}

impl ParameterDescriptor {
    /// Creates a descriptor with the location's default style.
    ///
    /// Path parameters start out required, everything else optional.
    /// `explode` defaults to true only for the `form` style.
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParameterLocation, ty: ParamType) -> Self {
        let style = location.default_style();
        Self {
            name: name.into(),
            location,
            style,
            explode: style == ParameterStyle::Form,
            required: location == ParameterLocation::Path,
            ty,
        }
    }

    /// A required path parameter.
    #[must_use]
    pub fn path(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ParameterLocation::Path, ty)
    }

    /// An optional query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ParameterLocation::Query, ty)
    }

    /// An optional header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ParameterLocation::Header, ty)
    }

    /// An optional cookie parameter.
    #[must_use]
    pub fn cookie(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ParameterLocation::Cookie, ty)
    }

    /// An optional multipart file field.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Multipart, ParamType::File)
    }

    /// Sets whether the parameter must be present.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the serialization style.
    #[must_use]
    pub fn with_style(mut self, style: ParameterStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the explode flag.
    #[must_use]
    pub fn with_explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    /// Parameter name as it appears on the wire.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the parameter is read from.
    #[must_use]
    pub const fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Serialization style.
    #[must_use]
    pub const fn style(&self) -> ParameterStyle {
        self.style
    }

    /// Explode flag.
    #[must_use]
    pub const fn explode(&self) -> bool {
        self.explode
    }

    /// Whether absence is an error.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Coercion target.
    #[must_use]
    pub const fn ty(&self) -> ParamType {
        self.ty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TypeName {
    Integer,
    Number,
    Boolean,
    String,
    Array,
    Object,
    Json,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorDef {
    name: String,
    #[serde(rename = "in")]
    location: ParameterLocation,
    #[serde(rename = "type")]
    ty: TypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<ScalarType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<ParameterStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
}

impl TryFrom<DescriptorDef> for ParameterDescriptor {
    type Error = String;

    fn try_from(def: DescriptorDef) -> Result<Self, Self::Error> {
        let ty = match (def.ty, def.items) {
            (TypeName::Array, Some(item)) => ParamType::Array(item),
            (TypeName::Array, None) => {
                return Err(format!("array parameter `{}` needs `items`", def.name))
            }
            (_, Some(_)) => {
                return Err(format!(
                    "`items` is only valid on array parameters (`{}`)",
                    def.name
                ))
            }
            (TypeName::Integer, None) => ParamType::INTEGER,
            (TypeName::Number, None) => ParamType::NUMBER,
            (TypeName::Boolean, None) => ParamType::BOOLEAN,
            (TypeName::String, None) => ParamType::STRING,
            (TypeName::Object, None) => ParamType::Object,
            (TypeName::Json, None) => ParamType::Json,
            (TypeName::File, None) => ParamType::File,
        };

        let mut descriptor = Self::new(def.name, def.location, ty);
        if let Some(style) = def.style {
            descriptor.style = style;
            descriptor.explode = style == ParameterStyle::Form;
        }
        if let Some(explode) = def.explode {
            descriptor.explode = explode;
        }
        if let Some(required) = def.required {
            descriptor.required = required;
        }
        Ok(descriptor)
    }
}

impl From<ParameterDescriptor> for DescriptorDef {
    fn from(d: ParameterDescriptor) -> Self {
        let (ty, items) = match d.ty {
            ParamType::Scalar(ScalarType::Integer) => (TypeName::Integer, None),
            ParamType::Scalar(ScalarType::Number) => (TypeName::Number, None),
            ParamType::Scalar(ScalarType::Boolean) => (TypeName::Boolean, None),
            ParamType::Scalar(ScalarType::String) => (TypeName::String, None),
            ParamType::Array(item) => (TypeName::Array, Some(item)),
            ParamType::Object => (TypeName::Object, None),
            ParamType::Json => (TypeName::Json, None),
            ParamType::File => (TypeName::File, None),
        };
        Self {
            name: d.name,
            location: d.location,
            ty,
            items,
            style: Some(d.style),
            explode: Some(d.explode),
            required: Some(d.required),
        }
    }
}
