//! Typed parameter values.
//!
//! The binder turns each satisfied descriptor into a [`BoundValue`] and
//! collects them into [`BoundParams`]. Handlers read them back either
//! dynamically through [`BoundParams::get`] or by declaring a typed tuple
//! that implements [`FromBoundParams`].

use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;

use crate::ParameterLocation;

/// A file received in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    /// Creates a file from its parts.
    #[must_use]
    pub fn new(file_name: Option<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name,
            content_type,
            data,
        }
    }

    /// Client-supplied file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Part content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// File contents.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// File size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for an empty upload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// `integer`
    Integer(i64),
    /// `number`
    Number(f64),
    /// `boolean`
    Boolean(bool),
    /// `string`
    String(String),
    /// `array`; items are all the same scalar variant.
    Array(Vec<BoundValue>),
    /// `object`
    Object(BTreeMap<String, String>),
    /// `json`
    Json(serde_json::Value),
    /// `file`
    File(UploadedFile),
}

impl BoundValue {
    /// Name of the variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Json(_) => "json",
            Self::File(_) => "file",
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the number. Integers widen.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the array items, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[BoundValue]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the object properties, if this is an object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the JSON document, if this is one.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the uploaded file, if this is one.
    #[must_use]
    pub const fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(v) => Some(v),
            _ => None,
        }
    }
}

/// One bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Parameter name.
    pub name: String,
    /// Where it was read from.
    pub location: ParameterLocation,
    /// Coerced value.
    pub value: BoundValue,
}

/// All parameters bound for one request, in binding order.
///
/// Optional parameters that were absent have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    entries: Vec<BoundParameter>,
}

impl BoundParams {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bound value.
    pub fn insert(&mut self, name: impl Into<String>, location: ParameterLocation, value: BoundValue) {
        self.entries.push(BoundParameter {
            name: name.into(),
            location,
            value,
        });
    }

    /// First value bound under `name`, in any location.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    /// Value bound under `name` in a specific location.
    #[must_use]
    pub fn get_in(&self, location: ParameterLocation, name: &str) -> Option<&BoundValue> {
        self.entries
            .iter()
            .find(|e| e.location == location && e.name == name)
            .map(|e| &e.value)
    }

    /// Converts the value bound under `name` to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamMismatch`] if the value is absent (and `T` is not an
    /// `Option`) or holds a different type.
    pub fn extract<T: FromBoundValue>(&self, name: &str) -> Result<T, ParamMismatch> {
        match self.get(name) {
            Some(value) => T::from_bound(value).ok_or_else(|| ParamMismatch::WrongType {
                name: name.to_string(),
                found: value.type_name(),
            }),
            None => T::from_absent().ok_or_else(|| ParamMismatch::Missing {
                name: name.to_string(),
            }),
        }
    }

    /// Returns true if `name` was bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in binding order.
    pub fn iter(&self) -> impl Iterator<Item = &BoundParameter> {
        self.entries.iter()
    }
}

/// A typed read of [`BoundParams`] didn't line up with what was bound.
///
/// This means handler wiring and the contract disagree; it never reflects
/// bad client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamMismatch {
    /// Nothing was bound under the name.
    #[error("parameter `{name}` was not bound")]
    Missing {
        /// Parameter name.
        name: String,
    },
    /// The bound value has another type.
    #[error("parameter `{name}` is bound as {found}")]
    WrongType {
        /// Parameter name.
        name: String,
        /// Variant actually bound.
        found: &'static str,
    },
    /// The number of names differs from the tuple arity.
    #[error("expected {expected} parameter names, got {actual}")]
    Arity {
        /// Tuple arity.
        expected: usize,
        /// Names supplied.
        actual: usize,
    },
}

/// Conversion from a bound value into a Rust type.
pub trait FromBoundValue: Sized {
    /// Converts a present value.
    fn from_bound(value: &BoundValue) -> Option<Self>;

    /// Value to use when the parameter was absent; `None` means "required".
    fn from_absent() -> Option<Self> {
        None
    }
}

impl FromBoundValue for i64 {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_i64()
    }
}

impl FromBoundValue for i32 {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromBoundValue for u64 {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_i64().and_then(|v| u64::try_from(v).ok())
    }
}

impl FromBoundValue for f64 {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromBoundValue for bool {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromBoundValue for String {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromBoundValue for BTreeMap<String, String> {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_object().cloned()
    }
}

impl FromBoundValue for serde_json::Value {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_json().cloned()
    }
}

impl FromBoundValue for UploadedFile {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_file().cloned()
    }
}

impl FromBoundValue for BoundValue {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: FromBoundValue> FromBoundValue for Vec<T> {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        value.as_array()?.iter().map(T::from_bound).collect()
    }
}

impl<T: FromBoundValue> FromBoundValue for Option<T> {
    fn from_bound(value: &BoundValue) -> Option<Self> {
        T::from_bound(value).map(Some)
    }

    fn from_absent() -> Option<Self> {
        Some(None)
    }
}

/// Conversion from a whole parameter set into a typed handler argument.
///
/// Implemented for tuples of [`FromBoundValue`] types; `names` gives the
/// parameter read into each tuple position.
///
/// ```
/// use turnstile_core::{BoundParams, BoundValue, FromBoundParams, ParameterLocation};
///
/// let mut params = BoundParams::new();
/// params.insert("accountId", ParameterLocation::Path, BoundValue::Integer(1));
/// params.insert("eventId", ParameterLocation::Path, BoundValue::Integer(2));
///
/// let (account, event, page): (i64, i64, Option<i64>) =
///     FromBoundParams::from_params(&params, &["accountId", "eventId", "page"]).unwrap();
/// assert_eq!((account, event, page), (1, 2, None));
/// ```
pub trait FromBoundParams: Sized {
    /// Reads `names` out of `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamMismatch`] if the arity or any value's type is off.
    fn from_params(params: &BoundParams, names: &[&str]) -> Result<Self, ParamMismatch>;
}

impl FromBoundParams for () {
    fn from_params(_params: &BoundParams, names: &[&str]) -> Result<Self, ParamMismatch> {
        check_arity(names, 0)
    }
}

fn check_arity(names: &[&str], expected: usize) -> Result<(), ParamMismatch> {
    if names.len() == expected {
        Ok(())
    } else {
        Err(ParamMismatch::Arity {
            expected,
            actual: names.len(),
        })
    }
}

macro_rules! impl_from_bound_params {
    ($len:literal; $($ty:ident => $idx:tt),+) => {
        impl<$($ty: FromBoundValue),+> FromBoundParams for ($($ty,)+) {
            fn from_params(params: &BoundParams, names: &[&str]) -> Result<Self, ParamMismatch> {
                check_arity(names, $len)?;
                Ok(($(params.extract::<$ty>(names[$idx])?,)+))
            }
        }
    };
}

impl_from_bound_params!(1; A => 0);
impl_from_bound_params!(2; A => 0, B => 1);
impl_from_bound_params!(3; A => 0, B => 1, C => 2);
impl_from_bound_params!(4; A => 0, B => 1, C => 2, D => 3);
impl_from_bound_params!(5; A => 0, B => 1, C => 2, D => 3, E => 4);
impl_from_bound_params!(6; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BoundParams {
        let mut params = BoundParams::new();
        params.insert("accountId", ParameterLocation::Path, BoundValue::Integer(42));
        params.insert(
            "tags",
            ParameterLocation::Query,
            BoundValue::Array(vec![
                BoundValue::String("a".into()),
                BoundValue::String("b".into()),
            ]),
        );
        params.insert(
            "file",
            ParameterLocation::Multipart,
            BoundValue::File(UploadedFile::new(
                Some("guests.csv".into()),
                Some("text/csv".into()),
                Bytes::from_static(b"name\nada\n"),
            )),
        );
        params
    }

    #[test]
    fn test_get_and_get_in() {
        let params = sample();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("accountId"), Some(&BoundValue::Integer(42)));
        assert!(params.get_in(ParameterLocation::Query, "accountId").is_none());
        assert!(params.contains("tags"));
        assert!(!params.contains("page"));
    }

    #[test]
    fn test_extract_scalars_and_arrays() {
        let params = sample();
        assert_eq!(params.extract::<i64>("accountId"), Ok(42));
        assert_eq!(params.extract::<i32>("accountId"), Ok(42));
        assert_eq!(params.extract::<f64>("accountId"), Ok(42.0));
        assert_eq!(
            params.extract::<Vec<String>>("tags"),
            Ok(vec!["a".to_string(), "b".to_string()])
        );
        let file = params.extract::<UploadedFile>("file").unwrap();
        assert_eq!(file.file_name(), Some("guests.csv"));
        assert_eq!(file.len(), 9);
    }

    #[test]
    fn test_extract_missing_and_optional() {
        let params = sample();
        assert_eq!(
            params.extract::<i64>("page"),
            Err(ParamMismatch::Missing {
                name: "page".into()
            })
        );
        assert_eq!(params.extract::<Option<i64>>("page"), Ok(None));
        assert_eq!(params.extract::<Option<i64>>("accountId"), Ok(Some(42)));
    }

    #[test]
    fn test_extract_wrong_type() {
        let params = sample();
        assert_eq!(
            params.extract::<String>("accountId"),
            Err(ParamMismatch::WrongType {
                name: "accountId".into(),
                found: "integer"
            })
        );
    }

    #[test]
    fn test_tuple_from_params() {
        let params = sample();
        let (account,): (i64,) = FromBoundParams::from_params(&params, &["accountId"]).unwrap();
        assert_eq!(account, 42);

        let (account, file): (i64, Option<UploadedFile>) =
            FromBoundParams::from_params(&params, &["accountId", "file"]).unwrap();
        assert_eq!(account, 42);
        assert!(file.is_some());
    }

    #[test]
    fn test_tuple_arity_mismatch() {
        let params = sample();
        let err = <(i64, i64)>::from_params(&params, &["accountId"]).unwrap_err();
        assert_eq!(
            err,
            ParamMismatch::Arity {
                expected: 2,
                actual: 1
            }
        );
        assert!(<()>::from_params(&params, &[]).is_ok());
    }

    #[test]
    fn test_u64_rejects_negative() {
        let mut params = BoundParams::new();
        params.insert("offset", ParameterLocation::Query, BoundValue::Integer(-1));
        assert!(params.extract::<u64>("offset").is_err());
    }
}
