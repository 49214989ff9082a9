//! Query string binding.
//!
//! Handles the forms that span several query pairs: exploded arrays
//! (`tag=a&tag=b`), exploded objects (`role=admin&team=ops`) and
//! `deepObject` (`filter[role]=admin`). Everything else is a single value
//! decoded by [`crate::style`].

use std::collections::BTreeMap;

use turnstile_core::{
    BindingError, BoundValue, ParamType, ParameterDescriptor, ParameterStyle,
};

use crate::style::{coerce_items, decode_delimited};
use crate::ExtractionContext;

/// Binds one query descriptor.
///
/// `claimed` holds the names of every query descriptor on the route; an
/// exploded form object collects only the keys nobody else claims.
pub(crate) fn bind_query(
    d: &ParameterDescriptor,
    ctx: &ExtractionContext,
    claimed: &[&str],
) -> Result<Option<BoundValue>, BindingError> {
    let pairs = ctx
        .query_pairs()
        .map_err(|e| BindingError::invalid_format(d.location(), d.name(), e))?;
    let name = d.name();

    match (d.style(), d.ty()) {
        (ParameterStyle::DeepObject, _) => collect_properties(
            d,
            pairs
                .iter()
                .filter_map(|(k, v)| deep_object_key(name, k).map(|p| (p, v.as_str()))),
        ),

        (ParameterStyle::Form, ParamType::Object) if d.explode() => collect_properties(
            d,
            pairs
                .iter()
                .filter(|(k, _)| !claimed.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v.as_str())),
        ),

        (_, ParamType::Array(ty)) if d.explode() => {
            let values: Vec<&str> = ctx.query_values(name).collect();
            if values.is_empty() {
                return Ok(None);
            }
            coerce_items(d, ty, values).map(Some)
        }

        _ => {
            let values: Vec<&str> = ctx.query_values(name).collect();
            match values.as_slice() {
                [] => Ok(None),
                [raw] => decode_delimited(d, raw).map(Some),
                many => Err(BindingError::too_many_values(
                    d.location(),
                    name,
                    many.len(),
                )),
            }
        }
    }
}

/// Gathers object properties; a property sent twice is ambiguous and
/// rejected with the number of values seen for it.
fn collect_properties<'a>(
    d: &ParameterDescriptor,
    props: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<Option<BoundValue>, BindingError> {
    let mut seen: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (prop, value) in props {
        seen.entry(prop.to_string()).or_default().push(value);
    }

    if let Some(values) = seen.values().find(|values| values.len() > 1) {
        return Err(BindingError::too_many_values(
            d.location(),
            d.name(),
            values.len(),
        ));
    }

    let object: BTreeMap<String, String> = seen
        .into_iter()
        .filter_map(|(prop, values)| values.first().map(|v| (prop, (*v).to_string())))
        .collect();
    Ok((!object.is_empty()).then_some(BoundValue::Object(object)))
}

/// Returns `prop` for a key of the form `name[prop]`.
fn deep_object_key<'a>(name: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(name)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|p| !p.is_empty() && !p.contains(['[', ']']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, Method, Uri};
    use turnstile_core::{ErrorKind, ScalarType};
    use turnstile_router::Params;

    fn ctx(uri: &str) -> ExtractionContext {
        ExtractionContext::new(
            Method::GET,
            uri.parse::<Uri>().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
            Params::new(),
        )
    }

    fn bind(d: &ParameterDescriptor, uri: &str) -> Result<Option<BoundValue>, BindingError> {
        bind_query(d, &ctx(uri), &[d.name()])
    }

    fn ints(items: &[i64]) -> BoundValue {
        BoundValue::Array(items.iter().copied().map(BoundValue::Integer).collect())
    }

    #[test]
    fn test_scalar_absent_and_present() {
        let d = ParameterDescriptor::query("page", ParamType::INTEGER);
        assert_eq!(bind(&d, "/e").unwrap(), None);
        assert_eq!(bind(&d, "/e?page=3").unwrap(), Some(BoundValue::Integer(3)));
    }

    #[test]
    fn test_scalar_repeated_is_too_many_values() {
        let d = ParameterDescriptor::query("page", ParamType::INTEGER);
        let err = bind(&d, "/e?page=1&page=2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyValues);
        assert_eq!(err.count(), 2);
    }

    #[test]
    fn test_exploded_array_from_repeated_keys() {
        let d = ParameterDescriptor::query("id", ParamType::Array(ScalarType::Integer));
        assert_eq!(bind(&d, "/e?id=3&id=4").unwrap(), Some(ints(&[3, 4])));
        assert_eq!(bind(&d, "/e?id=3,4").unwrap_err().kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_non_exploded_array_comma_separated() {
        let d = ParameterDescriptor::query("id", ParamType::Array(ScalarType::Integer))
            .with_explode(false);
        assert_eq!(bind(&d, "/e?id=3,4,5").unwrap(), Some(ints(&[3, 4, 5])));
        assert_eq!(
            bind(&d, "/e?id=3&id=4").unwrap_err().kind(),
            ErrorKind::TooManyValues
        );
    }

    #[test]
    fn test_pipe_delimited_array() {
        let d = ParameterDescriptor::query("id", ParamType::Array(ScalarType::Integer))
            .with_style(ParameterStyle::PipeDelimited)
            .with_explode(false);
        assert_eq!(bind(&d, "/e?id=3%7C4").unwrap(), Some(ints(&[3, 4])));
    }

    #[test]
    fn test_deep_object() {
        let d = ParameterDescriptor::query("filter", ParamType::Object)
            .with_style(ParameterStyle::DeepObject);
        let v = bind(&d, "/e?filter%5Brole%5D=admin&filter%5Bteam%5D=ops&other=1")
            .unwrap()
            .unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["role"], "admin");
        assert_eq!(obj["team"], "ops");

        assert_eq!(bind(&d, "/e?other=1").unwrap(), None);
    }

    #[test]
    fn test_deep_object_repeated_property_is_too_many_values() {
        let d = ParameterDescriptor::query("filter", ParamType::Object)
            .with_style(ParameterStyle::DeepObject);
        let err = bind(&d, "/e?filter%5Brole%5D=a&filter%5Bteam%5D=ops&filter%5Brole%5D=b")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyValues);
        assert_eq!(err.parameter(), "filter");
        assert_eq!(err.count(), 2);
    }

    #[test]
    fn test_exploded_form_object_repeated_property_is_too_many_values() {
        let d = ParameterDescriptor::query("color", ParamType::Object);
        let err = bind_query(&d, &ctx("/e?R=1&G=2&R=3"), &["color"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyValues);
    }

    #[test]
    fn test_repeated_json_value_is_too_many_values() {
        let d = ParameterDescriptor::query("q", ParamType::Json);
        let err = bind(&d, "/e?q=1&q=2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyValues);
        assert_eq!(err.count(), 2);
    }

    #[test]
    fn test_exploded_form_object_skips_claimed_keys() {
        let d = ParameterDescriptor::query("color", ParamType::Object);
        let v = bind_query(&d, &ctx("/e?R=100&G=200&page=2"), &["color", "page"])
            .unwrap()
            .unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["G"], "200");
    }

    #[test]
    fn test_json_in_query() {
        let d = ParameterDescriptor::query("q", ParamType::Json);
        let v = bind(&d, "/e?q=%7B%22a%22%3A1%7D").unwrap().unwrap();
        assert_eq!(v, BoundValue::Json(serde_json::json!({"a": 1})));

        let err = bind(&d, "/e?q=%7B").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmarshalFailure);
    }

    #[test]
    fn test_deep_object_key() {
        assert_eq!(deep_object_key("f", "f[a]"), Some("a"));
        assert_eq!(deep_object_key("f", "f[]"), None);
        assert_eq!(deep_object_key("f", "fx[a]"), None);
        assert_eq!(deep_object_key("f", "f[a][b]"), None);
    }
}
