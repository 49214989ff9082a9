//! Style-aware decoding and scalar coercion.
//!
//! Everything here works on a single raw string: a path capture, a header
//! line, a cookie value or a non-exploded query value. Exploded query
//! forms are handled in [`crate::query`].
//!
//! Path captures arrive still percent-encoded and are split on their
//! delimiters before each item is decoded. Every other source is decoded
//! by the time it gets here.

use std::borrow::Cow;
use std::collections::BTreeMap;

use turnstile_core::{
    BindingError, BoundValue, ParamType, ParameterDescriptor, ParameterStyle, ScalarType,
};
use turnstile_router::percent_decode;

/// Coerces one raw scalar.
pub(crate) fn coerce_scalar(
    d: &ParameterDescriptor,
    ty: ScalarType,
    raw: &str,
) -> Result<BoundValue, BindingError> {
    let invalid = |detail: String| BindingError::invalid_format(d.location(), d.name(), detail);

    match ty {
        ScalarType::Integer => raw
            .parse::<i64>()
            .map(BoundValue::Integer)
            .map_err(|e| invalid(format!("cannot parse {raw:?} as integer: {e}"))),
        ScalarType::Number => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(BoundValue::Number(v)),
            Ok(_) => Err(invalid(format!("{raw:?} is not a finite number"))),
            Err(e) => Err(invalid(format!("cannot parse {raw:?} as number: {e}"))),
        },
        ScalarType::Boolean => parse_bool(raw)
            .map(BoundValue::Boolean)
            .ok_or_else(|| invalid(format!("cannot parse {raw:?} as boolean"))),
        ScalarType::String => Ok(BoundValue::String(raw.to_string())),
    }
}

/// Accepts the usual spellings: `1`, `t`, `true` and their opposites.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Coerces each item into an array.
pub(crate) fn coerce_items<I>(
    d: &ParameterDescriptor,
    ty: ScalarType,
    items: I,
) -> Result<BoundValue, BindingError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| coerce_scalar(d, ty, item.as_ref()))
        .collect::<Result<Vec<_>, _>>()
        .map(BoundValue::Array)
}

/// Decodes a JSON-typed value.
pub(crate) fn coerce_json(d: &ParameterDescriptor, raw: &str) -> Result<BoundValue, BindingError> {
    serde_json::from_str(raw)
        .map(BoundValue::Json)
        .map_err(|e| BindingError::unmarshal_failure(d.location(), d.name(), e.to_string()))
}

/// Builds an object from `k,v,k2,v2` items.
fn object_from_flat<I>(
    d: &ParameterDescriptor,
    items: I,
) -> Result<BoundValue, BindingError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let items: Vec<I::Item> = items.into_iter().collect();
    if items.len() % 2 != 0 {
        return Err(BindingError::invalid_format(
            d.location(),
            d.name(),
            format!("expected key,value pairs, got {} items", items.len()),
        ));
    }
    Ok(BoundValue::Object(
        items
            .chunks_exact(2)
            .map(|kv| (kv[0].as_ref().to_string(), kv[1].as_ref().to_string()))
            .collect(),
    ))
}

/// Builds an object from `k=v` items, unescaping each side after the split.
fn object_from_assignments<'a>(
    d: &ParameterDescriptor,
    items: impl IntoIterator<Item = &'a str>,
    escapes: Escapes,
) -> Result<BoundValue, BindingError> {
    let mut map = BTreeMap::new();
    for item in items {
        let (k, v) = item.split_once('=').ok_or_else(|| {
            BindingError::invalid_format(
                d.location(),
                d.name(),
                format!("expected key=value, got {item:?}"),
            )
        })?;
        map.insert(escapes.apply(k).into_owned(), escapes.apply(v).into_owned());
    }
    Ok(BoundValue::Object(map))
}

fn split_nonempty(raw: &str, sep: char) -> Vec<&str> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(sep).collect()
    }
}

/// Whether delimiters are found before or after percent-decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escapes {
    /// The input is already decoded text.
    Decoded,
    /// The input is a raw path component; items are decoded after splitting
    /// so an escaped delimiter stays part of its item.
    Percent,
}

impl Escapes {
    fn apply(self, item: &str) -> Cow<'_, str> {
        match self {
            Self::Decoded => Cow::Borrowed(item),
            Self::Percent => percent_decode(item),
        }
    }
}

/// Decodes one already-unescaped string according to the descriptor's
/// style and type.
pub(crate) fn decode_delimited(
    d: &ParameterDescriptor,
    raw: &str,
) -> Result<BoundValue, BindingError> {
    decode_styled(d, raw, Escapes::Decoded)
}

/// Decodes a raw path component, splitting before percent-decoding.
pub(crate) fn decode_path_component(
    d: &ParameterDescriptor,
    raw: &str,
) -> Result<BoundValue, BindingError> {
    decode_styled(d, raw, Escapes::Percent)
}

fn decode_styled(
    d: &ParameterDescriptor,
    raw: &str,
    escapes: Escapes,
) -> Result<BoundValue, BindingError> {
    let invalid = |detail: String| BindingError::invalid_format(d.location(), d.name(), detail);
    let name = d.name();
    let explode = d.explode();

    match d.style() {
        ParameterStyle::Simple | ParameterStyle::Form => decode_body(d, raw, ',', explode, escapes),

        ParameterStyle::Label => {
            let rest = raw
                .strip_prefix('.')
                .ok_or_else(|| invalid(format!("label value {raw:?} must start with '.'")))?;
            let sep = if explode { '.' } else { ',' };
            decode_body(d, rest, sep, explode, escapes)
        }

        ParameterStyle::Matrix => {
            let named = format!(";{name}=");
            match d.ty() {
                ParamType::Array(ty) if explode => {
                    let items = raw
                        .strip_prefix(';')
                        .ok_or_else(|| invalid(format!("matrix value {raw:?} must start with ';'")))?
                        .split(';')
                        .map(|item| {
                            item.strip_prefix(&named[1..])
                                .map(|v| escapes.apply(v))
                                .ok_or_else(|| {
                                    invalid(format!("matrix item {item:?} must be {name}=value"))
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    coerce_items(d, ty, items)
                }
                ParamType::Object if explode => {
                    let rest = raw.strip_prefix(';').ok_or_else(|| {
                        invalid(format!("matrix value {raw:?} must start with ';'"))
                    })?;
                    object_from_assignments(d, split_nonempty(rest, ';'), escapes)
                }
                _ => {
                    let rest = raw.strip_prefix(named.as_str()).ok_or_else(|| {
                        invalid(format!("matrix value {raw:?} must start with {named:?}"))
                    })?;
                    decode_body(d, rest, ',', false, escapes)
                }
            }
        }

        ParameterStyle::SpaceDelimited => decode_body(d, raw, ' ', false, escapes),
        ParameterStyle::PipeDelimited => decode_body(d, raw, '|', false, escapes),

        ParameterStyle::DeepObject => Err(invalid(
            "deepObject values are only read from the query string".to_string(),
        )),
    }
}

/// Decodes a prefix-free body with a known separator.
fn decode_body(
    d: &ParameterDescriptor,
    raw: &str,
    sep: char,
    explode: bool,
    escapes: Escapes,
) -> Result<BoundValue, BindingError> {
    let items = move || split_nonempty(raw, sep).into_iter().map(move |item| escapes.apply(item));
    match d.ty() {
        ParamType::Scalar(ty) => coerce_scalar(d, ty, &escapes.apply(raw)),
        ParamType::Array(ty) => coerce_items(d, ty, items()),
        ParamType::Object if explode => {
            object_from_assignments(d, split_nonempty(raw, sep), escapes)
        }
        ParamType::Object => object_from_flat(d, items()),
        ParamType::Json => coerce_json(d, &escapes.apply(raw)),
        ParamType::File => Err(BindingError::invalid_format(
            d.location(),
            d.name(),
            "files are only read from multipart bodies",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::{ErrorKind, ParameterLocation};

    fn path(name: &str, ty: ParamType) -> ParameterDescriptor {
        ParameterDescriptor::path(name, ty)
    }

    fn strings(items: &[&str]) -> BoundValue {
        BoundValue::Array(
            items
                .iter()
                .map(|s| BoundValue::String((*s).to_string()))
                .collect(),
        )
    }

    fn object(pairs: &[(&str, &str)]) -> BoundValue {
        BoundValue::Object(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_integer_coercion() {
        let d = path("accountId", ParamType::INTEGER);
        assert_eq!(decode_delimited(&d, "42").unwrap(), BoundValue::Integer(42));
        assert_eq!(decode_delimited(&d, "-7").unwrap(), BoundValue::Integer(-7));

        let err = decode_delimited(&d, "abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert_eq!(err.parameter(), "accountId");
        assert_eq!(err.location(), ParameterLocation::Path);
    }

    #[test]
    fn test_integer_overflow_is_invalid() {
        let d = path("accountId", ParamType::INTEGER);
        assert!(decode_delimited(&d, "99999999999999999999").is_err());
    }

    #[test]
    fn test_number_coercion() {
        let d = ParameterDescriptor::query("lat", ParamType::NUMBER);
        assert_eq!(decode_delimited(&d, "1.5").unwrap(), BoundValue::Number(1.5));
        assert!(decode_delimited(&d, "NaN").is_err());
        assert!(decode_delimited(&d, "inf").is_err());
    }

    #[test]
    fn test_boolean_coercion() {
        let d = ParameterDescriptor::query("draft", ParamType::BOOLEAN);
        for raw in ["true", "1", "T", "True"] {
            assert_eq!(decode_delimited(&d, raw).unwrap(), BoundValue::Boolean(true));
        }
        for raw in ["false", "0", "F", "FALSE"] {
            assert_eq!(decode_delimited(&d, raw).unwrap(), BoundValue::Boolean(false));
        }
        assert!(decode_delimited(&d, "yes").is_err());
    }

    #[test]
    fn test_simple_array() {
        let d = path("ids", ParamType::Array(ScalarType::Integer));
        assert_eq!(
            decode_delimited(&d, "3,4,5").unwrap(),
            BoundValue::Array(vec![
                BoundValue::Integer(3),
                BoundValue::Integer(4),
                BoundValue::Integer(5)
            ])
        );
        assert_eq!(decode_delimited(&d, "").unwrap(), BoundValue::Array(vec![]));
        assert!(decode_delimited(&d, "3,x").is_err());
    }

    #[test]
    fn test_simple_object() {
        let d = path("color", ParamType::Object);
        assert_eq!(
            decode_delimited(&d, "R,100,G,200").unwrap(),
            object(&[("R", "100"), ("G", "200")])
        );
        assert!(decode_delimited(&d, "R,100,G").is_err());

        let d = d.with_explode(true);
        assert_eq!(
            decode_delimited(&d, "R=100,G=200").unwrap(),
            object(&[("R", "100"), ("G", "200")])
        );
        assert!(decode_delimited(&d, "R=100,G").is_err());
    }

    #[test]
    fn test_label_style() {
        let d = path("id", ParamType::STRING).with_style(ParameterStyle::Label);
        assert_eq!(
            decode_delimited(&d, ".5").unwrap(),
            BoundValue::String("5".into())
        );
        assert!(decode_delimited(&d, "5").is_err());

        let d = path("ids", ParamType::Array(ScalarType::String)).with_style(ParameterStyle::Label);
        assert_eq!(decode_delimited(&d, ".a,b").unwrap(), strings(&["a", "b"]));
        let d = d.with_explode(true);
        assert_eq!(decode_delimited(&d, ".a.b").unwrap(), strings(&["a", "b"]));
    }

    #[test]
    fn test_matrix_style() {
        let d = path("id", ParamType::INTEGER).with_style(ParameterStyle::Matrix);
        assert_eq!(decode_delimited(&d, ";id=5").unwrap(), BoundValue::Integer(5));
        assert!(decode_delimited(&d, ";other=5").is_err());

        let d = path("ids", ParamType::Array(ScalarType::String)).with_style(ParameterStyle::Matrix);
        assert_eq!(decode_delimited(&d, ";ids=a,b").unwrap(), strings(&["a", "b"]));
        let d = d.with_explode(true);
        assert_eq!(
            decode_delimited(&d, ";ids=a;ids=b").unwrap(),
            strings(&["a", "b"])
        );
        assert!(decode_delimited(&d, ";ids=a;x=b").is_err());

        let d = path("color", ParamType::Object)
            .with_style(ParameterStyle::Matrix)
            .with_explode(true);
        assert_eq!(
            decode_delimited(&d, ";R=1;G=2").unwrap(),
            object(&[("R", "1"), ("G", "2")])
        );
    }

    #[test]
    fn test_delimited_styles() {
        let d = ParameterDescriptor::query("tags", ParamType::Array(ScalarType::String))
            .with_style(ParameterStyle::SpaceDelimited);
        assert_eq!(decode_delimited(&d, "a b").unwrap(), strings(&["a", "b"]));

        let d = d.with_style(ParameterStyle::PipeDelimited);
        assert_eq!(decode_delimited(&d, "a|b").unwrap(), strings(&["a", "b"]));
    }

    #[test]
    fn test_path_component_split_before_decoding() {
        let d = path("names", ParamType::Array(ScalarType::String));
        assert_eq!(
            decode_path_component(&d, "a%2Cb,c%20d").unwrap(),
            strings(&["a,b", "c d"])
        );
        // Already-decoded input splits on the comma.
        assert_eq!(decode_delimited(&d, "a,b,c d").unwrap(), strings(&["a", "b", "c d"]));

        let d = path("tag", ParamType::STRING);
        assert_eq!(
            decode_path_component(&d, "a%2Cb").unwrap(),
            BoundValue::String("a,b".into())
        );
    }

    #[test]
    fn test_path_component_objects_and_matrix() {
        let d = path("color", ParamType::Object);
        assert_eq!(
            decode_path_component(&d, "R,1%2C2,G,3").unwrap(),
            object(&[("R", "1,2"), ("G", "3")])
        );

        let d = d.with_explode(true);
        assert_eq!(
            decode_path_component(&d, "R=a%3Db,G=3").unwrap(),
            object(&[("R", "a=b"), ("G", "3")])
        );

        let d = path("ids", ParamType::Array(ScalarType::String))
            .with_style(ParameterStyle::Matrix)
            .with_explode(true);
        assert_eq!(
            decode_path_component(&d, ";ids=a%3Bb;ids=c").unwrap(),
            strings(&["a;b", "c"])
        );
    }

    #[test]
    fn test_json_unmarshal_failure() {
        let d = ParameterDescriptor::query("filter", ParamType::Json);
        assert_eq!(
            decode_delimited(&d, r#"{"a":1}"#).unwrap(),
            BoundValue::Json(serde_json::json!({"a": 1}))
        );
        let err = decode_delimited(&d, "{").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmarshalFailure);
        assert!(err.to_string().starts_with("Error unmarshaling parameter filter as JSON"));
    }
}
