//! Cookie binding.
//!
//! Cookies are read from every `Cookie` header on the request. Values are
//! percent-decoded like a query component (`+` is a space); a malformed
//! escape is reported as an unescape failure rather than a format error.

use http::header;
use turnstile_core::{BindingError, BoundValue, ParameterDescriptor};

use crate::style::decode_delimited;

/// Raw `name=value` pairs from all `Cookie` headers, duplicates kept.
///
/// # Example
///
/// ```rust
/// use turnstile_extract::Cookies;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     http::header::COOKIE,
///     HeaderValue::from_static("session=abc123; theme=\"dark\""),
/// );
///
/// let cookies = Cookies::from_headers(&headers);
/// assert_eq!(cookies.get_all("session").collect::<Vec<_>>(), vec!["abc123"]);
/// assert_eq!(cookies.get_all("theme").collect::<Vec<_>>(), vec!["dark"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    pairs: Vec<(String, String)>,
}

impl Cookies {
    /// Parses all `Cookie` headers. Headers that aren't valid UTF-8 are
    /// skipped, as are fragments without `=`.
    #[must_use]
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|fragment| {
                let (name, value) = fragment.trim().split_once('=')?;
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Some((name.trim().to_string(), value.to_string()))
            })
            .collect();
        Self { pairs }
    }

    /// Every raw value sent under `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of parsed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no cookies were sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Decodes `%XX` escapes and `+`, rejecting malformed escapes and
/// non-UTF-8 results.
pub fn unescape_cookie(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

/// A repeated name is accepted only for array and object targets, whose
/// unescaped values are joined with `,` before decoding.
pub(crate) fn bind_cookie(
    d: &ParameterDescriptor,
    cookies: &Cookies,
) -> Result<Option<BoundValue>, BindingError> {
    let values: Vec<&str> = cookies.get_all(d.name()).collect();
    if values.is_empty() {
        return Ok(None);
    }
    if values.len() > 1 && d.ty().is_single_valued() {
        return Err(BindingError::too_many_values(
            d.location(),
            d.name(),
            values.len(),
        ));
    }

    let decoded = values
        .into_iter()
        .map(|raw| unescape_cookie(raw).ok_or_else(|| BindingError::unescape_failure(d.name())))
        .collect::<Result<Vec<_>, _>>()?;
    decode_delimited(d, &decoded.join(",")).map(Some)
}
