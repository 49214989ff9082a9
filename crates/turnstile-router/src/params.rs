//! Captured path components.
//!
//! Each capture keeps the component exactly as it appeared in the request
//! path next to its percent-decoded text. Style-aware binders split the raw
//! form so that an escaped delimiter such as `%2C` stays inside one item.

use std::borrow::Cow;

use smallvec::SmallVec;

/// Templates rarely carry more than this many placeholders.
const INLINE_PARAMS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Capture {
    name: String,
    raw: String,
    decoded: String,
}

/// Path captures from a route match, in template order.
///
/// # Example
///
/// ```rust
/// use turnstile_router::Params;
///
/// let mut params = Params::new();
/// params.push("accountId", "42");
/// params.push("tags", "a%2Cb,c");
///
/// assert_eq!(params.get("accountId"), Some("42"));
/// assert_eq!(params.get("tags"), Some("a,b,c"));
/// assert_eq!(params.get_raw("tags"), Some("a%2Cb,c"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[Capture; INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for `capacity` captures.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Records the path component `raw` captured under `name`.
    pub fn push(&mut self, name: impl Into<String>, raw: impl Into<String>) {
        let raw = raw.into();
        let decoded = percent_decode(&raw).into_owned();
        self.inner.push(Capture {
            name: name.into(),
            raw,
            decoded,
        });
    }

    /// Decoded value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|c| c.decoded.as_str())
    }

    /// The component under `name` as it appeared in the path.
    #[must_use]
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.find(name).map(|c| c.raw.as_str())
    }

    /// Returns true if `name` was captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `(name, decoded)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|c| (c.name.as_str(), c.decoded.as_str()))
    }

    fn find(&self, name: &str) -> Option<&Capture> {
        self.inner.iter().find(|c| c.name == name)
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, raw) in iter {
            params.push(name, raw);
        }
        params
    }
}

/// Percent-decodes `raw`, falling back to the input unchanged when an
/// escape is malformed or the result is not UTF-8.
#[must_use]
pub fn percent_decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_new() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_params_push_and_get() {
        let mut params = Params::new();
        params.push("accountId", "1");
        params.push("eventId", "2");

        assert_eq!(params.get("accountId"), Some("1"));
        assert_eq!(params.get_raw("eventId"), Some("2"));
        assert_eq!(params.get("file"), None);
        assert!(params.contains("eventId"));
        assert!(!params.contains("file"));
    }

    #[test]
    fn test_raw_and_decoded_forms() {
        let mut params = Params::new();
        params.push("name", "hello%20world");
        params.push("broken", "%FF%FE");

        assert_eq!(params.get("name"), Some("hello world"));
        assert_eq!(params.get_raw("name"), Some("hello%20world"));
        assert_eq!(params.get("broken"), Some("%FF%FE"));
    }

    #[test]
    fn test_params_iter_keeps_order() {
        let mut params = Params::new();
        params.push("eventId", "2");
        params.push("accountId", "1");

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("eventId", "2"), ("accountId", "1")]);

        let names: Vec<_> = (&params).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["eventId", "accountId"]);
    }

    #[test]
    fn test_params_from_iterator() {
        let params: Params = vec![
            ("accountId".to_string(), "1".to_string()),
            ("eventId".to_string(), "a%2Fb".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("eventId"), Some("a/b"));
    }

    #[test]
    fn test_params_spill_past_inline_capacity() {
        let mut params = Params::with_capacity(2);
        for i in 0..10 {
            params.push(format!("p{i}"), format!("v{i}"));
        }
        assert_eq!(params.len(), 10);
        assert_eq!(params.get("p9"), Some("v9"));
    }
}
