//! Extraction context providing access to request data.
//!
//! The [`ExtractionContext`] is the raw source the binder reads from:
//! path captures from the route match, the decoded query string, headers
//! and the buffered body.

use bytes::Bytes;
use http::{request::Parts, HeaderMap, Method, Uri};
use turnstile_router::Params;

/// Context providing access to all parts of an HTTP request.
///
/// The query string is decoded once on construction.
///
/// # Example
///
/// ```rust
/// use turnstile_extract::ExtractionContext;
/// use turnstile_router::Params;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = Params::new();
/// params.push("accountId", "42");
///
/// let ctx = ExtractionContext::new(
///     Method::POST,
///     Uri::from_static("/accounts/42/events?tag=a&tag=b"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path_params().get("accountId"), Some("42"));
/// assert_eq!(ctx.query_values("tag").collect::<Vec<_>>(), vec!["a", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    query: Result<Vec<(String, String)>, String>,
}

impl ExtractionContext {
    /// Creates a new extraction context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: Params,
    ) -> Self {
        let query = uri
            .query()
            .map_or_else(
                || Ok(Vec::new()),
                serde_urlencoded::from_str::<Vec<(String, String)>>,
            )
            .map_err(|e| e.to_string());

        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            query,
        }
    }

    /// Creates a context from request parts.
    #[must_use]
    pub fn from_parts(parts: &Parts, body: Bytes, path_params: Params) -> Self {
        Self::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
            body,
            path_params,
        )
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body as bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Decoded query pairs in order, or the parse error.
    pub(crate) fn query_pairs(&self) -> Result<&[(String, String)], &str> {
        self.query.as_deref().map_err(String::as_str)
    }

    /// All values for query key `name`, in order.
    pub fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(uri: &'static str) -> ExtractionContext {
        ExtractionContext::new(
            Method::GET,
            Uri::from_static(uri),
            HeaderMap::new(),
            Bytes::new(),
            Params::new(),
        )
    }

    #[test]
    fn test_query_decoded_once() {
        let c = ctx("/events?name=Spring%20Gala&tag=a+b&tag=c");
        assert_eq!(c.query_values("name").collect::<Vec<_>>(), vec!["Spring Gala"]);
        assert_eq!(c.query_values("tag").collect::<Vec<_>>(), vec!["a b", "c"]);
        assert_eq!(c.query_values("missing").count(), 0);
    }

    #[test]
    fn test_no_query() {
        let c = ctx("/events");
        assert_eq!(c.query_pairs().unwrap().len(), 0);
        assert_eq!(c.path(), "/events");
    }

    #[test]
    fn test_query_pairs_in_order() {
        let c = ctx("/events?b=2&a=1&b=3");
        let pairs: Result<Vec<(&str, &str)>, &str> = c
            .query_pairs()
            .map(|pairs| pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect());
        assert_eq!(pairs, Ok(vec![("b", "2"), ("a", "1"), ("b", "3")]));
    }

    #[test]
    fn test_from_parts() {
        let (parts, ()) = http::Request::builder()
            .method(Method::POST)
            .uri("/accounts/1/events?x=1")
            .header("x-tenant", "acme")
            .body(())
            .unwrap()
            .into_parts();
        let mut params = Params::new();
        params.push("accountId", "1");

        let c = ExtractionContext::from_parts(&parts, Bytes::from_static(b"{}"), params);
        assert_eq!(c.method(), &Method::POST);
        assert_eq!(c.headers()["x-tenant"], "acme");
        assert_eq!(c.body().as_ref(), b"{}");
        assert_eq!(c.query_values("x").next(), Some("1"));
        assert_eq!(c.uri().path(), "/accounts/1/events");
    }
}
