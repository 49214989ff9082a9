//! Ordered route table.

use http::Method;

use crate::{Params, PathTemplate, RouteMatch, RouteMatcher, RouterError, Segment};

#[derive(Debug, Clone)]
struct Entry<T> {
    method: Method,
    template: PathTemplate,
    value: T,
}

impl<T> Entry<T> {
    fn match_path(&self, components: &[&str]) -> Option<Params> {
        let segments = self.template.segments();
        if components.len() != segments.len() {
            return None;
        }

        let mut params = Params::with_capacity(segments.len());
        for (segment, actual) in segments.iter().zip(components) {
            match segment {
                Segment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.push(name.as_str(), *actual);
                }
            }
        }
        Some(params)
    }
}

/// Routes requests by exact method and structural path match.
///
/// Routes are tried in registration order and the first match wins, so
/// when `/accounts/me` and `/accounts/{accountId}` are both registered the
/// one inserted first takes the request. Inserting a template with exactly
/// the same shape as an existing one for the same method is rejected since
/// the later route could never be reached.
///
/// # Example
///
/// ```rust
/// use turnstile_router::{PathTemplate, RouteTable};
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// let template = PathTemplate::parse("/accounts/{accountId}/events").unwrap();
/// table.insert(Method::POST, template, "CreateEvent").unwrap();
///
/// let m = table.find(&Method::POST, "/accounts/42/events").unwrap();
/// assert_eq!(*m.value, "CreateEvent");
/// assert_eq!(m.params.get("accountId"), Some("42"));
///
/// assert!(table.find(&Method::GET, "/accounts/42/events").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a route.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateRoute`] if a route with the same
    /// method and template shape is already present.
    pub fn insert(
        &mut self,
        method: Method,
        template: PathTemplate,
        value: T,
    ) -> Result<(), RouterError> {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.method == method && e.template.same_shape(&template))
        {
            return Err(RouterError::DuplicateRoute {
                method,
                template: template.to_string(),
                existing: existing.template.to_string(),
            });
        }

        self.entries.push(Entry {
            method,
            template,
            value,
        });
        Ok(())
    }

    /// Finds the first route matching `method` and `path`.
    ///
    /// `path` must not include the query string.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let components: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.entries
            .iter()
            .filter(|e| e.method == *method)
            .find_map(|e| {
                e.match_path(&components)
                    .map(|params| RouteMatch::new(&e.value, params))
            })
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(method, template, value)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &PathTemplate, &T)> {
        self.entries
            .iter()
            .map(|e| (&e.method, &e.template, &e.value))
    }
}

impl<T: Send + Sync> RouteMatcher<T> for RouteTable<T> {
    fn insert(
        &mut self,
        method: Method,
        template: PathTemplate,
        value: T,
    ) -> Result<(), RouterError> {
        RouteTable::insert(self, method, template, value)
    }

    fn find<'a>(&'a self, method: &Method, path: &str) -> Option<RouteMatch<'a, T>> {
        RouteTable::find(self, method, path)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(routes: &[(Method, &str, &'static str)]) -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        for (method, path, op) in routes {
            table
                .insert(method.clone(), PathTemplate::parse(path).unwrap(), *op)
                .unwrap();
        }
        table
    }

    #[test]
    fn test_empty_table() {
        let t: RouteTable<()> = RouteTable::new();
        assert!(t.is_empty());
        assert!(t.find(&Method::GET, "/").is_none());
    }

    #[test]
    fn test_match_with_params() {
        let t = table(&[(
            Method::POST,
            "/accounts/{accountId}/events/{eventId}/sendInvitations",
            "SendInvitations",
        )]);

        let m = t
            .find(&Method::POST, "/accounts/1/events/2/sendInvitations")
            .unwrap();
        assert_eq!(*m.value, "SendInvitations");
        assert_eq!(m.params.get("accountId"), Some("1"));
        assert_eq!(m.params.get("eventId"), Some("2"));
    }

    #[test]
    fn test_method_must_match_exactly() {
        let t = table(&[(Method::POST, "/accounts/{accountId}/events", "CreateEvent")]);
        assert!(t.find(&Method::GET, "/accounts/1/events").is_none());
        assert!(t.find(&Method::POST, "/accounts/1/events").is_some());
    }

    #[test]
    fn test_segment_count_mismatch() {
        let t = table(&[(Method::GET, "/users/{id}", "getUser")]);
        assert!(t.find(&Method::GET, "/users").is_none());
        assert!(t.find(&Method::GET, "/users/1/extra").is_none());
    }

    #[test]
    fn test_trailing_slash_tolerated() {
        let t = table(&[(Method::GET, "/users", "listUsers")]);
        assert!(t.find(&Method::GET, "/users/").is_some());
        assert!(t.find(&Method::GET, "//users").is_some());
    }

    #[test]
    fn test_root_route() {
        let t = table(&[(Method::GET, "/", "root")]);
        assert_eq!(*t.find(&Method::GET, "/").unwrap().value, "root");
    }

    #[test]
    fn test_first_registered_wins() {
        let t = table(&[
            (Method::GET, "/accounts/me", "me"),
            (Method::GET, "/accounts/{accountId}", "byId"),
        ]);
        assert_eq!(*t.find(&Method::GET, "/accounts/me").unwrap().value, "me");
        assert_eq!(*t.find(&Method::GET, "/accounts/7").unwrap().value, "byId");

        let t = table(&[
            (Method::GET, "/accounts/{accountId}", "byId"),
            (Method::GET, "/accounts/me", "me"),
        ]);
        assert_eq!(*t.find(&Method::GET, "/accounts/me").unwrap().value, "byId");
    }

    #[test]
    fn test_duplicate_shape_rejected() {
        let mut t = table(&[(Method::GET, "/accounts/{accountId}", "a")]);
        let err = t
            .insert(Method::GET, PathTemplate::parse("/accounts/{id}").unwrap(), "b")
            .unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute { .. }));

        // Same shape under another method is fine.
        t.insert(Method::PUT, PathTemplate::parse("/accounts/{id}").unwrap(), "c")
            .unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_captures_are_percent_decoded() {
        let t = table(&[(Method::GET, "/files/{name}", "file")]);
        let m = t.find(&Method::GET, "/files/hello%20world").unwrap();
        assert_eq!(m.params.get("name"), Some("hello world"));
        assert_eq!(m.params.get_raw("name"), Some("hello%20world"));
    }

    #[test]
    fn test_malformed_escape_kept_raw() {
        let t = table(&[(Method::GET, "/files/{name}", "file")]);
        let m = t.find(&Method::GET, "/files/%FF%FE").unwrap();
        assert_eq!(m.params.get("name"), Some("%FF%FE"));
    }

    #[test]
    fn test_iter_in_registration_order() {
        let t = table(&[
            (Method::GET, "/b", "second"),
            (Method::GET, "/a", "first"),
        ]);
        let ops: Vec<_> = t.iter().map(|(_, _, v)| *v).collect();
        assert_eq!(ops, vec!["second", "first"]);
    }
}
