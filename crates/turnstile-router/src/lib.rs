//! Path-template route table for Turnstile.
//!
//! Maps an HTTP method and request path to a registered value (typically a
//! route index) together with the raw path captures.
//!
//! # Features
//!
//! - **Structural matching**: literal components compare verbatim, `{name}`
//!   captures exactly one non-empty component
//! - **Ordered**: first registered match wins for overlapping templates
//! - **Raw and decoded captures**: each capture keeps the path text as sent
//!   alongside its percent-decoded form
//! - **Pluggable**: anything implementing [`RouteMatcher`] can replace the
//!   default [`RouteTable`]
//!
//! # Example
//!
//! ```rust
//! use turnstile_router::{PathTemplate, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table
//!     .insert(
//!         Method::POST,
//!         PathTemplate::parse("/accounts/{accountId}/events/{eventId}/sendInvitations").unwrap(),
//!         2_usize,
//!     )
//!     .unwrap();
//!
//! let m = table
//!     .find(&Method::POST, "/accounts/1/events/2/sendInvitations")
//!     .unwrap();
//! assert_eq!(*m.value, 2);
//! assert_eq!(m.params.get("eventId"), Some("2"));
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod params;
mod table;
mod template;

pub use params::{percent_decode, Params};
pub use table::RouteTable;
pub use template::{PathTemplate, Segment};

use http::Method;

/// Errors raised while building a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// The path template could not be parsed.
    #[error("invalid path template `{template}`: {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A template with the same method and shape is already registered.
    #[error("route {method} {template} duplicates already registered {method} {existing}")]
    DuplicateRoute {
        /// Method of the rejected route.
        method: Method,
        /// Template of the rejected route.
        template: String,
        /// Template of the route already in the table.
        existing: String,
    },
}

/// A matched route with its registered value and path captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered with the route.
    pub value: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}

/// Strategy for resolving a request to a registered route.
///
/// The table is only mutated while the dispatcher is being built; after
/// that it is shared read-only between all in-flight requests.
pub trait RouteMatcher<T>: Send + Sync {
    /// Registers a route.
    ///
    /// # Errors
    ///
    /// Implementations reject routes they cannot distinguish from ones
    /// already registered.
    fn insert(&mut self, method: Method, template: PathTemplate, value: T)
        -> Result<(), RouterError>;

    /// Resolves `method` and `path` (without query string).
    fn find<'a>(&'a self, method: &Method, path: &str) -> Option<RouteMatch<'a, T>>;

    /// Number of registered routes.
    fn len(&self) -> usize;

    /// Returns true if no routes are registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed() -> Box<dyn RouteMatcher<usize>> {
        Box::new(RouteTable::new())
    }

    #[test]
    fn test_matcher_trait_object() {
        let mut matcher = boxed();
        assert!(matcher.is_empty());

        matcher
            .insert(
                Method::POST,
                PathTemplate::parse("/accounts/{accountId}/events").unwrap(),
                0,
            )
            .unwrap();
        matcher
            .insert(
                Method::POST,
                PathTemplate::parse("/accounts/{accountId}/events/{eventId}/participants/upload")
                    .unwrap(),
                1,
            )
            .unwrap();

        let m = matcher
            .find(&Method::POST, "/accounts/1/events/2/participants/upload")
            .unwrap();
        assert_eq!(*m.value, 1);
        assert_eq!(m.params.len(), 2);
        assert_eq!(matcher.len(), 2);
    }

    #[test]
    fn test_route_match_new() {
        let mut params = Params::new();
        params.push("accountId", "42");
        let value = "CreateEvent";
        let m = RouteMatch::new(&value, params);
        assert_eq!(*m.value, "CreateEvent");
        assert_eq!(m.params.get("accountId"), Some("42"));
    }

    #[test]
    fn test_error_display() {
        let err = RouterError::DuplicateRoute {
            method: Method::GET,
            template: "/a/{y}".into(),
            existing: "/a/{x}".into(),
        };
        assert_eq!(
            err.to_string(),
            "route GET /a/{y} duplicates already registered GET /a/{x}"
        );
    }
}
