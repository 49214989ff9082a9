//! Path template parsing.
//!
//! Templates use OpenAPI-style `{name}` placeholders, each of which must
//! occupy a whole path component:
//!
//! ```rust
//! use turnstile_router::{PathTemplate, Segment};
//!
//! let template = PathTemplate::parse("/accounts/{accountId}/events").unwrap();
//! assert_eq!(template.param_names().collect::<Vec<_>>(), vec!["accountId"]);
//! assert_eq!(template.segments()[1], Segment::Param("accountId".to_string()));
//! ```

use std::fmt;

use crate::RouterError;

/// One component of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches the component verbatim.
    Literal(String),
    /// Captures exactly one non-empty component under the given name.
    Param(String),
}

/// A parsed path template such as `/accounts/{accountId}/events`.
///
/// Empty components are dropped during parsing, so `/users/` and `/users`
/// produce the same template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTemplate`] when a placeholder is not a
    /// whole component, has an empty name, or when a name repeats.
    pub fn parse(raw: &str) -> Result<Self, RouterError> {
        let mut segments = Vec::new();

        for component in raw.split('/').filter(|s| !s.is_empty()) {
            let segment = if component.starts_with('{') && component.ends_with('}') {
                let name = &component[1..component.len() - 1];
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid(raw, "placeholder name must be non-empty"));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                {
                    return Err(invalid(raw, &format!("placeholder `{name}` appears twice")));
                }
                Segment::Param(name.to_string())
            } else if component.contains(['{', '}']) {
                return Err(invalid(
                    raw,
                    "placeholders must span a whole path component",
                ));
            } else {
                Segment::Literal(component.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Parses `path` after prefixing it with `base`.
    ///
    /// A trailing slash on `base` and a missing leading slash on `path` are
    /// both tolerated.
    ///
    /// # Errors
    ///
    /// Same as [`PathTemplate::parse`].
    pub fn with_base(base: &str, path: &str) -> Result<Self, RouterError> {
        if base.is_empty() {
            return Self::parse(path);
        }
        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Self::parse(&joined)
    }

    /// The template text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of all placeholders in order of appearance.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns true when both templates accept exactly the same paths.
    ///
    /// Placeholder names are ignored: `/a/{x}` and `/a/{y}` share a shape.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn invalid(template: &str, reason: &str) -> RouterError {
    RouterError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals_and_params() {
        let t = PathTemplate::parse("/accounts/{accountId}/events/{eventId}/sendInvitations")
            .unwrap();
        assert_eq!(t.segments().len(), 5);
        assert_eq!(t.segments()[0], Segment::Literal("accounts".into()));
        assert_eq!(t.segments()[3], Segment::Param("eventId".into()));
        assert_eq!(
            t.param_names().collect::<Vec<_>>(),
            vec!["accountId", "eventId"]
        );
    }

    #[test]
    fn test_parse_ignores_empty_components() {
        let a = PathTemplate::parse("/users/").unwrap();
        let b = PathTemplate::parse("users").unwrap();
        assert_eq!(a.segments(), b.segments());
    }

    #[test]
    fn test_parse_root() {
        let t = PathTemplate::parse("/").unwrap();
        assert!(t.segments().is_empty());
    }

    #[test]
    fn test_rejects_partial_placeholder() {
        let err = PathTemplate::parse("/files/{name}.json").unwrap_err();
        assert!(matches!(err, RouterError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_rejects_empty_placeholder() {
        assert!(PathTemplate::parse("/users/{}").is_err());
    }

    #[test]
    fn test_rejects_repeated_placeholder() {
        let err = PathTemplate::parse("/a/{id}/b/{id}").unwrap_err();
        assert!(err.to_string().contains("appears twice"));
    }

    #[test]
    fn test_with_base() {
        let t = PathTemplate::with_base("/api/v1/", "/accounts/{accountId}").unwrap();
        assert_eq!(t.as_str(), "/api/v1/accounts/{accountId}");
        assert_eq!(t.segments().len(), 4);

        let t = PathTemplate::with_base("", "/accounts").unwrap();
        assert_eq!(t.as_str(), "/accounts");
    }

    #[test]
    fn test_same_shape() {
        let a = PathTemplate::parse("/accounts/{accountId}").unwrap();
        let b = PathTemplate::parse("/accounts/{id}").unwrap();
        let c = PathTemplate::parse("/accounts/me").unwrap();
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }
}
