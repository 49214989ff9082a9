//! Error reporters.
//!
//! Routing and binding failures never reach a handler. The dispatcher hands
//! them to one [`ErrorReporter`], which turns the [`DispatchError`] into the
//! response the client sees. Handler responses never pass through here.

use http::request::Parts;
use http::StatusCode;
use turnstile_core::DispatchError;
use turnstile_middleware::{Response, ResponseExt};

/// Converts routing and binding failures into responses.
pub trait ErrorReporter: Send + Sync + 'static {
    /// Builds the response for `error`, raised while handling the request
    /// described by `parts`.
    fn report(&self, parts: &Parts, error: &DispatchError) -> Response;
}

/// Plain-text reporter: `404` for routing misses, `400` for binding
/// failures, the error message as body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReporter;

impl ErrorReporter for DefaultReporter {
    fn report(&self, _parts: &Parts, error: &DispatchError) -> Response {
        Response::text(error.status_code(), error.to_string())
    }
}

/// JSON envelope reporter.
///
/// ```json
/// {"error":{"code":"INVALID_FORMAT","message":"...","parameter":"accountId","location":"path"}}
/// ```
///
/// `parameter` and `location` are `null` for routing misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorReporter;

impl ErrorReporter for JsonErrorReporter {
    fn report(&self, _parts: &Parts, error: &DispatchError) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": error.error_code(),
                "message": error.to_string(),
                "parameter": error.parameter(),
                "location": error.location().map(|l| l.to_string()),
            }
        });
        Response::json(error.status_code(), &body)
    }
}

/// Reporter backed by a closure.
///
/// # Example
///
/// ```rust
/// use turnstile_server::{reporter_fn, ErrorReporter};
/// use turnstile_middleware::{Response, ResponseExt};
/// use http::StatusCode;
///
/// let reporter = reporter_fn(|_parts, error| {
///     Response::text(StatusCode::UNPROCESSABLE_ENTITY, error.error_code())
/// });
/// # let _ = reporter;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnReporter<F>(F);

/// Wraps a closure as an [`ErrorReporter`].
pub const fn reporter_fn<F>(f: F) -> FnReporter<F>
where
    F: Fn(&Parts, &DispatchError) -> Response + Send + Sync + 'static,
{
    FnReporter(f)
}

impl<F> ErrorReporter for FnReporter<F>
where
    F: Fn(&Parts, &DispatchError) -> Response + Send + Sync + 'static,
{
    fn report(&self, parts: &Parts, error: &DispatchError) -> Response {
        (self.0)(parts, error)
    }
}

/// Response for a request whose handler could not be called because the
/// handler and contract disagree. Not a client error.
pub(crate) fn wiring_failure() -> Response {
    Response::text(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error",
    )
}

/// Response for a request abandoned while binding; the client is gone, so
/// the body is never read.
pub(crate) fn cancelled() -> Response {
    Response::text(
        StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
        "client closed request",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Method;
    use http_body_util::BodyExt;
    use turnstile_core::{BindingError, ParameterLocation};

    fn parts() -> Parts {
        http::Request::builder()
            .method(Method::POST)
            .uri("/accounts/abc/events")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    async fn body(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    fn invalid_account() -> DispatchError {
        BindingError::invalid_format(ParameterLocation::Path, "accountId", "bad digit").into()
    }

    #[tokio::test]
    async fn test_default_reporter_binding_error() {
        let response = DefaultReporter.report(&parts(), &invalid_account());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let text = body(response).await;
        assert!(String::from_utf8_lossy(&text).contains("accountId"));
    }

    #[tokio::test]
    async fn test_default_reporter_not_found() {
        let error = DispatchError::not_found(Method::GET, "/accounts/1/events");
        let response = DefaultReporter.report(&parts(), &error);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body(response).await,
            Bytes::from("no route matches GET /accounts/1/events")
        );
    }

    #[tokio::test]
    async fn test_json_reporter_envelope() {
        let response = JsonErrorReporter.report(&parts(), &invalid_account());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_FORMAT");
        assert_eq!(json["error"]["parameter"], "accountId");
        assert_eq!(json["error"]["location"], "path");
    }

    #[tokio::test]
    async fn test_json_reporter_not_found_has_null_parameter() {
        let error = DispatchError::not_found(Method::GET, "/nope");
        let response = JsonErrorReporter.report(&parts(), &error);
        let json: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(json["error"]["code"], "ROUTE_NOT_FOUND");
        assert!(json["error"]["parameter"].is_null());
    }

    #[test]
    fn test_fn_reporter_sees_parts_and_error() {
        let reporter = reporter_fn(|parts, error| {
            Response::text(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("{} {}", parts.method, error.parameter().unwrap_or("-")),
            )
        });
        let response = reporter.report(&parts(), &invalid_account());
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_cancelled_status() {
        assert_eq!(cancelled().status().as_u16(), 499);
    }
}
