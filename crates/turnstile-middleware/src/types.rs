//! Request and response types shared by middleware, handlers and reporters.

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;

/// The HTTP request type: a standard `http::Request` with a buffered body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type: a standard `http::Response` with a buffered body.
pub type Response = http::Response<Full<Bytes>>;

/// Constructors for common response shapes.
pub trait ResponseExt {
    /// A `text/plain` response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;

    /// An `application/json` response from an already-serialized value.
    fn json(status: StatusCode, body: &serde_json::Value) -> Response;

    /// A JSON error envelope: `{"error":{"code","message"}}`.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        with_body(
            status,
            "text/plain; charset=utf-8",
            Bytes::from(body.into()),
        )
    }

    fn json(status: StatusCode, body: &serde_json::Value) -> Response {
        with_body(status, "application/json", Bytes::from(body.to_string()))
    }

    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        Self::json(status, &body)
    }
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
