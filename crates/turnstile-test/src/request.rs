//! Test request building.

use bytes::{BufMut, Bytes, BytesMut};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use http_body_util::Full;
use serde::Serialize;
use turnstile_middleware::Request;

use crate::error::TestError;

/// Boundary used for multipart bodies built by [`TestRequestBuilder`].
pub const MULTIPART_BOUNDARY: &str = "turnstile-test-boundary";

/// A fully built request, ready to hand to a dispatcher.
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI, query string included
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl TestRequest {
    /// Starts a GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Converts into the request type the dispatcher accepts.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::RequestBuild`] if `http` rejects the parts.
    pub fn into_http_request(self) -> Result<Request, TestError> {
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(Full::new(self.body))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

#[derive(Debug, Clone)]
enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        data: Bytes,
    },
}

#[derive(Debug, Clone)]
enum Body {
    Empty,
    Raw(Bytes),
    Multipart(Vec<Part>),
}

/// Builder for test requests.
///
/// Header names and values are checked in [`build`](Self::build), so a
/// chain of setters never panics.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: Body,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for `method` and `uri`.
    ///
    /// `uri` may already carry a query string; [`query`](Self::query) pairs
    /// are appended to it.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: Body::Empty,
            error: None,
        }
    }

    /// Appends a query pair. Both sides are percent-encoded.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Appends a header. Repeating a name adds another value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a cookie. `value` is sent as given, so percent-encode it if the
    /// receiving parameter expects that.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Raw(body.into());
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Body::Raw(Bytes::from(bytes)),
            Err(e) => self.error = Some(TestError::Json(e)),
        }
        self.content_type("application/json")
    }

    /// Sets a form-urlencoded body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Body::Raw(Bytes::from(encoded)),
            Err(e) => self.error = Some(TestError::Form(e)),
        }
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Adds a text field to a multipart body.
    pub fn multipart_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_part(Part::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file field to a multipart body.
    pub fn multipart_file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.push_part(Part::File {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        });
        self
    }

    fn push_part(&mut self, part: Part) {
        match &mut self.body {
            Body::Multipart(parts) => parts.push(part),
            body => *body = Body::Multipart(vec![part]),
        }
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first encoding error recorded by a setter, or an invalid
    /// URI or header error.
    pub fn build(mut self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }

        let uri = self.full_uri();
        let uri: Uri = uri.parse().map_err(|e: http::uri::InvalidUri| TestError::InvalidUri {
            uri: uri.clone(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let (name, value) = header_pair(name, value)?;
            headers.append(name, value);
        }
        if !self.cookies.is_empty() {
            let joined = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            let (name, value) = header_pair(header::COOKIE.as_str(), &joined)?;
            headers.append(name, value);
        }

        let body = match self.body {
            Body::Empty => Bytes::new(),
            Body::Raw(bytes) => bytes,
            Body::Multipart(parts) => {
                let content_type = format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}");
                let (name, value) = header_pair(header::CONTENT_TYPE.as_str(), &content_type)?;
                headers.insert(name, value);
                encode_multipart(&parts)
            }
        };

        Ok(TestRequest {
            method: self.method,
            uri,
            headers,
            body,
        })
    }

    fn full_uri(&self) -> String {
        if self.query.is_empty() {
            return self.uri.clone();
        }
        let pairs = self
            .query
            .iter()
            .map(|(name, value)| {
                format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.uri.contains('?') { '&' } else { '?' };
        format!("{}{separator}{pairs}", self.uri)
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), TestError> {
    let invalid = |reason: String| TestError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    let header_name = HeaderName::try_from(name).map_err(|e| invalid(e.to_string()))?;
    let header_value = HeaderValue::try_from(value).map_err(|e| invalid(e.to_string()))?;
    Ok((header_name, header_value))
}

fn encode_multipart(parts: &[Part]) -> Bytes {
    let mut out = BytesMut::new();
    for part in parts {
        out.put_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text { name, value } => {
                out.put_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                out.put_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                out.put_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                out.put_slice(data);
            }
        }
        out.put_slice(b"\r\n");
    }
    out.put_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    out.freeze()
}
