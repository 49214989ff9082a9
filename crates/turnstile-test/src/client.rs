//! In-memory client that drives a [`Dispatcher`] directly.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use turnstile_core::RequestContext;
use turnstile_server::Dispatcher;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Sends requests through a dispatcher without binding a socket.
///
/// Every request goes through the full pipeline: route lookup, binding,
/// scope attachment, middleware and the handler, or the error reporter when
/// one of the earlier stages fails.
///
/// # Example
///
/// ```ignore
/// use turnstile_test::TestClient;
///
/// let client = TestClient::new(dispatcher);
/// client
///     .post("/accounts/1/events")
///     .bearer_token("t")
///     .send()
///     .await
///     .assert_status(http::StatusCode::OK);
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps a dispatcher.
    pub fn new(dispatcher: impl Into<Arc<Dispatcher>>) -> Self {
        Self {
            dispatcher: dispatcher.into(),
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The wrapped dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name.clone(), value.clone());
        }
        TestClientRequest {
            client: self,
            builder,
            ctx: None,
        }
    }

    /// Dispatches a built request.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::RequestBuild`] if the request parts are rejected.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        self.execute_with(RequestContext::new(), request).await
    }

    /// Dispatches a built request with a caller-supplied context, e.g. one
    /// carrying a cancellation token or deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::RequestBuild`] if the request parts are rejected.
    pub async fn execute_with(
        &self,
        ctx: RequestContext,
        request: TestRequest,
    ) -> Result<TestResponse, TestError> {
        let request = request.into_http_request()?;
        let response = self.dispatcher.dispatch_with(ctx, request).await;
        Ok(TestResponse::from_response(response).await)
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("routes", &self.dispatcher.routes().len())
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
    ctx: Option<RequestContext>,
}

impl TestClientRequest<'_> {
    /// Appends a query pair.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Adds a cookie.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.cookie(name, value);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Adds a multipart text field.
    pub fn multipart_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.multipart_text(name, value);
        self
    }

    /// Adds a multipart file field.
    pub fn multipart_file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.builder = self
            .builder
            .multipart_file(name, filename, content_type, data);
        self
    }

    /// Uses `ctx` instead of a fresh context.
    pub fn context(mut self, ctx: RequestContext) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built; use
    /// [`try_send`](Self::try_send) to handle that case.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns any error from building the request.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        let ctx = self.ctx.unwrap_or_default();
        self.client.execute_with(ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use turnstile_core::{Contract, OperationSpec, ParamType, ParameterDescriptor};
    use turnstile_middleware::{Request, Response, ResponseExt};
    use turnstile_server::{typed, JsonErrorReporter};

    async fn echo(ctx: RequestContext, req: Request) -> Response {
        let tenant = req
            .headers()
            .get("x-tenant")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        Response::text(
            StatusCode::OK,
            format!("{} {tenant}", ctx.operation_id().unwrap_or_default()),
        )
    }

    async fn lookup(_ctx: RequestContext, _req: Request, (id,): (i64,)) -> Response {
        Response::text(StatusCode::OK, id.to_string())
    }

    fn client() -> TestClient {
        let contract = Contract::new()
            .operation(OperationSpec::new("Echo", &Method::GET, "/echo"))
            .operation(
                OperationSpec::new("Lookup", &Method::GET, "/items")
                    .param(ParameterDescriptor::query("id", ParamType::INTEGER).required(true)),
            );
        let dispatcher = Dispatcher::builder(contract)
            .handler("Echo", echo)
            .handler("Lookup", typed(&["id"], lookup))
            .reporter(JsonErrorReporter)
            .build()
            .unwrap();
        TestClient::new(dispatcher)
    }

    #[tokio::test]
    async fn test_routes_through_dispatcher() {
        client()
            .get("/echo")
            .header("X-Tenant", "acme")
            .send()
            .await
            .assert_status(StatusCode::OK)
            .assert_body_eq("Echo acme");
    }

    #[tokio::test]
    async fn test_default_headers() {
        client()
            .with_default_header("X-Tenant", "default")
            .get("/echo")
            .send()
            .await
            .assert_body_eq("Echo default");
    }

    #[tokio::test]
    async fn test_query_binding() {
        client()
            .get("/items")
            .query("id", "12")
            .send()
            .await
            .assert_body_eq("12");
    }

    #[tokio::test]
    async fn test_reporter_output() {
        let client = client();
        client
            .get("/items")
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_code("REQUIRED_PARAMETER");
        client
            .post("/echo")
            .send()
            .await
            .assert_status(StatusCode::NOT_FOUND)
            .assert_error_code("ROUTE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_try_send_surfaces_build_errors() {
        let result = client().get("/echo").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader { .. })));
    }
}
