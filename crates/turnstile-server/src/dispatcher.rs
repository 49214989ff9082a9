//! Request dispatch.
//!
//! The [`Dispatcher`] owns the route table built from a [`Contract`]. For
//! every request it moves through the same steps:
//!
//! ```text
//! Unmatched ──match──▶ Matched ──bind──▶ Bound ──scopes──▶ ScopesAttached ──chain──▶ Completed
//!     │                   │
//!     └─ not found        └─ binding failure / cancelled
//! ```
//!
//! Routing and binding failures go to the [`ErrorReporter`]; the handler
//! and middleware never see them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::Method;
use http_body_util::{BodyExt, Full};
use turnstile_core::{
    Contract, ContractError, DispatchError, ParameterDescriptor, RequestContext,
    SecurityRequirement,
};
use turnstile_extract::{BindAbort, Binder, ExtractionContext, MultipartConfig};
use turnstile_middleware::{BoxedMiddleware, Chain, Endpoint, Middleware, Request, Response};
use turnstile_router::{PathTemplate, RouteMatcher, RouteTable};
use turnstile_telemetry::metrics::{outcome, DISPATCH_DURATION_SECONDS, DISPATCH_TOTAL};

use crate::handler::HandlerRegistry;
use crate::reporter::{cancelled, wiring_failure, DefaultReporter, ErrorReporter};

/// Label used for requests that matched no operation.
const UNMATCHED: &str = "unmatched";

/// How a dispatch ended, as recorded in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No route matched.
    NotFound,
    /// A parameter failed to bind.
    BindingFailed,
    /// The request was cancelled during binding.
    Cancelled,
    /// The middleware chain and handler ran.
    Completed,
}

impl DispatchOutcome {
    /// Label value for the `outcome` metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => outcome::NOT_FOUND,
            Self::BindingFailed => outcome::BINDING_FAILED,
            Self::Cancelled => outcome::CANCELLED,
            Self::Completed => outcome::COMPLETED,
        }
    }
}

/// One registered operation.
pub struct Route {
    operation_id: String,
    method: Method,
    template: PathTemplate,
    binder: Binder,
    security: Vec<SecurityRequirement>,
    chain: Chain,
}

impl Route {
    /// The operation ID.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The full path template, base path included.
    #[must_use]
    pub const fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Parameter descriptors in binding order.
    #[must_use]
    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        self.binder.descriptors()
    }

    /// Security requirements attached to matching requests.
    #[must_use]
    pub fn security(&self) -> &[SecurityRequirement] {
        &self.security
    }

    /// Middleware names, outermost first.
    #[must_use]
    pub fn middleware(&self) -> Vec<&'static str> {
        self.chain.names()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("operation_id", &self.operation_id)
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("middleware", &self.chain.names())
            .finish_non_exhaustive()
    }
}

/// Matches, binds and dispatches requests for a fixed set of routes.
///
/// Immutable once built; share it behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use turnstile_server::Dispatcher;
/// use turnstile_core::{Contract, OperationSpec, ParamType, ParameterDescriptor};
/// use turnstile_middleware::{Request, Response, ResponseExt};
/// use turnstile_core::RequestContext;
/// use http::{Method, StatusCode};
/// use http_body_util::Full;
/// use bytes::Bytes;
///
/// let contract = Contract::new().operation(
///     OperationSpec::new("CreateEvent", &Method::POST, "/accounts/{accountId}/events")
///         .param(ParameterDescriptor::path("accountId", ParamType::INTEGER)),
/// );
///
/// let dispatcher = Dispatcher::builder(contract)
///     .handler("CreateEvent", |_ctx: RequestContext, _req: Request| async {
///         Response::text(StatusCode::OK, "CreateEvent")
///     })
///     .build()
///     .unwrap();
///
/// # tokio_test::block_on(async {
/// let request = http::Request::post("/accounts/42/events")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
/// let response = dispatcher.dispatch(request).await;
/// assert_eq!(response.status(), StatusCode::OK);
/// # });
/// ```
pub struct Dispatcher {
    matcher: Box<dyn RouteMatcher<usize>>,
    routes: Vec<Route>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Dispatcher {
    /// Starts building a dispatcher for `contract`.
    #[must_use]
    pub fn builder(contract: Contract) -> DispatcherBuilder {
        DispatcherBuilder::new(contract)
    }

    /// Registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Dispatches a request with a fresh [`RequestContext`].
    pub async fn dispatch(&self, request: Request) -> Response {
        self.dispatch_with(RequestContext::new(), request).await
    }

    /// Dispatches a request with a caller-supplied context, carrying the
    /// transport's cancellation token and deadline.
    pub async fn dispatch_with(&self, mut ctx: RequestContext, request: Request) -> Response {
        let started = Instant::now();
        let (parts, body) = request.into_parts();

        let Some(found) = self.matcher.find(&parts.method, parts.uri.path()) else {
            tracing::debug!(
                request_id = %ctx.request_id(),
                http.method = %parts.method,
                http.path = parts.uri.path(),
                "no route matched"
            );
            let error = DispatchError::not_found(parts.method.clone(), parts.uri.path());
            record(UNMATCHED, DispatchOutcome::NotFound, started);
            return self.reporter.report(&parts, &error);
        };

        let Some(route) = self.routes.get(*found.value) else {
            tracing::error!(index = *found.value, "matcher returned an unknown route");
            return wiring_failure();
        };
        ctx.set_operation_id(route.operation_id.as_str());
        tracing::debug!(
            request_id = %ctx.request_id(),
            operation_id = %route.operation_id,
            http.method = %parts.method,
            http.path = parts.uri.path(),
            "route matched"
        );

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        let source = ExtractionContext::from_parts(&parts, body.clone(), found.params);

        match route.binder.bind(&source, ctx.cancellation()).await {
            Ok(params) => {
                tracing::trace!(
                    operation_id = %route.operation_id,
                    bound = params.len(),
                    "parameters bound"
                );
                ctx.set_params(params);
            }
            Err(BindAbort::Invalid(error)) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    operation_id = %route.operation_id,
                    error.kind = error.error_code(),
                    param.name = error.parameter(),
                    "binding failed: {error}"
                );
                record(&route.operation_id, DispatchOutcome::BindingFailed, started);
                return self.reporter.report(&parts, &DispatchError::Binding(error));
            }
            Err(BindAbort::Cancelled) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    operation_id = %route.operation_id,
                    "request cancelled during binding"
                );
                record(&route.operation_id, DispatchOutcome::Cancelled, started);
                return cancelled();
            }
        }

        ctx.attach_scopes(&route.security);
        tracing::trace!(operation_id = %route.operation_id, "scopes attached");

        let request = Request::from_parts(parts, Full::new(body));
        let response = route.chain.run(&mut ctx, request).await;

        tracing::debug!(
            request_id = %ctx.request_id(),
            operation_id = %route.operation_id,
            http.status_code = response.status().as_u16(),
            "dispatch completed"
        );
        record(&route.operation_id, DispatchOutcome::Completed, started);
        response
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

fn record(operation: &str, outcome: DispatchOutcome, started: Instant) {
    let operation = operation.to_string();
    metrics::counter!(
        DISPATCH_TOTAL,
        "operation" => operation.clone(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!(DISPATCH_DURATION_SECONDS, "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// Builder for [`Dispatcher`].
///
/// Every contract operation needs exactly one handler. Global middleware
/// wraps every route; route middleware is appended after it for that route
/// only. Both keep registration order, outermost first.
pub struct DispatcherBuilder {
    contract: Contract,
    handlers: HandlerRegistry,
    global: Vec<BoxedMiddleware>,
    per_route: HashMap<String, Vec<BoxedMiddleware>>,
    base_path: String,
    matcher: Option<Box<dyn RouteMatcher<usize>>>,
    reporter: Arc<dyn ErrorReporter>,
    multipart: MultipartConfig,
}

impl DispatcherBuilder {
    /// Creates a builder with the default reporter and route table.
    #[must_use]
    pub fn new(contract: Contract) -> Self {
        Self {
            contract,
            handlers: HandlerRegistry::new(),
            global: Vec::new(),
            per_route: HashMap::new(),
            base_path: String::new(),
            matcher: None,
            reporter: Arc::new(DefaultReporter),
            multipart: MultipartConfig::default(),
        }
    }

    /// Wires a handler to an operation.
    #[must_use]
    pub fn handler<E: Endpoint>(mut self, operation_id: impl Into<String>, handler: E) -> Self {
        self.handlers.register(operation_id, handler);
        self
    }

    /// Replaces the handler registry.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Mutable access to the handler registry.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Adds middleware that wraps every route.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.global.push(Arc::new(middleware));
        self
    }

    /// Adds middleware for one operation, inside the global middleware.
    #[must_use]
    pub fn route_middleware<M: Middleware>(
        mut self,
        operation_id: impl Into<String>,
        middleware: M,
    ) -> Self {
        self.per_route
            .entry(operation_id.into())
            .or_default()
            .push(Arc::new(middleware));
        self
    }

    /// Prefix prepended to every path template.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Replaces the default [`RouteTable`]. The matcher must be empty.
    #[must_use]
    pub fn matcher<M: RouteMatcher<usize> + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    /// Replaces the [`DefaultReporter`].
    #[must_use]
    pub fn reporter<R: ErrorReporter>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Limits applied when reading multipart bodies.
    #[must_use]
    pub fn multipart_config(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }

    /// Validates the contract against the handlers and builds the routes.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContractError`]: a malformed or duplicate
    /// template, descriptors that disagree with the template, a repeated
    /// operation ID, an operation without a handler, or a handler or route
    /// middleware for an unknown operation.
    pub fn build(mut self) -> Result<Dispatcher, ContractError> {
        if let Some(operation_id) = self.handlers.duplicates().first() {
            return Err(ContractError::DuplicateOperation {
                operation_id: operation_id.clone(),
            });
        }

        let mut matcher: Box<dyn RouteMatcher<usize>> = match self.matcher.take() {
            Some(matcher) => matcher,
            None => Box::new(RouteTable::new()),
        };
        let mut routes = Vec::with_capacity(self.contract.operations.len());
        let mut seen = HashSet::new();

        for op in &self.contract.operations {
            if !seen.insert(op.operation_id.as_str()) {
                return Err(ContractError::DuplicateOperation {
                    operation_id: op.operation_id.clone(),
                });
            }

            let route_error = |source| ContractError::Route {
                operation_id: op.operation_id.clone(),
                source,
            };
            let template = PathTemplate::with_base(&self.base_path, &op.path).map_err(route_error)?;
            op.validate(&template)?;
            let method = op.http_method()?;

            let endpoint = self.handlers.take(&op.operation_id).ok_or_else(|| {
                ContractError::MissingHandler {
                    operation_id: op.operation_id.clone(),
                }
            })?;

            let mut middleware = self.global.clone();
            middleware.extend(self.per_route.remove(&op.operation_id).unwrap_or_default());

            matcher
                .insert(method.clone(), template.clone(), routes.len())
                .map_err(route_error)?;

            tracing::debug!(
                operation_id = %op.operation_id,
                http.method = %method,
                template = %template,
                middleware = middleware.len(),
                "route registered"
            );

            routes.push(Route {
                operation_id: op.operation_id.clone(),
                method,
                template,
                binder: Binder::new(op.binding_order()).with_multipart_config(self.multipart.clone()),
                security: op.security.clone(),
                chain: Chain::new(middleware, endpoint),
            });
        }

        if let Some(operation_id) = self
            .handlers
            .remaining_ids()
            .chain(self.per_route.keys().map(String::as_str))
            .next()
        {
            return Err(ContractError::UnknownOperation {
                operation_id: operation_id.to_string(),
            });
        }

        Ok(Dispatcher {
            matcher,
            routes,
            reporter: self.reporter,
        })
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("operations", &self.contract.operations.len())
            .field("handlers", &self.handlers)
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use turnstile_core::{OperationSpec, ParamType};
    use turnstile_middleware::ResponseExt;
    use turnstile_router::RouterError;

    fn ok(_ctx: RequestContext, _req: Request) -> std::future::Ready<Response> {
        std::future::ready(Response::text(StatusCode::OK, "ok"))
    }

    fn contract() -> Contract {
        Contract::new()
            .operation(
                OperationSpec::new("CreateEvent", &Method::POST, "/accounts/{accountId}/events")
                    .param(ParameterDescriptor::path("accountId", ParamType::INTEGER)),
            )
            .operation(OperationSpec::new("Health", &Method::GET, "/health"))
    }

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_build_registers_routes_in_order() {
        let dispatcher = Dispatcher::builder(contract())
            .handler("CreateEvent", ok)
            .handler("Health", ok)
            .base_path("/api")
            .build()
            .unwrap();

        let routes = dispatcher.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].operation_id(), "CreateEvent");
        assert_eq!(routes[0].template().as_str(), "/api/accounts/{accountId}/events");
        assert_eq!(routes[1].method(), &Method::GET);
    }

    #[test]
    fn test_missing_handler() {
        let err = Dispatcher::builder(contract())
            .handler("CreateEvent", ok)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::MissingHandler {
                operation_id: "Health".into()
            }
        );
    }

    #[test]
    fn test_unknown_operation() {
        let err = Dispatcher::builder(contract())
            .handler("CreateEvent", ok)
            .handler("Health", ok)
            .handler("DeleteEvent", ok)
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::UnknownOperation { operation_id } if operation_id == "DeleteEvent"));
    }

    #[test]
    fn test_route_middleware_for_unknown_operation() {
        let err = Dispatcher::builder(contract())
            .handler("CreateEvent", ok)
            .handler("Health", ok)
            .route_middleware("Nope", turnstile_middleware::stages::RequestIdMiddleware::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::UnknownOperation { .. }));
    }

    #[test]
    fn test_duplicate_handler_registration() {
        let err = Dispatcher::builder(contract())
            .handler("CreateEvent", ok)
            .handler("CreateEvent", ok)
            .handler("Health", ok)
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::DuplicateOperation { .. }));
    }

    #[test]
    fn test_duplicate_operation_in_contract() {
        let contract = contract().operation(OperationSpec::new("Health", &Method::HEAD, "/health"));
        let err = Dispatcher::builder(contract)
            .handler("CreateEvent", ok)
            .handler("Health", ok)
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::DuplicateOperation { operation_id } if operation_id == "Health"));
    }

    #[test]
    fn test_structurally_identical_route_rejected() {
        let contract = Contract::new()
            .operation(
                OperationSpec::new("A", &Method::GET, "/events/{id}")
                    .param(ParameterDescriptor::path("id", ParamType::INTEGER)),
            )
            .operation(
                OperationSpec::new("B", &Method::GET, "/events/{eventId}")
                    .param(ParameterDescriptor::path("eventId", ParamType::INTEGER)),
            );
        let err = Dispatcher::builder(contract)
            .handler("A", ok)
            .handler("B", ok)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ContractError::Route {
                source: RouterError::DuplicateRoute { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_path_descriptor_mismatch_rejected() {
        let contract = Contract::new().operation(OperationSpec::new(
            "CreateEvent",
            &Method::POST,
            "/accounts/{accountId}/events",
        ));
        let err = Dispatcher::builder(contract)
            .handler("CreateEvent", ok)
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::PathParameterMismatch { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_not_found_and_method_mismatch() {
        let dispatcher = Dispatcher::builder(contract())
            .handler("CreateEvent", ok)
            .handler("Health", ok)
            .build()
            .unwrap();

        let response = dispatcher.dispatch(request(Method::GET, "/accounts/1/events")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = dispatcher.dispatch(request(Method::GET, "/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = dispatcher.dispatch(request(Method::GET, "/health/")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dispatch_with_cancelled_context_skips_handler() {
        let upload = Contract::new().operation(
            OperationSpec::new("Upload", &Method::POST, "/upload")
                .param(ParameterDescriptor::file("file")),
        );
        let dispatcher = Dispatcher::builder(upload)
            .handler("Upload", ok)
            .build()
            .unwrap();

        let ctx = RequestContext::new();
        ctx.cancellation().cancel();
        let response = dispatcher
            .dispatch_with(ctx, request(Method::POST, "/upload"))
            .await;
        assert_eq!(response.status().as_u16(), 499);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DispatchOutcome::NotFound.as_str(), "not_found");
        assert_eq!(DispatchOutcome::Completed.as_str(), "completed");
    }
}
