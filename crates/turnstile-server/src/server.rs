//! HTTP transport.
//!
//! Accepts HTTP/1.1 connections with hyper and hands every request to a
//! shared [`Dispatcher`]. The transport owns what the dispatcher does not:
//! reading the body, the request deadline, and cancelling the request's
//! token when the client goes away.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use turnstile_server::{Dispatcher, Server, ServerConfig};
//! use turnstile_core::Contract;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::builder(Contract::new()).build()?;
//! let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//!
//! Server::new(config, Arc::new(dispatcher)).run().await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use turnstile_core::RequestContext;
use turnstile_middleware::{Response, ResponseExt};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::shutdown::ShutdownSignal;

/// Transport failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address `{addr}`: {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Other I/O failure on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An HTTP server in front of a [`Dispatcher`].
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// The transport configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The dispatcher requests are handed to.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Binds the configured address and serves until SIGTERM or Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already-bound listener until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        tracing::info!(
            addr = %local,
            routes = self.dispatcher.routes().len(),
            "server listening"
        );

        let server = Arc::new(self);
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let server = Arc::clone(&server);
                        let shutdown = shutdown.clone();
                        tracker.spawn(async move {
                            if let Err(e) = server.handle_connection(stream, shutdown).await {
                                tracing::debug!(remote = %remote, error = %e, "connection error");
                            }
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        tracker.close();
        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            connections = tracker.len(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "draining connections"
        );
        if tokio::time::timeout(timeout, tracker.wait()).await.is_err() {
            tracing::warn!(
                connections = tracker.len(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_request(&self, request: http::Request<Incoming>) -> Response {
        // Dropped with this future when hyper abandons the request.
        let token = CancellationToken::new();
        let _cancel_on_drop = token.clone().drop_guard();

        let mut ctx = RequestContext::with_cancellation(token);
        if let Some(timeout) = self.config.request_timeout() {
            ctx = ctx.with_timeout(timeout);
        }

        let (parts, body) = request.into_parts();
        let body = match self.read_body(body).await {
            Ok(body) => body,
            Err(response) => return response,
        };
        let request = http::Request::from_parts(parts, Full::new(body));

        let Some(timeout) = self.config.request_timeout() else {
            return self.dispatcher.dispatch_with(ctx, request).await;
        };
        let cancellation = ctx.cancellation().clone();
        match tokio::time::timeout(timeout, self.dispatcher.dispatch_with(ctx, request)).await {
            Ok(response) => response,
            Err(_) => {
                cancellation.cancel();
                tracing::warn!(
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "request deadline exceeded"
                );
                Response::text(StatusCode::GATEWAY_TIMEOUT, "request timed out")
            }
        }
    }

    async fn read_body(&self, body: Incoming) -> Result<Bytes, Response> {
        let collected = match self.config.max_body_size() {
            Some(limit) => Limited::new(body, limit).collect().await,
            None => body.collect().await.map_err(Into::into),
        };
        match collected {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.is::<LengthLimitError>() => {
                tracing::debug!("request body over limit");
                Err(Response::text(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "request body too large",
                ))
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to read request body");
                Err(Response::text(
                    StatusCode::BAD_REQUEST,
                    "failed to read request body",
                ))
            }
        }
    }
}
