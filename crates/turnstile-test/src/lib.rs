//! # Turnstile Test
//!
//! In-memory testing for Turnstile dispatchers. Requests are built with a
//! fluent builder and handed straight to [`Dispatcher::dispatch_with`], so
//! tests exercise routing, binding, middleware and error reporting without
//! opening a socket.
//!
//! ## Example
//!
//! ```ignore
//! use turnstile_test::TestClient;
//!
//! #[tokio::test]
//! async fn rejects_bad_account() {
//!     let client = TestClient::new(build_dispatcher());
//!
//!     client
//!         .post("/accounts/abc/events")
//!         .json(&serde_json::json!({"name": "Launch"}))
//!         .send()
//!         .await
//!         .assert_status(http::StatusCode::BAD_REQUEST)
//!         .assert_error_code("INVALID_FORMAT");
//! }
//! ```
//!
//! [`Dispatcher::dispatch_with`]: turnstile_server::Dispatcher::dispatch_with

#![doc(html_root_url = "https://docs.rs/turnstile-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder, MULTIPART_BOUNDARY};
pub use response::TestResponse;
