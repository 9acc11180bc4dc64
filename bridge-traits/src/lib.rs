//! # Host Bridge Traits
//!
//! Capabilities the enrichment core needs from its host but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - async HTTP used by every remote
//!   provider and by link verification
//! - [`Clock`](time::Clock) - wall-clock source, injectable for token expiry tests
//! - [`LoggerSink`](time::LoggerSink) - mirror structured logs into a host pipeline
//!
//! Desktop adapters live in `bridge-desktop`. Tests substitute `mockall`
//! mocks for any of these.
//!
//! ## Implementing HttpClient
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::error::Result;
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//!
//! pub struct MyHttpClient;
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Perform the request, honoring `request.follow_redirects`
//!         todo!()
//!     }
//! }
//! ```
//!
//! All traits require `Send + Sync` so a single adapter can be shared across
//! the concurrently running resolvers.

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
