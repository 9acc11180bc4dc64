//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let http = Arc::new(ReqwestHttpClient::with_timeout(
//!     Duration::from_secs(10),
//!     "album-enrichment/0.1 ( ops@example.org )",
//! )?);
//! ```

mod http;

pub use http::ReqwestHttpClient;
