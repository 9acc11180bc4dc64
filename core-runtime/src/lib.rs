//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the enrichment crates:
//! - Logging and tracing bootstrap ([`logging`])
//! - Configuration with fail-fast validation ([`config`])
//!
//! Nothing here performs lookups; the crate only decides how the rest of
//! the workspace is configured and how it reports what it does.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{EnrichmentConfig, FeatureFlags, MetadataApiConfig};
pub use error::{Error, Result};
