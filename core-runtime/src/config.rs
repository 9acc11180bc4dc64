//! # Enrichment Configuration
//!
//! Builder-based configuration for the album enrichment core.
//!
//! ## Overview
//!
//! [`EnrichmentConfig`] gathers the host bridges (HTTP client), the optional
//! local link store location, feature flags, and the credentials and pacing
//! settings for the remote metadata services. `build()` validates everything
//! up front so a misconfigured host fails before the first lookup.
//!
//! Remote services without credentials are simply left out of their
//! provider chains; the only service that is always available is the
//! keyless lyrics API.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{EnrichmentConfig, MetadataApiConfig};
//!
//! let config = EnrichmentConfig::builder()
//!     .database_path("/var/lib/jukebox/library.db")
//!     .metadata_api_config(
//!         MetadataApiConfig::from_env()
//!             .with_user_agent("Jukebox/1.0 (ops@example.org)"),
//!     )
//!     .build()?;
//! ```
//!
//! ### Environment
//!
//! [`MetadataApiConfig::from_env`] reads `ENRICHMENT_USER_AGENT`,
//! `LASTFM_API_KEY`, `DISCOGS_TOKEN`, `SPOTIFY_CLIENT_ID` and
//! `SPOTIFY_CLIENT_SECRET`. [`EnrichmentConfigBuilder::from_env`] additionally
//! reads `ENRICHMENT_DB_PATH`.

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default pause between two requests to the same remote service.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Default per-request timeout for remote providers.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Wikipedia editions probed when constructing reference links.
pub const DEFAULT_WIKIPEDIA_LANGUAGES: &[&str] = &["es", "en"];

/// Top-level configuration for the enrichment core.
#[derive(Clone)]
pub struct EnrichmentConfig {
    /// Local link store (SQLite). `None` disables the store-backed providers.
    pub database_path: Option<PathBuf>,

    /// HTTP client for remote providers (desktop default: reqwest)
    pub http_client: Option<Arc<dyn HttpClient>>,

    pub features: FeatureFlags,

    /// Credentials and pacing for the remote metadata services
    pub metadata_api_config: MetadataApiConfig,
}

impl std::fmt::Debug for EnrichmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &self.http_client.as_ref().map(|_| "<dyn HttpClient>"))
            .field("features", &self.features)
            .field("metadata_api_config", &self.metadata_api_config)
            .finish()
    }
}

/// Feature flags select which artifacts an enrichment run resolves.
///
/// The cover image (and the palette derived from it) is always resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub enable_artist_image: bool,
    pub enable_lyrics: bool,
    pub enable_links: bool,
    /// Append the MusicBrainz relationship provider to the link chain
    pub enable_link_relations: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_artist_image: true,
            enable_lyrics: true,
            enable_links: true,
            enable_link_relations: false,
        }
    }
}

/// Configuration for external metadata API services.
///
/// API keys must not be hardcoded; load them from the environment or the
/// host's secret storage. The `Debug` output redacts every credential.
#[derive(Clone, PartialEq, Eq)]
pub struct MetadataApiConfig {
    /// User agent sent to every service, format "AppName/Version (Contact)".
    ///
    /// MusicBrainz rejects anonymous clients, so MusicBrainz-backed
    /// providers are only enabled when this is set.
    pub user_agent: Option<String>,

    /// Last.fm API key for album.getinfo / artist.getinfo
    pub lastfm_api_key: Option<String>,

    /// Discogs personal access token (search works unauthenticated but is
    /// heavily throttled)
    pub discogs_token: Option<String>,

    /// Spotify client-credentials pair for artist images
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,

    /// Minimum delay between two requests to the same service
    pub rate_limit_delay_ms: u64,

    /// Per-request timeout
    pub request_timeout_ms: u64,

    /// Wikipedia language editions probed for reference links, in order
    pub wikipedia_languages: Vec<String>,
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("MetadataApiConfig")
            .field("user_agent", &self.user_agent)
            .field("lastfm_api_key", &redact(&self.lastfm_api_key))
            .field("discogs_token", &redact(&self.discogs_token))
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &redact(&self.spotify_client_secret))
            .field("rate_limit_delay_ms", &self.rate_limit_delay_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("wikipedia_languages", &self.wikipedia_languages)
            .finish()
    }
}

impl MetadataApiConfig {
    /// Creates a config with no credentials and default pacing
    pub fn new() -> Self {
        Self {
            user_agent: None,
            lastfm_api_key: None,
            discogs_token: None,
            spotify_client_id: None,
            spotify_client_secret: None,
            rate_limit_delay_ms: DEFAULT_RATE_LIMIT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            wikipedia_languages: DEFAULT_WIKIPEDIA_LANGUAGES
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
        }
    }

    /// Reads credentials from the process environment. Empty variables are
    /// treated as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            user_agent: read("ENRICHMENT_USER_AGENT"),
            lastfm_api_key: read("LASTFM_API_KEY"),
            discogs_token: read("DISCOGS_TOKEN"),
            spotify_client_id: read("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: read("SPOTIFY_CLIENT_SECRET"),
            ..Self::new()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_lastfm_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.lastfm_api_key = Some(api_key.into());
        self
    }

    pub fn with_discogs_token(mut self, token: impl Into<String>) -> Self {
        self.discogs_token = Some(token.into());
        self
    }

    pub fn with_spotify_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.spotify_client_id = Some(client_id.into());
        self.spotify_client_secret = Some(client_secret.into());
        self
    }

    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_wikipedia_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wikipedia_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref ua) = self.user_agent {
            if ua.trim().is_empty() {
                return Err(Error::Config("User agent cannot be empty".to_string()));
            }
            if !ua.contains('/') || !ua.contains('(') || !ua.contains(')') {
                return Err(Error::Config(
                    "User agent must follow format: 'AppName/Version (Contact)'".to_string(),
                ));
            }
        }

        if self.spotify_client_id.is_some() != self.spotify_client_secret.is_some() {
            return Err(Error::Config(
                "Spotify requires both client id and client secret".to_string(),
            ));
        }

        if self.rate_limit_delay_ms == 0 {
            return Err(Error::Config(
                "Rate limit delay must be greater than 0ms".to_string(),
            ));
        }

        if self.rate_limit_delay_ms > 60_000 {
            return Err(Error::Config(
                "Rate limit delay exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than 0ms".to_string(),
            ));
        }

        if self
            .wikipedia_languages
            .iter()
            .any(|lang| lang.is_empty() || !lang.chars().all(|c| c.is_ascii_lowercase()))
        {
            return Err(Error::Config(
                "Wikipedia languages must be lowercase language codes such as 'en'".to_string(),
            ));
        }

        Ok(())
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn has_musicbrainz(&self) -> bool {
        self.user_agent.is_some()
    }

    pub fn has_lastfm(&self) -> bool {
        self.lastfm_api_key.is_some()
    }

    pub fn has_spotify(&self) -> bool {
        self.spotify_client_id.is_some() && self.spotify_client_secret.is_some()
    }
}

impl EnrichmentConfig {
    pub fn builder() -> EnrichmentConfigBuilder {
        EnrichmentConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        self.metadata_api_config.validate()?;

        if self.features.enable_link_relations && !self.metadata_api_config.has_musicbrainz() {
            return Err(Error::Config(
                "Link relations require a user agent for MusicBrainz. \
                 Use MetadataApiConfig::with_user_agent() to set it."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// HTTP client, or a capability error naming what is missing.
    pub fn require_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        self.http_client
            .clone()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "HttpClient".to_string(),
                message: "No HTTP client implementation provided. \
                          Desktop: enable the `desktop-shims` feature. \
                          Other hosts: inject an adapter with .http_client()."
                    .to_string(),
            })
    }
}

/// Builder for [`EnrichmentConfig`].
#[derive(Default)]
pub struct EnrichmentConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    features: Option<FeatureFlags>,
    metadata_api_config: Option<MetadataApiConfig>,
}

impl EnrichmentConfigBuilder {
    /// Seeds the builder from the environment (`ENRICHMENT_DB_PATH` plus
    /// the variables read by [`MetadataApiConfig::from_env`]).
    pub fn from_env() -> Self {
        let database_path = std::env::var("ENRICHMENT_DB_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Self {
            database_path,
            metadata_api_config: Some(MetadataApiConfig::from_env()),
            ..Self::default()
        }
    }

    /// Sets the local link store location.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = Some(features);
        self
    }

    pub fn metadata_api_config(mut self, config: MetadataApiConfig) -> Self {
        self.metadata_api_config = Some(config);
        self
    }

    /// Builds the final `EnrichmentConfig` instance.
    ///
    /// With the `desktop-shims` feature a reqwest client is created when no
    /// HTTP client was injected, using the configured user agent and timeout.
    pub fn build(self) -> Result<EnrichmentConfig> {
        let metadata_api_config = self.metadata_api_config.unwrap_or_default();
        metadata_api_config.validate()?;

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client(&metadata_api_config)?,
        };

        let config = EnrichmentConfig {
            database_path: self.database_path,
            http_client,
            features: self.features.unwrap_or_default(),
            metadata_api_config,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(
    api_config: &MetadataApiConfig,
) -> Result<Option<Arc<dyn HttpClient>>> {
    let user_agent = api_config
        .user_agent
        .clone()
        .unwrap_or_else(|| concat!("album-enrichment/", env!("CARGO_PKG_VERSION")).to_string());

    let client =
        bridge_desktop::ReqwestHttpClient::with_timeout(api_config.request_timeout(), &user_agent)
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Some(Arc::new(client)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(
    _api_config: &MetadataApiConfig,
) -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}
