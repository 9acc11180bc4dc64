//! External Metadata Providers
//!
//! Each provider implements [`Provider`](crate::resolver::Provider) for one
//! artifact kind:
//!
//! | provider | kind | source |
//! |---|---|---|
//! | [`MusicBrainzCoverProvider`] | album cover | MusicBrainz release search + Cover Art Archive |
//! | [`LastFmAlbumImageProvider`] | album cover | Last.fm `album.getinfo` |
//! | [`DiscogsCoverProvider`] | album cover | Discogs database search |
//! | [`LocalStoreImageProvider`] | artist image | local link store |
//! | [`LastFmArtistImageProvider`] | artist image | Last.fm `artist.getinfo` |
//! | [`SpotifyArtistImageProvider`] | artist image | Spotify search (client credentials) |
//! | [`LyricsOvhProvider`] | lyrics | lyrics.ovh |
//! | [`LrcLibProvider`] | lyrics | LRCLib |
//! | [`LocalStoreLinkProvider`] | links | local link store |
//! | [`LinkPatternProvider`] | links | constructed URLs, verified with HEAD |
//! | [`MusicBrainzRelationProvider`] | links | MusicBrainz artist `url-rels` |
//!
//! Remote providers send the configured User-Agent on every request and
//! treat 404/503 as "nothing here"; 429 and other non-2xx statuses are
//! errors the chain logs before moving on.

pub mod discogs;
pub mod lastfm;
pub mod link_patterns;
pub mod local_store;
pub mod lyrics_api;
pub mod musicbrainz;
pub mod spotify;

pub use discogs::DiscogsCoverProvider;
pub use lastfm::{LastFmAlbumImageProvider, LastFmArtistImageProvider};
pub use link_patterns::LinkPatternProvider;
pub use local_store::{LocalStoreImageProvider, LocalStoreLinkProvider};
pub use lyrics_api::{LrcLibProvider, LyricsOvhProvider};
pub use musicbrainz::{MusicBrainzCoverProvider, MusicBrainzRelationProvider};
pub use spotify::SpotifyArtistImageProvider;

use crate::error::{MetadataError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Sent when no user agent is configured
pub const DEFAULT_USER_AGENT: &str = concat!("album-enrichment/", env!("CARGO_PKG_VERSION"));

/// Default timeout for API requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error bodies are cut to this many bytes
const MAX_ERROR_BODY: usize = 512;

/// HTTP plumbing shared by the remote providers
#[derive(Clone)]
pub struct RemoteContext {
    pub http_client: Arc<dyn HttpClient>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl RemoteContext {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// JSON GET with user agent and timeout
    pub(crate) fn json_get(&self, url: impl Into<String>) -> HttpRequest {
        HttpRequest::get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    /// Execute once, mapping transport failures to `NetworkError`.
    ///
    /// Each call is covered by a single limiter grant, so the client must
    /// not retry on its own.
    pub(crate) async fn send(&self, provider: &str, request: HttpRequest) -> Result<HttpResponse> {
        self.http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await
            .map_err(|e| MetadataError::NetworkError(format!("{} request failed: {}", provider, e)))
    }
}

/// Sort a response into "has data" (`Ok(true)`), "nothing here"
/// (`Ok(false)`) or an error.
pub(crate) fn check_status(provider: &str, response: &HttpResponse) -> Result<bool> {
    match response.status {
        200..=299 => Ok(true),
        404 => Ok(false),
        503 => {
            warn!(provider, "Service unavailable (503)");
            Ok(false)
        }
        429 => {
            let retry_after = response
                .headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("Retry-After"))
                .and_then(|(_, value)| value.parse::<u64>().ok())
                .unwrap_or(60);

            Err(MetadataError::RateLimited {
                provider: provider.to_string(),
                retry_after_seconds: retry_after,
            })
        }
        status => {
            let body = String::from_utf8_lossy(&response.body);
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            Err(MetadataError::HttpError { status, body })
        }
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(provider: &str, response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| MetadataError::JsonParse(format!("{} response: {}", provider, e)))
}

/// Trimmed value, `None` when blank
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
