//! Spotify Web API artist images
//!
//! ## Authentication
//!
//! Client-credentials flow: the client id and secret are exchanged at
//! `https://accounts.spotify.com/api/token` for a bearer token, which is
//! reused until one minute before it expires.
//!
//! ## API Endpoints
//!
//! - **Search**: `https://api.spotify.com/v1/search?q={artist}&type=artist&limit=1`

use super::{check_status, parse_json, RemoteContext};
use crate::artwork::ImageRef;
use crate::error::{MetadataError, Result};
use crate::query::Query;
use crate::resolver::{Hit, Provider, RateLimiter, SourceClass};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::http::{HttpMethod, HttpRequest};
use bridge_traits::time::{Clock, SystemClock};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_SEARCH_URL: &str = "https://api.spotify.com/v1/search";

/// Tokens are renewed this many seconds before their stated expiry
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

const SOURCE: &str = "Spotify";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Option<ArtistPage>,
}

#[derive(Debug, Deserialize)]
struct ArtistPage {
    #[serde(default)]
    items: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
    #[serde(default)]
    width: Option<u32>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    /// Unix seconds
    expires_at: i64,
}

/// Image of the top artist search hit, widest first
pub struct SpotifyArtistImageProvider {
    context: RemoteContext,
    client_id: String,
    client_secret: String,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyArtistImageProvider {
    pub fn new(
        context: RemoteContext,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::with_clock(context, client_id, client_secret, Arc::new(SystemClock))
    }

    pub fn with_clock(
        context: RemoteContext,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            context,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            clock,
            token: Mutex::new(None),
        }
    }

    /// Cached token, or a fresh one. `true` when a request was spent on it.
    async fn access_token(&self) -> Result<(String, bool)> {
        let mut cached = self.token.lock().await;
        let now = self.clock.unix_timestamp();

        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > now) {
            return Ok((token.access_token.clone(), false));
        }

        debug!("Requesting Spotify access token");
        let credentials = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let request = HttpRequest::new(HttpMethod::Post, SPOTIFY_TOKEN_URL)
            .header("User-Agent", &self.context.user_agent)
            .basic_auth(credentials)
            .form(&[("grant_type", "client_credentials")])
            .timeout(self.context.timeout);

        let response = self.context.send(SOURCE, request).await?;
        if !response.is_success() {
            return Err(MetadataError::RemoteApi(format!(
                "Spotify token request failed with status {}",
                response.status
            )));
        }

        let token: TokenResponse = parse_json(SOURCE, &response)?;
        let fresh = CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in - TOKEN_EXPIRY_MARGIN_SECS,
        };
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);

        Ok((access_token, true))
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl Provider<ImageRef> for SpotifyArtistImageProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::SPOTIFY
    }

    async fn fetch(&self, query: &Query, limiter: &RateLimiter) -> Result<Option<Hit<ImageRef>>> {
        let (token, spent_request) = self.access_token().await?;
        if spent_request {
            limiter.acquire(SourceClass::SPOTIFY).await;
        }

        let url = format!(
            "{}?q={}&type=artist&limit=1",
            SPOTIFY_SEARCH_URL,
            urlencoding::encode(query.artist_name())
        );
        let response = self
            .context
            .send(SOURCE, self.context.json_get(url).bearer_token(token))
            .await?;

        if response.status == 401 {
            self.forget_token().await;
            return Err(MetadataError::RemoteApi(
                "Spotify rejected the access token".to_string(),
            ));
        }
        if !check_status(SOURCE, &response)? {
            return Ok(None);
        }

        let results: SearchResponse = parse_json(SOURCE, &response)?;
        let widest = results
            .artists
            .and_then(|page| page.items.into_iter().next())
            .and_then(|artist| {
                artist
                    .images
                    .into_iter()
                    .filter(|img| !img.url.trim().is_empty())
                    .max_by_key(|img| img.width.unwrap_or(0))
            });

        Ok(widest.map(|img| Hit::new(ImageRef::new(img.url, SOURCE)).with_confidence(0.9)))
    }
}
