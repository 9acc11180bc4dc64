//! Discogs database search for album covers
//!
//! `https://api.discogs.com/database/search?q={artist album}&type=release&per_page=1`
//!
//! Works without a token but is heavily throttled; a personal access token
//! is sent as `Authorization: Discogs token=...` when configured.

use super::{check_status, non_blank, parse_json, RemoteContext};
use crate::artwork::ImageRef;
use crate::error::Result;
use crate::query::Query;
use crate::resolver::{Hit, Provider, RateLimiter, SourceClass};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const DISCOGS_SEARCH_URL: &str = "https://api.discogs.com/database/search";

const SOURCE: &str = "Discogs";

/// Discogs search results
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    cover_image: Option<String>,
}

/// Cover image of the top release search result
pub struct DiscogsCoverProvider {
    context: RemoteContext,
    token: Option<String>,
}

impl DiscogsCoverProvider {
    pub fn new(context: RemoteContext) -> Self {
        Self {
            context,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = non_blank(Some(&token.into()));
        self
    }
}

#[async_trait]
impl Provider<ImageRef> for DiscogsCoverProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::DISCOGS
    }

    async fn fetch(&self, query: &Query, _limiter: &RateLimiter) -> Result<Option<Hit<ImageRef>>> {
        let terms = format!("{} {}", query.artist_name(), query.album_name());
        let url = format!(
            "{}?q={}&type=release&per_page=1",
            DISCOGS_SEARCH_URL,
            urlencoding::encode(terms.trim())
        );

        debug!("Searching Discogs: {}", url);
        let mut request = self.context.json_get(url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Discogs token={}", token));
        }

        let response = self.context.send(SOURCE, request).await?;
        if !check_status(SOURCE, &response)? {
            return Ok(None);
        }

        let results: SearchResponse = parse_json(SOURCE, &response)?;
        let cover = results
            .results
            .into_iter()
            .next()
            .and_then(|r| non_blank(r.cover_image.as_deref()));

        // Full-text match, weaker than a catalog lookup
        Ok(cover.map(|url| Hit::new(ImageRef::new(url, SOURCE)).with_confidence(0.6)))
    }
}
