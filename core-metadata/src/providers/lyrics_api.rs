//! Lyrics providers
//!
//! - **lyrics.ovh** (primary): `https://api.lyrics.ovh/v1/{artist}/{title}`
//!   returns `{"lyrics": "..."}`
//! - **LRCLib**: `https://lrclib.net/api/get?artist_name=&track_name=`
//!   returns synced (LRC) and/or plain lyrics
//!
//! Both are free and keyless. Plain lyrics are passed through
//! [`clean_lyrics`](crate::lyrics::clean_lyrics).

use super::{check_status, non_blank, parse_json, RemoteContext};
use crate::error::{MetadataError, Result};
use crate::lyrics::Lyrics;
use crate::query::Query;
use crate::resolver::{Hit, Provider, RateLimiter, SourceClass};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

fn track_title(query: &Query) -> Result<&str> {
    query
        .track_title()
        .ok_or_else(|| MetadataError::invalid_query("track_title", "lyrics lookup needs a track title"))
}

// ===== lyrics.ovh =====

#[derive(Debug, Deserialize)]
struct LyricsOvhResponse {
    #[serde(default)]
    lyrics: Option<String>,
}

pub struct LyricsOvhProvider {
    context: RemoteContext,
    base_url: String,
}

impl LyricsOvhProvider {
    pub fn new(context: RemoteContext) -> Self {
        Self {
            context,
            base_url: "https://api.lyrics.ovh/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Provider<Lyrics> for LyricsOvhProvider {
    fn name(&self) -> &str {
        "lyrics.ovh"
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::LYRICS_OVH
    }

    async fn fetch(&self, query: &Query, _limiter: &RateLimiter) -> Result<Option<Hit<Lyrics>>> {
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(query.artist_name()),
            urlencoding::encode(track_title(query)?)
        );

        debug!("Fetching lyrics: {}", url);
        let response = self.context.send(self.name(), self.context.json_get(url)).await?;
        if !check_status(self.name(), &response)? {
            return Ok(None);
        }

        let body: LyricsOvhResponse = parse_json(self.name(), &response)?;
        Ok(non_blank(body.lyrics.as_deref()).map(|raw| Hit::new(Lyrics::plain(&raw))))
    }
}

// ===== LRCLib =====

#[derive(Debug, Deserialize)]
struct LrcLibResponse {
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
}

pub struct LrcLibProvider {
    context: RemoteContext,
    base_url: String,
}

impl LrcLibProvider {
    pub fn new(context: RemoteContext) -> Self {
        Self {
            context,
            base_url: "https://lrclib.net/api".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Provider<Lyrics> for LrcLibProvider {
    fn name(&self) -> &str {
        "LRCLib"
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::LRCLIB
    }

    async fn fetch(&self, query: &Query, _limiter: &RateLimiter) -> Result<Option<Hit<Lyrics>>> {
        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(query.artist_name()),
            urlencoding::encode(track_title(query)?)
        );
        if !query.album_name().is_empty() {
            url.push_str(&format!(
                "&album_name={}",
                urlencoding::encode(query.album_name())
            ));
        }

        debug!("Fetching lyrics: {}", url);
        let response = self.context.send(self.name(), self.context.json_get(url)).await?;
        if !check_status(self.name(), &response)? {
            return Ok(None);
        }

        let body: LrcLibResponse = parse_json(self.name(), &response)?;

        // Prefer synced lyrics if available
        if let Some(synced) = non_blank(body.synced_lyrics.as_deref()) {
            return Ok(Some(Hit::new(Lyrics::synced(&synced))));
        }

        Ok(non_blank(body.plain_lyrics.as_deref()).map(|raw| Hit::new(Lyrics::plain(&raw))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, status_response, MockHttp};
    use std::sync::Arc;

    fn track() -> Query {
        Query::new("Massive Attack", "Mezzanine").with_track_title("Teardrop")
    }

    #[tokio::test]
    async fn test_lyrics_ovh_cleans_text() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| r.url == "https://api.lyrics.ovh/v1/Massive%20Attack/Teardrop")
            .returning(|_| {
                Ok(json_response(
                    r#"{"lyrics":"Love, love is a verb\n\n\n\nLove is a doing word\nPowered by SomeLyrics"}"#,
                ))
            });

        let provider = LyricsOvhProvider::new(RemoteContext::new(Arc::new(mock)));
        let hit = provider
            .fetch(&track(), &RateLimiter::unthrottled())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            hit.payload.text,
            "Love, love is a verb\n\nLove is a doing word"
        );
        assert!(!hit.payload.is_synced);
    }

    #[tokio::test]
    async fn test_lyrics_ovh_not_found() {
        let mut mock = MockHttp::new();
        mock.expect_execute().returning(|_| Ok(status_response(404)));

        let provider = LyricsOvhProvider::new(RemoteContext::new(Arc::new(mock)));
        assert!(provider
            .fetch(&track(), &RateLimiter::unthrottled())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_lrclib_prefers_synced() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| {
                r.url.starts_with("https://lrclib.net/api/get?")
                    && r.url.contains("track_name=Teardrop")
                    && r.url.contains("album_name=Mezzanine")
            })
            .returning(|_| {
                Ok(json_response(
                    r#"{"syncedLyrics":"[00:12.00] Love, love is a verb","plainLyrics":"Love, love is a verb"}"#,
                ))
            });

        let provider = LrcLibProvider::new(RemoteContext::new(Arc::new(mock)));
        let hit = provider
            .fetch(&track(), &RateLimiter::unthrottled())
            .await
            .unwrap()
            .unwrap();

        assert!(hit.payload.is_synced);
        assert!(hit.payload.text.starts_with("[00:12.00]"));
    }

    #[tokio::test]
    async fn test_lrclib_plain_fallback() {
        let mut mock = MockHttp::new();
        mock.expect_execute().returning(|_| {
            Ok(json_response(
                r#"{"syncedLyrics":null,"plainLyrics":"  Words  "}"#,
            ))
        });

        let provider = LrcLibProvider::new(RemoteContext::new(Arc::new(mock)));
        let hit = provider
            .fetch(&track(), &RateLimiter::unthrottled())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.payload, Lyrics::plain("Words"));
    }

    #[tokio::test]
    async fn test_missing_track_title_is_invalid() {
        let provider = LrcLibProvider::new(RemoteContext::new(Arc::new(MockHttp::new())));
        let result = provider
            .fetch(&Query::artist("Air"), &RateLimiter::unthrottled())
            .await;

        assert!(matches!(result, Err(MetadataError::InvalidQuery { .. })));
    }
}
