//! MusicBrainz API Client
//!
//! Album covers through release search and the Cover Art Archive, and
//! reference links through the artist's URL relationships.
//!
//! ## API Endpoints
//!
//! - **Release search**: `https://musicbrainz.org/ws/2/release/?query={query}&fmt=json&limit=1`
//! - **Artist search**: `https://musicbrainz.org/ws/2/artist/?query={query}&fmt=json&limit=1`
//! - **Artist relations**: `https://musicbrainz.org/ws/2/artist/{mbid}?inc=url-rels&fmt=json`
//! - **Cover art list**: `https://coverartarchive.org/release/{mbid}`
//!
//! ## Rate Limiting
//!
//! MusicBrainz allows one request per second per client. Every request,
//! Cover Art Archive included, is throttled under
//! [`SourceClass::MUSICBRAINZ`].
//!
//! ## User Agent Requirement
//!
//! MusicBrainz rejects anonymous clients. The configured user agent must
//! look like "ApplicationName/Version (Contact)".
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::providers::{MusicBrainzCoverProvider, RemoteContext};
//!
//! let context = RemoteContext::new(http_client)
//!     .with_user_agent("Jukebox/1.0 (admin@example.com)");
//! let chain = ProviderChain::new(ArtifactKind::AlbumCover)
//!     .with_provider(Arc::new(MusicBrainzCoverProvider::new(context)));
//! ```

use super::{check_status, non_blank, parse_json, RemoteContext};
use crate::artwork::ImageRef;
use crate::error::Result;
use crate::links::LinkEntry;
use crate::query::Query;
use crate::resolver::{Hit, Provider, RateLimiter, SourceClass};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// MusicBrainz API base URL
const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

/// Cover Art Archive base URL
const COVERART_ARCHIVE_BASE: &str = "https://coverartarchive.org";

/// Public MusicBrainz pages
const MUSICBRAINZ_WEB_BASE: &str = "https://musicbrainz.org";

const COVER_SOURCE: &str = "MusicBrainz Cover Art Archive";

#[derive(Debug, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    /// 0 to 100
    #[serde(default)]
    score: Option<u8>,
}

impl SearchHit {
    fn confidence(&self) -> f32 {
        self.score.map(|s| s as f32 / 100.0).unwrap_or(1.0)
    }
}

#[derive(Debug, Deserialize)]
struct CoverArtList {
    #[serde(default)]
    images: Vec<CoverArtImage>,
}

#[derive(Debug, Deserialize)]
struct CoverArtImage {
    image: String,
    #[serde(default)]
    front: bool,
    #[serde(default)]
    types: Vec<String>,
}

impl CoverArtImage {
    fn is_front(&self) -> bool {
        self.front || self.types.iter().any(|t| t == "Front")
    }
}

#[derive(Debug, Deserialize)]
struct ArtistWithRelations {
    #[serde(default)]
    relations: Vec<UrlRelation>,
}

#[derive(Debug, Deserialize)]
struct UrlRelation {
    #[serde(rename = "type", default)]
    relation_type: String,
    url: Option<RelationTarget>,
}

#[derive(Debug, Deserialize)]
struct RelationTarget {
    resource: String,
}

/// Escapes special characters in Lucene query syntax
fn escape_query(s: &str) -> String {
    const SPECIAL: &[char] = &[
        '\\', '"', '+', '-', '!', '(', ')', '{', '}', '[', ']', '^', '~', '*', '?', ':', '/', '.',
    ];
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Search and lookup calls shared by both MusicBrainz providers
struct MusicBrainzClient {
    context: RemoteContext,
}

impl MusicBrainzClient {
    async fn search_release(&self, artist: &str, album: &str) -> Result<Option<SearchHit>> {
        let query = format!(
            "artist:\"{}\" AND release:\"{}\"",
            escape_query(artist),
            escape_query(album)
        );
        let url = format!(
            "{}/release/?query={}&fmt=json&limit=1",
            MUSICBRAINZ_API_BASE,
            urlencoding::encode(&query)
        );

        debug!("Searching MusicBrainz releases: {}", url);
        let response = self
            .context
            .send("MusicBrainz", self.context.json_get(url))
            .await?;
        if !check_status("MusicBrainz", &response)? {
            return Ok(None);
        }

        let results: ReleaseSearchResponse = parse_json("MusicBrainz", &response)?;
        Ok(results.releases.into_iter().next())
    }

    async fn search_artist(&self, artist: &str) -> Result<Option<SearchHit>> {
        let query = format!("artist:\"{}\"", escape_query(artist));
        let url = format!(
            "{}/artist/?query={}&fmt=json&limit=1",
            MUSICBRAINZ_API_BASE,
            urlencoding::encode(&query)
        );

        debug!("Searching MusicBrainz artists: {}", url);
        let response = self
            .context
            .send("MusicBrainz", self.context.json_get(url))
            .await?;
        if !check_status("MusicBrainz", &response)? {
            return Ok(None);
        }

        let results: ArtistSearchResponse = parse_json("MusicBrainz", &response)?;
        Ok(results.artists.into_iter().next())
    }

    async fn artist_relations(&self, mbid: &str) -> Result<Vec<UrlRelation>> {
        let url = format!(
            "{}/artist/{}?inc=url-rels&fmt=json",
            MUSICBRAINZ_API_BASE,
            urlencoding::encode(mbid)
        );

        let response = self
            .context
            .send("MusicBrainz", self.context.json_get(url))
            .await?;
        if !check_status("MusicBrainz", &response)? {
            return Ok(Vec::new());
        }

        let artist: ArtistWithRelations = parse_json("MusicBrainz", &response)?;
        Ok(artist.relations)
    }

    async fn cover_art_url(&self, release_id: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/release/{}",
            COVERART_ARCHIVE_BASE,
            urlencoding::encode(release_id)
        );

        debug!("Fetching cover art list: {}", url);
        let response = self
            .context
            .send("Cover Art Archive", self.context.json_get(url))
            .await?;
        if !check_status("Cover Art Archive", &response)? {
            debug!("No cover art available for release {}", release_id);
            return Ok(None);
        }

        let list: CoverArtList = parse_json("Cover Art Archive", &response)?;
        let chosen = list
            .images
            .iter()
            .find(|image| image.is_front())
            .or_else(|| list.images.first());

        Ok(chosen.and_then(|image| non_blank(Some(&image.image))))
    }
}

// ===== Album cover =====

/// Release search, then the release's Cover Art Archive listing.
///
/// A query carrying an external id is taken as the release MBID and skips
/// the search. The front image is preferred, else the first listed.
pub struct MusicBrainzCoverProvider {
    client: MusicBrainzClient,
}

impl MusicBrainzCoverProvider {
    pub fn new(context: RemoteContext) -> Self {
        Self {
            client: MusicBrainzClient { context },
        }
    }
}

#[async_trait]
impl Provider<ImageRef> for MusicBrainzCoverProvider {
    fn name(&self) -> &str {
        "MusicBrainz"
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::MUSICBRAINZ
    }

    async fn fetch(&self, query: &Query, limiter: &RateLimiter) -> Result<Option<Hit<ImageRef>>> {
        let (release_id, confidence) = match query.external_id() {
            Some(id) => (id.to_string(), 1.0),
            None => {
                let Some(release) = self
                    .client
                    .search_release(query.artist_name(), query.album_name())
                    .await?
                else {
                    debug!(
                        "No release found for '{} - {}' on MusicBrainz",
                        query.artist_name(),
                        query.album_name()
                    );
                    return Ok(None);
                };
                let confidence = release.confidence();
                limiter.acquire(SourceClass::MUSICBRAINZ).await;
                (release.id, confidence)
            }
        };

        let Some(url) = self.client.cover_art_url(&release_id).await? else {
            return Ok(None);
        };

        Ok(Some(
            Hit::new(ImageRef::new(url, COVER_SOURCE)).with_confidence(confidence),
        ))
    }
}

// ===== Artist relationships =====

/// Reference links from the artist's MusicBrainz URL relationships, plus
/// the artist page and, for album queries, the matching release page.
pub struct MusicBrainzRelationProvider {
    client: MusicBrainzClient,
}

impl MusicBrainzRelationProvider {
    pub fn new(context: RemoteContext) -> Self {
        Self {
            client: MusicBrainzClient { context },
        }
    }
}

/// Display title for a relationship, `None` for types not shown
fn relation_title(relation_type: &str, url: &str) -> Option<String> {
    let kind = relation_type.to_lowercase();
    let host = url.to_lowercase();

    if kind.contains("official") || kind.contains("homepage") {
        return Some("Official Website".to_string());
    }
    if kind.contains("discogs") {
        return Some("Discogs".to_string());
    }
    if kind.contains("last.fm") || kind.contains("lastfm") {
        return Some("Last.fm".to_string());
    }
    if kind.contains("bandcamp") {
        return Some("Bandcamp".to_string());
    }
    if kind.contains("youtube") {
        return Some("YouTube".to_string());
    }
    if kind.contains("social network") || kind.contains("twitter") || kind.contains("facebook") {
        let platforms = [
            ("twitter.com", "Twitter"),
            ("x.com", "Twitter"),
            ("facebook.com", "Facebook"),
            ("instagram.com", "Instagram"),
            ("bsky.app", "Bluesky"),
            ("tiktok.com", "TikTok"),
        ];
        return platforms
            .iter()
            .find(|(domain, _)| host.contains(domain))
            .map(|(_, title)| title.to_string());
    }
    None
}

#[async_trait]
impl Provider<Vec<LinkEntry>> for MusicBrainzRelationProvider {
    fn name(&self) -> &str {
        "MusicBrainz relations"
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::MUSICBRAINZ
    }

    async fn fetch(
        &self,
        query: &Query,
        limiter: &RateLimiter,
    ) -> Result<Option<Hit<Vec<LinkEntry>>>> {
        let Some(artist) = self.client.search_artist(query.artist_name()).await? else {
            return Ok(None);
        };

        limiter.acquire(SourceClass::MUSICBRAINZ).await;
        let relations = self.client.artist_relations(&artist.id).await?;

        let mut links = vec![LinkEntry::new(
            format!("{}/artist/{}", MUSICBRAINZ_WEB_BASE, artist.id),
            "MusicBrainz",
            self.name(),
        )];

        for relation in relations {
            let Some(target) = relation.url else { continue };
            if let Some(title) = relation_title(&relation.relation_type, &target.resource) {
                if !links.iter().any(|l| l.url == target.resource) {
                    links.push(LinkEntry::new(target.resource, title, self.name()));
                }
            }
        }

        if !query.album_name().is_empty() {
            limiter.acquire(SourceClass::MUSICBRAINZ).await;
            if let Some(release) = self
                .client
                .search_release(query.artist_name(), query.album_name())
                .await?
            {
                links.push(LinkEntry::new(
                    format!("{}/release/{}", MUSICBRAINZ_WEB_BASE, release.id),
                    "MusicBrainz Release",
                    self.name(),
                ));
            }
        }

        Ok(Some(Hit::new(links).with_confidence(artist.confidence())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, status_response, MockHttp, RequestTimes};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    const PACE: Duration = Duration::from_millis(80);

    fn context(mock: MockHttp) -> RemoteContext {
        RemoteContext::new(Arc::new(mock)).with_user_agent("Test/1.0 (test@example.com)")
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("AC/DC"), "AC\\/DC");
        assert_eq!(
            escape_query("Artist (feat. Other)"),
            "Artist \\(feat\\. Other\\)"
        );
        assert_eq!(escape_query("Album: Title"), "Album\\: Title");
    }

    #[test]
    fn test_relation_titles() {
        assert_eq!(
            relation_title("official homepage", "https://radiohead.com").as_deref(),
            Some("Official Website")
        );
        assert_eq!(
            relation_title("social network", "https://www.instagram.com/radiohead").as_deref(),
            Some("Instagram")
        );
        assert_eq!(relation_title("wikidata", "https://www.wikidata.org/wiki/Q44190"), None);
    }

    #[tokio::test]
    async fn test_cover_prefers_front_image() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/release/") && r.headers.contains_key("User-Agent"))
            .times(1)
            .returning(|_| Ok(json_response(r#"{"releases":[{"id":"rel-1","score":90}]}"#)));
        mock.expect_execute()
            .withf(|r| r.url == "https://coverartarchive.org/release/rel-1")
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    r#"{"images":[
                        {"image":"https://caa/back.jpg","front":false,"types":["Back"]},
                        {"image":"https://caa/front.jpg","front":true,"types":["Front"]}
                    ]}"#,
                ))
            });

        let provider = MusicBrainzCoverProvider::new(context(mock));
        let hit = provider
            .fetch(&Query::new("Portishead", "Dummy"), &RateLimiter::unthrottled())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.payload.url, "https://caa/front.jpg");
        assert_eq!(hit.payload.source, COVER_SOURCE);
        assert!((hit.confidence - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_cover_with_external_id_skips_search() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| r.url == "https://coverartarchive.org/release/known-id")
            .times(1)
            .returning(|_| Ok(json_response(r#"{"images":[{"image":"https://caa/only.jpg"}]}"#)));

        let provider = MusicBrainzCoverProvider::new(context(mock));
        let query = Query::new("Air", "Moon Safari").with_external_id("known-id");
        let hit = provider
            .fetch(&query, &RateLimiter::unthrottled())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.payload.url, "https://caa/only.jpg");
    }

    #[tokio::test]
    async fn test_cover_missing_art_is_none() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/release/"))
            .returning(|_| Ok(json_response(r#"{"releases":[{"id":"rel-2"}]}"#)));
        mock.expect_execute()
            .withf(|r| r.url.contains("coverartarchive"))
            .returning(|_| Ok(status_response(404)));

        let provider = MusicBrainzCoverProvider::new(context(mock));
        let result = provider
            .fetch(&Query::new("Low", "Things We Lost"), &RateLimiter::unthrottled())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_relations_become_links() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/artist/?query="))
            .returning(|_| Ok(json_response(r#"{"artists":[{"id":"art-1","score":100}]}"#)));
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/artist/art-1?inc=url-rels"))
            .returning(|_| {
                Ok(json_response(
                    r#"{"relations":[
                        {"type":"official homepage","url":{"resource":"https://air.fr"}},
                        {"type":"discogs","url":{"resource":"https://www.discogs.com/artist/1"}},
                        {"type":"wikidata","url":{"resource":"https://www.wikidata.org/wiki/Q1"}}
                    ]}"#,
                ))
            });

        let provider = MusicBrainzRelationProvider::new(context(mock));
        let hit = provider
            .fetch(&Query::artist("Air"), &RateLimiter::unthrottled())
            .await
            .unwrap()
            .unwrap();

        let titles: Vec<&str> = hit.payload.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["MusicBrainz", "Official Website", "Discogs"]);
        assert_eq!(hit.payload[0].url, "https://musicbrainz.org/artist/art-1");
    }

    #[tokio::test]
    async fn test_archive_request_waits_for_its_own_grant() {
        let times = RequestTimes::default();
        let mut mock = MockHttp::new();
        let search_times = times.clone();
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/release/"))
            .times(1)
            .returning(move |_| {
                search_times.record();
                Ok(json_response(r#"{"releases":[{"id":"rel-1","score":90}]}"#))
            });
        let archive_times = times.clone();
        mock.expect_execute()
            .withf(|r| r.url.contains("coverartarchive"))
            .times(1)
            .returning(move |_| {
                archive_times.record();
                Ok(json_response(r#"{"images":[{"image":"https://caa/front.jpg","front":true}]}"#))
            });

        let provider = MusicBrainzCoverProvider::new(context(mock));
        let limiter = RateLimiter::new(PACE);

        // The grant a chain takes before calling the provider
        let granted = Instant::now();
        limiter.acquire(SourceClass::MUSICBRAINZ).await;
        provider
            .fetch(&Query::new("Portishead", "Dummy"), &limiter)
            .await
            .unwrap()
            .unwrap();

        let times = times.all();
        assert_eq!(times.len(), 2);
        assert!(times[1] >= times[0]);
        assert!(times[1] - granted >= PACE);
    }

    #[tokio::test]
    async fn test_relation_requests_are_paced() {
        let times = RequestTimes::default();
        let mut mock = MockHttp::new();
        let artist_times = times.clone();
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/artist/?query="))
            .times(1)
            .returning(move |_| {
                artist_times.record();
                Ok(json_response(r#"{"artists":[{"id":"art-1","score":100}]}"#))
            });
        let relation_times = times.clone();
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/artist/art-1?inc=url-rels"))
            .times(1)
            .returning(move |_| {
                relation_times.record();
                Ok(json_response(r#"{"relations":[]}"#))
            });
        let release_times = times.clone();
        mock.expect_execute()
            .withf(|r| r.url.contains("/ws/2/release/"))
            .times(1)
            .returning(move |_| {
                release_times.record();
                Ok(json_response(r#"{"releases":[{"id":"rel-9","score":95}]}"#))
            });

        let provider = MusicBrainzRelationProvider::new(context(mock));
        let limiter = RateLimiter::new(PACE);

        let granted = Instant::now();
        limiter.acquire(SourceClass::MUSICBRAINZ).await;
        let hit = provider
            .fetch(&Query::new("Air", "Moon Safari"), &limiter)
            .await
            .unwrap()
            .unwrap();

        let times = times.all();
        assert_eq!(times.len(), 3);
        assert!(times[1] - granted >= PACE);
        assert!(times[2] - granted >= PACE * 2);
        assert_eq!(
            hit.payload.last().map(|l| l.url.as_str()),
            Some("https://musicbrainz.org/release/rel-9")
        );
    }
}
