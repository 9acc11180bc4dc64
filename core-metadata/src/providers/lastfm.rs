//! Last.fm API Client
//!
//! Album covers and artist images from the Last.fm web service.
//!
//! ## API Endpoints
//!
//! - **Album Info**: `https://ws.audioscrobbler.com/2.0/?method=album.getinfo&api_key={key}&artist={artist}&album={album}&format=json`
//! - **Artist Info**: `https://ws.audioscrobbler.com/2.0/?method=artist.getinfo&api_key={key}&artist={artist}&format=json`
//!
//! ## API Key Requirement
//!
//! Last.fm requires an API key for all requests. The providers are only
//! added to a chain when one is configured.

use super::{check_status, parse_json, RemoteContext};
use crate::artwork::ImageRef;
use crate::error::{MetadataError, Result};
use crate::query::Query;
use crate::resolver::{Hit, Provider, RateLimiter, SourceClass};
use async_trait::async_trait;
use core_runtime::logging::redact_url;
use serde::Deserialize;
use tracing::debug;

/// Last.fm API base URL
const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";

/// Last.fm error code for an unknown album or artist
const ERROR_NOT_FOUND: i32 = 6;

/// File name of the star placeholder Last.fm serves instead of artist photos
const PLACEHOLDER_IMAGE_ID: &str = "2a96cbd8b46e442fc41c2b86b821562f";

/// Image sizes, largest first
const SIZE_PREFERENCE: &[&str] = &["mega", "extralarge", "large", "medium"];

const SOURCE: &str = "Last.fm";

/// Last.fm image entry
#[derive(Debug, Clone, Deserialize)]
struct LastFmImage {
    #[serde(rename = "#text")]
    url: String,
    #[serde(default)]
    size: String,
}

#[derive(Debug, Deserialize)]
struct ImageHolder {
    #[serde(default)]
    image: Vec<LastFmImage>,
}

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    album: Option<ImageHolder>,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    artist: Option<ImageHolder>,
}

/// Last.fm error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: i32,
    message: String,
}

/// Largest non-empty image, falling back to the first non-empty one
fn largest_image(images: &[LastFmImage]) -> Option<String> {
    let usable: Vec<&LastFmImage> = images
        .iter()
        .filter(|img| !img.url.trim().is_empty() && !img.url.contains(PLACEHOLDER_IMAGE_ID))
        .collect();

    SIZE_PREFERENCE
        .iter()
        .find_map(|size| usable.iter().find(|img| img.size == *size))
        .or_else(|| usable.first())
        .map(|img| img.url.trim().to_string())
}

/// `album.getinfo` when an album is given, else `artist.getinfo`.
/// Returns the images of the album or artist object.
async fn get_images(
    context: &RemoteContext,
    api_key: &str,
    artist: &str,
    album: Option<&str>,
) -> Result<Option<Vec<LastFmImage>>> {
    let method = if album.is_some() {
        "album.getinfo"
    } else {
        "artist.getinfo"
    };
    let mut url = format!(
        "{}?method={}&api_key={}&artist={}&format=json",
        LASTFM_API_BASE,
        method,
        urlencoding::encode(api_key),
        urlencoding::encode(artist)
    );
    if let Some(album) = album {
        url.push_str(&format!("&album={}", urlencoding::encode(album)));
    }

    debug!("Querying Last.fm: {}", redact_url(&url));
    let response = context.send(SOURCE, context.json_get(url)).await?;

    // Last.fm reports unknown items as an error object, with or without a 2xx status
    if let Ok(error_resp) = serde_json::from_slice::<ErrorResponse>(&response.body) {
        return match error_resp.error {
            ERROR_NOT_FOUND => Ok(None),
            code => Err(MetadataError::RemoteApi(format!(
                "Last.fm API error {}: {}",
                code, error_resp.message
            ))),
        };
    }

    if !check_status(SOURCE, &response)? {
        return Ok(None);
    }

    let images = if album.is_some() {
        parse_json::<AlbumResponse>(SOURCE, &response)?
            .album
            .map(|a| a.image)
    } else {
        parse_json::<ArtistResponse>(SOURCE, &response)?
            .artist
            .map(|a| a.image)
    };

    Ok(images)
}

// ===== Album cover =====

/// `album.getinfo`, largest available cover
pub struct LastFmAlbumImageProvider {
    context: RemoteContext,
    api_key: String,
}

impl LastFmAlbumImageProvider {
    pub fn new(context: RemoteContext, api_key: impl Into<String>) -> Self {
        Self {
            context,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Provider<ImageRef> for LastFmAlbumImageProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::LASTFM
    }

    async fn fetch(&self, query: &Query, _limiter: &RateLimiter) -> Result<Option<Hit<ImageRef>>> {
        let url = get_images(
            &self.context,
            &self.api_key,
            query.artist_name(),
            Some(query.album_name()),
        )
        .await?
        .and_then(|images| largest_image(&images));

        Ok(url.map(|url| Hit::new(ImageRef::new(url, SOURCE)).with_confidence(0.8)))
    }
}

// ===== Artist image =====

/// `artist.getinfo`, largest available photo. Placeholder images are skipped.
pub struct LastFmArtistImageProvider {
    context: RemoteContext,
    api_key: String,
}

impl LastFmArtistImageProvider {
    pub fn new(context: RemoteContext, api_key: impl Into<String>) -> Self {
        Self {
            context,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Provider<ImageRef> for LastFmArtistImageProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::LASTFM
    }

    async fn fetch(&self, query: &Query, _limiter: &RateLimiter) -> Result<Option<Hit<ImageRef>>> {
        let url = get_images(&self.context, &self.api_key, query.artist_name(), None)
            .await?
            .and_then(|images| largest_image(&images));

        Ok(url.map(|url| Hit::new(ImageRef::new(url, SOURCE)).with_confidence(0.8)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, MockHttp};
    use std::sync::Arc;

    fn image(url: &str, size: &str) -> LastFmImage {
        LastFmImage {
            url: url.to_string(),
            size: size.to_string(),
        }
    }

    #[test]
    fn test_largest_image_preference() {
        let images = vec![
            image("https://lfm/s.png", "small"),
            image("https://lfm/l.png", "large"),
            image("", "mega"),
            image("https://lfm/xl.png", "extralarge"),
        ];
        assert_eq!(largest_image(&images).as_deref(), Some("https://lfm/xl.png"));

        let unsized_only = vec![image("", "medium"), image("https://lfm/x.png", "")];
        assert_eq!(largest_image(&unsized_only).as_deref(), Some("https://lfm/x.png"));

        assert!(largest_image(&[]).is_none());
    }

    #[test]
    fn test_placeholder_is_ignored() {
        let images = vec![image(
            "https://lastfm.freetls.fastly.net/i/u/300x300/2a96cbd8b46e442fc41c2b86b821562f.png",
            "extralarge",
        )];
        assert!(largest_image(&images).is_none());
    }

    #[tokio::test]
    async fn test_album_lookup() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| {
                r.url.contains("method=album.getinfo")
                    && r.url.contains("artist=Massive%20Attack")
                    && r.url.contains("album=Mezzanine")
            })
            .returning(|_| {
                Ok(json_response(
                    r##"{"album":{"image":[{"#text":"https://lfm/m.png","size":"medium"},{"#text":"https://lfm/mega.png","size":"mega"}]}}"##,
                ))
            });

        let provider = LastFmAlbumImageProvider::new(RemoteContext::new(Arc::new(mock)), "key");
        let hit = provider
            .fetch(
                &Query::new("Massive Attack", "Mezzanine"),
                &RateLimiter::unthrottled(),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.payload.url, "https://lfm/mega.png");
        assert_eq!(hit.payload.source, "Last.fm");
    }

    #[tokio::test]
    async fn test_not_found_error_is_none() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .returning(|_| Ok(json_response(r#"{"error":6,"message":"Artist not found"}"#)));

        let provider = LastFmArtistImageProvider::new(RemoteContext::new(Arc::new(mock)), "key");
        let result = provider
            .fetch(&Query::artist("Nobody"), &RateLimiter::unthrottled())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_other_api_errors_fail() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .returning(|_| Ok(json_response(r#"{"error":10,"message":"Invalid API key"}"#)));

        let provider = LastFmArtistImageProvider::new(RemoteContext::new(Arc::new(mock)), "bad");
        let result = provider
            .fetch(&Query::artist("Air"), &RateLimiter::unthrottled())
            .await;

        assert!(matches!(result, Err(MetadataError::RemoteApi(_))));
    }
}
