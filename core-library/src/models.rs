//! Row models for the local link store

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::normalize::normalize_for_search;

// =============================================================================
// Typed URL fields
// =============================================================================

/// Per-service reference URLs shared by artist and album rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ServiceUrls {
    pub spotify_url: Option<String>,
    pub youtube_url: Option<String>,
    pub musicbrainz_url: Option<String>,
    pub discogs_url: Option<String>,
    pub rateyourmusic_url: Option<String>,
    pub wikipedia_url: Option<String>,
    pub bandcamp_url: Option<String>,
    pub lastfm_url: Option<String>,
}

impl ServiceUrls {
    /// Non-blank URLs paired with the service's display name, in column order.
    pub fn labelled(&self) -> Vec<(&'static str, String)> {
        [
            ("Spotify", &self.spotify_url),
            ("YouTube", &self.youtube_url),
            ("MusicBrainz", &self.musicbrainz_url),
            ("Discogs", &self.discogs_url),
            ("Rate Your Music", &self.rateyourmusic_url),
            ("Wikipedia", &self.wikipedia_url),
            ("Bandcamp", &self.bandcamp_url),
            ("Last.fm", &self.lastfm_url),
        ]
        .into_iter()
        .filter_map(|(label, url)| non_blank(url).map(|url| (label, url)))
        .collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Artist
// =============================================================================

/// Artist row: reference URLs, official website and image locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArtistRecord {
    pub id: i64,
    pub name: String,
    /// Search key, see [`normalize_for_search`]
    pub normalized_name: String,
    #[sqlx(flatten)]
    pub urls: ServiceUrls,
    pub website: Option<String>,
    /// Local image file
    #[sqlx(rename = "img_paths")]
    pub image_path: Option<String>,
    /// Single remote image URL
    #[sqlx(rename = "img")]
    pub image_url: Option<String>,
    /// Newline-separated remote image URLs
    #[sqlx(rename = "img_urls")]
    pub image_urls: Option<String>,
}

impl ArtistRecord {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            normalized_name: normalize_for_search(&name),
            name,
            ..Self::default()
        }
    }

    pub fn with_urls(mut self, urls: ServiceUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_image_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = urls
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        self.image_urls = Some(joined);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Artist name cannot be empty".to_string());
        }
        Ok(())
    }

    /// Labelled links: service URLs followed by the official website.
    pub fn links(&self) -> Vec<(&'static str, String)> {
        let mut links = self.urls.labelled();
        if let Some(website) = non_blank(&self.website) {
            links.push(("Official Website", website));
        }
        links
    }

    /// Remote image URLs from the newline-separated column.
    pub fn remote_image_urls(&self) -> Vec<String> {
        self.image_urls
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Image candidates in priority order: local path, single URL, URL list.
    pub fn image_candidates(&self) -> Vec<String> {
        non_blank(&self.image_path)
            .into_iter()
            .chain(non_blank(&self.image_url))
            .chain(self.remote_image_urls())
            .collect()
    }
}

// =============================================================================
// Album
// =============================================================================

/// Album row, owned by an artist row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AlbumRecord {
    pub id: i64,
    pub artist_id: i64,
    pub name: String,
    pub normalized_name: String,
    #[sqlx(flatten)]
    pub urls: ServiceUrls,
    /// MusicBrainz release id
    pub musicbrainz_albumid: Option<String>,
}

impl AlbumRecord {
    pub fn new(artist_id: i64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            artist_id,
            normalized_name: normalize_for_search(&name),
            name,
            ..Self::default()
        }
    }

    pub fn with_urls(mut self, urls: ServiceUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_musicbrainz_albumid(mut self, mbid: impl Into<String>) -> Self {
        self.musicbrainz_albumid = Some(mbid.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Album name cannot be empty".to_string());
        }
        Ok(())
    }

    /// Labelled links: service URLs followed by the MusicBrainz release page.
    pub fn links(&self) -> Vec<(&'static str, String)> {
        let mut links = self.urls.labelled();
        if let Some(mbid) = non_blank(&self.musicbrainz_albumid) {
            links.push((
                "MusicBrainz Release",
                format!("https://musicbrainz.org/release/{}", mbid),
            ));
        }
        links
    }
}
