//! # Enrichment Service
//!
//! Turns a locally described album into an [`EnrichedAlbum`]: cover, artist
//! image, per-track lyrics, reference links, dominant cover color and the
//! derived palette.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ EnrichmentService  │
//! │  - RateLimiter     │  (shared by every resolver)
//! └──────────┬─────────┘
//!            │
//!            ├──> cover        ImageResolver  ──> ColorExtractor ──> PaletteBuilder
//!            ├──> artist_image ImageResolver  (optional)
//!            ├──> lyrics       LyricsResolver (optional, one query per track)
//!            └──> links        LinkResolver   (optional)
//! ```
//!
//! The four resolutions run concurrently. A missing or undecodable cover
//! yields the neutral gray palette rather than an error.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::enrichment_service::{AlbumDescriptor, EnrichmentService};
//!
//! let service = EnrichmentService::from_config(&config, Some(store))?;
//!
//! let album = AlbumDescriptor::new("Portishead", "Dummy")
//!     .with_track("Mysterons")
//!     .with_track("Sour Times");
//!
//! let enriched = service.enrich(&album).await?;
//! println!("background {}", enriched.palette.background);
//! ```

use crate::artwork::{load_image_bytes, ImageRef};
use crate::color::{build_palette, extract_dominant, Palette, Rgb, FALLBACK_GRAY};
use crate::error::{MetadataError, Result};
use crate::links::LinkEntry;
use crate::lyrics::{is_searchable_title, Lyrics};
use crate::providers::{
    DiscogsCoverProvider, LastFmAlbumImageProvider, LastFmArtistImageProvider,
    LinkPatternProvider, LocalStoreImageProvider, LocalStoreLinkProvider, LrcLibProvider,
    LyricsOvhProvider, MusicBrainzCoverProvider, MusicBrainzRelationProvider, RemoteContext,
    SpotifyArtistImageProvider, DEFAULT_USER_AGENT,
};
use crate::query::Query;
use crate::resolver::{
    ArtifactKind, ArtifactResult, ImageResolver, LinkResolver, LyricsResolver, ProviderChain,
    RateLimiter, SourceClass,
};
use core_library::LinkRepository;
use core_runtime::EnrichmentConfig;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Reason recorded for artifacts whose feature flag is off
pub const DISABLED_REASON: &str = "disabled by configuration";

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub title: String,
    /// Track artist when it differs from the album artist
    pub artist: Option<String>,
}

/// An album as known locally, before enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDescriptor {
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub tracks: Vec<TrackDescriptor>,
    /// MusicBrainz release id, skips the release search when present
    #[serde(default)]
    pub external_id: Option<String>,
}

impl AlbumDescriptor {
    pub fn new(artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
            tracks: Vec::new(),
            external_id: None,
        }
    }

    pub fn with_track(mut self, title: impl Into<String>) -> Self {
        self.tracks.push(TrackDescriptor {
            title: title.into(),
            artist: None,
        });
        self
    }

    pub fn with_track_by(mut self, title: impl Into<String>, artist: impl Into<String>) -> Self {
        self.tracks.push(TrackDescriptor {
            title: title.into(),
            artist: Some(artist.into()),
        });
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    fn album_query(&self) -> Query {
        let query = Query::new(&self.artist, &self.album);
        match &self.external_id {
            Some(id) => query.with_external_id(id),
            None => query,
        }
    }

    /// Lyrics queries for tracks with a usable title, in track order
    fn track_queries(&self) -> Vec<(String, Query)> {
        self.tracks
            .iter()
            .filter(|track| is_searchable_title(&track.title))
            .map(|track| {
                let artist = track
                    .artist
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .unwrap_or(self.artist.as_str());
                let query = Query::new(artist, &self.album).with_track_title(&track.title);
                (track.title.clone(), query)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackLyrics {
    pub title: String,
    pub lyrics: ArtifactResult<Lyrics>,
}

/// Everything the rendering stage needs for one album
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedAlbum {
    pub artist: String,
    pub album: String,
    pub cover: ArtifactResult<ImageRef>,
    pub artist_image: ArtifactResult<ImageRef>,
    pub lyrics: Vec<TrackLyrics>,
    pub links: ArtifactResult<Vec<LinkEntry>>,
    pub dominant_color: Rgb,
    pub palette: Palette,
}

// =============================================================================
// Enrichment Service
// =============================================================================

/// Limiter class for downloading an image the named provider returned
fn download_class(source: &str) -> SourceClass {
    let source = source.to_lowercase();
    if source.contains("musicbrainz") {
        SourceClass::MUSICBRAINZ
    } else if source.contains("last.fm") {
        SourceClass::LASTFM
    } else if source.contains("discogs") {
        SourceClass::DISCOGS
    } else if source.contains("spotify") {
        SourceClass::SPOTIFY
    } else {
        SourceClass::new("image-download")
    }
}

pub struct EnrichmentService {
    context: RemoteContext,
    limiter: Arc<RateLimiter>,
    cover: ImageResolver,
    artist_image: Option<ImageResolver>,
    lyrics: Option<LyricsResolver>,
    links: Option<LinkResolver>,
}

impl EnrichmentService {
    /// Service with only cover resolution. The cover resolver is switched
    /// to `limiter`; add the optional resolvers with the `with_*` methods.
    pub fn new(context: RemoteContext, limiter: Arc<RateLimiter>, cover: ImageResolver) -> Self {
        Self {
            context,
            cover: cover.with_rate_limiter(limiter.clone()),
            limiter,
            artist_image: None,
            lyrics: None,
            links: None,
        }
    }

    pub fn with_artist_image(mut self, resolver: ImageResolver) -> Self {
        self.artist_image = Some(resolver.with_rate_limiter(self.limiter.clone()));
        self
    }

    pub fn with_lyrics(mut self, resolver: LyricsResolver) -> Self {
        self.lyrics = Some(resolver.with_rate_limiter(self.limiter.clone()));
        self
    }

    pub fn with_links(mut self, resolver: LinkResolver) -> Self {
        self.links = Some(resolver.with_rate_limiter(self.limiter.clone()));
        self
    }

    /// Build every provider chain from configuration.
    ///
    /// Chains, highest priority first:
    /// - cover: MusicBrainz (needs a user agent), Last.fm (needs a key), Discogs
    /// - artist image: local store, Last.fm, Spotify (needs credentials)
    /// - lyrics: lyrics.ovh, LRCLib
    /// - links: local store, constructed links, MusicBrainz relations
    ///   (needs `enable_link_relations` and a user agent)
    ///
    /// # Errors
    ///
    /// Invalid configuration or no HTTP client.
    pub fn from_config(
        config: &EnrichmentConfig,
        repository: Option<Arc<dyn LinkRepository>>,
    ) -> Result<Self> {
        config.validate()?;
        let http_client = config.require_http_client()?;
        let api = &config.metadata_api_config;
        let features = &config.features;

        let context = RemoteContext::new(http_client)
            .with_user_agent(api.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .with_timeout(api.request_timeout());
        let limiter = Arc::new(RateLimiter::new(api.rate_limit_interval()));

        let mut cover = ProviderChain::new(ArtifactKind::AlbumCover);
        if api.has_musicbrainz() {
            cover.push(Arc::new(MusicBrainzCoverProvider::new(context.clone())));
        }
        if let Some(key) = &api.lastfm_api_key {
            cover.push(Arc::new(LastFmAlbumImageProvider::new(context.clone(), key)));
        }
        let mut discogs = DiscogsCoverProvider::new(context.clone());
        if let Some(token) = &api.discogs_token {
            discogs = discogs.with_token(token);
        }
        cover.push(Arc::new(discogs));

        let mut service = Self::new(context.clone(), limiter, ImageResolver::new(cover));

        if features.enable_artist_image {
            let mut chain = ProviderChain::new(ArtifactKind::ArtistImage);
            if let Some(repository) = &repository {
                chain.push(Arc::new(LocalStoreImageProvider::new(repository.clone())));
            }
            if let Some(key) = &api.lastfm_api_key {
                chain.push(Arc::new(LastFmArtistImageProvider::new(context.clone(), key)));
            }
            if let (Some(id), Some(secret)) = (&api.spotify_client_id, &api.spotify_client_secret) {
                chain.push(Arc::new(SpotifyArtistImageProvider::new(
                    context.clone(),
                    id,
                    secret,
                )));
            }
            service = service.with_artist_image(ImageResolver::new(chain));
        }

        if features.enable_lyrics {
            let chain = ProviderChain::new(ArtifactKind::Lyrics)
                .with_provider(Arc::new(LyricsOvhProvider::new(context.clone())))
                .with_provider(Arc::new(LrcLibProvider::new(context.clone())));
            service = service.with_lyrics(LyricsResolver::new(chain));
        }

        if features.enable_links {
            let mut chain = ProviderChain::new(ArtifactKind::Links);
            if let Some(repository) = &repository {
                chain.push(Arc::new(LocalStoreLinkProvider::new(repository.clone())));
            }
            chain.push(Arc::new(LinkPatternProvider::new(
                context.clone(),
                api.wikipedia_languages.clone(),
            )));
            if features.enable_link_relations && api.has_musicbrainz() {
                chain.push(Arc::new(MusicBrainzRelationProvider::new(context.clone())));
            }
            service = service.with_links(LinkResolver::new(chain));
        }

        info!(
            cover = ?service.cover.provider_names(),
            artist_image = ?service.artist_image.as_ref().map(|r| r.provider_names()),
            lyrics = ?service.lyrics.as_ref().map(|r| r.provider_names()),
            links = ?service.links.as_ref().map(|r| r.provider_names()),
            "Enrichment service ready"
        );
        Ok(service)
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn cover_resolver(&self) -> &ImageResolver {
        &self.cover
    }

    pub fn link_resolver(&self) -> Option<&LinkResolver> {
        self.links.as_ref()
    }

    /// Resolve everything known about an album.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` for a blank artist or album name, before any provider
    /// runs. Provider failures never surface here; they end up as `Absent`.
    #[instrument(skip(self, album), fields(artist = %album.artist, album = %album.album))]
    pub async fn enrich(&self, album: &AlbumDescriptor) -> Result<EnrichedAlbum> {
        let album_query = album.album_query();
        ArtifactKind::AlbumCover.validate(&album_query)?;
        let artist_query = Query::artist(album_query.artist_name());

        let cover_and_color = async {
            let cover = self.cover.resolve(&album_query).await?;
            let dominant = match cover.payload() {
                Some(image) => self.dominant_color(image).await,
                None => FALLBACK_GRAY,
            };
            Ok::<_, MetadataError>((cover, dominant))
        };

        let artist_image = async {
            match &self.artist_image {
                Some(resolver) => resolver.resolve(&artist_query).await,
                None => Ok(ArtifactResult::absent(DISABLED_REASON)),
            }
        };

        let lyrics = self.resolve_lyrics(album);

        let links = async {
            match &self.links {
                Some(resolver) => resolver.resolve(&album_query).await,
                None => Ok(ArtifactResult::absent(DISABLED_REASON)),
            }
        };

        let (cover_and_color, artist_image, lyrics, links) =
            tokio::join!(cover_and_color, artist_image, lyrics, links);
        let (cover, dominant_color) = cover_and_color?;

        let enriched = EnrichedAlbum {
            artist: album_query.artist_name().to_string(),
            album: album_query.album_name().to_string(),
            cover,
            artist_image: artist_image?,
            lyrics: lyrics?,
            links: links?,
            dominant_color,
            palette: build_palette(dominant_color),
        };

        info!(
            cover = enriched.cover.is_found(),
            artist_image = enriched.artist_image.is_found(),
            lyrics = enriched.lyrics.iter().filter(|t| t.lyrics.is_found()).count(),
            links = enriched.links.payload().map_or(0, Vec::len),
            dominant = %enriched.dominant_color,
            "Album enriched"
        );
        Ok(enriched)
    }

    async fn resolve_lyrics(&self, album: &AlbumDescriptor) -> Result<Vec<TrackLyrics>> {
        let Some(resolver) = &self.lyrics else {
            return Ok(Vec::new());
        };

        let queries = album.track_queries();
        let skipped = album.tracks.len() - queries.len();
        if skipped > 0 {
            debug!(skipped, "Skipping tracks without a searchable title");
        }

        let results = join_all(queries.iter().map(|(_, query)| resolver.resolve(query))).await;

        queries
            .into_iter()
            .zip(results)
            .map(|((title, _), result)| Ok(TrackLyrics { title, lyrics: result? }))
            .collect()
    }

    /// Dominant color of the cover, gray when it cannot be loaded
    async fn dominant_color(&self, image: &ImageRef) -> Rgb {
        if !image.is_local() {
            self.limiter.acquire(download_class(&image.source)).await;
        }

        match load_image_bytes(
            self.context.http_client.as_ref(),
            image,
            Some(&self.context.user_agent),
            self.context.timeout,
        )
        .await
        {
            Ok(bytes) => extract_dominant(&bytes),
            Err(e) => {
                warn!(source = %image.source, error = %e, "Cover download failed, using fallback color");
                FALLBACK_GRAY
            }
        }
    }
}
