//! Link store repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{AlbumRecord, ArtistRecord};
use crate::normalize::{escape_like, normalize_for_search};
use async_trait::async_trait;
use sqlx::{query_as, query_scalar, SqlitePool};
use tracing::debug;

/// Lookup contract for the local link store.
///
/// Name lookups normalize their input (see
/// [`normalize_for_search`]) and try an exact match before a partial one.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Find an artist by name
    ///
    /// # Returns
    /// - `Ok(Some(artist))` on an exact or partial name match
    /// - `Ok(None)` if nothing matches or the name is blank
    async fn find_artist(&self, name: &str) -> Result<Option<ArtistRecord>>;

    /// Find an album of the named artist
    async fn find_album(&self, artist: &str, album: &str) -> Result<Option<AlbumRecord>>;

    /// Insert or update an artist keyed by its normalized name
    ///
    /// Returns the row id.
    async fn save_artist(&self, artist: &ArtistRecord) -> Result<i64>;

    /// Insert or update an album keyed by (artist, normalized name)
    ///
    /// Returns the row id.
    async fn save_album(&self, album: &AlbumRecord) -> Result<i64>;
}

/// SQLite implementation of LinkRepository
pub struct SqliteLinkRepository {
    pool: SqlitePool,
}

impl SqliteLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_artist_by_key(&self, key: &str) -> Result<Option<ArtistRecord>> {
        let exact = query_as::<_, ArtistRecord>("SELECT * FROM artists WHERE normalized_name = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        if exact.is_some() {
            return Ok(exact);
        }

        let partial = query_as::<_, ArtistRecord>(
            r#"
            SELECT * FROM artists
            WHERE normalized_name LIKE ? ESCAPE '\'
            ORDER BY length(normalized_name) ASC
            LIMIT 1
            "#,
        )
        .bind(format!("%{}%", escape_like(key)))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(artist) = &partial {
            debug!(query = %key, matched = %artist.name, "Artist matched partially");
        }

        Ok(partial)
    }
}

#[async_trait]
impl LinkRepository for SqliteLinkRepository {
    async fn find_artist(&self, name: &str) -> Result<Option<ArtistRecord>> {
        let key = normalize_for_search(name);
        if key.is_empty() {
            return Ok(None);
        }

        self.find_artist_by_key(&key).await
    }

    async fn find_album(&self, artist: &str, album: &str) -> Result<Option<AlbumRecord>> {
        let album_key = normalize_for_search(album);
        if album_key.is_empty() {
            return Ok(None);
        }

        let Some(artist) = self.find_artist(artist).await? else {
            return Ok(None);
        };

        let exact = query_as::<_, AlbumRecord>(
            "SELECT * FROM albums WHERE artist_id = ? AND normalized_name = ?",
        )
        .bind(artist.id)
        .bind(&album_key)
        .fetch_optional(&self.pool)
        .await?;

        if exact.is_some() {
            return Ok(exact);
        }

        let partial = query_as::<_, AlbumRecord>(
            r#"
            SELECT * FROM albums
            WHERE artist_id = ? AND normalized_name LIKE ? ESCAPE '\'
            ORDER BY length(normalized_name) ASC
            LIMIT 1
            "#,
        )
        .bind(artist.id)
        .bind(format!("%{}%", escape_like(&album_key)))
        .fetch_optional(&self.pool)
        .await?;

        Ok(partial)
    }

    async fn save_artist(&self, artist: &ArtistRecord) -> Result<i64> {
        artist.validate().map_err(|e| LibraryError::InvalidInput {
            field: "ArtistRecord".to_string(),
            message: e,
        })?;

        let id = query_scalar::<_, i64>(
            r#"
            INSERT INTO artists (
                name, normalized_name, spotify_url, youtube_url, musicbrainz_url,
                discogs_url, rateyourmusic_url, wikipedia_url, bandcamp_url,
                lastfm_url, website, img_paths, img, img_urls
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(normalized_name) DO UPDATE SET
                name = excluded.name,
                spotify_url = excluded.spotify_url,
                youtube_url = excluded.youtube_url,
                musicbrainz_url = excluded.musicbrainz_url,
                discogs_url = excluded.discogs_url,
                rateyourmusic_url = excluded.rateyourmusic_url,
                wikipedia_url = excluded.wikipedia_url,
                bandcamp_url = excluded.bandcamp_url,
                lastfm_url = excluded.lastfm_url,
                website = excluded.website,
                img_paths = excluded.img_paths,
                img = excluded.img,
                img_urls = excluded.img_urls
            RETURNING id
            "#,
        )
        .bind(&artist.name)
        .bind(normalize_for_search(&artist.name))
        .bind(&artist.urls.spotify_url)
        .bind(&artist.urls.youtube_url)
        .bind(&artist.urls.musicbrainz_url)
        .bind(&artist.urls.discogs_url)
        .bind(&artist.urls.rateyourmusic_url)
        .bind(&artist.urls.wikipedia_url)
        .bind(&artist.urls.bandcamp_url)
        .bind(&artist.urls.lastfm_url)
        .bind(&artist.website)
        .bind(&artist.image_path)
        .bind(&artist.image_url)
        .bind(&artist.image_urls)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn save_album(&self, album: &AlbumRecord) -> Result<i64> {
        album.validate().map_err(|e| LibraryError::InvalidInput {
            field: "AlbumRecord".to_string(),
            message: e,
        })?;

        let id = query_scalar::<_, i64>(
            r#"
            INSERT INTO albums (
                artist_id, name, normalized_name, spotify_url, youtube_url,
                musicbrainz_url, discogs_url, rateyourmusic_url, wikipedia_url,
                bandcamp_url, lastfm_url, musicbrainz_albumid
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(artist_id, normalized_name) DO UPDATE SET
                name = excluded.name,
                spotify_url = excluded.spotify_url,
                youtube_url = excluded.youtube_url,
                musicbrainz_url = excluded.musicbrainz_url,
                discogs_url = excluded.discogs_url,
                rateyourmusic_url = excluded.rateyourmusic_url,
                wikipedia_url = excluded.wikipedia_url,
                bandcamp_url = excluded.bandcamp_url,
                lastfm_url = excluded.lastfm_url,
                musicbrainz_albumid = excluded.musicbrainz_albumid
            RETURNING id
            "#,
        )
        .bind(album.artist_id)
        .bind(&album.name)
        .bind(normalize_for_search(&album.name))
        .bind(&album.urls.spotify_url)
        .bind(&album.urls.youtube_url)
        .bind(&album.urls.musicbrainz_url)
        .bind(&album.urls.discogs_url)
        .bind(&album.urls.rateyourmusic_url)
        .bind(&album.urls.wikipedia_url)
        .bind(&album.urls.bandcamp_url)
        .bind(&album.urls.lastfm_url)
        .bind(&album.musicbrainz_albumid)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
