//! Resolution query and its cache key

use core_library::normalize::normalize_for_search;
use serde::Serialize;

/// Identity of the thing being enriched.
///
/// Immutable once built. Two queries that differ only in case, accents,
/// quotes or spacing share a [`cache_key`](Query::cache_key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    artist: String,
    album: String,
    track_title: Option<String>,
    external_id: Option<String>,
}

impl Query {
    pub fn new(artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into().trim().to_string(),
            album: album.into().trim().to_string(),
            track_title: None,
            external_id: None,
        }
    }

    /// Artist-only query (artist image, artist links)
    pub fn artist(artist: impl Into<String>) -> Self {
        Self::new(artist, "")
    }

    pub fn with_track_title(mut self, title: impl Into<String>) -> Self {
        self.track_title = non_blank(title.into());
        self
    }

    /// Service identifier known up front (e.g. a MusicBrainz release id)
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = non_blank(id.into());
        self
    }

    pub fn artist_name(&self) -> &str {
        &self.artist
    }

    pub fn album_name(&self) -> &str {
        &self.album
    }

    pub fn track_title(&self) -> Option<&str> {
        self.track_title.as_deref()
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// Normalized, tagged concatenation of the non-empty fields.
    ///
    /// Tags keep `("A", "B")` as artist/album apart from `("A", "")` with
    /// track "B".
    pub fn cache_key(&self) -> String {
        let fields = [
            ("a", Some(self.artist.as_str())),
            ("l", Some(self.album.as_str())),
            ("t", self.track_title.as_deref()),
        ];

        let mut parts: Vec<String> = fields
            .into_iter()
            .filter_map(|(tag, value)| {
                let normalized = normalize_for_search(value?);
                (!normalized.is_empty()).then(|| format!("{}:{}", tag, normalized))
            })
            .collect();

        if let Some(id) = &self.external_id {
            parts.push(format!("x:{}", id.to_lowercase()));
        }

        parts.join("|")
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
