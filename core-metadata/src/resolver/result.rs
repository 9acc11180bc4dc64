//! Resolution outcomes

use crate::error::{MetadataError, Result};
use crate::query::Query;
use serde::Serialize;

/// Reason recorded when every provider came back empty or failed
pub const NO_PROVIDER_RESULT: &str = "no provider produced a result";

/// Outcome of resolving one artifact.
///
/// `Absent` is a normal result, cached like `Found`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactResult<P> {
    Found {
        payload: P,
        /// Name of the provider that produced the payload
        source: String,
        confidence: f32,
    },
    Absent {
        reason: String,
    },
}

impl<P> ArtifactResult<P> {
    pub fn absent(reason: impl Into<String>) -> Self {
        Self::Absent {
            reason: reason.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            Self::Found { payload, .. } => Some(payload),
            Self::Absent { .. } => None,
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Found { source, .. } => Some(source),
            Self::Absent { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<P> {
        match self {
            Self::Found { payload, .. } => Some(payload),
            Self::Absent { .. } => None,
        }
    }
}

/// Value a provider can produce.
///
/// An empty payload counts as "nothing found" and the chain moves on.
pub trait Payload: Clone + Send + Sync + 'static {
    fn is_empty(&self) -> bool;
}

impl<T: Clone + Send + Sync + 'static> Payload for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

/// A provider's non-empty answer
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<P> {
    pub payload: P,
    /// 0.0 to 1.0
    pub confidence: f32,
}

impl<P> Hit<P> {
    pub fn new(payload: P) -> Self {
        Self {
            payload,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// What a resolver looks for. Decides which query fields are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    AlbumCover,
    ArtistImage,
    Lyrics,
    Links,
}

impl ArtifactKind {
    /// Reject queries missing a field this kind needs
    pub fn validate(&self, query: &Query) -> Result<()> {
        if query.artist_name().is_empty() {
            return Err(MetadataError::invalid_query(
                "artist",
                "artist must not be empty",
            ));
        }

        match self {
            ArtifactKind::AlbumCover if query.album_name().is_empty() => Err(
                MetadataError::invalid_query("album", "album cover lookup needs an album"),
            ),
            ArtifactKind::Lyrics if query.track_title().is_none() => Err(
                MetadataError::invalid_query("track_title", "lyrics lookup needs a track title"),
            ),
            _ => Ok(()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::AlbumCover => "album_cover",
            ArtifactKind::ArtistImage => "artist_image",
            ArtifactKind::Lyrics => "lyrics",
            ArtifactKind::Links => "links",
        }
    }
}
