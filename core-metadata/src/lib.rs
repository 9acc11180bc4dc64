//! # Album Enrichment
//!
//! Resolves cover art, artist images, lyrics and reference links for a
//! locally described album from ordered chains of external providers, and
//! derives a readable color palette from the cover.
//!
//! ## Overview
//!
//! - [`query`]: the normalized lookup key shared by every resolver
//! - [`resolver`]: rate limiter, result cache, provider chain and the
//!   [`SourceResolver`](resolver::SourceResolver) composing them
//! - [`providers`]: MusicBrainz, Last.fm, Discogs, Spotify, lyrics.ovh,
//!   LRCLib, constructed links and the local link store
//! - [`links`]: link categories and grouping
//! - [`color`]: dominant color extraction and WCAG-checked palettes
//! - [`enrichment_service`]: runs all resolvers for one album

pub mod artwork;
pub mod color;
pub mod enrichment_service;
pub mod error;
pub mod links;
pub mod lyrics;
pub mod providers;
pub mod query;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use artwork::ImageRef;
pub use color::{Palette, Rgb};
pub use enrichment_service::{
    AlbumDescriptor, EnrichedAlbum, EnrichmentService, TrackDescriptor, TrackLyrics,
};
pub use error::{MetadataError, Result};
pub use links::{categorize, group_by_category, LinkCategory, LinkEntry};
pub use lyrics::Lyrics;
pub use query::Query;
pub use resolver::{ArtifactKind, ArtifactResult, SourceResolver};
