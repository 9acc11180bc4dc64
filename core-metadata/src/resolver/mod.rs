//! # Resolution Engine
//!
//! A [`SourceResolver`] composes three parts:
//!
//! - [`RateLimiter`] - minimum interval between calls to one source class
//! - [`ResultCache`] - memo of outcomes keyed by [`Query::cache_key`](crate::Query::cache_key)
//! - [`ProviderChain`] - ordered providers, first non-empty answer wins
//!
//! It is instantiated per artifact kind: cover and artist images, lyrics
//! and reference links.

mod cache;
mod chain;
mod rate_limit;
mod result;
mod source;

pub use cache::ResultCache;
pub use chain::{Provider, ProviderChain};
pub use rate_limit::{RateLimiter, SourceClass, DEFAULT_MIN_INTERVAL};
pub use result::{ArtifactKind, ArtifactResult, Hit, Payload, NO_PROVIDER_RESULT};
pub use source::SourceResolver;

use crate::artwork::ImageRef;
use crate::lyrics::Lyrics;
use crate::links::LinkEntry;

pub type ImageResolver = SourceResolver<ImageRef>;
pub type LyricsResolver = SourceResolver<Lyrics>;
pub type LinkResolver = SourceResolver<Vec<LinkEntry>>;
