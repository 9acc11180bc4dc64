//! Cache + throttle + chain composite

use super::cache::ResultCache;
use super::chain::ProviderChain;
use super::rate_limit::RateLimiter;
use super::result::{ArtifactKind, ArtifactResult, Payload};
use crate::error::Result;
use crate::query::Query;
use std::sync::Arc;
use tracing::debug;

/// Generic resolution primitive for one artifact kind.
///
/// Identical queries (same [`Query::cache_key`]) reach the providers at
/// most once per resolver lifetime; `Absent` outcomes are cached too.
///
/// ## Usage
///
/// ```ignore
/// let resolver = SourceResolver::new(
///     ProviderChain::new(ArtifactKind::AlbumCover)
///         .with_provider(Arc::new(musicbrainz))
///         .with_provider(Arc::new(lastfm)),
/// );
///
/// match resolver.resolve(&Query::new("Portishead", "Dummy")).await? {
///     ArtifactResult::Found { payload, source, .. } => println!("{} via {}", payload.url, source),
///     ArtifactResult::Absent { reason } => println!("no cover: {}", reason),
/// }
/// ```
pub struct SourceResolver<P: Payload> {
    chain: ProviderChain<P>,
    cache: ResultCache<ArtifactResult<P>>,
    limiter: Arc<RateLimiter>,
}

impl<P: Payload> SourceResolver<P> {
    /// Resolver with its own limiter at the default interval
    pub fn new(chain: ProviderChain<P>) -> Self {
        Self {
            chain,
            cache: ResultCache::new(),
            limiter: Arc::new(RateLimiter::default()),
        }
    }

    /// Use a limiter shared with other resolvers
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn kind(&self) -> ArtifactKind {
        self.chain.kind()
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Provider names in consultation order
    pub fn provider_names(&self) -> Vec<&str> {
        self.chain.provider_names()
    }

    /// Number of cached outcomes
    pub async fn cached_len(&self) -> usize {
        self.cache.len().await
    }

    /// Cached outcome, or run the chain and cache what it returns.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` when the query lacks a field this kind needs.
    pub async fn resolve(&self, query: &Query) -> Result<ArtifactResult<P>> {
        self.chain.kind().validate(query)?;

        let key = query.cache_key();
        let result = self
            .cache
            .get_or_compute(&key, || self.chain.run(query, &self.limiter))
            .await;

        Ok(result)
    }

    /// Bypass the cached outcome, run the chain and overwrite the entry.
    pub async fn refresh(&self, query: &Query) -> Result<ArtifactResult<P>> {
        self.chain.kind().validate(query)?;

        let key = query.cache_key();
        debug!(kind = self.kind().as_str(), key = %key, "Forced refresh");
        let result = self
            .cache
            .recompute(&key, || self.chain.run(query, &self.limiter))
            .await;

        Ok(result)
    }
}
