//! Ordered provider fallback

use super::rate_limit::{RateLimiter, SourceClass};
use super::result::{ArtifactKind, ArtifactResult, Hit, Payload, NO_PROVIDER_RESULT};
use crate::error::Result;
use crate::query::Query;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One external data source tried within a chain.
///
/// The chain acquires the provider's [`SourceClass`] before calling
/// [`fetch`](Provider::fetch); a provider that issues further requests
/// acquires the limiter again before each of them.
#[async_trait]
pub trait Provider<P: Payload>: Send + Sync {
    /// Label recorded as the `source` of a found result
    fn name(&self) -> &str;

    fn source_class(&self) -> SourceClass;

    /// # Returns
    /// - `Ok(Some(hit))` - data found
    /// - `Ok(None)` - the source has nothing for this query
    /// - `Err` - transient failure, the chain moves on
    async fn fetch(&self, query: &Query, limiter: &RateLimiter) -> Result<Option<Hit<P>>>;
}

/// Providers for one artifact kind, in priority order.
///
/// The first non-empty answer wins and later providers are not invoked.
/// Failures never abort the chain.
pub struct ProviderChain<P: Payload> {
    kind: ArtifactKind,
    providers: Vec<Arc<dyn Provider<P>>>,
}

impl<P: Payload> ProviderChain<P> {
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            providers: Vec::new(),
        }
    }

    /// Append a provider at the lowest priority
    pub fn with_provider(mut self, provider: Arc<dyn Provider<P>>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn push(&mut self, provider: Arc<dyn Provider<P>>) {
        self.providers.push(provider);
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Validate the query, then try each provider in order.
    ///
    /// # Errors
    ///
    /// Only [`MetadataError::InvalidQuery`](crate::MetadataError::InvalidQuery),
    /// before any provider runs.
    pub async fn resolve(&self, query: &Query, limiter: &RateLimiter) -> Result<ArtifactResult<P>> {
        self.kind.validate(query)?;
        Ok(self.run(query, limiter).await)
    }

    /// Try each provider in order. The query must already be valid.
    pub(crate) async fn run(&self, query: &Query, limiter: &RateLimiter) -> ArtifactResult<P> {
        for provider in &self.providers {
            limiter.acquire(provider.source_class()).await;

            match provider.fetch(query, limiter).await {
                Ok(Some(hit)) if !hit.payload.is_empty() => {
                    info!(
                        kind = self.kind.as_str(),
                        provider = provider.name(),
                        artist = %query.artist_name(),
                        "Provider produced a result"
                    );
                    return ArtifactResult::Found {
                        payload: hit.payload,
                        source: provider.name().to_string(),
                        confidence: hit.confidence,
                    };
                }
                Ok(_) => {
                    debug!(
                        kind = self.kind.as_str(),
                        provider = provider.name(),
                        "Provider had no result"
                    );
                }
                Err(e) => {
                    warn!(
                        kind = self.kind.as_str(),
                        provider = provider.name(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                }
            }
        }

        info!(
            kind = self.kind.as_str(),
            artist = %query.artist_name(),
            providers = self.providers.len(),
            "No provider produced a result"
        );
        ArtifactResult::absent(NO_PROVIDER_RESULT)
    }
}
