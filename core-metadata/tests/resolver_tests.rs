//! Integration tests for SourceResolver
//!
//! Covers the caching, fallback and validation behavior shared by every
//! artifact kind, using counting fake providers.

use async_trait::async_trait;
use core_metadata::artwork::ImageRef;
use core_metadata::resolver::{
    ArtifactKind, ArtifactResult, Hit, Payload, Provider, ProviderChain, RateLimiter,
    SourceClass, SourceResolver, NO_PROVIDER_RESULT,
};
use core_metadata::{MetadataError, Query, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a fake provider answers
#[derive(Clone)]
enum Answer<P> {
    Found(P),
    Nothing,
    Fail,
}

struct CountingProvider<P> {
    name: &'static str,
    class: SourceClass,
    answer: Answer<P>,
    calls: Arc<AtomicUsize>,
}

impl<P: Payload> CountingProvider<P> {
    fn new(name: &'static str, answer: Answer<P>) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(Self {
            name,
            class: SourceClass::new("fake"),
            answer,
            calls: calls.clone(),
        });
        (provider, calls)
    }
}

#[async_trait]
impl<P: Payload> Provider<P> for CountingProvider<P> {
    fn name(&self) -> &str {
        self.name
    }

    fn source_class(&self) -> SourceClass {
        self.class
    }

    async fn fetch(&self, _query: &Query, _limiter: &RateLimiter) -> Result<Option<Hit<P>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;

        match &self.answer {
            Answer::Found(payload) => Ok(Some(Hit::new(payload.clone()))),
            Answer::Nothing => Ok(None),
            Answer::Fail => Err(MetadataError::NetworkError("connection reset".to_string())),
        }
    }
}

fn cover(url: &str) -> ImageRef {
    ImageRef::new(url, "fake")
}

fn resolver(chain: ProviderChain<ImageRef>) -> SourceResolver<ImageRef> {
    SourceResolver::new(chain).with_rate_limiter(Arc::new(RateLimiter::unthrottled()))
}

#[tokio::test]
async fn test_first_non_empty_answer_wins() {
    let (failing, failing_calls) = CountingProvider::new("failing", Answer::Fail);
    let (empty, empty_calls) = CountingProvider::new("empty", Answer::Nothing);
    let (hit, hit_calls) =
        CountingProvider::new("hit", Answer::Found(cover("https://img/cover.jpg")));
    let (later, later_calls) =
        CountingProvider::new("later", Answer::Found(cover("https://img/other.jpg")));

    let resolver = resolver(
        ProviderChain::new(ArtifactKind::AlbumCover)
            .with_provider(failing)
            .with_provider(empty)
            .with_provider(hit)
            .with_provider(later),
    );

    let result = resolver
        .resolve(&Query::new("Portishead", "Dummy"))
        .await
        .unwrap();

    match result {
        ArtifactResult::Found { payload, source, .. } => {
            assert_eq!(payload.url, "https://img/cover.jpg");
            assert_eq!(source, "hit");
        }
        other => panic!("expected a found cover, got {:?}", other),
    }
    assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(empty_calls.load(Ordering::SeqCst), 1);
    assert_eq!(hit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chain_resolve_stops_at_second_provider() {
    let (empty, _) = CountingProvider::new("empty", Answer::Nothing);
    let (second, _) = CountingProvider::new("Y", Answer::Found(ImageRef::new("X", "Y")));
    let (third, third_calls) = CountingProvider::new("third", Answer::Found(cover("Z")));

    let chain = ProviderChain::new(ArtifactKind::ArtistImage)
        .with_provider(empty)
        .with_provider(second)
        .with_provider(third);

    let result = chain
        .resolve(&Query::artist("Mogwai"), &RateLimiter::unthrottled())
        .await
        .unwrap();

    assert_eq!(result.payload(), Some(&ImageRef::new("X", "Y")));
    assert_eq!(result.source(), Some("Y"));
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_payload_counts_as_no_result() {
    let (blank, _) = CountingProvider::new("blank", Answer::Found(cover("   ")));
    let (hit, _) = CountingProvider::new("hit", Answer::Found(cover("https://img/a.jpg")));

    let resolver = resolver(
        ProviderChain::new(ArtifactKind::AlbumCover)
            .with_provider(blank)
            .with_provider(hit),
    );

    let result = resolver.resolve(&Query::new("Air", "Moon Safari")).await.unwrap();
    assert_eq!(result.source(), Some("hit"));
}

#[tokio::test]
async fn test_identical_queries_reach_providers_once() {
    let (provider, calls) =
        CountingProvider::new("only", Answer::Found(cover("https://img/cover.jpg")));
    let resolver = resolver(ProviderChain::new(ArtifactKind::AlbumCover).with_provider(provider));

    let first = resolver.resolve(&Query::new("Björk", "Homogenic")).await.unwrap();
    // Same cache key after normalization
    let second = resolver.resolve(&Query::new("  BJORK ", "homogenic")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.cached_len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_queries_share_one_resolution() {
    let (provider, calls) =
        CountingProvider::new("only", Answer::Found(cover("https://img/cover.jpg")));
    let resolver = Arc::new(resolver(
        ProviderChain::new(ArtifactKind::AlbumCover).with_provider(provider),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(&Query::new("Low", "Things We Lost")).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_found());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_absent_outcome_is_cached() {
    let (empty, calls) = CountingProvider::<ImageRef>::new("empty", Answer::Nothing);
    let resolver = resolver(ProviderChain::new(ArtifactKind::AlbumCover).with_provider(empty));
    let query = Query::new("Nobody", "Nothing");

    for _ in 0..3 {
        let result = resolver.resolve(&query).await.unwrap();
        assert_eq!(result, ArtifactResult::absent(NO_PROVIDER_RESULT));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_chain_is_absent() {
    let resolver = resolver(ProviderChain::<ImageRef>::new(ArtifactKind::ArtistImage));
    let result = resolver.resolve(&Query::artist("Anyone")).await.unwrap();
    assert!(!result.is_found());
}

#[tokio::test]
async fn test_refresh_overwrites_cached_entry() {
    let (provider, calls) =
        CountingProvider::new("only", Answer::Found(cover("https://img/cover.jpg")));
    let resolver = resolver(ProviderChain::new(ArtifactKind::AlbumCover).with_provider(provider));
    let query = Query::new("Slowdive", "Souvlaki");

    resolver.resolve(&query).await.unwrap();
    resolver.refresh(&query).await.unwrap();
    resolver.resolve(&query).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.cached_len().await, 1);
}

#[tokio::test]
async fn test_invalid_query_rejected_before_providers() {
    let (provider, calls) =
        CountingProvider::new("only", Answer::Found(cover("https://img/cover.jpg")));
    let resolver = resolver(ProviderChain::new(ArtifactKind::AlbumCover).with_provider(provider));

    let blank_artist = resolver.resolve(&Query::new("   ", "Dummy")).await;
    assert!(matches!(blank_artist, Err(MetadataError::InvalidQuery { .. })));

    let no_album = resolver.resolve(&Query::artist("Portishead")).await;
    assert!(no_album.unwrap_err().is_invalid_query());

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(resolver.cached_len().await, 0);
}

#[tokio::test]
async fn test_provider_calls_are_spaced_by_the_limiter() {
    let (first, _) = CountingProvider::<ImageRef>::new("first", Answer::Nothing);
    let (second, _) = CountingProvider::<ImageRef>::new("second", Answer::Nothing);

    // Both fakes share one source class
    let resolver = SourceResolver::new(
        ProviderChain::new(ArtifactKind::AlbumCover)
            .with_provider(first)
            .with_provider(second),
    )
    .with_rate_limiter(Arc::new(RateLimiter::new(Duration::from_millis(60))));

    let started = tokio::time::Instant::now();
    resolver.resolve(&Query::new("Talk Talk", "Laughing Stock")).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(60));
}
