//! Providers backed by the local link store
//!
//! Both consult a [`LinkRepository`] and never touch the network, so their
//! source class carries no throttle.

use crate::artwork::ImageRef;
use crate::error::Result;
use crate::links::LinkEntry;
use crate::query::Query;
use crate::resolver::{Hit, Provider, RateLimiter, SourceClass};
use async_trait::async_trait;
use core_library::LinkRepository;
use std::sync::Arc;
use tracing::debug;

const SOURCE: &str = "Local store";

/// Stored album links followed by stored artist links
pub struct LocalStoreLinkProvider {
    repository: Arc<dyn LinkRepository>,
}

impl LocalStoreLinkProvider {
    pub fn new(repository: Arc<dyn LinkRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Provider<Vec<LinkEntry>> for LocalStoreLinkProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::LOCAL_STORE
    }

    async fn fetch(
        &self,
        query: &Query,
        _limiter: &RateLimiter,
    ) -> Result<Option<Hit<Vec<LinkEntry>>>> {
        let mut links: Vec<LinkEntry> = Vec::new();
        let mut push = |title: &str, url: String| {
            if !links.iter().any(|l| l.url == url) {
                links.push(LinkEntry::new(url, title, SOURCE));
            }
        };

        if !query.album_name().is_empty() {
            if let Some(album) = self
                .repository
                .find_album(query.artist_name(), query.album_name())
                .await?
            {
                for (title, url) in album.links() {
                    push(title, url);
                }
            }
        }

        if let Some(artist) = self.repository.find_artist(query.artist_name()).await? {
            for (title, url) in artist.links() {
                push(title, url);
            }
        }

        debug!(count = links.len(), artist = query.artist_name(), "Stored links");
        Ok((!links.is_empty()).then(|| Hit::new(links)))
    }
}

/// Stored artist image: a local file if it exists, else the first remote URL
pub struct LocalStoreImageProvider {
    repository: Arc<dyn LinkRepository>,
}

impl LocalStoreImageProvider {
    pub fn new(repository: Arc<dyn LinkRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Provider<ImageRef> for LocalStoreImageProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::LOCAL_STORE
    }

    async fn fetch(&self, query: &Query, _limiter: &RateLimiter) -> Result<Option<Hit<ImageRef>>> {
        let Some(artist) = self.repository.find_artist(query.artist_name()).await? else {
            return Ok(None);
        };

        for candidate in artist.image_candidates() {
            let image = ImageRef::new(candidate, SOURCE);
            if !image.is_local() {
                return Ok(Some(Hit::new(image)));
            }
            match tokio::fs::metadata(&image.url).await {
                Ok(meta) if meta.is_file() => return Ok(Some(Hit::new(image))),
                _ => debug!(path = %image.url, "Stored image path missing, skipping"),
            }
        }

        Ok(None)
    }
}
