//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided HTTP bridge, the optional SQLite link
//! store and the configured provider chains into one ready-to-use
//! [`CoreService`]. Desktop hosts typically enable the `desktop-shims`
//! feature, which lets the configuration builder create a reqwest client
//! when none is injected.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::{EnrichmentConfig, MetadataApiConfig};
//! use core_service::{AlbumDescriptor, CoreService};
//!
//! let config = EnrichmentConfig::builder()
//!     .database_path("links.db")
//!     .metadata_api_config(MetadataApiConfig::from_env())
//!     .build()?;
//!
//! let core = CoreService::bootstrap(config).await?;
//! let album = core
//!     .enrich(&AlbumDescriptor::new("Portishead", "Dummy").with_track("Roads"))
//!     .await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_metadata::enrichment_service::{
    AlbumDescriptor, EnrichedAlbum, EnrichmentService, TrackDescriptor, TrackLyrics,
};

use core_library::db::{create_pool, DatabaseConfig};
use core_library::{LinkRepository, SqliteLinkRepository};
use core_runtime::EnrichmentConfig;
use std::sync::Arc;
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<EnrichmentConfig>,
    enrichment: Arc<EnrichmentService>,
    link_store: Option<Arc<dyn LinkRepository>>,
}

impl CoreService {
    /// Open the link store named in the configuration (if any) and build
    /// the enrichment service on top of it.
    pub async fn bootstrap(config: EnrichmentConfig) -> Result<Self> {
        config.validate()?;

        let link_store: Option<Arc<dyn LinkRepository>> = match &config.database_path {
            Some(path) => {
                let pool = create_pool(DatabaseConfig::new(path)).await?;
                Some(Arc::new(SqliteLinkRepository::new(pool)))
            }
            None => None,
        };

        Self::with_link_store(config, link_store)
    }

    /// Build from an already opened link store, or none.
    pub fn with_link_store(
        config: EnrichmentConfig,
        link_store: Option<Arc<dyn LinkRepository>>,
    ) -> Result<Self> {
        let enrichment = EnrichmentService::from_config(&config, link_store.clone())?;

        info!(
            link_store = link_store.is_some(),
            "Core service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            enrichment: Arc::new(enrichment),
            link_store,
        })
    }

    /// Resolve cover, artist image, lyrics, links and palette for an album.
    pub async fn enrich(&self, album: &AlbumDescriptor) -> Result<EnrichedAlbum> {
        Ok(self.enrichment.enrich(album).await?)
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    pub fn enrichment(&self) -> Arc<EnrichmentService> {
        Arc::clone(&self.enrichment)
    }

    pub fn link_store(&self) -> Option<Arc<dyn LinkRepository>> {
        self.link_store.clone()
    }
}
