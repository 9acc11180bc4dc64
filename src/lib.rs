//! Workspace placeholder crate.
//!
//! Host applications depend on `album-enrichment` and get the façade, the
//! enrichment types and the configuration in one place, without wiring the
//! individual workspace crates.

pub use core_metadata::{
    categorize, group_by_category, AlbumDescriptor, ArtifactResult, EnrichedAlbum, ImageRef,
    LinkCategory, LinkEntry, Lyrics, Palette, Query, Rgb,
};
pub use core_runtime::{EnrichmentConfig, FeatureFlags, MetadataApiConfig};
pub use core_service::{CoreError, CoreService, Result};
