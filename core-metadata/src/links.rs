//! Reference links and their categories

use serde::{Deserialize, Serialize};
use std::fmt;

const SOCIAL_KEYWORDS: &[&str] = &["twitter", "facebook", "instagram", "bluesky", "tiktok"];
const STREAMING_KEYWORDS: &[&str] = &["spotify", "apple", "youtube", "bandcamp"];
const INFO_KEYWORDS: &[&str] = &[
    "wikipedia",
    "discogs",
    "musicbrainz",
    "lastfm",
    "last.fm",
    "genius",
];
const OFFICIAL_KEYWORDS: &[&str] = &["official", "website", "homepage"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    Official,
    Streaming,
    Social,
    Info,
    Other,
}

impl LinkCategory {
    /// Presentation order
    pub const ALL: [LinkCategory; 5] = [
        LinkCategory::Official,
        LinkCategory::Streaming,
        LinkCategory::Social,
        LinkCategory::Info,
        LinkCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkCategory::Official => "official",
            LinkCategory::Streaming => "streaming",
            LinkCategory::Social => "social",
            LinkCategory::Info => "info",
            LinkCategory::Other => "other",
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a service name or URL by keyword.
///
/// Case-insensitive substring match, checked social, streaming, info,
/// official; anything else is `Other`.
pub fn categorize(source_or_url: &str) -> LinkCategory {
    let text = source_or_url.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if matches(SOCIAL_KEYWORDS) {
        LinkCategory::Social
    } else if matches(STREAMING_KEYWORDS) {
        LinkCategory::Streaming
    } else if matches(INFO_KEYWORDS) {
        LinkCategory::Info
    } else if matches(OFFICIAL_KEYWORDS) {
        LinkCategory::Official
    } else {
        LinkCategory::Other
    }
}

/// A resolved or constructed reference link.
///
/// The category is derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub url: String,
    /// Display label, usually the service name
    pub title: String,
    /// Provider that produced the link
    pub source: String,
}

impl LinkEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            source: source.into(),
        }
    }

    /// Category from the title, falling back to the URL
    pub fn category(&self) -> LinkCategory {
        match categorize(&self.title) {
            LinkCategory::Other => categorize(&self.url),
            category => category,
        }
    }
}

/// Links grouped in presentation order, empty groups omitted.
pub fn group_by_category(links: &[LinkEntry]) -> Vec<(LinkCategory, Vec<LinkEntry>)> {
    LinkCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let group: Vec<LinkEntry> = links
                .iter()
                .filter(|link| link.category() == category)
                .cloned()
                .collect();
            (!group.is_empty()).then_some((category, group))
        })
        .collect()
}
