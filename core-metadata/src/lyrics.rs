//! Lyrics payload and text cleanup

use crate::resolver::Payload;
use core_library::normalize::normalize_for_search;
use serde::{Deserialize, Serialize};

/// Credit and advertising lines some lyrics APIs append
const BOILERPLATE_MARKERS: &[&str] = &[
    "lyrics provided by",
    "powered by",
    "copyright",
    "all rights reserved",
    "unauthorized reproduction",
];

/// Titles that tag readers emit for tracks without a title tag
const PLACEHOLDER_TITLES: &[&str] = &["pista sin titulo", "untitled", "untitled track"];

/// Lyrics text for one track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub text: String,
    /// LRC timestamps present
    pub is_synced: bool,
}

impl Lyrics {
    /// Plain lyrics, cleaned
    pub fn plain(raw: &str) -> Self {
        Self {
            text: clean_lyrics(raw),
            is_synced: false,
        }
    }

    /// LRC lyrics, kept verbatim apart from outer whitespace
    pub fn synced(lrc: &str) -> Self {
        Self {
            text: lrc.trim().to_string(),
            is_synced: true,
        }
    }
}

impl Payload for Lyrics {
    fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Tidy raw lyrics text.
///
/// Trims every line, collapses runs of blank lines to one, and drops
/// credit/advertising lines.
pub fn clean_lyrics(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;

    for line in raw.lines().map(str::trim) {
        let lower = line.to_lowercase();
        if BOILERPLATE_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }

        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        lines.push(line);
    }

    lines.join("\n").trim().to_string()
}

/// Whether a track title is worth a lyrics lookup
pub fn is_searchable_title(title: &str) -> bool {
    let normalized = normalize_for_search(title);
    !normalized.is_empty() && !PLACEHOLDER_TITLES.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_lyrics_trims_and_collapses() {
        let raw = "  First line  \n\n\n\n  Second line\r\n\n Third \n";
        assert_eq!(clean_lyrics(raw), "First line\n\nSecond line\n\nThird");
    }

    #[test]
    fn test_clean_lyrics_drops_boilerplate() {
        let raw = "Verse one\nLyrics provided by SomeService\nVerse two\n\u{a9} Copyright 2001 Label\n";
        assert_eq!(clean_lyrics(raw), "Verse one\nVerse two");
    }

    #[test]
    fn test_empty_lyrics_payload() {
        assert!(Payload::is_empty(&Lyrics::plain("  \n\n ")));
        assert!(!Payload::is_empty(&Lyrics::synced("[00:01.00] hello")));
    }

    #[test]
    fn test_searchable_titles() {
        assert!(is_searchable_title("Teardrop"));
        assert!(!is_searchable_title(""));
        assert!(!is_searchable_title("Pista Sin Título"));
        assert!(!is_searchable_title("Untitled"));
    }
}
