//! # Color Theming
//!
//! Dominant color extraction from cover art and the palette derived from
//! it. Text colors are chosen against the WCAG 2.0 contrast ratio.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::color::{build_palette, extract_dominant};
//!
//! let dominant = extract_dominant(&cover_bytes);
//! let palette = build_palette(dominant);
//! assert!(palette.text_contrast_ratio() >= 4.5);
//! ```

mod extractor;
mod palette;

pub use extractor::{extract_dominant, FALLBACK_GRAY, SAMPLE_SIZE};
pub use palette::{
    build_palette, contrast_ratio, relative_luminance, Palette, MIN_TEXT_CONTRAST,
    TEXT_CANDIDATES,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGB color. Serializes as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three channels, 0 to 255
    pub fn brightness(&self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / 3.0
    }

    /// HSV saturation, 0 to 1
    pub fn saturation(&self) -> f32 {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        if max == 0 {
            0.0
        } else {
            (max - min) as f32 / max as f32
        }
    }

    /// Perceived luminance (ITU-R 601 weights), 0 to 1
    pub fn perceived_luminance(&self) -> f32 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32) / 255.0
    }

    pub fn channel_sum(&self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `#rrggbb` or `rrggbb`, any case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid hex color: {:?}", value));
        }

        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| e.to_string())
        };
        Ok(Rgb::new(byte(0..2)?, byte(2..4)?, byte(4..6)?))
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
