//! Palette derivation with WCAG text contrast

use super::Rgb;
use serde::{Deserialize, Serialize};

/// WCAG AA minimum for normal text
pub const MIN_TEXT_CONTRAST: f64 = 4.5;

/// Text color candidates in priority order: white, black, light gray, dark gray
pub const TEXT_CANDIDATES: [Rgb; 4] = [
    Rgb::WHITE,
    Rgb::BLACK,
    Rgb::new(240, 240, 240),
    Rgb::new(40, 40, 40),
];

/// Per-channel shift from the primary to the secondary text color
const SECONDARY_TEXT_OFFSET: u8 = 80;

/// Colors derived from one dominant color. Never mutated after building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub text_primary: Rgb,
    pub text_secondary: Rgb,
    pub border: Rgb,
}

impl Palette {
    /// Contrast between `text_primary` and `background`
    pub fn text_contrast_ratio(&self) -> f64 {
        contrast_ratio(self.background, self.text_primary)
    }
}

/// Derive the presentation palette from a dominant color.
///
/// - background: saturation x1.1, value x0.85
/// - secondary: hue +0.08, saturation x0.9
/// - accent: complementary hue, saturation x0.8, value x0.9
/// - text_primary: first of [`TEXT_CANDIDATES`] reaching
///   [`MIN_TEXT_CONTRAST`] on the background, else the highest-contrast one
/// - text_secondary: text_primary moved 80 per channel toward the middle
/// - border: background darkened on light backgrounds, lightened on dark
pub fn build_palette(dominant: Rgb) -> Palette {
    let (h, s, v) = rgb_to_hsv(dominant);

    let background = hsv_to_rgb(h, (s * 1.1).min(1.0), (v * 0.85).min(1.0));
    let secondary = hsv_to_rgb((h + 0.08) % 1.0, (s * 0.9).min(1.0), v.min(1.0));
    let accent = hsv_to_rgb((h + 0.5) % 1.0, (s * 0.8).min(1.0), (v * 0.9).min(1.0));

    let text_primary = pick_text_color(background);
    let text_secondary = secondary_text_color(text_primary);

    Palette {
        background,
        secondary,
        accent,
        text_primary,
        text_secondary,
        border: border_color(background),
    }
}

/// WCAG 2.0 relative luminance, 0 to 1
pub fn relative_luminance(color: Rgb) -> f64 {
    fn linearize(channel: u8) -> f64 {
        let c = channel as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

/// WCAG 2.0 contrast ratio, 1 to 21, symmetric in its arguments
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

fn pick_text_color(background: Rgb) -> Rgb {
    let ratios = TEXT_CANDIDATES.map(|candidate| (candidate, contrast_ratio(background, candidate)));

    if let Some((candidate, _)) = ratios.iter().find(|(_, ratio)| *ratio >= MIN_TEXT_CONTRAST) {
        return *candidate;
    }

    ratios
        .iter()
        .fold(ratios[0], |best, current| if current.1 > best.1 { *current } else { best })
        .0
}

fn secondary_text_color(primary: Rgb) -> Rgb {
    let shift = |c: u8| {
        if primary.channel_sum() > 400 {
            c.saturating_sub(SECONDARY_TEXT_OFFSET)
        } else {
            c.saturating_add(SECONDARY_TEXT_OFFSET)
        }
    };
    Rgb::new(shift(primary.r), shift(primary.g), shift(primary.b))
}

fn border_color(background: Rgb) -> Rgb {
    let factor = if background.perceived_luminance() > 0.5 {
        0.8
    } else {
        1.2
    };
    let scale = |c: u8| (c as f64 * factor).clamp(0.0, 255.0) as u8;
    Rgb::new(scale(background.r), scale(background.g), scale(background.b))
}

// ===== HSV conversion =====

fn rgb_to_hsv(color: Rgb) -> (f64, f64, f64) {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    if max == min {
        return (0.0, 0.0, v);
    }

    let delta = max - min;
    let s = delta / max;
    let rc = (max - r) / delta;
    let gc = (max - g) / delta;
    let bc = (max - b) / delta;

    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    ((h / 6.0).rem_euclid(1.0), s, v)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let to_byte = |c: f64| (c * 255.0).clamp(0.0, 255.0) as u8;

    if s == 0.0 {
        let c = to_byte(v);
        return Rgb::new(c, c, c);
    }

    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    Rgb::new(to_byte(r), to_byte(g), to_byte(b))
}
