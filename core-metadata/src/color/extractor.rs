//! Dominant color extraction

use super::Rgb;
use image::imageops::FilterType;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Side of the square the image is resampled to before counting
pub const SAMPLE_SIZE: u32 = 150;

/// Returned when the bytes cannot be decoded
pub const FALLBACK_GRAY: Rgb = Rgb::new(80, 80, 80);

/// Quantization bucket width per channel
const BUCKET: u16 = 10;

/// How many of the most frequent buckets are considered
const TOP_CANDIDATES: usize = 20;

/// Pick the most representative, non-degenerate color of an image.
///
/// Never fails: falls back to the mean color when no frequent color
/// qualifies, and to [`FALLBACK_GRAY`] when decoding fails.
pub fn extract_dominant(image_bytes: &[u8]) -> Rgb {
    let decoded = match image::load_from_memory(image_bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, bytes = image_bytes.len(), "Cover decode failed, using fallback gray");
            return FALLBACK_GRAY;
        }
    };

    let sample = decoded
        .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Lanczos3)
        .to_rgb8();
    let pixels: Vec<Rgb> = sample
        .pixels()
        .map(|p| Rgb::new(p[0], p[1], p[2]))
        .collect();

    if let Some(color) = most_frequent_qualifying(&pixels) {
        debug!(color = %color, "Dominant color from frequency scan");
        return color;
    }

    let mean = mean_color(&pixels);
    debug!(color = %mean, "No frequent color qualified, using mean");
    mean
}

fn quantize(channel: u8) -> u8 {
    let rounded = (channel as u16 + BUCKET / 2) / BUCKET * BUCKET;
    rounded.min(250) as u8
}

fn qualifies(color: &Rgb) -> bool {
    let brightness = color.brightness();
    (brightness > 20.0 && brightness < 235.0 && color.saturation() > 0.1) || brightness < 100.0
}

/// Scan the most frequent quantized colors, most common first. Ties go to
/// the color seen first.
fn most_frequent_qualifying(pixels: &[Rgb]) -> Option<Rgb> {
    let mut counts: HashMap<Rgb, (usize, usize)> = HashMap::new();
    for (index, pixel) in pixels.iter().enumerate() {
        let bucket = Rgb::new(quantize(pixel.r), quantize(pixel.g), quantize(pixel.b));
        counts.entry(bucket).or_insert((0, index)).0 += 1;
    }

    let mut ranked: Vec<(Rgb, usize, usize)> = counts
        .into_iter()
        .map(|(color, (count, first_seen))| (color, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(TOP_CANDIDATES)
        .map(|(color, _, _)| color)
        .find(qualifies)
}

fn mean_color(pixels: &[Rgb]) -> Rgb {
    if pixels.is_empty() {
        return FALLBACK_GRAY;
    }

    let (r, g, b) = pixels.iter().fold((0u64, 0u64, 0u64), |(r, g, b), p| {
        (r + p.r as u64, g + p.g as u64, b + p.b as u64)
    });
    let n = pixels.len() as u64;
    Rgb::new((r / n) as u8, (g / n) as u8, (b / n) as u8)
}
