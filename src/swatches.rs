//! Dominant-color palette extraction.
//!
//! The source is resized to a small square, sampled sparsely, bucketed by
//! rounding every channel to a fixed step, and the most frequent buckets are
//! accepted in order as long as they stay far enough from what was already
//! picked.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::config::PaletteConfig;
use crate::error::{PrepError, Result};
use crate::raster::RasterImage;

/// One palette entry. Displays and serializes as `#rrggbb`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ColorSwatch(Srgb<u8>);

impl PartialEq for ColorSwatch {
    fn eq(&self, other: &Self) -> bool {
        self.rgb() == other.rgb()
    }
}

impl Eq for ColorSwatch {}

impl ColorSwatch {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self(Srgb::new(red, green, blue))
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.0.red, self.0.green, self.0.blue)
    }

    pub fn hex(self) -> String {
        self.to_string()
    }

    /// Euclidean distance in 8-bit RGB space.
    pub fn distance(self, other: ColorSwatch) -> f64 {
        let dr = self.0.red as f64 - other.0.red as f64;
        let dg = self.0.green as f64 - other.0.green as f64;
        let db = self.0.blue as f64 - other.0.blue as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl fmt::Display for ColorSwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0.red, self.0.green, self.0.blue)
    }
}

impl FromStr for ColorSwatch {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim();
        if hex.trim_start_matches('#').len() != 6 {
            return Err(PrepError::invalid_parameter("hex color", s));
        }
        Srgb::<u8>::from_str(hex)
            .map(ColorSwatch)
            .map_err(|_| PrepError::invalid_parameter("hex color", s))
    }
}

impl From<ColorSwatch> for String {
    fn from(swatch: ColorSwatch) -> Self {
        swatch.to_string()
    }
}

impl TryFrom<String> for ColorSwatch {
    type Error = PrepError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Up to `max_colors` swatches, most frequent first. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(Vec<ColorSwatch>);

impl Palette {
    pub fn swatches(&self) -> &[ColorSwatch] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> Vec<String> {
        self.0.iter().map(|s| s.hex()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorSwatch> {
        self.0.iter()
    }
}

impl IntoIterator for Palette {
    type Item = ColorSwatch;
    type IntoIter = std::vec::IntoIter<ColorSwatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Palette extractor bound to a validated configuration.
#[derive(Debug, Clone)]
pub struct PaletteExtractor {
    config: PaletteConfig,
}

impl Default for PaletteExtractor {
    fn default() -> Self {
        Self {
            config: PaletteConfig::default(),
        }
    }
}

impl PaletteExtractor {
    pub fn new(config: PaletteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    /// Never fails for a decoded image; an image with no visible pixels
    /// yields an empty palette.
    pub fn extract(&self, image: &RasterImage) -> Palette {
        let cfg = &self.config;
        if image.width() == 0 || image.height() == 0 {
            return Palette::default();
        }

        let small = imageops::resize(
            image.as_rgba(),
            cfg.sample_size,
            cfg.sample_size,
            FilterType::Triangle,
        );
        let raw = small.as_raw();

        // Buckets in first-seen order; the stable sort below keeps that
        // order for equal counts.
        let mut index: HashMap<[u16; 3], usize> = HashMap::new();
        let mut buckets: Vec<([u16; 3], u32)> = Vec::new();

        for px in raw.chunks_exact(4).step_by(cfg.stride) {
            if px[3] < cfg.alpha_threshold {
                continue;
            }
            let key = [
                quantize(px[0], cfg.quantum),
                quantize(px[1], cfg.quantum),
                quantize(px[2], cfg.quantum),
            ];
            match index.get(&key) {
                Some(&i) => buckets[i].1 += 1,
                None => {
                    index.insert(key, buckets.len());
                    buckets.push((key, 1));
                }
            }
        }

        buckets.sort_by(|a, b| b.1.cmp(&a.1));

        let mut accepted: Vec<ColorSwatch> = Vec::with_capacity(cfg.max_colors);
        for (key, _) in &buckets {
            if accepted.len() >= cfg.max_colors {
                break;
            }
            let candidate = ColorSwatch::new(
                clamp_channel(key[0]),
                clamp_channel(key[1]),
                clamp_channel(key[2]),
            );
            if accepted.iter().all(|s| s.distance(candidate) >= cfg.min_distance) {
                accepted.push(candidate);
            }
        }

        log::debug!(
            "palette: {} buckets, {} swatches accepted",
            buckets.len(),
            accepted.len()
        );
        Palette(accepted)
    }
}

/// Extract with the default configuration.
pub fn extract_palette(image: &RasterImage) -> Palette {
    PaletteExtractor::default().extract(image)
}

/// Decode then extract, returning `#rrggbb` strings.
pub fn extract_palette_bytes(input: &[u8]) -> Result<Vec<String>> {
    let image = RasterImage::decode(input)?;
    Ok(extract_palette(&image).to_hex())
}

pub fn extract_palette_data_url(url: &str) -> Result<Vec<String>> {
    let image = RasterImage::from_data_url(url)?;
    Ok(extract_palette(&image).to_hex())
}

/// Round to the nearest multiple of `quantum`, halves rounding up.
fn quantize(channel: u8, quantum: u16) -> u16 {
    let q = quantum as u32;
    (((channel as u32) + q / 2) / q * q).min(u16::MAX as u32) as u16
}

fn clamp_channel(value: u16) -> u8 {
    value.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RasterImage {
        RasterImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba(px)))
    }

    #[test]
    fn quantize_rounds_to_nearest_step() {
        assert_eq!(quantize(0, 32), 0);
        assert_eq!(quantize(15, 32), 0);
        assert_eq!(quantize(16, 32), 32);
        assert_eq!(quantize(100, 32), 96);
        assert_eq!(quantize(255, 32), 256);
        assert_eq!(clamp_channel(256), 255);
    }

    #[test]
    fn solid_color_yields_single_quantized_swatch() {
        let palette = extract_palette(&solid(100, 100, [100, 150, 200, 255]));
        assert_eq!(palette.to_hex(), vec!["#60a0c0".to_string()]);
        assert_eq!(palette.swatches()[0].rgb(), (96, 160, 192));
    }

    #[test]
    fn white_clamps_to_ff() {
        let palette = extract_palette(&solid(10, 10, [255, 255, 255, 255]));
        assert_eq!(palette.to_hex(), vec!["#ffffff".to_string()]);
    }

    #[test]
    fn transparent_image_yields_empty_palette() {
        assert!(extract_palette(&solid(64, 64, [255, 0, 0, 0])).is_empty());
        // Just under the visibility threshold still counts as transparent.
        assert!(extract_palette(&solid(64, 64, [255, 0, 0, 199])).is_empty());
    }

    #[test]
    fn similar_colors_collapse_into_one_swatch() {
        // Left half (0,0,0), right half (32,32,32): distance ~55 < 60.
        let img = RgbaImage::from_fn(100, 100, |x, _| {
            if x < 50 { Rgba([0, 0, 0, 255]) } else { Rgba([32, 32, 32, 255]) }
        });
        let palette = extract_palette(&RasterImage::from_rgba(img));
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn most_frequent_color_comes_first() {
        let img = RgbaImage::from_fn(100, 100, |x, _| {
            if x < 70 { Rgba([0, 0, 255, 255]) } else { Rgba([255, 0, 0, 255]) }
        });
        let palette = extract_palette(&RasterImage::from_rgba(img));
        assert_eq!(palette.swatches()[0], ColorSwatch::new(0, 0, 255));
        assert!(palette.swatches().contains(&ColorSwatch::new(255, 0, 0)));
    }

    #[test]
    fn max_colors_caps_the_result() {
        let extractor = PaletteExtractor::new(PaletteConfig {
            max_colors: 2,
            ..PaletteConfig::default()
        })
        .unwrap();
        let img = RgbaImage::from_fn(100, 100, |x, _| match x / 25 {
            0 => Rgba([0, 0, 0, 255]),
            1 => Rgba([255, 0, 0, 255]),
            2 => Rgba([0, 255, 0, 255]),
            _ => Rgba([0, 0, 255, 255]),
        });
        assert_eq!(extractor.extract(&RasterImage::from_rgba(img)).len(), 2);
    }

    #[test]
    fn swatch_parses_and_serializes_as_hex() {
        let swatch: ColorSwatch = "#A0c0E0".parse().unwrap();
        assert_eq!(swatch.rgb(), (0xa0, 0xc0, 0xe0));
        assert_eq!(serde_json::to_string(&swatch).unwrap(), "\"#a0c0e0\"");
        assert!("#abc".parse::<ColorSwatch>().is_err());
        assert!("#zzzzzz".parse::<ColorSwatch>().is_err());
    }
}
