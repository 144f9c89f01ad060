//! Tunables for palette extraction, export encoding and collage layout.
//!
//! Every constant the pipeline relies on lives here with its production
//! default, so hosts can serialize a configuration, tweak it and hand it back.

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// JPEG quality used for editor saves and collages (0-100 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Parameters of the dominant-color extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Side of the square canvas the source is resized to before sampling.
    pub sample_size: u32,
    /// Visit every `stride`-th pixel of the flattened buffer.
    pub stride: usize,
    /// Pixels with alpha strictly below this are ignored.
    pub alpha_threshold: u8,
    /// Channel rounding step used to build frequency buckets.
    pub quantum: u16,
    /// Minimum Euclidean RGB distance between two accepted swatches.
    pub min_distance: f64,
    pub max_colors: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            stride: 5,
            alpha_threshold: 200,
            quantum: 32,
            min_distance: 60.0,
            max_colors: 5,
        }
    }
}

impl PaletteConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(PrepError::invalid_parameter("sample_size", self.sample_size));
        }
        if self.stride == 0 {
            return Err(PrepError::invalid_parameter("stride", self.stride));
        }
        if self.quantum == 0 {
            return Err(PrepError::invalid_parameter("quantum", self.quantum));
        }
        if self.max_colors == 0 {
            return Err(PrepError::invalid_parameter("max_colors", self.max_colors));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(PrepError::invalid_parameter("min_distance", self.min_distance));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Jpeg,
    Png,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
        }
    }
}

/// How finalized rasters are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Only meaningful for JPEG; clamped to 1..=100 when encoding.
    pub quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExportConfig {
    pub fn png() -> Self {
        Self {
            format: ExportFormat::Png,
            ..Self::default()
        }
    }

    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality,
        }
    }
}

/// Pixel measurements of the before/after comparison collage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollageLayout {
    pub padding: u32,
    pub gap: u32,
    /// Band above the images reserved for their captions.
    pub label_height: u32,
    /// Band below the images reserved for the footer line.
    pub footer_height: u32,
    pub background: [u8; 3],
}

impl Default for CollageLayout {
    fn default() -> Self {
        Self {
            padding: 40,
            gap: 20,
            label_height: 60,
            footer_height: 40,
            background: [0xFF, 0xFF, 0xFF],
        }
    }
}
