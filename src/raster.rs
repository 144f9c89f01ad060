//! Decoded bitmaps and the encode/decode boundary.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, RgbaImage};

use crate::config::{ExportConfig, ExportFormat};
use crate::error::{PrepError, Result};

/// An immutable RGBA8 bitmap.
///
/// Only obtainable from a successful decode or from one of the renders in
/// this crate, which is what guarantees no operation runs on an image that
/// has not finished decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Decode JPEG/PNG (or any format `image` recognizes) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?;
        log::debug!("decoded {}x{} image", decoded.width(), decoded.height());
        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    /// Decode a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let bytes = decode_data_url(url)?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// Encode with the given export settings.
    pub fn encode(&self, export: &ExportConfig) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match export.format {
            ExportFormat::Jpeg => {
                // JPEG carries no alpha; the channel is dropped like a canvas export does.
                let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8();
                let quality = export.quality.clamp(1, 100);
                let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality);
                encoder
                    .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                    .map_err(|e| PrepError::Encode {
                        message: format!("JPEG encode error: {e}"),
                    })?;
            }
            ExportFormat::Png => {
                let mut cursor = Cursor::new(&mut buf);
                self.pixels
                    .write_to(&mut cursor, ImageFormat::Png)
                    .map_err(|e| PrepError::Encode {
                        message: format!("PNG encode error: {e}"),
                    })?;
            }
        }
        Ok(buf)
    }

    pub fn to_data_url(&self, export: &ExportConfig) -> Result<String> {
        let encoded = self.encode(export)?;
        Ok(encode_data_url(export.format.mime(), &encoded))
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Extract the payload bytes of a base64 data URL. The MIME type is not
/// validated here; the decoder sniffs the actual format.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| PrepError::invalid_data_url("missing `data:` scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PrepError::invalid_data_url("missing `,` separator"))?;
    if !header.ends_with(";base64") {
        return Err(PrepError::invalid_data_url("only base64 payloads are supported"));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| PrepError::invalid_data_url(format!("bad base64 payload: {e}")))
}
