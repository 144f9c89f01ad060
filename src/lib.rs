pub mod adjust;
pub mod collage;
pub mod config;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod recipe;
pub mod session;
pub mod swatches;
pub mod view;
pub mod wasm;

pub use adjust::{Adjustments, Rotation};
pub use collage::comparison_collage;
pub use config::{CollageLayout, DEFAULT_JPEG_QUALITY, ExportConfig, ExportFormat, PaletteConfig};
pub use error::{PrepError, Result};
pub use geometry::{AspectPreset, CropHandle, CropRect, Point};
pub use raster::RasterImage;
pub use recipe::{EditRecipe, edit_bytes};
pub use session::{EditSession, EditState, ToolTab};
pub use swatches::{
    ColorSwatch, Palette, PaletteExtractor, extract_palette, extract_palette_bytes,
    extract_palette_data_url,
};
pub use view::ViewTransform;

// ------------------------------------------------------------
// Byte-level helpers for native callers
// ------------------------------------------------------------

/// Decode two encoded images and return their comparison collage, encoded
/// with `export`.
pub fn collage_bytes(original: &[u8], generated: &[u8], export: &ExportConfig) -> Result<Vec<u8>> {
    let original = RasterImage::decode(original)?;
    let generated = RasterImage::decode(generated)?;
    comparison_collage(&original, &generated, &CollageLayout::default()).encode(export)
}
