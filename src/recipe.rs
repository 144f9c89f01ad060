//! Non-interactive replay of an edit.
//!
//! A recipe drives the same [`EditSession`] operations a user would, in a
//! fixed order: sliders, rotations, ratio preset, explicit crop. Absent fields
//! leave the corresponding default untouched.

use serde::{Deserialize, Serialize};

use crate::adjust::LEVEL_IDENTITY;
use crate::config::ExportConfig;
use crate::error::Result;
use crate::geometry::{AspectPreset, CropRect};
use crate::raster::RasterImage;
use crate::session::{EditSession, ToolTab};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditRecipe {
    pub brightness: i32,
    pub contrast: i32,
    /// Clockwise 90° turns.
    pub quarter_turns: u32,
    /// Ratio preset. Any preset opens the crop tab, which creates a centered
    /// rectangle: `Free` covers 80% of both sides, a fixed ratio 80% of the
    /// limiting side.
    pub aspect: Option<AspectPreset>,
    /// Explicit crop in percent of the rotated canvas; wins over `aspect`.
    pub crop: Option<CropRect>,
}

impl Default for EditRecipe {
    fn default() -> Self {
        Self {
            brightness: LEVEL_IDENTITY as i32,
            contrast: LEVEL_IDENTITY as i32,
            quarter_turns: 0,
            aspect: None,
            crop: None,
        }
    }
}

impl EditRecipe {
    /// Replay onto a fresh session over `source`.
    pub fn open(&self, source: RasterImage) -> EditSession {
        let mut session = EditSession::new(source);
        session.set_brightness(self.brightness);
        session.set_contrast(self.contrast);
        for _ in 0..self.quarter_turns % 4 {
            session.rotate_clockwise();
        }
        if let Some(aspect) = self.aspect {
            session.switch_tab(ToolTab::Crop);
            session.select_aspect(aspect);
        }
        if let Some(crop) = self.crop {
            session.set_crop(crop);
        }
        session
    }

    /// Replay and finalize in one go.
    pub fn apply(&self, source: RasterImage, export: &ExportConfig) -> Result<Vec<u8>> {
        self.open(source).finalize(export)
    }
}

/// Decode `input`, replay `recipe` and encode the result.
pub fn edit_bytes(input: &[u8], recipe: &EditRecipe, export: &ExportConfig) -> Result<Vec<u8>> {
    let source = RasterImage::decode(input)?;
    recipe.apply(source, export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn source() -> RasterImage {
        RasterImage::from_rgba(RgbaImage::from_pixel(400, 300, Rgba([100, 100, 100, 255])))
    }

    #[test]
    fn empty_recipe_is_identity() {
        let recipe: EditRecipe = serde_json::from_str("{}").unwrap();
        assert_eq!(recipe, EditRecipe::default());
        let mut session = recipe.open(source());
        assert_eq!(session.render_output(), source());
    }

    #[test]
    fn recipe_matches_interactive_session() {
        let recipe: EditRecipe = serde_json::from_str(
            r#"{"brightness": 120, "quarter_turns": 1,
                "crop": {"x": 25, "y": 25, "width": 50, "height": 50}}"#,
        )
        .unwrap();

        let mut interactive = EditSession::new(source());
        interactive.set_brightness(120);
        interactive.rotate_clockwise();
        interactive.switch_tab(ToolTab::Crop);
        interactive.set_crop(CropRect::new(25.0, 25.0, 50.0, 50.0));

        let replayed = recipe.open(source()).render_output();
        assert_eq!(replayed, interactive.render_output());
        assert_eq!(replayed.dimensions(), (150, 200));
    }

    #[test]
    fn free_aspect_opens_a_full_free_rect() {
        let recipe = EditRecipe {
            aspect: Some(AspectPreset::Free),
            ..EditRecipe::default()
        };
        let mut session = recipe.open(source());
        let rect = session.crop().unwrap();
        assert!((rect.width - 80.0).abs() < 1e-9 && (rect.height - 80.0).abs() < 1e-9);
        assert_eq!(session.render_output().dimensions(), (320, 240));
    }

    #[test]
    fn aspect_preset_creates_a_rect() {
        let recipe = EditRecipe {
            aspect: Some(AspectPreset::Square),
            ..EditRecipe::default()
        };
        let mut session = recipe.open(source());
        assert!(session.crop().is_some());
        assert_eq!(session.render_output().dimensions(), (240, 240));
    }
}
