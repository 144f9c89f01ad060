//! Brightness/contrast filtering and quarter-turn rotation.
//!
//! `render_canonical` produces the canonical canvas: the full-resolution
//! source with the committed adjustments baked in. View pan/zoom never
//! reaches this module.

use std::fmt;

use image::imageops;
use serde::{Deserialize, Serialize};

use crate::error::PrepError;
use crate::raster::RasterImage;

/// Identity value for brightness and contrast percentages.
pub const LEVEL_IDENTITY: u16 = 100;
pub const LEVEL_MIN: u16 = 50;
pub const LEVEL_MAX: u16 = 150;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Next clockwise quarter turn (270 wraps to 0).
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn from_quarter_turns(turns: u32) -> Self {
        (0..turns % 4).fold(Rotation::Deg0, |r, _| r.next())
    }

    /// Accepts any multiple of 90, wrapping at 360.
    pub fn from_degrees(degrees: u32) -> Result<Self, PrepError> {
        if degrees % 90 != 0 {
            return Err(PrepError::invalid_parameter("rotation", degrees));
        }
        Ok(Self::from_quarter_turns(degrees / 90))
    }

    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Bounding box of a `width`×`height` source after this rotation.
    pub fn canvas_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() { (height, width) } else { (width, height) }
    }
}

impl TryFrom<u32> for Rotation {
    type Error = PrepError;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// The committed, export-affecting edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Adjustments {
    pub brightness: u16,
    pub contrast: u16,
    pub rotation: Rotation,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: LEVEL_IDENTITY,
            contrast: LEVEL_IDENTITY,
            rotation: Rotation::Deg0,
        }
    }
}

impl Adjustments {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    fn has_filter(&self) -> bool {
        self.brightness != LEVEL_IDENTITY || self.contrast != LEVEL_IDENTITY
    }
}

/// Clamp a slider value into `[LEVEL_MIN, LEVEL_MAX]`.
pub fn clamp_level(value: i32) -> u16 {
    value.clamp(LEVEL_MIN as i32, LEVEL_MAX as i32) as u16
}

/// Per-channel lookup table for brightness followed by contrast.
///
/// Brightness scales the channel linearly; contrast scales its distance from
/// mid-grey. Both work on 8-bit sRGB values and leave alpha alone.
pub fn filter_lut(brightness: u16, contrast: u16) -> [u8; 256] {
    let b = brightness as f32 / 100.0;
    let c = contrast as f32 / 100.0;
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        let lit = v as f32 * b;
        let contrasted = (lit - 127.5) * c + 127.5;
        *out = contrasted.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Render the canonical canvas for `source` under `adjustments`.
pub fn render_canonical(source: &RasterImage, adjustments: &Adjustments) -> RasterImage {
    if adjustments.is_identity() {
        return source.clone();
    }
    let mut filtered = source.as_rgba().clone();
    if adjustments.has_filter() {
        let lut = filter_lut(adjustments.brightness, adjustments.contrast);
        for px in filtered.pixels_mut() {
            px[0] = lut[px[0] as usize];
            px[1] = lut[px[1] as usize];
            px[2] = lut[px[2] as usize];
        }
    }

    let rotated = match adjustments.rotation {
        Rotation::Deg0 => filtered,
        Rotation::Deg90 => imageops::rotate90(&filtered),
        Rotation::Deg180 => imageops::rotate180(&filtered),
        Rotation::Deg270 => imageops::rotate270(&filtered),
    };

    log::debug!(
        "canonical canvas {}x{} (brightness {}%, contrast {}%, rotation {})",
        rotated.width(),
        rotated.height(),
        adjustments.brightness,
        adjustments.contrast,
        adjustments.rotation
    );
    RasterImage::from_rgba(rotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn default_adjustments_render_the_source_unchanged() {
        let src = RasterImage::from_rgba(RgbaImage::from_pixel(3, 2, Rgba([10, 200, 30, 128])));
        assert!(Adjustments::default().is_identity());
        assert_eq!(render_canonical(&src, &Adjustments::default()), src);

        let rotated = Adjustments { rotation: Rotation::Deg90, ..Adjustments::default() };
        assert!(!rotated.is_identity());
        assert_eq!(render_canonical(&src, &rotated).dimensions(), (2, 3));
    }

    #[test]
    fn identity_lut_is_a_no_op() {
        let lut = filter_lut(LEVEL_IDENTITY, LEVEL_IDENTITY);
        assert!(lut.iter().enumerate().all(|(i, v)| *v as usize == i));
    }

    #[test]
    fn brightness_scales_and_saturates() {
        let lut = filter_lut(120, LEVEL_IDENTITY);
        assert_eq!(lut[100], 120);
        assert_eq!(lut[250], 255);
        assert_eq!(lut[0], 0);
    }

    #[test]
    fn contrast_pushes_away_from_mid_grey() {
        let lut = filter_lut(LEVEL_IDENTITY, 150);
        assert!(lut[200] > 200);
        assert!(lut[50] < 50);
        let flat = filter_lut(LEVEL_IDENTITY, LEVEL_MIN);
        assert!(flat[0] > 0 && flat[255] < 255);
    }

    #[test]
    fn levels_are_clamped() {
        assert_eq!(clamp_level(10), LEVEL_MIN);
        assert_eq!(clamp_level(400), LEVEL_MAX);
        assert_eq!(clamp_level(120), 120);
    }

    #[test]
    fn rotation_cycles_in_quarter_turns() {
        assert_eq!(Rotation::Deg270.next(), Rotation::Deg0);
        assert_eq!(Rotation::from_quarter_turns(5), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(450).unwrap(), Rotation::Deg90);
        assert!(Rotation::from_degrees(45).is_err());
    }

    #[test]
    fn quarter_turns_swap_the_bounding_box() {
        let src = RasterImage::from_rgba(RgbaImage::new(40, 30));
        for (rotation, dims) in [
            (Rotation::Deg0, (40, 30)),
            (Rotation::Deg90, (30, 40)),
            (Rotation::Deg180, (40, 30)),
            (Rotation::Deg270, (30, 40)),
        ] {
            let adj = Adjustments { rotation, ..Adjustments::default() };
            assert_eq!(render_canonical(&src, &adj).dimensions(), dims);
            assert_eq!(rotation.canvas_size(40, 30), dims);
        }
    }

    #[test]
    fn clockwise_rotation_moves_top_left_to_top_right() {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let adj = Adjustments { rotation: Rotation::Deg90, ..Adjustments::default() };
        let out = render_canonical(&RasterImage::from_rgba(img), &adj);
        assert_eq!(out.as_rgba().get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn filter_keeps_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 77]));
        let adj = Adjustments { brightness: 120, ..Adjustments::default() };
        let out = render_canonical(&RasterImage::from_rgba(img), &adj);
        assert_eq!(out.as_rgba().get_pixel(0, 0), &Rgba([120, 120, 120, 77]));
    }
}
