//! Before/after comparison collage.
//!
//! Both images are scaled to a common height and laid side by side on a
//! solid background, with bands above (captions) and below (footer) left
//! for the host to letter.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::config::CollageLayout;
use crate::raster::RasterImage;

/// Compose `original` and `generated` side by side.
pub fn comparison_collage(
    original: &RasterImage,
    generated: &RasterImage,
    layout: &CollageLayout,
) -> RasterImage {
    let content_h = original.height().max(generated.height()).max(1);
    let left = scale_to_height(original, content_h);
    let right = scale_to_height(generated, content_h);

    let width = left.width() + right.width() + layout.gap + layout.padding * 2;
    let height = content_h + layout.label_height + layout.footer_height + layout.padding * 2;
    let [r, g, b] = layout.background;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));

    let top = (layout.padding + layout.label_height) as i64;
    imageops::overlay(&mut canvas, &left, layout.padding as i64, top);
    imageops::overlay(
        &mut canvas,
        &right,
        (layout.padding + left.width() + layout.gap) as i64,
        top,
    );

    log::debug!("collage {}x{}", width, height);
    RasterImage::from_rgba(canvas)
}

fn scale_to_height(image: &RasterImage, target_h: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if h == target_h || w == 0 || h == 0 {
        return image.as_rgba().clone();
    }
    let target_w = ((w as f64) * (target_h as f64) / (h as f64)).round().max(1.0) as u32;
    imageops::resize(image.as_rgba(), target_w, target_h, FilterType::Triangle)
}
