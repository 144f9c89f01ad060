//! Interactive edit session over one decoded image.
//!
//! The session owns the source bitmap, the committed edits (brightness,
//! contrast, rotation, crop), the view transform and the pointer drag in
//! progress. Pointer handlers only translate input into calls to the pure
//! functions in [`crate::geometry`] and [`crate::view`].
//!
//! Crop rectangles are dropped whenever the canvas they refer to changes
//! shape (rotation) and when the user leaves the crop tab.

use std::fmt;
use std::str::FromStr;

use image::imageops;
use serde::{Deserialize, Serialize};

use crate::adjust::{Adjustments, Rotation, clamp_level, render_canonical};
use crate::config::ExportConfig;
use crate::error::{PrepError, Result};
use crate::geometry::{self, AspectPreset, CropHandle, CropRect, PERCENT_MAX, Point};
use crate::raster::RasterImage;
use crate::view::{ViewTransform, ZOOM_STEP};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolTab {
    #[default]
    Adjust,
    Crop,
}

impl FromStr for ToolTab {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adjust" => Ok(ToolTab::Adjust),
            "crop" => Ok(ToolTab::Crop),
            _ => Err(PrepError::invalid_parameter("tool tab", s)),
        }
    }
}

impl fmt::Display for ToolTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolTab::Adjust => "adjust",
            ToolTab::Crop => "crop",
        })
    }
}

/// Everything "Reset all" restores, kept in one value so a reset is a
/// single assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EditState {
    pub adjustments: Adjustments,
    pub crop: Option<CropRect>,
    pub aspect: AspectPreset,
    pub view: ViewTransform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    Idle,
    Pan {
        pointer_start: Point,
        translate_start: Point,
    },
    Crop {
        handle: CropHandle,
        pointer_start: Point,
        rect_start: CropRect,
        container_w: f64,
        container_h: f64,
    },
}

pub struct EditSession {
    source: RasterImage,
    state: EditState,
    tab: ToolTab,
    drag: Drag,
    // Derived from (source, adjustments); rebuilt on demand.
    canvas: Option<(Adjustments, RasterImage)>,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("source", &self.source.dimensions())
            .field("state", &self.state)
            .field("tab", &self.tab)
            .field("drag", &self.drag)
            .finish()
    }
}

impl EditSession {
    /// Open a session on the adjust tab.
    pub fn new(source: RasterImage) -> Self {
        Self {
            source,
            state: EditState::default(),
            tab: ToolTab::Adjust,
            drag: Drag::Idle,
            canvas: None,
        }
    }

    /// Open a session on `tab`; opening on the crop tab starts with a
    /// free-form crop rectangle.
    pub fn with_tab(source: RasterImage, tab: ToolTab) -> Self {
        let mut session = Self::new(source);
        session.switch_tab(tab);
        session
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(RasterImage::decode(bytes)?))
    }

    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn adjustments(&self) -> Adjustments {
        self.state.adjustments
    }

    pub fn brightness(&self) -> u16 {
        self.state.adjustments.brightness
    }

    pub fn contrast(&self) -> u16 {
        self.state.adjustments.contrast
    }

    pub fn rotation(&self) -> Rotation {
        self.state.adjustments.rotation
    }

    pub fn crop(&self) -> Option<CropRect> {
        self.state.crop
    }

    pub fn aspect(&self) -> AspectPreset {
        self.state.aspect
    }

    pub fn view(&self) -> &ViewTransform {
        &self.state.view
    }

    pub fn tab(&self) -> ToolTab {
        self.tab
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.drag, Drag::Pan { .. })
    }

    /// The crop handle being dragged, if any.
    pub fn active_handle(&self) -> Option<CropHandle> {
        match self.drag {
            Drag::Crop { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// Size of the canonical canvas: the source with width and height
    /// swapped for 90° and 270°.
    pub fn canvas_size(&self) -> (u32, u32) {
        let (w, h) = self.source.dimensions();
        self.rotation().canvas_size(w, h)
    }

    // ----- adjustments -----

    pub fn set_brightness(&mut self, percent: i32) {
        self.state.adjustments.brightness = clamp_level(percent);
    }

    pub fn set_contrast(&mut self, percent: i32) {
        self.state.adjustments.contrast = clamp_level(percent);
    }

    /// Rotate 90° clockwise. The crop rectangle, if any, is discarded since
    /// it was expressed against the old canvas.
    pub fn rotate_clockwise(&mut self) {
        self.state.adjustments.rotation = self.rotation().next();
        self.state.crop = None;
        self.end_drag();
    }

    // ----- tabs & crop -----

    /// Entering the crop tab without a rectangle creates a free-form one;
    /// leaving it discards the rectangle.
    pub fn switch_tab(&mut self, tab: ToolTab) {
        self.tab = tab;
        match tab {
            ToolTab::Crop if self.state.crop.is_none() => self.select_aspect(AspectPreset::Free),
            ToolTab::Crop => {}
            ToolTab::Adjust => {
                self.state.crop = None;
                self.end_drag();
            }
        }
    }

    /// Pick a ratio preset. On the crop tab a fixed ratio re-creates the
    /// rectangle centered at 80% of the limiting side; `Free` only unlocks
    /// the ratio and keeps an existing rectangle.
    pub fn select_aspect(&mut self, preset: AspectPreset) {
        self.state.aspect = preset;
        if self.tab != ToolTab::Crop {
            return;
        }
        if preset == AspectPreset::Free && self.state.crop.is_some() {
            return;
        }
        let (w, h) = self.canvas_size();
        self.state.crop = Some(geometry::initial_crop_rect(w, h, preset.ratio()));
    }

    /// Place a crop rectangle directly. The rectangle is normalized into the
    /// canvas and the session moves to the crop tab.
    pub fn set_crop(&mut self, rect: CropRect) {
        self.tab = ToolTab::Crop;
        self.state.crop = Some(rect.normalized());
    }

    pub fn clear_crop(&mut self) {
        self.state.crop = None;
        self.end_drag();
    }

    // ----- view -----

    pub fn zoom_in(&mut self) {
        self.state.view.zoom_by(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.state.view.zoom_by(-ZOOM_STEP);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.state.view.zoom_by(delta);
    }

    pub fn zoom_wheel(&mut self, delta_y: f64) {
        self.state.view.zoom_wheel(delta_y);
    }

    /// "Fit to screen".
    pub fn reset_view(&mut self) {
        self.state.view.reset();
    }

    // ----- pointer input -----

    /// Pointer pressed on the viewport background: start panning.
    pub fn begin_pan(&mut self, pointer: Point) {
        self.drag = Drag::Pan {
            pointer_start: pointer,
            translate_start: self.state.view.translate,
        };
    }

    /// Pointer pressed on the crop overlay. `container_w`/`container_h` are
    /// the on-screen size of the displayed canvas, used to turn pixel deltas
    /// into percentages. Returns `false` (and starts nothing) when there is
    /// no rectangle to drag or the container size is unusable.
    pub fn begin_crop_drag(
        &mut self,
        handle: CropHandle,
        pointer: Point,
        container_w: f64,
        container_h: f64,
    ) -> bool {
        let Some(rect) = self.state.crop else {
            return false;
        };
        if self.tab != ToolTab::Crop || !is_positive(container_w) || !is_positive(container_h) {
            return false;
        }
        self.drag = Drag::Crop {
            handle,
            pointer_start: pointer,
            rect_start: rect,
            container_w,
            container_h,
        };
        true
    }

    /// Pointer moved anywhere. Deltas are always measured from the drag
    /// start, so dropped events cannot accumulate error.
    pub fn pointer_move(&mut self, pointer: Point) {
        match self.drag {
            Drag::Idle => {}
            Drag::Pan {
                pointer_start,
                translate_start,
            } => self.state.view.pan_to(translate_start, pointer_start, pointer),
            Drag::Crop {
                handle,
                pointer_start,
                rect_start,
                container_w,
                container_h,
            } => {
                let dx = (pointer.x - pointer_start.x) / container_w * PERCENT_MAX;
                let dy = (pointer.y - pointer_start.y) / container_h * PERCENT_MAX;
                self.state.crop = Some(geometry::apply_drag(rect_start, handle, dx, dy));
            }
        }
    }

    /// Pointer released or cancelled, on or off the editor.
    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    fn end_drag(&mut self) {
        self.drag = Drag::Idle;
    }

    /// Restore every edit and the view to defaults in one step.
    pub fn reset_all(&mut self) {
        self.state = EditState::default();
        self.drag = Drag::Idle;
    }

    // ----- rendering -----

    /// The canonical canvas for the current adjustments, re-rendered only
    /// when brightness, contrast or rotation changed since the last call.
    pub fn canonical_canvas(&mut self) -> &RasterImage {
        let adjustments = self.state.adjustments;
        if !matches!(&self.canvas, Some((key, _)) if *key == adjustments) {
            self.canvas = None;
        }
        let source = &self.source;
        let (_, canvas) = self
            .canvas
            .get_or_insert_with(|| (adjustments, render_canonical(source, &adjustments)));
        canvas
    }

    /// The image a save would produce, before encoding. A crop rectangle
    /// that maps to no pixels falls back to the full canvas.
    pub fn render_output(&mut self) -> RasterImage {
        let crop = self.state.crop;
        let canvas = self.canonical_canvas();
        let Some(rect) = crop else {
            return canvas.clone();
        };
        match rect.to_pixels(canvas.width(), canvas.height()) {
            Some(px) => {
                let region = imageops::crop_imm(canvas.as_rgba(), px.x, px.y, px.width, px.height);
                RasterImage::from_rgba(region.to_image())
            }
            None => {
                log::warn!("degenerate crop {rect:?}, exporting the full canvas");
                canvas.clone()
            }
        }
    }

    /// Save: encode the committed edits and end the session.
    pub fn finalize(mut self, export: &ExportConfig) -> Result<Vec<u8>> {
        let output = self.render_output();
        let encoded = output.encode(export)?;
        log::info!(
            "finalized {}x{} -> {}x{} {} ({} bytes)",
            self.source.width(),
            self.source.height(),
            output.width(),
            output.height(),
            export.format.mime(),
            encoded.len()
        );
        Ok(encoded)
    }

    pub fn finalize_data_url(mut self, export: &ExportConfig) -> Result<String> {
        let output = self.render_output();
        output.to_data_url(export)
    }

    /// Discard the session without producing anything.
    pub fn cancel(self) {
        log::debug!("edit session cancelled");
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
