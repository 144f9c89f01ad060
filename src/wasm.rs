//! JavaScript bindings.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::config::{CollageLayout, ExportConfig};
use crate::error::PrepError;
use crate::geometry::{AspectPreset, CropHandle, CropRect, Point};
use crate::raster::RasterImage;
use crate::session::{EditSession, ToolTab};
use crate::{collage, swatches};

// Callers show the message in an alert; the full error goes to the log.
fn js_err(err: PrepError) -> JsValue {
    log::warn!("{err}");
    JsValue::from_str(&err.user_message())
}

fn hex_array(hex: Vec<String>) -> Array {
    let out = Array::new();
    for color in hex {
        out.push(&JsValue::from_str(&color));
    }
    out
}

/// Dominant colors of an encoded image as `#rrggbb` strings (0 to 5 entries).
#[wasm_bindgen(js_name = extractPalette)]
pub fn extract_palette(input: Vec<u8>) -> Result<Array, JsValue> {
    swatches::extract_palette_bytes(&input)
        .map(hex_array)
        .map_err(js_err)
}

#[wasm_bindgen(js_name = extractPaletteFromDataUrl)]
pub fn extract_palette_from_data_url(data_url: &str) -> Result<Array, JsValue> {
    swatches::extract_palette_data_url(data_url)
        .map(hex_array)
        .map_err(js_err)
}

/// Side-by-side before/after image, returned as a JPEG data URL.
#[wasm_bindgen(js_name = createComparisonCollage)]
pub fn create_comparison_collage(original: Vec<u8>, generated: Vec<u8>) -> Result<String, JsValue> {
    let original = RasterImage::decode(&original).map_err(js_err)?;
    let generated = RasterImage::decode(&generated).map_err(js_err)?;
    collage::comparison_collage(&original, &generated, &CollageLayout::default())
        .to_data_url(&ExportConfig::default())
        .map_err(js_err)
}

/// Photo editor session. Construct it once the file bytes are available;
/// `save` and `cancel` consume the object.
#[wasm_bindgen]
pub struct ImageEditor {
    session: EditSession,
}

impl ImageEditor {
    fn open(source: RasterImage, initial_tab: Option<String>) -> ImageEditor {
        // Unknown tab names fall back to the adjust tab.
        let tab = initial_tab
            .as_deref()
            .and_then(|t| t.parse::<ToolTab>().ok())
            .unwrap_or_default();
        ImageEditor {
            session: EditSession::with_tab(source, tab),
        }
    }
}

#[wasm_bindgen]
impl ImageEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(input: Vec<u8>, initial_tab: Option<String>) -> Result<ImageEditor, JsValue> {
        let source = RasterImage::decode(&input).map_err(js_err)?;
        Ok(Self::open(source, initial_tab))
    }

    #[wasm_bindgen(js_name = fromDataUrl)]
    pub fn from_data_url(data_url: &str, initial_tab: Option<String>) -> Result<ImageEditor, JsValue> {
        let source = RasterImage::from_data_url(data_url).map_err(js_err)?;
        Ok(Self::open(source, initial_tab))
    }

    /// Canonical canvas width (after rotation).
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.session.canvas_size().0
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.session.canvas_size().1
    }

    #[wasm_bindgen(getter)]
    pub fn brightness(&self) -> u16 {
        self.session.brightness()
    }

    #[wasm_bindgen(getter)]
    pub fn contrast(&self) -> u16 {
        self.session.contrast()
    }

    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> u32 {
        self.session.rotation().degrees()
    }

    #[wasm_bindgen(getter)]
    pub fn tab(&self) -> String {
        self.session.tab().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn aspect(&self) -> String {
        self.session.aspect().label().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.session.view().scale
    }

    #[wasm_bindgen(getter, js_name = zoomPercent)]
    pub fn zoom_percent(&self) -> u32 {
        self.session.view().percent()
    }

    #[wasm_bindgen(getter, js_name = translateX)]
    pub fn translate_x(&self) -> f64 {
        self.session.view().translate.x
    }

    #[wasm_bindgen(getter, js_name = translateY)]
    pub fn translate_y(&self) -> f64 {
        self.session.view().translate.y
    }

    #[wasm_bindgen(getter, js_name = isPanning)]
    pub fn is_panning(&self) -> bool {
        self.session.is_panning()
    }

    /// Active crop handle name, or `undefined` when no crop drag is running.
    #[wasm_bindgen(getter, js_name = activeHandle)]
    pub fn active_handle(&self) -> Option<String> {
        self.session.active_handle().map(|h| h.as_str().to_string())
    }

    /// `{x, y, width, height}` in percent, or `null`.
    #[wasm_bindgen(js_name = cropRect)]
    pub fn crop_rect(&self) -> Result<JsValue, JsValue> {
        let Some(rect) = self.session.crop() else {
            return Ok(JsValue::NULL);
        };
        let obj = Object::new();
        Reflect::set(&obj, &JsValue::from_str("x"), &JsValue::from_f64(rect.x))?;
        Reflect::set(&obj, &JsValue::from_str("y"), &JsValue::from_f64(rect.y))?;
        Reflect::set(&obj, &JsValue::from_str("width"), &JsValue::from_f64(rect.width))?;
        Reflect::set(&obj, &JsValue::from_str("height"), &JsValue::from_f64(rect.height))?;
        Ok(obj.into())
    }

    #[wasm_bindgen(js_name = setBrightness)]
    pub fn set_brightness(&mut self, percent: i32) {
        self.session.set_brightness(percent);
    }

    #[wasm_bindgen(js_name = setContrast)]
    pub fn set_contrast(&mut self, percent: i32) {
        self.session.set_contrast(percent);
    }

    pub fn rotate(&mut self) {
        self.session.rotate_clockwise();
    }

    #[wasm_bindgen(js_name = switchTab)]
    pub fn switch_tab(&mut self, tab: &str) -> Result<(), JsValue> {
        let tab = tab.parse::<ToolTab>().map_err(js_err)?;
        self.session.switch_tab(tab);
        Ok(())
    }

    /// Accepts the preset labels: `Free`, `1:1`, `4:3`, `3:4`, `16:9`, `9:16`.
    #[wasm_bindgen(js_name = selectAspect)]
    pub fn select_aspect(&mut self, label: &str) -> Result<(), JsValue> {
        let preset = label.parse::<AspectPreset>().map_err(js_err)?;
        self.session.select_aspect(preset);
        Ok(())
    }

    #[wasm_bindgen(js_name = setCrop)]
    pub fn set_crop(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.session.set_crop(CropRect::new(x, y, width, height));
    }

    #[wasm_bindgen(js_name = clearCrop)]
    pub fn clear_crop(&mut self) {
        self.session.clear_crop();
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        self.session.zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        self.session.zoom_out();
    }

    /// Feed a wheel event's `deltaY`.
    #[wasm_bindgen(js_name = zoomWheel)]
    pub fn zoom_wheel(&mut self, delta_y: f64) {
        self.session.zoom_wheel(delta_y);
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&mut self) {
        self.session.reset_view();
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, client_x: f64, client_y: f64) {
        self.session.begin_pan(Point::new(client_x, client_y));
    }

    /// Start dragging the crop body (`"move"`) or a corner. Coordinates are
    /// relative to the displayed canvas, whose on-screen size is
    /// `container_w`×`container_h`.
    #[wasm_bindgen(js_name = cropPointerDown)]
    pub fn crop_pointer_down(
        &mut self,
        handle: &str,
        x: f64,
        y: f64,
        container_w: f64,
        container_h: f64,
    ) -> Result<bool, JsValue> {
        let handle = handle.parse::<CropHandle>().map_err(js_err)?;
        Ok(self
            .session
            .begin_crop_drag(handle, Point::new(x, y), container_w, container_h))
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.session.pointer_move(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
    }

    #[wasm_bindgen(js_name = resetAll)]
    pub fn reset_all(&mut self) {
        self.session.reset_all();
    }

    /// RGBA bytes of the canonical canvas, ready for `new ImageData(...)`.
    #[wasm_bindgen(js_name = previewRgba)]
    pub fn preview_rgba(&mut self) -> Vec<u8> {
        self.session.canonical_canvas().as_rgba().as_raw().clone()
    }

    /// Apply the edits and return the result as a JPEG data URL.
    pub fn save(self, quality: Option<u8>) -> Result<String, JsValue> {
        let export = quality.map(ExportConfig::jpeg).unwrap_or_default();
        self.session.finalize_data_url(&export).map_err(js_err)
    }

    pub fn cancel(self) {
        self.session.cancel();
    }
}
