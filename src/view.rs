//! On-screen pan/zoom of the preview. Never affects exported pixels.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub const MIN_VIEW_SCALE: f64 = 0.5;
pub const MAX_VIEW_SCALE: f64 = 5.0;
/// Increment applied by the zoom in/out buttons.
pub const ZOOM_STEP: f64 = 0.25;
/// Scale change per unit of wheel `deltaY`.
pub const WHEEL_SENSITIVITY: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Point::default(),
        }
    }
}

impl ViewTransform {
    /// Additive zoom, as used by the step buttons.
    pub fn zoom_by(&mut self, delta: f64) {
        if delta.is_finite() {
            self.scale = clamp_scale(self.scale + delta);
        }
    }

    /// Multiplicative zoom from a wheel event; scrolling up (negative
    /// `delta_y`) zooms in.
    pub fn zoom_wheel(&mut self, delta_y: f64) {
        if delta_y.is_finite() && delta_y != 0.0 {
            self.scale = clamp_scale(self.scale * (1.0 - delta_y * WHEEL_SENSITIVITY));
        }
    }

    /// Offset from a pan that started at `pointer_start` with the view
    /// translated by `translate_start`. Unbounded on purpose: the image may
    /// be panned fully out of view.
    pub fn pan_to(&mut self, translate_start: Point, pointer_start: Point, pointer: Point) {
        let (dx, dy) = (pointer.x - pointer_start.x, pointer.y - pointer_start.y);
        if dx.is_finite() && dy.is_finite() {
            self.translate = Point::new(translate_start.x + dx, translate_start.y + dy);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Zoom level as a rounded percentage, for the zoom readout.
    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }
}

fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_VIEW_SCALE, MAX_VIEW_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_zoom_is_clamped() {
        let mut view = ViewTransform::default();
        for _ in 0..40 {
            view.zoom_by(ZOOM_STEP);
        }
        assert_eq!(view.scale, MAX_VIEW_SCALE);
        for _ in 0..40 {
            view.zoom_by(-ZOOM_STEP);
        }
        assert_eq!(view.scale, MIN_VIEW_SCALE);
    }

    #[test]
    fn wheel_zoom_is_proportional() {
        let mut view = ViewTransform::default();
        view.zoom_wheel(-100.0);
        assert!((view.scale - 1.2).abs() < 1e-12);
        view.zoom_wheel(100_000.0);
        assert_eq!(view.scale, MIN_VIEW_SCALE);
        view.zoom_wheel(f64::NAN);
        assert_eq!(view.scale, MIN_VIEW_SCALE);
    }

    #[test]
    fn pan_is_relative_to_drag_start() {
        let mut view = ViewTransform::default();
        view.pan_to(Point::new(10.0, 10.0), Point::new(100.0, 100.0), Point::new(5000.0, 90.0));
        assert_eq!(view.translate, Point::new(4910.0, 0.0));
        view.reset();
        assert_eq!(view, ViewTransform::default());
        assert_eq!(view.percent(), 100);
    }
}
