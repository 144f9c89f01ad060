//! Crop rectangle geometry in percentage space.
//!
//! Everything here is a pure function over `CropRect` values. Coordinates are
//! percentages (0-100) of the canonical canvas; the invariant maintained by
//! every operation is `0 <= x`, `x + width <= 100`, `width >= MIN_CROP_SIZE`
//! and the same for the vertical axis. Out-of-range input is clamped, never
//! rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrepError;

pub const PERCENT_MAX: f64 = 100.0;
/// Smallest crop side, in percent of the canvas side.
pub const MIN_CROP_SIZE: f64 = 5.0;
/// Share of the limiting canvas dimension covered by a fresh crop rectangle.
pub const INITIAL_CROP_FILL: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer source region on a concrete canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the rectangle satisfies the crop invariant.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height].iter().all(|v| v.is_finite())
            && self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= PERCENT_MAX
            && self.bottom() <= PERCENT_MAX
            && self.width >= MIN_CROP_SIZE
            && self.height >= MIN_CROP_SIZE
    }

    /// Force an arbitrary rectangle into the invariant: sides are clamped to
    /// `[MIN_CROP_SIZE, 100]` first, then the origin is pulled inside.
    pub fn normalized(self) -> Self {
        let width = clamp_or(self.width, MIN_CROP_SIZE, PERCENT_MAX, MIN_CROP_SIZE);
        let height = clamp_or(self.height, MIN_CROP_SIZE, PERCENT_MAX, MIN_CROP_SIZE);
        let x = fit_start(clamp_or(self.x, 0.0, PERCENT_MAX - width, 0.0), width);
        let y = fit_start(clamp_or(self.y, 0.0, PERCENT_MAX - height, 0.0), height);
        Self { x, y, width, height }
    }

    /// Map onto a `canvas_w`×`canvas_h` canvas. Returns `None` when the
    /// rectangle is not valid or covers less than one pixel on either axis.
    pub fn to_pixels(&self, canvas_w: u32, canvas_h: u32) -> Option<PixelRect> {
        if !self.is_valid() || canvas_w == 0 || canvas_h == 0 {
            return None;
        }
        let x = percent_to_px(self.x, canvas_w).min(canvas_w);
        let y = percent_to_px(self.y, canvas_h).min(canvas_h);
        let width = percent_to_px(self.width, canvas_w).min(canvas_w - x);
        let height = percent_to_px(self.height, canvas_h).min(canvas_h - y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(PixelRect { x, y, width, height })
    }
}

/// What a crop drag grabbed: the body, or one of the four corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropHandle {
    Move,
    Nw,
    Ne,
    Sw,
    Se,
}

impl CropHandle {
    pub fn as_str(self) -> &'static str {
        match self {
            CropHandle::Move => "move",
            CropHandle::Nw => "nw",
            CropHandle::Ne => "ne",
            CropHandle::Sw => "sw",
            CropHandle::Se => "se",
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, CropHandle::Nw | CropHandle::Sw)
    }

    fn moves_right(self) -> bool {
        matches!(self, CropHandle::Ne | CropHandle::Se)
    }

    fn moves_top(self) -> bool {
        matches!(self, CropHandle::Nw | CropHandle::Ne)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, CropHandle::Sw | CropHandle::Se)
    }
}

impl FromStr for CropHandle {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "move" => Ok(CropHandle::Move),
            "nw" => Ok(CropHandle::Nw),
            "ne" => Ok(CropHandle::Ne),
            "sw" => Ok(CropHandle::Sw),
            "se" => Ok(CropHandle::Se),
            _ => Err(PrepError::invalid_parameter("crop handle", s)),
        }
    }
}

/// Translate by `(dx, dy)` percent, keeping the rectangle inside the canvas.
pub fn apply_move_delta(rect: CropRect, dx: f64, dy: f64) -> CropRect {
    let (dx, dy) = (finite_or_zero(dx), finite_or_zero(dy));
    CropRect {
        x: fit_start((rect.x + dx).max(0.0).min(PERCENT_MAX - rect.width), rect.width),
        y: fit_start((rect.y + dy).max(0.0).min(PERCENT_MAX - rect.height), rect.height),
        ..rect
    }
}

/// Drag a corner by `(dx, dy)` percent. Each affected edge is clamped on its
/// own: it stops `MIN_CROP_SIZE` short of the opposite edge and never leaves
/// `[0, 100]`. The aspect ratio is not preserved.
pub fn apply_resize_delta(rect: CropRect, handle: CropHandle, dx: f64, dy: f64) -> CropRect {
    let (dx, dy) = (finite_or_zero(dx), finite_or_zero(dy));
    let mut out = rect;

    if handle.moves_left() {
        let delta = dx.max(-out.x).min(out.width - MIN_CROP_SIZE);
        out.x += delta;
        (out.x, out.width) = fit_span(out.x, (out.width - delta).max(MIN_CROP_SIZE));
    }
    if handle.moves_right() {
        let width = (out.width + dx).max(MIN_CROP_SIZE);
        (out.x, out.width) = fit_span(out.x, width);
    }
    if handle.moves_top() {
        let delta = dy.max(-out.y).min(out.height - MIN_CROP_SIZE);
        out.y += delta;
        (out.y, out.height) = fit_span(out.y, (out.height - delta).max(MIN_CROP_SIZE));
    }
    if handle.moves_bottom() {
        let height = (out.height + dy).max(MIN_CROP_SIZE);
        (out.y, out.height) = fit_span(out.y, height);
    }
    out
}

/// Dispatch a drag delta to the move or resize rule.
pub fn apply_drag(rect: CropRect, handle: CropHandle, dx: f64, dy: f64) -> CropRect {
    match handle {
        CropHandle::Move => apply_move_delta(rect, dx, dy),
        corner => apply_resize_delta(rect, corner, dx, dy),
    }
}

/// Centered rectangle covering 80% of the limiting dimension for `ratio`
/// (width / height in pixels), or of the canvas' own ratio when `None`.
pub fn initial_crop_rect(canvas_w: u32, canvas_h: u32, ratio: Option<f64>) -> CropRect {
    let fill = INITIAL_CROP_FILL * PERCENT_MAX;
    if canvas_w == 0 || canvas_h == 0 {
        return centered(fill, fill);
    }
    let (cw, ch) = (canvas_w as f64, canvas_h as f64);
    let canvas_ratio = cw / ch;
    let effective = ratio.filter(|r| r.is_finite() && *r > 0.0).unwrap_or(canvas_ratio);

    let (w, h) = if effective > canvas_ratio {
        (fill, (cw * INITIAL_CROP_FILL / effective / ch) * PERCENT_MAX)
    } else {
        ((ch * INITIAL_CROP_FILL * effective / cw) * PERCENT_MAX, fill)
    };
    centered(side(w), side(h))
}

fn centered(width: f64, height: f64) -> CropRect {
    CropRect {
        x: fit_start((PERCENT_MAX - width) / 2.0, width),
        y: fit_start((PERCENT_MAX - height) / 2.0, height),
        width,
        height,
    }
}

// Truncates like a canvas size assignment; the epsilon absorbs values such
// as 239.99999999999997 that are meant to be whole.
fn percent_to_px(percent: f64, dim: u32) -> u32 {
    ((percent * dim as f64 / PERCENT_MAX) + 1e-9).floor().max(0.0) as u32
}

/// Keep `start + len <= 100` after rounding. An overshooting far edge is
/// put on the border, shrinking `len` first and moving `start` only when
/// `len` is already at the minimum.
fn fit_span(start: f64, len: f64) -> (f64, f64) {
    if start + len <= PERCENT_MAX {
        return (start, len);
    }
    let len = largest_fitting(start, PERCENT_MAX - start).max(MIN_CROP_SIZE);
    (fit_start(start, len), len)
}

/// `start`, pulled back just enough that `start + len <= 100`.
fn fit_start(start: f64, len: f64) -> f64 {
    if start + len <= PERCENT_MAX {
        return start;
    }
    largest_fitting(len, PERCENT_MAX - len).max(0.0).min(start)
}

// Largest float near `guess` with `fixed + v <= 100`; lands the sum on 100
// exactly whenever some float does.
fn largest_fitting(fixed: f64, guess: f64) -> f64 {
    let mut v = guess;
    while v > 0.0 && fixed + v > PERCENT_MAX {
        v = next_down(v);
    }
    while fixed + v < PERCENT_MAX && fixed + next_up(v) <= PERCENT_MAX {
        v = next_up(v);
    }
    v
}

// Neighbouring floats for non-negative finite values.
fn next_down(v: f64) -> f64 {
    if v > 0.0 { f64::from_bits(v.to_bits() - 1) } else { v }
}

fn next_up(v: f64) -> f64 {
    if v >= 0.0 { f64::from_bits(v.to_bits() + 1) } else { v }
}

fn side(v: f64) -> f64 {
    clamp_or(v, MIN_CROP_SIZE, PERCENT_MAX, MIN_CROP_SIZE)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn clamp_or(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_nan() { fallback } else { v.max(lo).min(hi) }
}

/// Crop ratio presets offered to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectPreset {
    #[default]
    Free,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "16:9")]
    Wide16x9,
    #[serde(rename = "9:16")]
    Tall9x16,
}

impl AspectPreset {
    pub const ALL: [AspectPreset; 6] = [
        AspectPreset::Free,
        AspectPreset::Square,
        AspectPreset::Landscape4x3,
        AspectPreset::Portrait3x4,
        AspectPreset::Wide16x9,
        AspectPreset::Tall9x16,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AspectPreset::Free => "Free",
            AspectPreset::Square => "1:1",
            AspectPreset::Landscape4x3 => "4:3",
            AspectPreset::Portrait3x4 => "3:4",
            AspectPreset::Wide16x9 => "16:9",
            AspectPreset::Tall9x16 => "9:16",
        }
    }

    /// Width / height, `None` for free-form.
    pub fn ratio(self) -> Option<f64> {
        match self {
            AspectPreset::Free => None,
            AspectPreset::Square => Some(1.0),
            AspectPreset::Landscape4x3 => Some(4.0 / 3.0),
            AspectPreset::Portrait3x4 => Some(3.0 / 4.0),
            AspectPreset::Wide16x9 => Some(16.0 / 9.0),
            AspectPreset::Tall9x16 => Some(9.0 / 16.0),
        }
    }
}

impl fmt::Display for AspectPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectPreset {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AspectPreset::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PrepError::invalid_parameter("aspect ratio", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn move_is_clamped_to_canvas() {
        let rect = CropRect::new(10.0, 10.0, 50.0, 40.0);
        let moved = apply_move_delta(rect, 500.0, -500.0);
        assert_eq!(moved, CropRect::new(50.0, 0.0, 50.0, 40.0));
    }

    #[test]
    fn east_edge_stops_at_canvas_border() {
        // x + width would reach 110.
        let rect = CropRect::new(10.0, 10.0, 80.0, 50.0);
        let out = apply_resize_delta(rect, CropHandle::Se, 20.0, 0.0);
        assert!(approx(out.right(), 100.0));
        assert!(approx(out.width, 90.0));
        assert_eq!(out.x, 10.0);
    }

    #[test]
    fn clamped_edges_land_on_the_border_without_overshoot() {
        let rect = CropRect::new(1.93637346614828, 10.0, 18.410517618929923, 50.0);
        let out = apply_resize_delta(rect, CropHandle::Se, 500.0, 500.0);
        assert_eq!(out.right(), 100.0);
        assert!(out.bottom() <= 100.0);
        assert_eq!(out.x, rect.x);

        let moved = apply_move_delta(out, 500.0, 500.0);
        assert!(moved.right() <= 100.0 && moved.bottom() <= 100.0);
        assert!(moved.is_valid());
    }

    #[test]
    fn west_edge_cannot_cross_east_edge() {
        let rect = CropRect::new(20.0, 20.0, 30.0, 30.0);
        let out = apply_resize_delta(rect, CropHandle::Nw, 100.0, 100.0);
        assert!(approx(out.width, MIN_CROP_SIZE));
        assert!(approx(out.height, MIN_CROP_SIZE));
        assert!(approx(out.right(), 50.0));
        assert!(approx(out.bottom(), 50.0));
    }

    #[test]
    fn west_edge_cannot_leave_canvas() {
        let rect = CropRect::new(20.0, 20.0, 30.0, 30.0);
        let out = apply_resize_delta(rect, CropHandle::Sw, -80.0, 0.0);
        assert_eq!(out.x, 0.0);
        assert!(approx(out.width, 50.0));
    }

    #[test]
    fn corner_only_touches_its_edges() {
        let rect = CropRect::new(20.0, 20.0, 30.0, 30.0);
        let out = apply_resize_delta(rect, CropHandle::Ne, 5.0, -5.0);
        assert_eq!(out, CropRect::new(20.0, 15.0, 35.0, 35.0));
    }

    #[test]
    fn non_finite_deltas_are_ignored() {
        let rect = CropRect::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(apply_drag(rect, CropHandle::Move, f64::NAN, f64::INFINITY), rect);
        assert_eq!(apply_drag(rect, CropHandle::Se, f64::NEG_INFINITY, f64::NAN), rect);
    }

    #[test]
    fn free_initial_rect_is_80_percent_centered() {
        let rect = initial_crop_rect(400, 300, None);
        assert!(approx(rect.x, 10.0) && approx(rect.y, 10.0));
        assert!(approx(rect.width, 80.0) && approx(rect.height, 80.0));
    }

    #[test]
    fn square_initial_rect_on_landscape_canvas() {
        let rect = initial_crop_rect(400, 300, Some(1.0));
        // Height limits: 80% of 300 = 240px, so width = 240px = 60%.
        assert!(approx(rect.height, 80.0));
        assert!(approx(rect.width, 60.0));
        assert!(approx(rect.x, 20.0));
    }

    #[test]
    fn wide_initial_rect_on_landscape_canvas() {
        let rect = initial_crop_rect(400, 300, Some(16.0 / 9.0));
        // Width limits: 320px wide, 180px tall = 60%.
        assert!(approx(rect.width, 80.0));
        assert!(approx(rect.height, 60.0));
        assert!(approx(rect.y, 20.0));
    }

    #[test]
    fn extreme_ratio_still_respects_minimum_size() {
        let rect = initial_crop_rect(10, 1000, Some(16.0 / 9.0));
        assert!(rect.is_valid());
    }

    #[test]
    fn pixel_mapping_uses_canvas_dimensions() {
        let rect = CropRect::new(25.0, 25.0, 50.0, 50.0);
        assert_eq!(
            rect.to_pixels(300, 400),
            Some(PixelRect { x: 75, y: 100, width: 150, height: 200 })
        );
    }

    #[test]
    fn degenerate_rects_have_no_pixels() {
        assert_eq!(CropRect::new(0.0, 0.0, 1.0, 50.0).to_pixels(100, 100), None);
        assert_eq!(CropRect::new(f64::NAN, 0.0, 50.0, 50.0).to_pixels(100, 100), None);
        // Valid in percent but below one pixel on a tiny canvas.
        assert_eq!(CropRect::new(0.0, 0.0, 10.0, 10.0).to_pixels(5, 5), None);
    }

    #[test]
    fn normalize_repairs_out_of_range_rects() {
        let rect = CropRect::new(-10.0, 95.0, 200.0, 1.0).normalized();
        assert_eq!(rect, CropRect::new(0.0, 95.0, 100.0, 5.0));
        assert!(CropRect::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN).normalized().is_valid());
    }

    #[test]
    fn presets_parse_from_labels() {
        assert_eq!("16:9".parse::<AspectPreset>().unwrap(), AspectPreset::Wide16x9);
        assert_eq!("free".parse::<AspectPreset>().unwrap(), AspectPreset::Free);
        assert!("2:1".parse::<AspectPreset>().is_err());
        assert_eq!("SE".parse::<CropHandle>().unwrap(), CropHandle::Se);
    }

    fn arb_handle() -> impl Strategy<Value = CropHandle> {
        prop_oneof![
            Just(CropHandle::Move),
            Just(CropHandle::Nw),
            Just(CropHandle::Ne),
            Just(CropHandle::Sw),
            Just(CropHandle::Se),
        ]
    }

    fn arb_delta() -> impl Strategy<Value = f64> {
        prop_oneof![
            -150.0..150.0f64,
            Just(-1e12),
            Just(1e12),
            Just(0.0),
        ]
    }

    fn arb_rect() -> impl Strategy<Value = CropRect> {
        (0.0..100.0f64, 0.0..100.0f64, 0.0..100.0f64, 0.0..100.0f64)
            .prop_map(|(x, y, w, h)| CropRect::new(x, y, w, h).normalized())
    }

    proptest! {
        #[test]
        fn far_edges_never_pass_the_border(
            rect in arb_rect(),
            handle in arb_handle(),
            dx in arb_delta(),
            dy in arb_delta(),
        ) {
            prop_assert!(rect.is_valid(), "{:?}", rect);
            let out = apply_drag(rect, handle, dx, dy);
            prop_assert!(out.x + out.width <= 100.0, "{:?}", out);
            prop_assert!(out.y + out.height <= 100.0, "{:?}", out);
            prop_assert!(out.x >= 0.0 && out.y >= 0.0, "{:?}", out);
            prop_assert!(out.width >= MIN_CROP_SIZE && out.height >= MIN_CROP_SIZE, "{:?}", out);
        }

        #[test]
        fn drags_preserve_the_crop_invariant(
            w in 1u32..1000,
            h in 1u32..1000,
            drags in prop::collection::vec((arb_handle(), arb_delta(), arb_delta()), 1..40),
        ) {
            let mut rect = initial_crop_rect(w, h, None);
            for (handle, dx, dy) in drags {
                rect = apply_drag(rect, handle, dx, dy);
                prop_assert!(rect.is_valid(), "invalid rect {:?}", rect);
            }
        }

        #[test]
        fn normalized_is_always_valid(
            x in -1e6..1e6f64,
            y in -1e6..1e6f64,
            width in -1e6..1e6f64,
            height in -1e6..1e6f64,
        ) {
            prop_assert!(CropRect::new(x, y, width, height).normalized().is_valid());
        }
    }
}
