//! Fingertip → screen coordinate mapping with exponential smoothing.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Region of the camera frame that is stretched over the whole screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveRect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl ActiveRect {
    /// Trim `margin` pixels off every edge of a `width`×`height` frame, then
    /// shift the vertical bounds up by `vertical_offset`.
    pub fn from_frame(width: u32, height: u32, margin: u32, vertical_offset: u32) -> Self {
        let (w, h, m, o) = (
            f64::from(width),
            f64::from(height),
            f64::from(margin),
            f64::from(vertical_offset),
        );
        Self {
            left: m,
            right: w - m,
            top: m - o,
            bottom: h - m - o,
        }
    }
}

// Affine map of `v` from [a0, a1] onto [b0, b1]; values outside extrapolate.
fn lerp_range(v: f64, a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    b0 + (v - a0) * (b1 - b0) / (a1 - a0)
}

/// Screen-space target for a raw camera-space fingertip, before smoothing.
pub fn interpolate(raw: Point, rect: &ActiveRect, screen: ScreenSize) -> Point {
    Point {
        x: lerp_range(raw.x, rect.left, rect.right, 0.0, f64::from(screen.width)),
        y: lerp_range(raw.y, rect.top, rect.bottom, 0.0, f64::from(screen.height)),
    }
}

/// One smoothing step: move `prev` a `1/factor` fraction of the way toward the
/// interpolated target.
pub fn smooth(
    raw: Point,
    rect: &ActiveRect,
    screen: ScreenSize,
    prev: Point,
    factor: f64,
) -> Point {
    let target = interpolate(raw, rect, screen);
    Point {
        x: prev.x + (target.x - prev.x) / factor,
        y: prev.y + (target.y - prev.y) / factor,
    }
}

/// Final pointer position: X mirrored for the flipped camera, clamped to the
/// screen.
pub fn move_target(smoothed: Point, screen: ScreenSize) -> Point {
    let w = f64::from(screen.width);
    let h = f64::from(screen.height);
    Point {
        x: (w - smoothed.x).clamp(0.0, w),
        y: smoothed.y.clamp(0.0, h),
    }
}
