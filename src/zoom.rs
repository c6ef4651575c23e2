//! Zoom/pan viewport engine for a single focused image.
//!
//! ## Coordinate model
//!
//! Input positions are container-local (origin top-left, CSS pixels). The
//! image is first fitted ("contain") into the container, then scaled by
//! `zoom` about the container centre, then translated by `pan`:
//!
//! ```text
//! screen = centre + pan + (fitted_point - centre) * zoom
//! ```
//!
//! Zooming "anchored" at a point `a` keeps the image pixel under `a` where it
//! is. With `c = a - centre`, the new pan for a zoom change `z → z'` is
//!
//! ```text
//! pan' = c - (c - pan) * z' / z
//! ```
//!
//! ## Clamping
//!
//! Every operation computes its raw candidate first and clamps afterwards, so
//! an overshooting gesture lands exactly on the bound. Zoom is clamped to
//! `[min_zoom, max_zoom]`. Pan is clamped per axis to
//! `±max(0, (fitted * zoom - container) / 2)`, which keeps the image edges
//! from retreating inside the container; an axis where the zoomed image is
//! not larger than the container is locked to 0, and so is all pan while
//! zoom sits at `min_zoom`. NaN candidates are dropped and the previous
//! value kept.
//!
//! ## Gesture sessions
//!
//! A drag or pinch exists only between its start and end events. Sessions
//! end on pointer up/cancel, touch end/cancel, [`ZoomPanEngine::reset_zoom`]
//! and [`ZoomPanEngine::reset_for_identity`]. Hosts that own a whole gesture
//! in one scope can use [`ZoomPanEngine::drag`] / [`ZoomPanEngine::pinch`],
//! whose guards end the session when dropped.

use crate::config::ZoomConfig;
use crate::types::Dimensions;
use std::ops::{Add, Mul, Sub};

/// 2D vector in CSS pixels. Used for positions and offsets alike.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn midpoint(self, other: Vec2) -> Vec2 {
        (self + other) * 0.5
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_positive(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

impl From<Dimensions> for Size {
    fn from(d: Dimensions) -> Self {
        Size::new(d.width as f64, d.height as f64)
    }
}

/// Scale + offset applied to the focused image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub zoom: f64,
    pub pan: Vec2,
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform = ViewportTransform {
        zoom: 1.0,
        pan: Vec2::ZERO,
    };

    /// CSS `transform` value, e.g. `translate(12px, -4px) scale(2)`.
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.pan.x, self.pan.y, self.zoom
        )
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureSession {
    Drag {
        last: Vec2,
    },
    Pinch {
        start_distance: f64,
        start_zoom: f64,
        start_pan: Vec2,
        start_midpoint: Vec2,
    },
}

/// Gesture-driven viewport transform. See the [module docs](self).
#[derive(Debug, Clone)]
pub struct ZoomPanEngine {
    config: ZoomConfig,
    transform: ViewportTransform,
    gesture: Option<GestureSession>,
    container: Size,
    image: Option<Size>,
}

impl ZoomPanEngine {
    pub fn new(config: ZoomConfig) -> Self {
        let transform = ViewportTransform {
            zoom: config.min_zoom,
            pan: Vec2::ZERO,
        };
        Self {
            config,
            transform,
            gesture: None,
            container: Size::default(),
            image: None,
        }
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn zoom(&self) -> f64 {
        self.transform.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.transform.pan
    }

    pub fn is_zoomed(&self) -> bool {
        self.transform.zoom > self.config.min_zoom
    }

    /// Zoom as a rounded percentage, for overlay indicators.
    pub fn zoom_percent(&self) -> u32 {
        (self.transform.zoom * 100.0).round() as u32
    }

    pub fn is_gesturing(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// Update the container size. The current pan is re-clamped.
    pub fn set_container(&mut self, container: Size) {
        self.container = container;
        self.settle(self.transform.zoom, self.transform.pan);
    }

    /// Natural size of the focused image, once known. Unknown images are
    /// treated as filling the container exactly.
    pub fn set_image_size(&mut self, image: Option<Size>) {
        self.image = image.filter(|s| s.is_positive());
        self.settle(self.transform.zoom, self.transform.pan);
    }

    // =========================================================================
    // Buttons
    // =========================================================================

    pub fn zoom_in(&mut self) {
        let raw = self.transform.zoom * self.config.step_factor;
        self.zoom_at(raw, self.centre());
    }

    pub fn zoom_out(&mut self) {
        let raw = self.transform.zoom / self.config.step_factor;
        self.zoom_at(raw, self.centre());
    }

    /// Back to `zoom = 1, pan = (0, 0)`. Any gesture in progress is dropped.
    pub fn reset_zoom(&mut self) {
        self.transform = ViewportTransform {
            zoom: self.config.min_zoom,
            pan: Vec2::ZERO,
        };
        self.gesture = None;
    }

    /// Reset for a newly focused asset: identity transform, no gesture, and
    /// the previous image's size forgotten.
    pub fn reset_for_identity(&mut self) {
        self.reset_zoom();
        self.image = None;
    }

    // =========================================================================
    // Wheel / double-click
    // =========================================================================

    /// Continuous zoom anchored at `cursor`. Positive `delta_y` (scrolling
    /// down) zooms out.
    pub fn handle_wheel(&mut self, delta_y: f64, cursor: Vec2) {
        let raw = self.transform.zoom * (-delta_y * self.config.wheel_sensitivity).exp();
        self.zoom_at(raw, cursor);
    }

    /// Toggle between the resting zoom and `double_click_zoom`, anchored at
    /// `position`.
    pub fn handle_double_click(&mut self, position: Vec2) {
        if self.is_zoomed() {
            self.reset_zoom();
        } else {
            self.zoom_at(self.config.double_click_zoom, position);
        }
    }

    // =========================================================================
    // Pointer drag
    // =========================================================================

    /// Start a drag. Refused (returns `false`) unless zoomed in.
    pub fn pointer_down(&mut self, position: Vec2) -> bool {
        if !self.is_zoomed() || !position.is_finite() {
            return false;
        }
        self.gesture = Some(GestureSession::Drag { last: position });
        true
    }

    /// Pan by the movement since the previous event. No-op outside a drag.
    pub fn pointer_move(&mut self, position: Vec2) {
        let Some(GestureSession::Drag { last }) = self.gesture else {
            return;
        };
        if !position.is_finite() {
            return;
        }
        let raw = self.transform.pan + (position - last);
        self.settle(self.transform.zoom, raw);
        self.gesture = Some(GestureSession::Drag { last: position });
    }

    pub fn pointer_up(&mut self) {
        self.end_drag();
    }

    pub fn pointer_cancel(&mut self) {
        self.end_drag();
    }

    fn end_drag(&mut self) {
        if matches!(self.gesture, Some(GestureSession::Drag { .. })) {
            self.gesture = None;
        }
    }

    // =========================================================================
    // Touch (pinch, one-finger pan)
    // =========================================================================

    /// Two touches start a pinch (replacing any drag); a single touch starts
    /// a drag when zoomed in. Other counts are ignored.
    pub fn touch_start(&mut self, touches: &[Vec2]) {
        match touches {
            [a, b] => {
                let start_distance = (*a - *b).length();
                if start_distance.is_finite() && start_distance > f64::EPSILON {
                    self.gesture = Some(GestureSession::Pinch {
                        start_distance,
                        start_zoom: self.transform.zoom,
                        start_pan: self.transform.pan,
                        start_midpoint: a.midpoint(*b),
                    });
                }
            }
            [single] => {
                self.pointer_down(*single);
            }
            _ => {}
        }
    }

    pub fn touch_move(&mut self, touches: &[Vec2]) {
        match (self.gesture, touches) {
            (
                Some(GestureSession::Pinch {
                    start_distance,
                    start_zoom,
                    start_pan,
                    start_midpoint,
                }),
                [a, b, ..],
            ) => {
                let ratio = (*a - *b).length() / start_distance;
                let zoom = self.clamp_zoom(start_zoom * ratio);

                // Keep the image point that was under the starting midpoint
                // under the current midpoint.
                let m0 = start_midpoint - self.centre();
                let m = a.midpoint(*b) - self.centre();
                let anchored = (m0 - start_pan) * (1.0 / start_zoom);
                self.settle(zoom, m - anchored * zoom);
            }
            (Some(GestureSession::Drag { .. }), [single]) => self.pointer_move(*single),
            _ => {}
        }
    }

    pub fn touch_end(&mut self) {
        self.gesture = None;
    }

    pub fn touch_cancel(&mut self) {
        self.gesture = None;
    }

    // =========================================================================
    // Scoped gestures
    // =========================================================================

    /// Begin a drag that ends when the returned guard is dropped.
    pub fn drag(&mut self, origin: Vec2) -> Option<DragGuard<'_>> {
        if self.pointer_down(origin) {
            Some(DragGuard { engine: self })
        } else {
            None
        }
    }

    /// Begin a pinch that ends when the returned guard is dropped.
    pub fn pinch(&mut self, a: Vec2, b: Vec2) -> Option<PinchGuard<'_>> {
        self.touch_start(&[a, b]);
        if matches!(self.gesture, Some(GestureSession::Pinch { .. })) {
            Some(PinchGuard { engine: self })
        } else {
            None
        }
    }

    // =========================================================================
    // Math
    // =========================================================================

    fn centre(&self) -> Vec2 {
        Vec2::new(self.container.width / 2.0, self.container.height / 2.0)
    }

    fn zoom_at(&mut self, raw_zoom: f64, anchor: Vec2) {
        let old = self.transform.zoom;
        let zoom = self.clamp_zoom(raw_zoom);
        if !anchor.is_finite() {
            self.settle(zoom, self.transform.pan * (zoom / old));
            return;
        }
        let c = anchor - self.centre();
        let pan = c - (c - self.transform.pan) * (zoom / old);
        self.settle(zoom, pan);
    }

    /// Infinities clamp to the nearest bound; NaN keeps the current zoom.
    fn clamp_zoom(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return self.transform.zoom;
        }
        let zoom = raw.clamp(self.config.min_zoom, self.config.max_zoom);
        if zoom != raw {
            tracing::trace!(raw, zoom, "Zoom clamped");
        }
        zoom
    }

    /// Size of the image at zoom 1 when fitted inside the container.
    fn fitted_size(&self) -> Size {
        let container = self.container;
        if !container.is_positive() {
            return Size::default();
        }
        match self.image {
            Some(image) => {
                let image_aspect = image.width / image.height;
                let container_aspect = container.width / container.height;
                if image_aspect > container_aspect {
                    Size::new(container.width, container.width / image_aspect)
                } else {
                    Size::new(container.height * image_aspect, container.height)
                }
            }
            None => container,
        }
    }

    /// Largest allowed |pan| per axis at `zoom`.
    fn max_pan(&self, zoom: f64) -> Vec2 {
        let fitted = self.fitted_size();
        Vec2::new(
            ((fitted.width * zoom - self.container.width) / 2.0).max(0.0),
            ((fitted.height * zoom - self.container.height) / 2.0).max(0.0),
        )
    }

    /// Commit a zoom and a raw pan candidate, clamping the pan.
    fn settle(&mut self, zoom: f64, raw_pan: Vec2) {
        let raw_pan = if raw_pan.is_finite() {
            raw_pan
        } else {
            self.transform.pan
        };
        let pan = if zoom <= self.config.min_zoom {
            Vec2::ZERO
        } else {
            let bound = self.max_pan(zoom);
            Vec2::new(
                raw_pan.x.clamp(-bound.x, bound.x),
                raw_pan.y.clamp(-bound.y, bound.y),
            )
        };
        if pan != raw_pan {
            tracing::trace!(?raw_pan, ?pan, "Pan clamped");
        }
        self.transform = ViewportTransform { zoom, pan };
    }
}

impl Default for ZoomPanEngine {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

/// Scoped drag session; the drag ends when this is dropped.
pub struct DragGuard<'a> {
    engine: &'a mut ZoomPanEngine,
}

impl DragGuard<'_> {
    pub fn move_to(&mut self, position: Vec2) {
        self.engine.pointer_move(position);
    }

    pub fn transform(&self) -> ViewportTransform {
        self.engine.transform()
    }
}

impl Drop for DragGuard<'_> {
    fn drop(&mut self) {
        self.engine.pointer_up();
    }
}

/// Scoped pinch session; the pinch ends when this is dropped.
pub struct PinchGuard<'a> {
    engine: &'a mut ZoomPanEngine,
}

impl PinchGuard<'_> {
    pub fn move_to(&mut self, a: Vec2, b: Vec2) {
        self.engine.touch_move(&[a, b]);
    }

    pub fn transform(&self) -> ViewportTransform {
        self.engine.transform()
    }
}

impl Drop for PinchGuard<'_> {
    fn drop(&mut self) {
        self.engine.touch_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    /// 1000x800 container, image size unknown (fills the container).
    fn engine() -> ZoomPanEngine {
        let mut engine = ZoomPanEngine::default();
        engine.set_container(Size::new(1000.0, 800.0));
        engine
    }

    fn assert_identity(engine: &ZoomPanEngine) {
        assert_eq!(engine.zoom(), 1.0);
        assert_eq!(engine.pan(), Vec2::ZERO);
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    // =========================================================================
    // Buttons
    // =========================================================================

    #[test]
    fn zoom_in_steps_by_factor() {
        let mut engine = engine();
        engine.zoom_in();
        assert_close(engine.zoom(), 1.5);
        engine.zoom_in();
        assert_close(engine.zoom(), 2.25);
    }

    #[test]
    fn zoom_in_eight_times_stays_within_max() {
        let mut engine = engine();
        for _ in 0..8 {
            engine.zoom_in();
            assert!(engine.zoom() >= 1.0 && engine.zoom() <= 5.0);
        }
        // Overshoot lands exactly on the bound
        assert_eq!(engine.zoom(), 5.0);
    }

    #[test]
    fn zoom_out_to_one_resets_pan() {
        let mut engine = engine();
        engine.zoom_in();
        engine.zoom_in();
        engine.handle_wheel(0.0, Vec2::new(900.0, 700.0));
        assert!(engine.pointer_down(Vec2::new(500.0, 400.0)));
        engine.pointer_move(Vec2::new(450.0, 380.0));
        engine.pointer_up();
        assert_ne!(engine.pan(), Vec2::ZERO);

        for _ in 0..10 {
            engine.zoom_out();
        }
        assert_identity(&engine);
    }

    #[test]
    fn reset_zoom_always_yields_identity() {
        let mut engine = engine();
        engine.handle_double_click(Vec2::new(100.0, 100.0));
        engine.zoom_in();
        engine.pointer_down(Vec2::new(10.0, 10.0));
        engine.reset_zoom();
        assert_identity(&engine);
        assert!(!engine.is_gesturing());
    }

    #[test]
    fn zoom_percent_rounds() {
        let mut engine = engine();
        assert_eq!(engine.zoom_percent(), 100);
        engine.zoom_in();
        assert_eq!(engine.zoom_percent(), 150);
    }

    // =========================================================================
    // Wheel
    // =========================================================================

    #[test]
    fn wheel_up_zooms_in_and_down_zooms_out() {
        let mut engine = engine();
        engine.handle_wheel(-200.0, Vec2::new(500.0, 400.0));
        let zoomed = engine.zoom();
        assert!(zoomed > 1.0);
        engine.handle_wheel(100.0, Vec2::new(500.0, 400.0));
        assert!(engine.zoom() < zoomed);
    }

    #[test]
    fn wheel_keeps_point_under_cursor_fixed() {
        let mut engine = engine();
        let cursor = Vec2::new(700.0, 300.0);
        let c = cursor - Vec2::new(500.0, 400.0);

        engine.handle_wheel(-300.0, cursor);
        let t = engine.transform();
        // Image point under the cursor before zooming was `c` itself (zoom 1,
        // pan 0). After zooming it must still map to the cursor.
        let screen = t.pan + c * t.zoom;
        assert!((screen - c).length() < EPS);
    }

    #[test]
    fn wheel_clamps_both_ends() {
        let mut engine = engine();
        engine.handle_wheel(-1.0e6, Vec2::new(500.0, 400.0));
        assert_eq!(engine.zoom(), 5.0);
        engine.handle_wheel(1.0e6, Vec2::new(500.0, 400.0));
        assert_identity(&engine);
    }

    #[test]
    fn wheel_ignores_non_finite_delta() {
        let mut engine = engine();
        engine.zoom_in();
        engine.handle_wheel(f64::NAN, Vec2::new(500.0, 400.0));
        assert_close(engine.zoom(), 1.5);
    }

    // =========================================================================
    // Double click
    // =========================================================================

    #[test]
    fn double_click_toggles_anchored_zoom() {
        let mut engine = engine();
        engine.handle_double_click(Vec2::new(750.0, 400.0));
        assert_eq!(engine.zoom(), 2.0);
        // Click was 250px right of centre; the pixel there stays put
        assert_close(engine.pan().x, -250.0);
        assert_close(engine.pan().y, 0.0);

        engine.handle_double_click(Vec2::new(10.0, 10.0));
        assert_identity(&engine);
    }

    #[test]
    fn double_click_near_corner_is_clamped_to_edges() {
        let mut engine = engine();
        engine.handle_double_click(Vec2::new(1000.0, 800.0));
        // Raw pan would be (-500, -400); bound at zoom 2 is (500, 400)
        assert_close(engine.pan().x, -500.0);
        assert_close(engine.pan().y, -400.0);
    }

    // =========================================================================
    // Drag
    // =========================================================================

    #[test]
    fn drag_at_zoom_one_has_no_effect() {
        let mut engine = engine();
        assert!(!engine.pointer_down(Vec2::new(100.0, 100.0)));
        engine.pointer_move(Vec2::new(300.0, 250.0));
        engine.pointer_up();
        assert_identity(&engine);
    }

    #[test]
    fn drag_adds_pointer_delta() {
        let mut engine = engine();
        engine.zoom_in(); // 1.5: bound is (250, 200)
        assert!(engine.pointer_down(Vec2::new(100.0, 100.0)));
        engine.pointer_move(Vec2::new(130.0, 90.0));
        engine.pointer_move(Vec2::new(150.0, 80.0));
        assert_close(engine.pan().x, 50.0);
        assert_close(engine.pan().y, -20.0);
    }

    #[test]
    fn drag_clamps_to_container_edges() {
        let mut engine = engine();
        engine.zoom_in(); // bound (250, 200)
        engine.pointer_down(Vec2::new(0.0, 0.0));
        engine.pointer_move(Vec2::new(10_000.0, -10_000.0));
        assert_close(engine.pan().x, 250.0);
        assert_close(engine.pan().y, -200.0);
    }

    #[test]
    fn drag_locks_axis_when_image_narrower_than_container() {
        let mut engine = engine();
        // Tall image: fitted to 400x800 inside 1000x800
        engine.set_image_size(Some(Size::new(500.0, 1000.0)));
        engine.zoom_in(); // 1.5: fitted 600x1200, width still < 1000
        engine.pointer_down(Vec2::new(0.0, 0.0));
        engine.pointer_move(Vec2::new(300.0, 300.0));
        assert_eq!(engine.pan().x, 0.0);
        assert_close(engine.pan().y, 200.0);
    }

    #[test]
    fn moves_after_pointer_up_are_ignored() {
        let mut engine = engine();
        engine.zoom_in();
        engine.pointer_down(Vec2::new(0.0, 0.0));
        engine.pointer_up();
        engine.pointer_move(Vec2::new(50.0, 50.0));
        assert_eq!(engine.pan(), Vec2::ZERO);
    }

    #[test]
    fn drag_guard_ends_session_on_drop() {
        let mut engine = engine();
        engine.zoom_in();
        {
            let mut drag = engine.drag(Vec2::new(0.0, 0.0)).unwrap();
            drag.move_to(Vec2::new(20.0, 10.0));
            assert_close(drag.transform().pan.x, 20.0);
        }
        assert!(!engine.is_gesturing());
    }

    #[test]
    fn drag_guard_refused_at_zoom_one() {
        let mut engine = engine();
        assert!(engine.drag(Vec2::new(0.0, 0.0)).is_none());
    }

    // =========================================================================
    // Pinch
    // =========================================================================

    #[test]
    fn pinch_doubling_distance_doubles_zoom() {
        let mut engine = engine();
        engine.touch_start(&[Vec2::new(400.0, 400.0), Vec2::new(600.0, 400.0)]);
        engine.touch_move(&[Vec2::new(300.0, 400.0), Vec2::new(700.0, 400.0)]);
        assert_close(engine.zoom(), 2.0);
        // Midpoint is the container centre, so no pan is needed
        assert!(engine.pan().length() < EPS);
        engine.touch_end();
        assert!(!engine.is_gesturing());
    }

    #[test]
    fn pinch_ratio_beyond_max_is_clamped() {
        let mut engine = engine();
        engine.touch_start(&[Vec2::new(490.0, 400.0), Vec2::new(510.0, 400.0)]);
        engine.touch_move(&[Vec2::new(0.0, 400.0), Vec2::new(1000.0, 400.0)]);
        assert_eq!(engine.zoom(), 5.0);
    }

    #[test]
    fn pinch_keeps_midpoint_fixed() {
        let mut engine = engine();
        let a = Vec2::new(600.0, 300.0);
        let b = Vec2::new(700.0, 300.0);
        engine.touch_start(&[a, b]);
        engine.touch_move(&[Vec2::new(575.0, 300.0), Vec2::new(725.0, 300.0)]);
        assert_close(engine.zoom(), 1.5);

        let m = a.midpoint(b) - Vec2::new(500.0, 400.0);
        let t = engine.transform();
        let screen = t.pan + m * t.zoom;
        assert!((screen - m).length() < 1e-6);
    }

    #[test]
    fn pinch_in_below_one_lands_on_one() {
        let mut engine = engine();
        engine.zoom_in();
        engine.touch_start(&[Vec2::new(400.0, 400.0), Vec2::new(600.0, 400.0)]);
        engine.touch_move(&[Vec2::new(495.0, 400.0), Vec2::new(505.0, 400.0)]);
        assert_identity(&engine);
    }

    #[test]
    fn pinch_with_coincident_touches_is_ignored() {
        let mut engine = engine();
        engine.touch_start(&[Vec2::new(400.0, 400.0), Vec2::new(400.0, 400.0)]);
        assert!(!engine.is_gesturing());
    }

    #[test]
    fn pinch_guard_ends_session_on_drop() {
        let mut engine = engine();
        {
            let mut pinch = engine
                .pinch(Vec2::new(450.0, 400.0), Vec2::new(550.0, 400.0))
                .unwrap();
            pinch.move_to(Vec2::new(400.0, 400.0), Vec2::new(600.0, 400.0));
            assert_close(pinch.transform().zoom, 2.0);
        }
        assert!(!engine.is_gesturing());
        assert_close(engine.zoom(), 2.0);
    }

    #[test]
    fn single_touch_pans_when_zoomed() {
        let mut engine = engine();
        engine.zoom_in();
        engine.touch_start(&[Vec2::new(100.0, 100.0)]);
        engine.touch_move(&[Vec2::new(120.0, 100.0)]);
        assert_close(engine.pan().x, 20.0);
    }

    // =========================================================================
    // Identity / container changes
    // =========================================================================

    #[test]
    fn identity_change_resets_mid_gesture() {
        let mut engine = engine();
        engine.touch_start(&[Vec2::new(400.0, 400.0), Vec2::new(600.0, 400.0)]);
        engine.touch_move(&[Vec2::new(300.0, 400.0), Vec2::new(700.0, 300.0)]);
        assert!(engine.is_zoomed());

        engine.reset_for_identity();
        assert_identity(&engine);
        assert!(!engine.is_gesturing());

        // Late move events from the old gesture do nothing
        engine.touch_move(&[Vec2::new(0.0, 0.0), Vec2::new(1000.0, 800.0)]);
        assert_identity(&engine);
    }

    #[test]
    fn shrinking_container_reclamps_pan() {
        let mut engine = engine();
        engine.set_image_size(Some(Size::new(1000.0, 800.0)));
        engine.handle_double_click(Vec2::new(1000.0, 800.0));
        assert_close(engine.pan().x, -500.0);

        engine.set_container(Size::new(500.0, 400.0));
        // fitted 500x400, zoom 2 → bound (250, 200)
        assert_close(engine.pan().x, -250.0);
        assert_close(engine.pan().y, -200.0);
    }

    #[test]
    fn zero_sized_container_never_pans() {
        let mut engine = ZoomPanEngine::default();
        engine.zoom_in();
        engine.pointer_down(Vec2::new(0.0, 0.0));
        engine.pointer_move(Vec2::new(50.0, 50.0));
        assert_eq!(engine.pan(), Vec2::ZERO);
    }

    #[test]
    fn custom_max_zoom_is_respected() {
        let mut engine = ZoomPanEngine::new(ZoomConfig {
            max_zoom: 3.0,
            ..ZoomConfig::default()
        });
        for _ in 0..8 {
            engine.zoom_in();
        }
        assert_eq!(engine.zoom(), 3.0);
    }

    #[test]
    fn raised_min_zoom_keeps_pan_centred_at_rest() {
        let mut engine = ZoomPanEngine::new(ZoomConfig {
            min_zoom: 2.0,
            ..ZoomConfig::default()
        });
        engine.set_container(Size::new(1000.0, 800.0));
        engine.set_image_size(Some(Size::new(1000.0, 800.0)));
        assert_eq!(engine.zoom(), 2.0);

        // Zoom in off-centre, then back out about the centre. The anchor
        // math alone would leave a residual pan at 2x.
        engine.handle_wheel(-100.0, Vec2::new(0.0, 0.0));
        assert!(engine.zoom() > 2.0);
        assert_ne!(engine.pan(), Vec2::ZERO);

        engine.handle_wheel(1000.0, Vec2::new(500.0, 400.0));
        assert_eq!(engine.zoom(), 2.0);
        assert_eq!(engine.pan(), Vec2::ZERO);
        assert!(engine.drag(Vec2::new(500.0, 400.0)).is_none());
    }

    #[test]
    fn transform_css() {
        let t = ViewportTransform {
            zoom: 2.0,
            pan: Vec2::new(-10.0, 5.5),
        };
        assert_eq!(t.to_css(), "translate(-10px, 5.5px) scale(2)");
    }
}
