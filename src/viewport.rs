//! Zoom/pan state for the image display surface.
//!
//! Pure math, kept separate from the canvas so the clamping and the
//! identity invariant are unit-testable.

use egui::{Pos2, Vec2};

pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 8.0;

/// Scroll-wheel delta to scale-units conversion.
pub const WHEEL_SENSITIVITY: f32 = 0.005;

/// Zoom applied per toolbar button press.
pub const BUTTON_STEP: f32 = 0.5;

/// Current zoom scale and pan offset.
///
/// Invariant: `scale == 1.0` implies `pan == Vec2::ZERO` — panning is only
/// meaningful while zoomed in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub pan: Vec2,
}

impl Viewport {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            pan: Vec2::ZERO,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.pan == Vec2::ZERO
    }

    /// Clamp into [`MIN_SCALE`, `MAX_SCALE`]; reaching scale 1 snaps the pan
    /// back to zero.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        if self.scale == MIN_SCALE {
            self.pan = Vec2::ZERO;
        }
    }

    /// Scroll-wheel zoom; positive `delta_y` (scrolling down) zooms out.
    pub fn wheel_zoom(&mut self, delta_y: f32) {
        self.set_scale(self.scale - delta_y * WHEEL_SENSITIVITY);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + BUTTON_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - BUTTON_STEP);
    }

    /// Anchor for a new pan gesture, so that `pan = pointer - anchor` holds
    /// during updates.
    pub fn pan_anchor(&self, pointer: Pos2) -> Vec2 {
        pointer.to_vec2() - self.pan
    }

    pub fn update_pan(&mut self, pointer: Pos2, anchor: Vec2) {
        self.pan = pointer.to_vec2() - anchor;
    }

    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Screen-space offset of the displayed rect. The reference transform is
    /// scale-then-translate, so the pointer-space pan is multiplied by the
    /// scale when rendering.
    pub fn screen_offset(&self) -> Vec2 {
        self.pan * self.scale
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::{Viewport, MAX_SCALE, MIN_SCALE, WHEEL_SENSITIVITY};
    use egui::{Pos2, Vec2};

    #[test]
    fn scale_is_clamped_at_both_ends() {
        let mut viewport = Viewport::identity();
        viewport.set_scale(20.0);
        assert_eq!(viewport.scale, MAX_SCALE);
        viewport.set_scale(0.1);
        assert_eq!(viewport.scale, MIN_SCALE);
    }

    #[test]
    fn returning_to_scale_one_clears_pan() {
        let mut viewport = Viewport::identity();
        viewport.set_scale(3.0);
        viewport.update_pan(Pos2::new(40.0, 25.0), Vec2::ZERO);
        assert_eq!(viewport.pan, Vec2::new(40.0, 25.0));

        viewport.set_scale(1.0);
        assert_eq!(viewport.pan, Vec2::ZERO);
    }

    #[test]
    fn wheel_zoom_uses_sensitivity_and_direction() {
        let mut viewport = Viewport::identity();
        viewport.wheel_zoom(-100.0);
        assert!((viewport.scale - (1.0 + 100.0 * WHEEL_SENSITIVITY)).abs() < 1e-6);

        viewport.wheel_zoom(1e6);
        assert_eq!(viewport.scale, MIN_SCALE);
    }

    #[test]
    fn pan_anchor_round_trips() {
        let mut viewport = Viewport::identity();
        viewport.set_scale(2.0);
        viewport.pan = Vec2::new(10.0, -6.0);

        let anchor = viewport.pan_anchor(Pos2::new(100.0, 80.0));
        viewport.update_pan(Pos2::new(130.0, 60.0), anchor);
        assert_eq!(viewport.pan, Vec2::new(40.0, -26.0));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut viewport = Viewport::identity();
        viewport.set_scale(4.0);
        viewport.pan = Vec2::new(5.0, 5.0);

        viewport.reset();
        let once = viewport;
        viewport.reset();
        assert_eq!(viewport, once);
        assert!(viewport.is_identity());
    }

    #[test]
    fn screen_offset_scales_the_pan() {
        let mut viewport = Viewport::identity();
        viewport.set_scale(4.0);
        viewport.pan = Vec2::new(10.0, 2.0);
        assert_eq!(viewport.screen_offset(), Vec2::new(40.0, 8.0));
    }
}
