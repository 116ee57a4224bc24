//! Pan/zoom view transform.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// Zoom change per wheel delta unit (one notch is roughly 100 units).
const WHEEL_ZOOM_BASE: f64 = 0.999;

/// Camera converts between screen (canvas element) and world coordinates.
///
/// `screen = world * zoom + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Pan offset in screen pixels.
    pub offset: Vec2,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            min_zoom,
            max_zoom,
            ..Self::default()
        }
    }

    /// World to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen to world.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Restore a persisted view, clamping the zoom into range.
    pub fn restore(&mut self, offset: Vec2, zoom: f64) {
        self.offset = offset;
        self.zoom = if zoom.is_finite() && zoom > 0.0 {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            1.0
        };
    }

    /// Zoom by `factor`, keeping the world point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Wheel zoom: positive `delta_y` (scrolling down) zooms out.
    pub fn wheel_zoom(&mut self, screen_point: Point, delta_y: f64) {
        self.zoom_at(screen_point, WHEEL_ZOOM_BASE.powf(delta_y));
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_world_round_trip() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(40.0, -20.0));
        camera.zoom = 2.0;
        let world = Point::new(13.0, 7.0);
        let screen = camera.world_to_screen(world);
        assert_eq!(screen, Point::new(66.0, -6.0));
        let back = camera.screen_to_world(screen);
        assert!((back.x - world.x).abs() < 1e-9);
        assert!((back.y - world.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_cursor_point_fixed() {
        let mut camera = Camera::new();
        let cursor = Point::new(300.0, 200.0);
        let before = camera.screen_to_world(cursor);
        camera.zoom_at(cursor, 2.5);
        let after = camera.screen_to_world(cursor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        assert!((camera.zoom - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.zoom - MAX_ZOOM).abs() < f64::EPSILON);
        camera.zoom_at(Point::ZERO, 1e-6);
        assert!((camera.zoom - MIN_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wheel_direction() {
        let mut camera = Camera::new();
        camera.wheel_zoom(Point::ZERO, -100.0);
        assert!(camera.zoom > 1.0);
        camera.reset();
        camera.wheel_zoom(Point::ZERO, 100.0);
        assert!(camera.zoom < 1.0);
    }

    #[test]
    fn test_restore_rejects_bad_zoom() {
        let mut camera = Camera::new();
        camera.restore(Vec2::new(5.0, 5.0), f64::NAN);
        assert!((camera.zoom - 1.0).abs() < f64::EPSILON);
        camera.restore(Vec2::ZERO, 50.0);
        assert!((camera.zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }
}
