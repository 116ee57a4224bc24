//! Rectangle shape.

use super::{ShapeMeta, ShapeStyle, ShapeTrait, unrotate};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (before rotation). Corners are always sharp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(meta: ShapeMeta, rect: Rect) -> Self {
        Self {
            meta,
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
            style: ShapeStyle::default(),
        }
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(meta: ShapeMeta, p1: Point, p2: Point) -> Self {
        Self::new(meta, Rect::from_points(p1, p2))
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

impl ShapeTrait for Rectangle {
    fn meta(&self) -> &ShapeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ShapeMeta {
        &mut self.meta
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect();
        let point = unrotate(point, rect.center(), self.meta.angle);
        let band = tolerance + self.style.stroke_width / 2.0;
        if self.style.fill_color.is_some() {
            rect.inflate(band, band).contains(point)
        } else {
            let outer = rect.inflate(band, band);
            let inner = rect.inflate(-band, -band);
            outer.contains(point)
                && (inner.width() <= 0.0 || inner.height() <= 0.0 || !inner.contains(point))
        }
    }

    fn to_path(&self) -> BezPath {
        let rect = self.as_rect();
        let path = rect.to_path(0.1);
        if self.meta.angle == 0.0 {
            path
        } else {
            Affine::rotate_about(self.meta.angle, rect.center()) * path
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn set_bounds(&mut self, bounds: Rect) {
        let bounds = bounds.abs();
        self.x = bounds.x0;
        self.y = bounds.y0;
        self.width = bounds.width();
        self.height = bounds.height();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SerializableColor;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rectangle {
        Rectangle::new(ShapeMeta::default(), Rect::new(x0, y0, x1, y1))
    }

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rectangle::from_corners(
            ShapeMeta::default(),
            Point::new(100.0, 50.0),
            Point::new(0.0, 0.0),
        );
        assert!((r.x).abs() < f64::EPSILON);
        assert!((r.y).abs() < f64::EPSILON);
        assert!((r.width - 100.0).abs() < f64::EPSILON);
        assert!((r.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outline_hit_test_ignores_interior() {
        let r = rect(0.0, 0.0, 100.0, 100.0);
        assert!(r.hit_test(Point::new(0.0, 50.0), 2.0));
        assert!(!r.hit_test(Point::new(50.0, 50.0), 2.0));
    }

    #[test]
    fn test_filled_hit_test_covers_interior() {
        let mut r = rect(0.0, 0.0, 100.0, 100.0);
        r.style.fill_color = Some(SerializableColor::white());
        assert!(r.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(!r.hit_test(Point::new(150.0, 50.0), 0.0));
    }

    #[test]
    fn test_rotated_hit_test() {
        let mut r = rect(0.0, 40.0, 100.0, 60.0);
        r.style.fill_color = Some(SerializableColor::white());
        r.meta.angle = std::f64::consts::FRAC_PI_2;
        // Rotated a quarter turn around (50, 50) the bar now stands upright.
        assert!(r.hit_test(Point::new(50.0, 5.0), 0.0));
        assert!(!r.hit_test(Point::new(5.0, 50.0), 0.0));
    }

    #[test]
    fn test_translate_and_set_bounds() {
        let mut r = rect(0.0, 0.0, 10.0, 10.0);
        r.translate(Vec2::new(5.0, -5.0));
        assert_eq!(r.as_rect(), Rect::new(5.0, -5.0, 15.0, 5.0));
        r.set_bounds(Rect::new(20.0, 20.0, 0.0, 0.0));
        assert_eq!(r.as_rect(), Rect::new(0.0, 0.0, 20.0, 20.0));
    }
}
