//! Diamond (rhombus inscribed in its bounding box).

use super::{
    ShapeMeta, ShapeStyle, ShapeTrait, point_in_polygon, point_to_polyline_dist, unrotate,
};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diamond {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub style: ShapeStyle,
}

impl Diamond {
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

    /// Vertices in order top, right, bottom, left (unrotated).
    pub fn vertices(&self) -> [Point; 4] {
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        [
            Point::new(cx, self.y),
            Point::new(self.x + self.width, cy),
            Point::new(cx, self.y + self.height),
            Point::new(self.x, cy),
        ]
    }
}

impl ShapeTrait for Diamond {
    fn meta(&self) -> &ShapeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ShapeMeta {
        &mut self.meta
    }

    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let point = unrotate(point, self.bounds().center(), self.meta.angle);
        let vertices = self.vertices();
        let closed = [vertices[0], vertices[1], vertices[2], vertices[3], vertices[0]];
        if point_to_polyline_dist(point, &closed) <= tolerance + self.style.stroke_width / 2.0 {
            return true;
        }
        self.style.fill_color.is_some() && point_in_polygon(point, &vertices)
    }

    fn to_path(&self) -> BezPath {
        let [top, right, bottom, left] = self.vertices();
        let mut path = BezPath::new();
        path.move_to(top);
        path.line_to(right);
        path.line_to(bottom);
        path.line_to(left);
        path.close_path();
        if self.meta.angle == 0.0 {
            path
        } else {
            Affine::rotate_about(self.meta.angle, self.bounds().center()) * path
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

    #[test]
    fn test_vertices() {
        let d = Diamond::new(ShapeMeta::default(), Rect::new(0.0, 0.0, 100.0, 50.0));
        let [top, right, bottom, left] = d.vertices();
        assert_eq!(top, Point::new(50.0, 0.0));
        assert_eq!(right, Point::new(100.0, 25.0));
        assert_eq!(bottom, Point::new(50.0, 50.0));
        assert_eq!(left, Point::new(0.0, 25.0));
    }

    #[test]
    fn test_hit_test_corners_are_empty() {
        let mut d = Diamond::new(ShapeMeta::default(), Rect::new(0.0, 0.0, 100.0, 100.0));
        d.style.fill_color = Some(SerializableColor::white());
        assert!(d.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(!d.hit_test(Point::new(5.0, 5.0), 0.0));
        assert!(d.hit_test(Point::new(50.0, 1.0), 0.0));
    }
}
