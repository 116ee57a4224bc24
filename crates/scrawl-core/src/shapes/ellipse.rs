//! Ellipse shape (the circle tool produces these).

use super::{ShapeMeta, ShapeStyle, ShapeTrait, unrotate};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// An ellipse inscribed in its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub style: ShapeStyle,
}

impl Ellipse {
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

    /// Circle of the given radius around a center.
    pub fn circle(meta: ShapeMeta, center: Point, radius: f64) -> Self {
        Self::new(
            meta,
            Rect::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
        )
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn radii(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn as_kurbo(&self) -> KurboEllipse {
        KurboEllipse::new(self.center(), self.radii(), self.meta.angle)
    }
}

impl ShapeTrait for Ellipse {
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
        let center = self.center();
        let radii = self.radii();
        let point = unrotate(point, center, self.meta.angle);
        let half_sw = self.style.stroke_width / 2.0;
        let dx_outer = (point.x - center.x) / (radii.x + tolerance + half_sw);
        let dy_outer = (point.y - center.y) / (radii.y + tolerance + half_sw);
        if dx_outer * dx_outer + dy_outer * dy_outer > 1.0 {
            return false;
        }
        if self.style.fill_color.is_some() {
            return true;
        }
        // Outline only: reject if inside the inner ellipse
        let inner_rx = (radii.x - tolerance - half_sw).max(0.0);
        let inner_ry = (radii.y - tolerance - half_sw).max(0.0);
        if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
            return true;
        }
        let dx_inner = (point.x - center.x) / inner_rx;
        let dy_inner = (point.y - center.y) / inner_ry;
        dx_inner * dx_inner + dy_inner * dy_inner > 1.0
    }

    fn to_path(&self) -> BezPath {
        let path = KurboEllipse::new(self.center(), self.radii(), 0.0).to_path(0.1);
        if self.meta.angle == 0.0 {
            path
        } else {
            Affine::rotate_about(self.meta.angle, self.center()) * path
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
