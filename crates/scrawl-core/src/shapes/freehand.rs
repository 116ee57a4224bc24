//! Freehand ink.

use super::{ShapeMeta, ShapeStyle, ShapeTrait, point_to_polyline_dist, points_bounds};
use kurbo::{BezPath, Circle, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Pressure recorded for pointer devices that report none.
pub const SYNTHETIC_PRESSURE: f64 = 0.5;

/// A freehand stroke: the sampled centerline plus per-point pressure.
/// Rendered as a filled outline built around the centerline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freehand {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub points: Vec<Point>,
    /// One entry per point; missing entries read as [`SYNTHETIC_PRESSURE`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pressures: Vec<f64>,
    #[serde(default)]
    pub style: ShapeStyle,
}

impl Freehand {
    pub fn from_points_with_pressure(meta: ShapeMeta, points: Vec<Point>, pressures: Vec<f64>) -> Self {
        Self {
            meta,
            points,
            pressures,
            style: ShapeStyle::default(),
        }
    }

    fn pressure(&self, index: usize) -> f64 {
        self.pressures
            .get(index)
            .copied()
            .unwrap_or(SYNTHETIC_PRESSURE)
            .clamp(0.0, 1.0)
    }

    /// Half the ink width at a sample.
    fn radius(&self, index: usize) -> f64 {
        (self.style.stroke_width / 2.0 * (0.5 + self.pressure(index))).max(0.5)
    }

    fn max_radius(&self) -> f64 {
        (0..self.points.len())
            .map(|i| self.radius(i))
            .fold(0.0, f64::max)
    }

    /// Outline polygon: left edge forward, right edge back.
    pub fn outline_points(&self) -> Vec<Point> {
        let n = self.points.len();
        if n < 2 {
            return Vec::new();
        }
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        for i in 0..n {
            let heading = self.points[(i + 1).min(n - 1)] - self.points[i.saturating_sub(1)];
            let len = heading.hypot();
            let dir = if len > f64::EPSILON { heading / len } else { Vec2::new(1.0, 0.0) };
            let normal = Vec2::new(-dir.y, dir.x) * self.radius(i);
            left.push(self.points[i] + normal);
            right.push(self.points[i] - normal);
        }
        right.reverse();
        left.extend(right);
        left
    }
}

impl ShapeTrait for Freehand {
    fn meta(&self) -> &ShapeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ShapeMeta {
        &mut self.meta
    }

    fn bounds(&self) -> Rect {
        let r = self.max_radius();
        points_bounds(&self.points).inflate(r, r)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self.points.as_slice() {
            [] => false,
            [only] => point.distance(*only) <= tolerance + self.radius(0),
            points => point_to_polyline_dist(point, points) <= tolerance + self.max_radius(),
        }
    }

    /// Closed outline smoothed with quadratic curves through edge midpoints.
    fn to_path(&self) -> BezPath {
        if let [only] = self.points.as_slice() {
            return Circle::new(*only, self.radius(0)).to_path(0.1);
        }
        let outline = self.outline_points();
        let n = outline.len();
        let mut path = BezPath::new();
        if n < 2 {
            return path;
        }
        path.move_to(outline[0].midpoint(outline[1]));
        for i in 1..=n {
            let control = outline[i % n];
            let next = outline[(i + 1) % n];
            path.quad_to(control, control.midpoint(next));
        }
        path.close_path();
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    /// `bounds` includes the ink radius, as [`Self::bounds`] reports it.
    fn set_bounds(&mut self, bounds: Rect) {
        let r = self.max_radius();
        let bounds = bounds.abs();
        let center = bounds.center();
        let (hw, hh) = ((bounds.width() / 2.0 - r).max(0.0), (bounds.height() / 2.0 - r).max(0.0));
        let bounds = Rect::new(center.x - hw, center.y - hh, center.x + hw, center.y + hh);
        let old = points_bounds(&self.points);
        let sx = if old.width() > f64::EPSILON { bounds.width() / old.width() } else { 1.0 };
        let sy = if old.height() > f64::EPSILON { bounds.height() / old.height() } else { 1.0 };
        for p in &mut self.points {
            *p = Point::new(bounds.x0 + (p.x - old.x0) * sx, bounds.y0 + (p.y - old.y0) * sy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn stroke(points: &[(f64, f64)]) -> Freehand {
        let points = points.iter().map(|&(x, y)| Point::new(x, y)).collect::<Vec<_>>();
        let pressures = vec![SYNTHETIC_PRESSURE; points.len()];
        Freehand::from_points_with_pressure(ShapeMeta::default(), points, pressures)
    }

    #[test]
    fn test_outline_wraps_centerline() {
        let f = stroke(&[(0.0, 0.0), (100.0, 0.0)]);
        let outline = f.outline_points();
        assert_eq!(outline.len(), 4);
        // Width 2 at baseline pressure: one unit either side
        assert!((outline[0].y - 1.0).abs() < 1e-9);
        assert!((outline[2].y + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_outline_path_is_closed_quadratics() {
        let f = stroke(&[(0.0, 0.0), (50.0, 20.0), (100.0, 0.0)]);
        let path = f.to_path();
        let elements = path.elements();
        assert!(matches!(elements.first(), Some(PathEl::MoveTo(_))));
        assert!(matches!(elements.last(), Some(PathEl::ClosePath)));
        assert!(elements.iter().any(|el| matches!(el, PathEl::QuadTo(..))));
    }

    #[test]
    fn test_hit_test() {
        let f = stroke(&[(0.0, 0.0), (100.0, 0.0)]);
        assert!(f.hit_test(Point::new(50.0, 0.0), 5.0));
        assert!(!f.hit_test(Point::new(50.0, 20.0), 5.0));
    }

    #[test]
    fn test_set_bounds_to_own_bounds_is_stable() {
        let mut f = stroke(&[(0.0, 0.0), (40.0, 30.0), (100.0, 10.0)]);
        f.style.stroke_width = 8.0;
        let before = f.bounds();
        let points = f.points.clone();
        f.set_bounds(before);
        assert_eq!(f.bounds(), before);
        for (a, b) in f.points.iter().zip(&points) {
            assert!(a.distance(*b) < 1e-9);
        }
    }

    #[test]
    fn test_set_bounds_scales_ink_extent() {
        let mut f = stroke(&[(0.0, 0.0), (100.0, 100.0)]);
        let r = f.max_radius();
        f.set_bounds(Rect::new(0.0, 0.0, 50.0 + 2.0 * r, 50.0 + 2.0 * r));
        let b = f.bounds();
        assert!((b.width() - (50.0 + 2.0 * r)).abs() < 1e-9);
        assert!((b.x0).abs() < 1e-9);
        assert_eq!(f.points[0], Point::new(r, r));
    }
}
