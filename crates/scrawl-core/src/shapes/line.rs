//! Line and arrow connectors.

use super::{ShapeId, ShapeMeta, ShapeStyle, ShapeTrait, point_to_polyline_dist, points_bounds};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Arrowhead length for a given stroke width.
pub fn arrowhead_size(stroke_width: f64) -> f64 {
    stroke_width * 4.0 + 6.0
}

/// A straight or polyline connector. An arrow is a line with an end arrowhead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub start_arrowhead: bool,
    #[serde(default)]
    pub end_arrowhead: bool,
    /// Shape the start point is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_binding: Option<ShapeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_binding: Option<ShapeId>,
    #[serde(default)]
    pub style: ShapeStyle,
}

impl Line {
    pub fn new(meta: ShapeMeta, start: Point, end: Point) -> Self {
        Self {
            meta,
            start,
            end,
            start_arrowhead: false,
            end_arrowhead: false,
            start_binding: None,
            end_binding: None,
            style: ShapeStyle::default(),
        }
    }

    /// A connector with an arrowhead at its end.
    pub fn arrow(meta: ShapeMeta, start: Point, end: Point) -> Self {
        Self {
            end_arrowhead: true,
            ..Self::new(meta, start, end)
        }
    }

    pub fn is_arrow(&self) -> bool {
        self.start_arrowhead || self.end_arrowhead
    }

    pub fn all_points(&self) -> Vec<Point> {
        vec![self.start, self.end]
    }

    pub fn head_size(&self) -> f64 {
        arrowhead_size(self.style.stroke_width)
    }

    /// Barb, tip, barb of the head at one end of the connector.
    fn head_at(&self, tip: Point, from: Point) -> Option<[Point; 3]> {
        let heading = tip - from;
        let len = heading.hypot();
        if len < f64::EPSILON {
            return None;
        }
        let dir = heading / len;
        let perp = Vec2::new(-dir.y, dir.x);
        let size = self.head_size();
        let back = tip - dir * size;
        Some([back + perp * size * 0.5, tip, back - perp * size * 0.5])
    }

    /// Arrowhead triangles, end head first.
    pub fn arrowheads(&self) -> Vec<[Point; 3]> {
        let points = self.all_points();
        let n = points.len();
        let mut heads = Vec::new();
        if self.end_arrowhead {
            heads.extend(self.head_at(points[n - 1], points[n - 2]));
        }
        if self.start_arrowhead {
            heads.extend(self.head_at(points[0], points[1]));
        }
        heads
    }

    /// Arrowhead strokes as an open path (two barbs per head).
    pub fn arrowhead_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for [left, tip, right] in self.arrowheads() {
            path.move_to(left);
            path.line_to(tip);
            path.line_to(right);
        }
        path
    }
}

impl ShapeTrait for Line {
    fn meta(&self) -> &ShapeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ShapeMeta {
        &mut self.meta
    }

    fn bounds(&self) -> Rect {
        let mut points = self.all_points();
        for head in self.arrowheads() {
            points.extend(head);
        }
        points_bounds(&points)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let points = self.all_points();
        if point_to_polyline_dist(point, &points) <= tolerance + self.style.stroke_width / 2.0 {
            return true;
        }

        fn sign(p1: Point, p2: Point, p3: Point) -> f64 {
            (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
        }

        self.arrowheads().into_iter().any(|[left, tip, right]| {
            let d1 = sign(point, tip, left);
            let d2 = sign(point, left, right);
            let d3 = sign(point, right, tip);
            let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
            let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
            !(has_neg && has_pos)
        })
    }

    /// Shaft only; heads come from [`Line::arrowhead_path`].
    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn set_bounds(&mut self, bounds: Rect) {
        let old = points_bounds(&self.all_points());
        let sx = if old.width() > f64::EPSILON { bounds.width() / old.width() } else { 1.0 };
        let sy = if old.height() > f64::EPSILON { bounds.height() / old.height() } else { 1.0 };
        let map = |p: Point| {
            Point::new(
                bounds.x0 + (p.x - old.x0) * sx,
                bounds.y0 + (p.y - old.y0) * sy,
            )
        };
        self.start = map(self.start);
        self.end = map(self.end);
    }
}
