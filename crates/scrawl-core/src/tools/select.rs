//! Selection set, group expansion and corner-handle resizing.

use crate::scene::SceneAdapter;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect, Vec2};

/// Corner handle hit radius in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// Smallest edge a resize may shrink a shape to.
const MIN_RESIZE_EDGE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn position(self, bounds: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
            Corner::TopRight => Point::new(bounds.x1, bounds.y0),
            Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
        }
    }

    /// Bounds after dragging this corner by `delta`, normalized.
    pub fn resize(self, bounds: Rect, delta: Vec2) -> Rect {
        let (x0, y0, x1, y1) = match self {
            Corner::TopLeft => (bounds.x0 + delta.x, bounds.y0 + delta.y, bounds.x1, bounds.y1),
            Corner::TopRight => (bounds.x0, bounds.y0 + delta.y, bounds.x1 + delta.x, bounds.y1),
            Corner::BottomLeft => (bounds.x0 + delta.x, bounds.y0, bounds.x1, bounds.y1 + delta.y),
            Corner::BottomRight => (bounds.x0, bounds.y0, bounds.x1 + delta.x, bounds.y1 + delta.y),
        };
        let rect = Rect::new(x0, y0, x1, y1).abs();
        Rect::from_origin_size(
            rect.origin(),
            (rect.width().max(MIN_RESIZE_EDGE), rect.height().max(MIN_RESIZE_EDGE)),
        )
    }
}

/// Corner of `shape` under `point`, if the shape can be resized that way.
pub fn corner_at(shape: &Shape, point: Point, tolerance: f64) -> Option<Corner> {
    if matches!(shape, Shape::Line(_)) {
        return None;
    }
    let bounds = shape.bounds();
    Corner::ALL
        .into_iter()
        .find(|corner| corner.position(bounds).distance(point) <= tolerance)
}

/// Ids of the selected shapes, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

impl Selection {
    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn set(&mut self, ids: Vec<ShapeId>) {
        self.ids.clear();
        self.extend(ids);
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Add `ids` if any of them is missing, otherwise remove them all.
    pub fn toggle(&mut self, ids: Vec<ShapeId>) {
        if ids.iter().all(|id| self.ids.contains(id)) {
            self.ids.retain(|id| !ids.contains(id));
        } else {
            self.extend(ids);
        }
    }

    /// Drop ids that no longer point at live shapes.
    pub fn retain_live(&mut self, scene: &dyn SceneAdapter) {
        self.ids
            .retain(|id| scene.get(id).is_some_and(|s| !s.is_deleted()));
    }

    /// The single selected shape, if exactly one is selected.
    pub fn single(&self) -> Option<&ShapeId> {
        match self.ids.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// `id` plus every live shape sharing its outermost group.
pub fn expand_group(scene: &dyn SceneAdapter, id: &ShapeId) -> Vec<ShapeId> {
    let Some(group) = scene.get(id).and_then(Shape::outer_group) else {
        return vec![id.clone()];
    };
    scene
        .shapes()
        .iter()
        .filter(|s| !s.is_deleted() && s.outer_group() == Some(group))
        .map(|s| s.id().clone())
        .collect()
}

/// Shapes to translate when moving `selection`. Connectors bound to a
/// selected shape are left to follow their binding instead.
pub fn movable(scene: &dyn SceneAdapter, selection: &Selection) -> Vec<ShapeId> {
    selection
        .ids()
        .iter()
        .filter(|id| match scene.get(id) {
            Some(Shape::Line(line)) => ![&line.start_binding, &line.end_binding]
                .into_iter()
                .flatten()
                .any(|bound| selection.contains(bound)),
            Some(shape) => !shape.is_deleted(),
            None => false,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneIndex, ShapePatch};
    use crate::shapes::{Line, Rectangle, ShapeMeta};

    fn rect(id: &str, groups: &[&str]) -> Shape {
        let mut meta = ShapeMeta::new(ShapeId::from(id));
        meta.group_ids = groups.iter().map(|g| g.to_string()).collect();
        Shape::Rectangle(Rectangle::new(meta, Rect::new(0.0, 0.0, 10.0, 10.0)))
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut selection = Selection::default();
        let a = ShapeId::from("a");
        selection.toggle(vec![a.clone()]);
        assert!(selection.contains(&a));
        selection.toggle(vec![a.clone()]);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_expand_group_uses_outermost_group() {
        let mut scene = SceneIndex::new();
        scene.add(rect("a", &["inner", "outer"])).unwrap();
        scene.add(rect("b", &["outer"])).unwrap();
        scene.add(rect("c", &["inner"])).unwrap();
        let ids = expand_group(&scene, &ShapeId::from("a"));
        assert_eq!(ids, vec![ShapeId::from("a"), ShapeId::from("b")]);
        assert_eq!(expand_group(&scene, &ShapeId::from("c")).len(), 1);
    }

    #[test]
    fn test_corner_resize_normalizes() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            Corner::BottomRight.resize(bounds, Vec2::new(20.0, 10.0)),
            Rect::new(0.0, 0.0, 120.0, 60.0)
        );
        // Dragging past the opposite corner flips instead of going negative.
        assert_eq!(
            Corner::TopLeft.resize(bounds, Vec2::new(150.0, 0.0)),
            Rect::new(100.0, 0.0, 150.0, 50.0)
        );
    }

    #[test]
    fn test_corner_hit() {
        let shape = rect("a", &[]);
        assert_eq!(
            corner_at(&shape, Point::new(10.5, 9.5), 2.0),
            Some(Corner::BottomRight)
        );
        assert_eq!(corner_at(&shape, Point::new(5.0, 5.0), 2.0), None);
    }

    #[test]
    fn test_bound_connector_is_not_moved_twice() {
        let mut scene = SceneIndex::new();
        scene.add(rect("a", &[])).unwrap();
        let mut line = Line::arrow(
            ShapeMeta::new(ShapeId::from("l")),
            Point::new(5.0, 5.0),
            Point::new(100.0, 5.0),
        );
        line.start_binding = Some(ShapeId::from("a"));
        scene.add(Shape::Line(line)).unwrap();

        let mut selection = Selection::default();
        selection.set(vec![ShapeId::from("a"), ShapeId::from("l")]);
        let ids = movable(&scene, &selection);
        assert_eq!(ids, vec![ShapeId::from("a")]);

        for id in ids {
            scene.update(&id, ShapePatch::Translate(Vec2::new(10.0, 0.0))).unwrap();
        }
        let line = scene.get(&ShapeId::from("l")).and_then(Shape::as_line).unwrap();
        assert_eq!(line.start, Point::new(15.0, 5.0));
    }
}
