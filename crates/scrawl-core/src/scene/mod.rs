//! Boundary between the document model and the retained 2-D scene.

mod index;

pub use index::SceneIndex;

use crate::format::{AppState, DocumentJson};
use crate::shapes::{Shape, ShapeId, ShapeStyle};
use kurbo::{Point, Rect, Vec2};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("shape {0} already exists")]
    DuplicateId(ShapeId),

    #[error("shape {0} not found")]
    NotFound(ShapeId),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Change notification emitted for every scene mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Added(ShapeId),
    Modified(ShapeId),
    Removed(ShapeId),
    /// The whole scene was replaced from a document.
    Hydrated,
}

pub type SceneObserver = Box<dyn FnMut(&SceneEvent)>;

/// Partial update applied through [`SceneAdapter::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum ShapePatch {
    Translate(Vec2),
    Bounds(Rect),
    Angle(f64),
    Style(ShapeStyle),
    Label(String),
    GroupIds(Vec<String>),
    /// Swap in a new value; the id must match.
    Replace(Shape),
}

/// Stacking changes for a single shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Forward,
    Backward,
    Front,
    Back,
}

/// Scene content that is drawn but never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Live preview of the shape being dragged out.
    pub preview: Option<Shape>,
    /// Transient freehand stroke while the pointer is down.
    pub ink: Vec<Point>,
    /// Selection marquee in world coordinates.
    pub marquee: Option<Rect>,
    /// Grid spacing when the grid is shown.
    pub grid: Option<f64>,
}

impl Overlay {
    pub fn clear_gesture(&mut self) {
        self.preview = None;
        self.ink.clear();
        self.marquee = None;
    }

    /// Grid line segments covering `viewport` (world coordinates).
    pub fn grid_lines(&self, viewport: Rect) -> Vec<(Point, Point)> {
        let Some(size) = self.grid.filter(|s| *s > 0.0) else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        let mut x = (viewport.x0 / size).floor() * size;
        while x <= viewport.x1 {
            lines.push((Point::new(x, viewport.y0), Point::new(x, viewport.y1)));
            x += size;
        }
        let mut y = (viewport.y0 / size).floor() * size;
        while y <= viewport.y1 {
            lines.push((Point::new(viewport.x0, y), Point::new(viewport.x1, y)));
            y += size;
        }
        lines
    }
}

/// A retained scene the editor draws into.
///
/// Implementations keep shapes in z-order, index them for hit testing and
/// report every mutation as a [`SceneEvent`]. Removal tombstones a shape so
/// ids stay stable for undo; tombstones are dropped on serialize.
pub trait SceneAdapter {
    fn add(&mut self, shape: Shape) -> SceneResult<()>;

    /// Tombstone a shape (and any text bound to it).
    fn remove(&mut self, id: &ShapeId) -> SceneResult<()>;

    fn update(&mut self, id: &ShapeId, patch: ShapePatch) -> SceneResult<()>;

    fn reorder(&mut self, id: &ShapeId, order: ZOrder) -> SceneResult<()>;

    /// Topmost live shape under `point`, only while shapes are interactive.
    fn hit_test(&self, point: Point, tolerance: f64) -> Option<ShapeId>;

    /// Topmost live shape under `point` regardless of interactivity.
    fn topmost_at(&self, point: Point, tolerance: f64) -> Option<ShapeId>;

    /// Whether shapes can be picked (only the select tool enables this).
    fn set_interactive(&mut self, interactive: bool);

    fn get(&self, id: &ShapeId) -> Option<&Shape>;

    /// All shapes in z-order, tombstones included.
    fn shapes(&self) -> &[Shape];

    fn app_state(&self) -> &AppState;

    fn set_app_state(&mut self, state: AppState);

    fn overlay(&self) -> &Overlay;

    fn overlay_mut(&mut self) -> &mut Overlay;

    /// Canonical document without overlay content or tombstones.
    fn serialize(&self) -> DocumentJson;

    /// Replace all content with `document`.
    fn hydrate(&mut self, document: &DocumentJson);

    fn subscribe(&mut self, observer: SceneObserver);

    /// Events since the last drain, oldest first.
    fn drain_events(&mut self) -> Vec<SceneEvent>;

    /// Live shapes intersecting `rect`.
    fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.shapes()
            .iter()
            .filter(|s| !s.is_deleted() && s.intersects_rect(rect))
            .map(|s| s.id().clone())
            .collect()
    }

    /// Union of live shape bounds.
    fn content_bounds(&self) -> Option<Rect> {
        self.shapes()
            .iter()
            .filter(|s| !s.is_deleted())
            .map(Shape::bounds)
            .reduce(|a, b| a.union(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_lines_cover_viewport() {
        let overlay = Overlay {
            grid: Some(10.0),
            ..Overlay::default()
        };
        let lines = overlay.grid_lines(Rect::new(0.0, 0.0, 20.0, 10.0));
        // x = 0, 10, 20 and y = 0, 10
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_no_grid_no_lines() {
        assert!(Overlay::default().grid_lines(Rect::new(0.0, 0.0, 100.0, 100.0)).is_empty());
    }
}
