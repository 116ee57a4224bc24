//! Retained scene keeping shapes in z-order with an id index.

use super::{
    Overlay, SceneAdapter, SceneError, SceneEvent, SceneObserver, SceneResult, ShapePatch, ZOrder,
};
use crate::format::{AppState, DocumentJson};
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// In-process [`SceneAdapter`].
///
/// Shapes live in a vector in z-order (first is bottom); `positions` maps ids
/// back to their slot and is rebuilt whenever the order changes.
pub struct SceneIndex {
    shapes: Vec<Shape>,
    positions: HashMap<ShapeId, usize>,
    app_state: AppState,
    overlay: Overlay,
    interactive: bool,
    events: Vec<SceneEvent>,
    observers: Vec<SceneObserver>,
}

impl SceneIndex {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            positions: HashMap::new(),
            app_state: AppState::default(),
            overlay: Overlay::default(),
            interactive: true,
            events: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Number of live shapes.
    pub fn len(&self) -> usize {
        self.shapes.iter().filter(|s| !s.is_deleted()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reindex(&mut self) {
        self.positions = self
            .shapes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id().clone(), i))
            .collect();
    }

    fn slot(&self, id: &ShapeId) -> SceneResult<usize> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| SceneError::NotFound(id.clone()))
    }

    fn emit(&mut self, event: SceneEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
        self.events.push(event);
    }

    /// Keep dependents in step after `id` moved or resized: bound connector
    /// endpoints shift with the container's center and bound text re-fits.
    fn follow(&mut self, id: &ShapeId, old_bounds: Rect) {
        let Some(new_bounds) = self.get(id).map(Shape::bounds) else {
            return;
        };
        if new_bounds == old_bounds {
            return;
        }
        let delta = new_bounds.center() - old_bounds.center();
        let mut touched = Vec::new();
        for shape in &mut self.shapes {
            if shape.is_deleted() {
                continue;
            }
            match shape {
                Shape::Line(line) => {
                    let mut moved = false;
                    if line.start_binding.as_ref() == Some(id) {
                        line.start += delta;
                        moved = true;
                    }
                    if line.end_binding.as_ref() == Some(id) {
                        line.end += delta;
                        moved = true;
                    }
                    if moved {
                        touched.push(line.meta.id.clone());
                    }
                }
                Shape::Text(text) if text.container_id.as_ref() == Some(id) => {
                    text.fit_to_container(new_bounds);
                    touched.push(text.meta.id.clone());
                }
                _ => {}
            }
        }
        for dependent in touched {
            if let Ok(slot) = self.slot(&dependent) {
                self.shapes[slot].bump_version();
            }
            self.emit(SceneEvent::Modified(dependent));
        }
    }

    fn topmost(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.hit_test(point, tolerance))
            .map(|s| s.id().clone())
    }
}

impl Default for SceneIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneAdapter for SceneIndex {
    fn add(&mut self, shape: Shape) -> SceneResult<()> {
        let id = shape.id().clone();
        if self.positions.contains_key(&id) {
            return Err(SceneError::DuplicateId(id));
        }
        self.positions.insert(id.clone(), self.shapes.len());
        self.shapes.push(shape);
        self.emit(SceneEvent::Added(id));
        Ok(())
    }

    fn remove(&mut self, id: &ShapeId) -> SceneResult<()> {
        let slot = self.slot(id)?;
        if self.shapes[slot].is_deleted() {
            return Ok(());
        }
        self.shapes[slot].meta_mut().is_deleted = true;
        self.shapes[slot].bump_version();
        self.emit(SceneEvent::Removed(id.clone()));

        let bound_text = self
            .shapes
            .iter()
            .filter_map(Shape::as_text)
            .filter(|t| !t.meta.is_deleted && t.container_id.as_ref() == Some(id))
            .map(|t| t.meta.id.clone())
            .collect::<Vec<_>>();
        for text_id in bound_text {
            self.remove(&text_id)?;
        }
        Ok(())
    }

    fn update(&mut self, id: &ShapeId, patch: ShapePatch) -> SceneResult<()> {
        let slot = self.slot(id)?;
        let old_bounds = self.shapes[slot].bounds();
        let shape = &mut self.shapes[slot];
        match patch {
            ShapePatch::Translate(delta) => shape.translate(delta),
            ShapePatch::Bounds(bounds) => shape.set_bounds(bounds),
            ShapePatch::Angle(angle) => shape.meta_mut().angle = angle,
            ShapePatch::Style(style) => *shape.style_mut() = style,
            ShapePatch::Label(label) => {
                shape.set_label(&label);
            }
            ShapePatch::GroupIds(groups) => shape.meta_mut().group_ids = groups,
            ShapePatch::Replace(replacement) => {
                if replacement.id() != id {
                    return Err(SceneError::NotFound(replacement.id().clone()));
                }
                *shape = replacement;
            }
        }
        shape.bump_version();
        self.emit(SceneEvent::Modified(id.clone()));
        self.follow(id, old_bounds);
        Ok(())
    }

    fn reorder(&mut self, id: &ShapeId, order: ZOrder) -> SceneResult<()> {
        let slot = self.slot(id)?;
        let last = self.shapes.len() - 1;
        let target = match order {
            ZOrder::Forward => (slot + 1).min(last),
            ZOrder::Backward => slot.saturating_sub(1),
            ZOrder::Front => last,
            ZOrder::Back => 0,
        };
        if target == slot {
            return Ok(());
        }
        let shape = self.shapes.remove(slot);
        self.shapes.insert(target, shape);
        self.reindex();
        self.emit(SceneEvent::Modified(id.clone()));
        Ok(())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        if !self.interactive {
            return None;
        }
        self.topmost(point, tolerance)
    }

    fn topmost_at(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.topmost(point, tolerance)
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.positions.get(id).map(|&slot| &self.shapes[slot])
    }

    fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    fn app_state(&self) -> &AppState {
        &self.app_state
    }

    fn set_app_state(&mut self, state: AppState) {
        self.app_state = state;
    }

    fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    fn serialize(&self) -> DocumentJson {
        DocumentJson {
            elements: self.shapes.clone(),
            app_state: self.app_state.clone(),
        }
        .without_tombstones()
    }

    fn hydrate(&mut self, document: &DocumentJson) {
        self.shapes = document.elements.clone();
        self.app_state = document.app_state.clone();
        self.overlay.clear_gesture();
        self.reindex();
        log::debug!("scene hydrated with {} shapes", self.shapes.len());
        self.emit(SceneEvent::Hydrated);
    }

    fn subscribe(&mut self, observer: SceneObserver) {
        self.observers.push(observer);
    }

    fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Line, Rectangle, SerializableColor, ShapeMeta, Text};
    use kurbo::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect(id: &str, x: f64, y: f64) -> Shape {
        let mut r = Rectangle::new(
            ShapeMeta::new(ShapeId::from(id)),
            Rect::new(x, y, x + 100.0, y + 100.0),
        );
        r.style.fill_color = Some(SerializableColor::white());
        Shape::Rectangle(r)
    }

    #[test]
    fn test_add_rejects_duplicate_ids() {
        let mut scene = SceneIndex::new();
        scene.add(rect("a", 0.0, 0.0)).unwrap();
        assert_eq!(
            scene.add(rect("a", 50.0, 50.0)),
            Err(SceneError::DuplicateId(ShapeId::from("a")))
        );
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_remove_tombstones_and_serialize_drops_them() {
        let mut scene = SceneIndex::new();
        scene.add(rect("a", 0.0, 0.0)).unwrap();
        scene.add(rect("b", 200.0, 0.0)).unwrap();
        scene.remove(&ShapeId::from("a")).unwrap();

        assert!(scene.get(&ShapeId::from("a")).is_some_and(Shape::is_deleted));
        let doc = scene.serialize();
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].id().as_str(), "b");
    }

    #[test]
    fn test_hit_test_picks_topmost_and_respects_interactivity() {
        let mut scene = SceneIndex::new();
        scene.add(rect("bottom", 0.0, 0.0)).unwrap();
        scene.add(rect("top", 50.0, 50.0)).unwrap();
        let p = Point::new(75.0, 75.0);
        assert_eq!(scene.hit_test(p, 0.0), Some(ShapeId::from("top")));

        scene.set_interactive(false);
        assert_eq!(scene.hit_test(p, 0.0), None);
        assert_eq!(scene.topmost_at(p, 0.0), Some(ShapeId::from("top")));
    }

    #[test]
    fn test_reorder_changes_hit_priority() {
        let mut scene = SceneIndex::new();
        scene.add(rect("a", 0.0, 0.0)).unwrap();
        scene.add(rect("b", 50.0, 50.0)).unwrap();
        scene.reorder(&ShapeId::from("a"), ZOrder::Front).unwrap();
        assert_eq!(scene.hit_test(Point::new(75.0, 75.0), 0.0), Some(ShapeId::from("a")));
        scene.reorder(&ShapeId::from("a"), ZOrder::Backward).unwrap();
        assert_eq!(scene.shapes()[0].id().as_str(), "a");
    }

    #[test]
    fn test_bound_connector_follows_moved_shape() {
        let mut scene = SceneIndex::new();
        scene.add(rect("a", 0.0, 0.0)).unwrap();
        let mut line = Line::arrow(
            ShapeMeta::new(ShapeId::from("l")),
            Point::new(50.0, 50.0),
            Point::new(300.0, 50.0),
        );
        line.start_binding = Some(ShapeId::from("a"));
        scene.add(Shape::Line(line)).unwrap();

        scene
            .update(&ShapeId::from("a"), ShapePatch::Translate(Vec2::new(10.0, 20.0)))
            .unwrap();
        let line = scene.get(&ShapeId::from("l")).and_then(Shape::as_line).unwrap();
        assert_eq!(line.start, Point::new(60.0, 70.0));
        assert_eq!(line.end, Point::new(300.0, 50.0));
    }

    #[test]
    fn test_container_text_refits_on_resize() {
        let mut scene = SceneIndex::new();
        scene.add(rect("box", 0.0, 0.0)).unwrap();
        let mut text = Text::new(
            ShapeMeta::new(ShapeId::from("t")),
            Point::ZERO,
            "a fairly long label for a box",
            20.0,
        );
        text.container_id = Some(ShapeId::from("box"));
        scene.add(Shape::Text(text)).unwrap();

        scene
            .update(&ShapeId::from("box"), ShapePatch::Bounds(Rect::new(0.0, 0.0, 400.0, 200.0)))
            .unwrap();
        let text = scene.get(&ShapeId::from("t")).and_then(Shape::as_text).unwrap();
        let bounds = scene.get(&ShapeId::from("t")).unwrap().bounds();
        assert!((bounds.center().x - 200.0).abs() < 1e-9);
        assert!((bounds.center().y - 100.0).abs() < 1e-9);
        assert!(text.width <= 390.0);
    }

    #[test]
    fn test_container_resize_keeps_line_breaks() {
        let mut scene = SceneIndex::new();
        scene.add(rect("box", 0.0, 0.0)).unwrap();
        let mut text = Text::new(ShapeMeta::new(ShapeId::from("t")), Point::ZERO, "Pros\nCons", 20.0);
        text.container_id = Some(ShapeId::from("box"));
        scene.add(Shape::Text(text)).unwrap();

        for width in [300.0, 120.0, 500.0] {
            scene
                .update(&ShapeId::from("box"), ShapePatch::Bounds(Rect::new(0.0, 0.0, width, 200.0)))
                .unwrap();
        }
        let text = scene.get(&ShapeId::from("t")).and_then(Shape::as_text).unwrap();
        assert_eq!(text.text, "Pros\nCons");
        assert_eq!(text.lines(), vec!["Pros", "Cons"]);
    }

    #[test]
    fn test_removing_container_removes_bound_text() {
        let mut scene = SceneIndex::new();
        scene.add(rect("box", 0.0, 0.0)).unwrap();
        let mut text = Text::new(ShapeMeta::new(ShapeId::from("t")), Point::ZERO, "hi", 20.0);
        text.container_id = Some(ShapeId::from("box"));
        scene.add(Shape::Text(text)).unwrap();

        scene.remove(&ShapeId::from("box")).unwrap();
        assert!(scene.serialize().elements.is_empty());
    }

    #[test]
    fn test_events_reach_observers_and_queue() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut scene = SceneIndex::new();
        scene.subscribe(Box::new(move |event| sink.borrow_mut().push(event.clone())));

        scene.add(rect("a", 0.0, 0.0)).unwrap();
        scene.remove(&ShapeId::from("a")).unwrap();
        scene.hydrate(&DocumentJson::new());

        let expected = vec![
            SceneEvent::Added(ShapeId::from("a")),
            SceneEvent::Removed(ShapeId::from("a")),
            SceneEvent::Hydrated,
        ];
        assert_eq!(*seen.borrow(), expected);
        assert_eq!(scene.drain_events(), expected);
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn test_overlay_is_never_serialized() {
        let mut scene = SceneIndex::new();
        scene.overlay_mut().preview = Some(rect("ghost", 0.0, 0.0));
        scene.overlay_mut().grid = Some(20.0);
        scene.overlay_mut().ink.push(Point::new(1.0, 1.0));
        assert!(scene.serialize().elements.is_empty());
        assert!(scene.get(&ShapeId::from("ghost")).is_none());
    }

    #[test]
    fn test_update_unknown_shape_errors() {
        let mut scene = SceneIndex::new();
        let err = scene
            .update(&ShapeId::from("nope"), ShapePatch::Angle(1.0))
            .unwrap_err();
        assert_eq!(err, SceneError::NotFound(ShapeId::from("nope")));
    }
}
