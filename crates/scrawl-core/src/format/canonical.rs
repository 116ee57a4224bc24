//! Reader for the canonical `{ elements, appState }` dialect.
//!
//! Elements are decoded one at a time so a single unknown or damaged entry
//! does not take the rest of the drawing down with it.

use super::{AppState, DocumentJson};
use crate::shapes::{Shape, ShapeId};
use serde_json::Value;
use std::collections::HashSet;

pub(super) fn read(data: &Value) -> (DocumentJson, usize) {
    let mut document = DocumentJson::new();
    let mut skipped = 0;
    let mut seen = HashSet::new();

    let elements = data
        .get("elements")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (index, raw) in elements.iter().enumerate() {
        match serde_json::from_value::<Shape>(raw.clone()) {
            Ok(mut shape) => {
                if !seen.insert(shape.id().clone()) {
                    log::warn!("element {index} reuses id {}, assigning a new one", shape.id());
                    shape.meta_mut().id = ShapeId::new();
                    seen.insert(shape.id().clone());
                }
                document.elements.push(shape);
            }
            Err(err) => {
                log::warn!("skipping element {index}: {err}");
                skipped += 1;
            }
        }
    }

    if let Some(app_state) = data.get("appState") {
        match serde_json::from_value::<AppState>(app_state.clone()) {
            Ok(state) => document.app_state = state,
            Err(err) => log::warn!("ignoring unreadable appState: {err}"),
        }
    }

    (document, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Dialect, read_document};
    use crate::shapes::ShapeKind;
    use serde_json::json;

    #[test]
    fn test_reads_elements_in_order() {
        let data = json!({
            "elements": [
                {"type": "rectangle", "id": "a", "x": 0, "y": 0, "width": 10, "height": 10},
                {"type": "ellipse", "id": "b", "x": 5, "y": 5, "width": 10, "height": 10},
            ],
            "appState": {"theme": "dark", "viewBackgroundColor": "#101010"}
        });
        let migrated = read_document(&data).unwrap();
        assert_eq!(migrated.dialect, Dialect::Canonical);
        let kinds = migrated
            .document
            .elements
            .iter()
            .map(Shape::kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![ShapeKind::Rectangle, ShapeKind::Ellipse]);
        assert_eq!(migrated.document.app_state.theme, crate::format::Theme::Dark);
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let data = json!({
            "elements": [
                {"type": "hologram", "id": "x"},
                {"type": "text", "id": "t", "x": 1, "y": 2, "text": "hello"},
            ]
        });
        let (doc, skipped) = read(&data);
        assert_eq!(skipped, 1);
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].label(), Some("hello"));
    }

    #[test]
    fn test_duplicate_ids_are_reassigned() {
        let data = json!({
            "elements": [
                {"type": "rectangle", "id": "a", "x": 0, "y": 0, "width": 1, "height": 1},
                {"type": "rectangle", "id": "a", "x": 2, "y": 2, "width": 1, "height": 1},
            ]
        });
        let (doc, _) = read(&data);
        assert_eq!(doc.elements.len(), 2);
        assert_ne!(doc.elements[0].id(), doc.elements[1].id());
    }

    #[test]
    fn test_canonical_round_trip_is_stable() {
        let data = json!({
            "elements": [
                {"type": "line", "id": "l", "start": {"x": 0, "y": 0}, "end": {"x": 9, "y": 9}, "endArrowhead": true},
            ]
        });
        let (doc, _) = read(&data);
        let written = doc.to_value().unwrap();
        let (again, _) = read(&written);
        assert_eq!(doc, again);
    }
}
