//! Reader for the object-canvas dialect (`{ objects: [...] }`).
//!
//! Objects are positioned by `left`/`top` with `scaleX`/`scaleY` multipliers
//! and an `angle` in degrees. Custom shapes are marked with `_customType`.
//! Children of a group are positioned relative to the group's center.

use super::{DocumentJson, num, parse_css_color, text};
use crate::shapes::{
    DEFAULT_FONT_SIZE, Diamond, DomainEntity, DomainNode, Ellipse, Freehand, Line, Rectangle,
    SYNTHETIC_PRESSURE, Shape, ShapeId, ShapeMeta, ShapeStyle, StickyNote, Text,
};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

const LABEL_WRAP: usize = 24;

/// Placement shared by every object.
struct Frame {
    rect: Rect,
    angle: f64,
}

fn frame(obj: &Value, origin: Vec2) -> Frame {
    let sx = num(obj, "scaleX").unwrap_or(1.0);
    let sy = num(obj, "scaleY").unwrap_or(1.0);
    let left = num(obj, "left").unwrap_or(0.0) + origin.x;
    let top = num(obj, "top").unwrap_or(0.0) + origin.y;
    let width = num(obj, "width").unwrap_or(0.0) * sx;
    let height = num(obj, "height").unwrap_or(0.0) * sy;
    Frame {
        rect: Rect::new(left, top, left + width, top + height),
        angle: num(obj, "angle").unwrap_or(0.0).to_radians(),
    }
}

fn style(obj: &Value) -> ShapeStyle {
    let mut style = ShapeStyle::default();
    if let Some(stroke) = text(obj, "stroke").and_then(parse_css_color) {
        style.stroke_color = stroke;
    }
    if let Some(width) = num(obj, "strokeWidth") {
        style.stroke_width = width;
    }
    style.fill_color = text(obj, "fill")
        .and_then(parse_css_color)
        .filter(|c| !c.is_transparent());
    if let Some(opacity) = num(obj, "opacity") {
        style.opacity = opacity;
    }
    style
}

fn meta(obj: &Value, angle: f64) -> ShapeMeta {
    let mut meta = ShapeMeta::new(ShapeId::new());
    meta.angle = angle;
    meta.external_ref = text(obj, "externalRef")
        .or_else(|| text(obj, "entityId"))
        .map(str::to_string);
    meta
}

/// First text found on the object or any of its children.
fn inner_text(obj: &Value) -> Option<&str> {
    text(obj, "text").or_else(|| {
        obj.get("objects")
            .and_then(Value::as_array)?
            .iter()
            .find_map(inner_text)
    })
}

/// Path commands hold absolute canvas coordinates (plus the parent group's origin).
fn path_points(obj: &Value, origin: Vec2) -> Vec<Point> {
    obj.get("path")
        .and_then(Value::as_array)
        .map(|commands| {
            commands
                .iter()
                .filter_map(|cmd| {
                    let cmd = cmd.as_array()?;
                    // Last coordinate pair of each command is the on-curve point.
                    let n = cmd.len();
                    if n < 3 {
                        return None;
                    }
                    let x = cmd[n - 2].as_f64()?;
                    let y = cmd[n - 1].as_f64()?;
                    Some(Point::new(x, y) + origin)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn convert(obj: &Value, origin: Vec2, groups: &[String], out: &mut Vec<Shape>) -> usize {
    let kind = text(obj, "type").unwrap_or_default();
    let custom = text(obj, "_customType");
    let Frame { rect, angle } = frame(obj, origin);
    let mut meta = meta(obj, angle);
    meta.group_ids = groups.to_vec();
    let style = style(obj);

    let shape = match (kind, custom) {
        (_, Some("stickyNote")) => {
            let mut note = StickyNote::new(meta, rect, inner_text(obj).unwrap_or_default());
            if let Some(fill) = style.fill_color {
                note.style.fill_color = Some(fill);
            }
            Shape::StickyNote(note)
        }
        (_, Some("domainNode" | "companyNode")) => {
            let entity = DomainEntity {
                id: meta.external_ref.clone().unwrap_or_default(),
                name: text(obj, "label")
                    .or_else(|| inner_text(obj))
                    .unwrap_or_default()
                    .to_string(),
                category_color: style.fill_color.map(|c| c.to_hex()),
            };
            let mut node = DomainNode::for_entity(meta, &entity, rect.center(), LABEL_WRAP);
            node.x = rect.x0;
            node.y = rect.y0;
            node.width = node.width.max(rect.width());
            node.height = node.height.max(rect.height());
            Shape::DomainNode(node)
        }
        ("group", _) => {
            let mut group_ids = groups.to_vec();
            group_ids.insert(0, ShapeId::new().to_string());
            let center = rect.center().to_vec2();
            let children = obj
                .get("objects")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            return children
                .iter()
                .map(|child| convert(child, center, &group_ids, out))
                .sum();
        }
        ("rect", _) => Shape::Rectangle(Rectangle {
            style,
            ..Rectangle::new(meta, rect)
        }),
        ("ellipse", _) => {
            let rx = num(obj, "rx").unwrap_or(rect.width() / 2.0) * num(obj, "scaleX").unwrap_or(1.0);
            let ry = num(obj, "ry").unwrap_or(rect.height() / 2.0) * num(obj, "scaleY").unwrap_or(1.0);
            let bounds = Rect::new(rect.x0, rect.y0, rect.x0 + 2.0 * rx, rect.y0 + 2.0 * ry);
            Shape::Ellipse(Ellipse {
                style,
                ..Ellipse::new(meta, bounds)
            })
        }
        ("circle", _) => {
            let r = num(obj, "radius").unwrap_or(rect.width() / 2.0) * num(obj, "scaleX").unwrap_or(1.0);
            let bounds = Rect::new(rect.x0, rect.y0, rect.x0 + 2.0 * r, rect.y0 + 2.0 * r);
            Shape::Ellipse(Ellipse {
                style,
                ..Ellipse::new(meta, bounds)
            })
        }
        ("polygon", _) => Shape::Diamond(Diamond {
            style,
            ..Diamond::new(meta, rect)
        }),
        ("line", _) => {
            let coord = |key: &str, offset: f64, fallback: f64| {
                num(obj, key).map(|v| v + offset).unwrap_or(fallback)
            };
            let start = Point::new(coord("x1", origin.x, rect.x0), coord("y1", origin.y, rect.y0));
            let end = Point::new(coord("x2", origin.x, rect.x1), coord("y2", origin.y, rect.y1));
            let line = if matches!(custom, Some("connector" | "arrow")) {
                Line::arrow(meta, start, end)
            } else {
                Line::new(meta, start, end)
            };
            Shape::Line(Line {
                style: ShapeStyle {
                    fill_color: None,
                    ..style
                },
                ..line
            })
        }
        ("path", _) => {
            let points = path_points(obj, origin);
            if points.is_empty() {
                log::warn!("path object without drawable commands skipped");
                return 1;
            }
            let pressures = vec![SYNTHETIC_PRESSURE; points.len()];
            Shape::Freehand(Freehand {
                style,
                ..Freehand::from_points_with_pressure(meta, points, pressures)
            })
        }
        ("i-text" | "textbox" | "text", _) => {
            let font_size = num(obj, "fontSize").unwrap_or(DEFAULT_FONT_SIZE) * num(obj, "scaleY").unwrap_or(1.0);
            let mut text = Text::new(meta, rect.origin(), inner_text(obj).unwrap_or_default(), font_size);
            // Text color lives in `fill` for this dialect.
            text.style = ShapeStyle {
                stroke_color: style.fill_color.unwrap_or(style.stroke_color),
                fill_color: None,
                ..style
            };
            Shape::Text(text)
        }
        (other, _) => {
            log::warn!("unsupported object type '{other}' skipped");
            return 1;
        }
    };
    out.push(shape);
    0
}

pub(super) fn read(data: &Value) -> (DocumentJson, usize) {
    let mut document = DocumentJson::new();
    let objects = data
        .get("objects")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let skipped = objects
        .iter()
        .map(|obj| convert(obj, Vec2::ZERO, &[], &mut document.elements))
        .sum();
    if let Some(bg) = text(data, "background").and_then(parse_css_color) {
        document.app_state.view_background_color = bg;
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
    fn test_basic_objects() {
        let data = json!({
            "objects": [
                {"type": "rect", "left": 10, "top": 20, "width": 50, "height": 40, "scaleX": 2,
                 "fill": "rgb(255,0,0)", "stroke": "#000000", "strokeWidth": 3},
                {"type": "circle", "left": 0, "top": 0, "radius": 25},
                {"type": "i-text", "left": 5, "top": 5, "text": "Hello", "fontSize": 18, "fill": "#333333"}
            ],
            "background": "#fafafa"
        });
        let migrated = read_document(&data).unwrap();
        assert_eq!(migrated.dialect, Dialect::ObjectCanvas);
        let doc = migrated.document;
        assert_eq!(doc.elements.len(), 3);
        assert_eq!(doc.elements[0].bounds(), Rect::new(10.0, 20.0, 110.0, 60.0));
        assert_eq!(doc.elements[0].style().fill_color.map(|c| c.to_hex()).as_deref(), Some("#ff0000"));
        assert_eq!(doc.elements[1].bounds(), Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(doc.elements[2].label(), Some("Hello"));
        assert_eq!(doc.elements[2].style().stroke_color.to_hex(), "#333333");
        assert_eq!(doc.app_state.view_background_color.to_hex(), "#fafafa");
    }

    #[test]
    fn test_custom_types_become_variants() {
        let data = json!({
            "objects": [
                {"type": "group", "_customType": "stickyNote", "left": 0, "top": 0, "width": 150, "height": 150,
                 "objects": [{"type": "rect"}, {"type": "textbox", "text": "Remember"}]},
                {"type": "group", "_customType": "companyNode", "entityId": "c-9", "left": 300, "top": 0,
                 "width": 120, "height": 60, "label": "Globex"},
                {"type": "line", "_customType": "connector", "x1": 0, "y1": 0, "x2": 100, "y2": 100}
            ]
        });
        let doc = read_document(&data).unwrap().document;
        assert_eq!(doc.elements[0].kind(), ShapeKind::StickyNote);
        assert_eq!(doc.elements[0].label(), Some("Remember"));
        assert_eq!(doc.elements[1].kind(), ShapeKind::DomainNode);
        assert_eq!(doc.elements[1].external_ref(), Some("c-9"));
        assert!(doc.elements[2].as_line().is_some_and(|l| l.end_arrowhead));
    }

    #[test]
    fn test_plain_group_children_share_group_id() {
        let data = json!({
            "objects": [
                {"type": "group", "left": 100, "top": 100, "width": 100, "height": 100,
                 "objects": [
                    {"type": "rect", "left": -50, "top": -50, "width": 10, "height": 10},
                    {"type": "rect", "left": 40, "top": 40, "width": 10, "height": 10}
                 ]}
            ]
        });
        let doc = read_document(&data).unwrap().document;
        assert_eq!(doc.elements.len(), 2);
        assert_eq!(doc.elements[0].bounds().origin(), Point::new(100.0, 100.0));
        assert_eq!(doc.elements[0].outer_group(), doc.elements[1].outer_group());
        assert!(doc.elements[0].outer_group().is_some());
    }

    #[test]
    fn test_paths_become_ink_and_unknowns_are_counted() {
        let data = json!({
            "objects": [
                {"type": "path", "path": [["M", 0, 0], ["Q", 5, 5, 10, 0], ["L", 20, 0]]},
                {"type": "image", "src": "x.png"}
            ]
        });
        let migrated = read_document(&data).unwrap();
        assert_eq!(migrated.skipped, 1);
        match &migrated.document.elements[0] {
            Shape::Freehand(f) => assert_eq!(
                f.points,
                vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0)]
            ),
            other => panic!("expected ink, got {other:?}"),
        }
    }
}
