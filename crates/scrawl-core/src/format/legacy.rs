//! Migration of the legacy node/edge graph into shapes.
//!
//! Nodes carry their fields either at the top level or under `data`, with the
//! position either under `position` or as `x`/`y`. Positions are node centers.

use super::{DocumentJson, FormatError, FormatResult, num, parse_css_color, text};
use crate::shapes::{
    DomainEntity, DomainNode, Line, Shape, ShapeId, ShapeMeta, StickyNote, Text, DEFAULT_FONT_SIZE,
};
use kurbo::{Point, Rect, Size};
use serde_json::Value;
use std::collections::HashMap;

const NOTE_SIZE: Size = Size::new(200.0, 160.0);
const LABEL_WRAP: usize = 24;

/// Look a field up on the node itself, then under `data`.
fn field<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        node.get(key)
            .or_else(|| node.get("data").and_then(|d| d.get(key)))
            .filter(|v| !v.is_null())
    })
}

fn field_str<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a str> {
    field(node, keys).and_then(Value::as_str)
}

/// Ids may be strings or numbers in old payloads.
fn field_id(node: &Value, keys: &[&str]) -> Option<String> {
    field(node, keys).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn position(node: &Value) -> Option<Point> {
    if let Some(pos) = node.get("position") {
        return Some(Point::new(num(pos, "x")?, num(pos, "y")?));
    }
    let x = num(node, "x").or_else(|| node.get("data").and_then(|d| num(d, "x")))?;
    let y = num(node, "y").or_else(|| node.get("data").and_then(|d| num(d, "y")))?;
    Some(Point::new(x, y))
}

/// Split the payload into node and edge lists.
fn partition(data: &Value) -> FormatResult<(Vec<&Value>, Vec<&Value>)> {
    let graph = data.get("elements").unwrap_or(data);
    match graph {
        Value::Object(map) => {
            let list = |key: &str| {
                map.get(key)
                    .and_then(Value::as_array)
                    .map(|items| items.iter().collect::<Vec<_>>())
                    .unwrap_or_default()
            };
            Ok((list("nodes"), list("edges")))
        }
        Value::Array(items) => {
            let mut nodes = Vec::new();
            let mut edges = Vec::new();
            for item in items {
                match text(item, "group") {
                    Some("nodes") => nodes.push(item),
                    Some("edges") => edges.push(item),
                    _ => log::warn!("ignoring graph entry without a node/edge group"),
                }
            }
            Ok((nodes, edges))
        }
        _ => Err(FormatError::Unsupported("legacy graph without nodes".to_string())),
    }
}

fn convert_node(node: &Value, center: Point) -> Shape {
    let kind = field_str(node, &["type", "kind", "nodeType"]).unwrap_or("company");
    let label = field_str(node, &["label", "name", "text", "title"]).unwrap_or_default();
    let meta = ShapeMeta::new(ShapeId::new());
    match kind {
        "note" | "sticky" | "stickyNote" => {
            let rect = Rect::from_center_size(center, NOTE_SIZE);
            let mut note = StickyNote::new(meta, rect, label);
            note.grow_to_fit();
            Shape::StickyNote(note)
        }
        "text" | "label" => {
            let mut text = Text::new(meta, center, label, DEFAULT_FONT_SIZE);
            text.x -= text.width / 2.0;
            text.y -= text.height / 2.0;
            Shape::Text(text)
        }
        _ => {
            let node_id = field_id(node, &["id"]).unwrap_or_default();
            let entity = DomainEntity {
                id: field_id(
                    node,
                    &["entity_id", "entityId", "company_id", "companyId", "externalRef"],
                )
                .unwrap_or(node_id),
                name: label.to_string(),
                category_color: field_str(node, &["color", "categoryColor", "category_color"])
                    .and_then(parse_css_color)
                    .map(|c| c.to_hex()),
            };
            Shape::DomainNode(DomainNode::for_entity(meta, &entity, center, LABEL_WRAP))
        }
    }
}

pub(super) fn read(data: &Value) -> FormatResult<(DocumentJson, usize)> {
    let (nodes, edges) = partition(data)?;
    let mut document = DocumentJson::new();
    let mut skipped = 0;
    // legacy node id -> (shape id, saved center)
    let mut placed: HashMap<String, (ShapeId, Point)> = HashMap::new();

    for node in nodes {
        let Some(center) = position(node) else {
            log::warn!("legacy node without a position skipped");
            skipped += 1;
            continue;
        };
        let shape = convert_node(node, center);
        if let Some(id) = field_id(node, &["id"]) {
            placed.insert(id, (shape.id().clone(), center));
        }
        document.elements.push(shape);
    }

    for edge in edges {
        let endpoints = field_id(edge, &["source", "from"])
            .zip(field_id(edge, &["target", "to"]))
            .and_then(|(s, t)| Some((placed.get(&s)?, placed.get(&t)?)));
        let Some(((source_id, from), (target_id, to))) = endpoints else {
            log::warn!("legacy edge with a missing endpoint skipped");
            skipped += 1;
            continue;
        };
        let mut line = Line::arrow(ShapeMeta::new(ShapeId::new()), *from, *to);
        line.start_binding = Some(source_id.clone());
        line.end_binding = Some(target_id.clone());
        document.elements.push(Shape::Line(line));
    }

    // Connectors render beneath the nodes they join.
    document
        .elements
        .sort_by_key(|shape| !matches!(shape, Shape::Line(_)));

    Ok((document, skipped))
}
