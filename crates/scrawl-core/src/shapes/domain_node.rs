//! Shapes bound to external business entities (companies, products, ...).

use super::text::{DEFAULT_FONT_SIZE, measure_text, wrap_text};
use super::{SerializableColor, ShapeMeta, ShapeStyle, ShapeTrait, unrotate};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Padding between a node's border and its label.
const LABEL_PADDING: f64 = 10.0;

/// Record supplied by the entity data source for drag and drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEntity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category_color: Option<String>,
}

/// A labeled box that stands for an external entity; `meta.external_ref` holds the entity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNode {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    #[serde(default = "default_label_size")]
    pub font_size: f64,
    #[serde(default)]
    pub style: ShapeStyle,
}

fn default_label_size() -> f64 {
    DEFAULT_FONT_SIZE * 0.8
}

impl DomainNode {
    /// Build a node for `entity` centered on `center`, sized to its wrapped label.
    pub fn for_entity(meta: ShapeMeta, entity: &DomainEntity, center: Point, max_chars: usize) -> Self {
        let font_size = default_label_size();
        let label = wrap_text(&entity.name, max_chars);
        let size = measure_text(&label, font_size);
        let width = size.width + 2.0 * LABEL_PADDING;
        let height = size.height + 2.0 * LABEL_PADDING;
        let mut style = ShapeStyle::default();
        let accent = entity
            .category_color
            .as_deref()
            .and_then(SerializableColor::parse)
            .unwrap_or(SerializableColor::new(0x4d, 0x7c, 0xfe, 255));
        style.stroke_color = accent;
        style.fill_color = Some(SerializableColor::new(accent.r, accent.g, accent.b, 0x33));
        Self {
            meta: ShapeMeta {
                external_ref: Some(entity.id.clone()),
                ..meta
            },
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
            label,
            font_size,
            style,
        }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.meta.external_ref.as_deref()
    }

    /// Top-left of the label block.
    pub fn label_origin(&self) -> Point {
        let size = measure_text(&self.label, self.font_size);
        let center = self.as_rect().center();
        Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0)
    }
}

impl ShapeTrait for DomainNode {
    fn meta(&self) -> &ShapeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ShapeMeta {
        &mut self.meta
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect();
        let point = unrotate(point, rect.center(), self.meta.angle);
        rect.inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        let rect = self.as_rect();
        let path = rect.to_path(0.1);
        if self.meta.angle == 0.0 {
            path
        } else {
            Affine::rotate_about(self.meta.angle, rect.center()) * path
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

    fn entity(name: &str) -> DomainEntity {
        DomainEntity {
            id: "c-42".to_string(),
            name: name.to_string(),
            category_color: Some("#12b886".to_string()),
        }
    }

    #[test]
    fn test_node_sized_to_longest_line() {
        let node = DomainNode::for_entity(
            ShapeMeta::default(),
            &entity("Northwind Traders Limited"),
            Point::new(100.0, 100.0),
            18,
        );
        assert_eq!(node.label, "Northwind Traders\nLimited");
        // 17 chars at 16px * 0.6 plus padding on both sides
        assert!((node.width - (17.0 * 16.0 * 0.6 + 20.0)).abs() < 1e-9);
        assert!((node.as_rect().center().x - 100.0).abs() < 1e-9);
        assert_eq!(node.entity_id(), Some("c-42"));
    }

    #[test]
    fn test_category_color_becomes_accent() {
        let node = DomainNode::for_entity(ShapeMeta::default(), &entity("Acme"), Point::ZERO, 24);
        assert_eq!(node.style.stroke_color.to_hex(), "#12b886");
        assert_eq!(node.style.fill_color.map(|c| c.a), Some(0x33));
    }

    #[test]
    fn test_entity_serializes_camel_case() {
        let json = serde_json::to_value(entity("Acme")).unwrap();
        assert_eq!(json["categoryColor"], "#12b886");
    }
}
