//! Sticky note: a filled card with wrapped text, moved and hit as one unit.

use super::text::{DEFAULT_FONT_SIZE, measure_text, wrap_text};
use super::{SerializableColor, ShapeMeta, ShapeStyle, ShapeTrait, unrotate};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Inner padding between the card edge and its text.
pub(crate) const NOTE_PADDING: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_note_font_size")]
    pub font_size: f64,
    #[serde(default = "default_note_style")]
    pub style: ShapeStyle,
}

fn default_note_font_size() -> f64 {
    DEFAULT_FONT_SIZE * 0.8
}

/// Pale yellow card with no visible border.
pub(crate) fn default_note_style() -> ShapeStyle {
    ShapeStyle {
        fill_color: Some(SerializableColor::new(0xff, 0xf3, 0xbf, 255)),
        stroke_color: SerializableColor::new(0xe6, 0xc2, 0x4c, 255),
        stroke_width: 1.0,
        ..ShapeStyle::default()
    }
}

impl StickyNote {
    pub fn new(meta: ShapeMeta, rect: Rect, text: &str) -> Self {
        Self {
            meta,
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
            text: text.to_string(),
            font_size: default_note_font_size(),
            style: default_note_style(),
        }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Content wrapped to the card's inner width.
    pub fn wrapped_text(&self) -> String {
        let inner = (self.width - 2.0 * NOTE_PADDING).max(self.font_size);
        let per_char = measure_text("m", self.font_size).width;
        wrap_text(&self.text, (inner / per_char).floor() as usize)
    }

    /// Top-left of the text block.
    pub fn text_origin(&self) -> Point {
        Point::new(self.x + NOTE_PADDING, self.y + NOTE_PADDING)
    }

    /// Grow the card so its wrapped text fits.
    pub fn grow_to_fit(&mut self) {
        let needed = measure_text(&self.wrapped_text(), self.font_size).height + 2.0 * NOTE_PADDING;
        if needed > self.height {
            self.height = needed;
        }
    }
}

impl ShapeTrait for StickyNote {
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

    #[test]
    fn test_note_hits_anywhere_on_card() {
        let note = StickyNote::new(ShapeMeta::default(), Rect::new(0.0, 0.0, 200.0, 160.0), "");
        assert!(note.hit_test(Point::new(100.0, 80.0), 0.0));
        assert!(!note.hit_test(Point::new(250.0, 80.0), 0.0));
    }

    #[test]
    fn test_grow_to_fit_long_text() {
        let mut note = StickyNote::new(
            ShapeMeta::default(),
            Rect::new(0.0, 0.0, 120.0, 40.0),
            "call the regional distributor about the pricing sheet before friday",
        );
        note.grow_to_fit();
        assert!(note.height > 40.0);
        assert!((note.width - 120.0).abs() < f64::EPSILON);
    }
}
