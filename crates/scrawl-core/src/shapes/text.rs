//! Text shape and the character-width text metrics used for every label.

use super::{ShapeId, ShapeMeta, ShapeStyle, ShapeTrait, unrotate};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size, Vec2};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: f64 = 20.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.25;

/// Average glyph advance as a multiple of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Padding between a bound text and its container's edge.
const CONTAINER_PADDING: f64 = 5.0;

/// Approximate rendered size of `text` without asking a font engine.
/// Width follows the longest line; height counts every line, empty ones included.
pub fn measure_text(text: &str, font_size: f64) -> Size {
    let lines = text.split('\n').collect::<Vec<_>>();
    let widest = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    Size::new(
        widest as f64 * font_size * CHAR_WIDTH_FACTOR,
        lines.len() as f64 * font_size * LINE_HEIGHT,
    )
}

/// Greedy word wrap at `max_chars` per line. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            let mut word_len = word.chars().count();
            while word_len > max_chars {
                if line_len > 0 {
                    out.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let split = word
                    .char_indices()
                    .nth(max_chars)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                out.push(word[..split].to_string());
                word = word[split..].to_string();
                word_len -= max_chars;
            }
            if word_len == 0 {
                continue;
            }
            if line_len > 0 && line_len + 1 + word_len > max_chars {
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.push_str(&word);
            line_len += word_len;
        }
        out.push(line);
    }
    out.join("\n")
}

/// A text label, optionally bound to a container shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(flatten)]
    pub meta: ShapeMeta,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Shape this text lives inside; its geometry is derived from that shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<ShapeId>,
    #[serde(default)]
    pub style: ShapeStyle,
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

impl Text {
    pub fn new(meta: ShapeMeta, position: Point, text: &str, font_size: f64) -> Self {
        let size = measure_text(text, font_size);
        Self {
            meta,
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            text: text.to_string(),
            font_size,
            container_id: None,
            style: ShapeStyle::default(),
        }
    }

    /// Replace the content and re-measure. Bound text keeps its width and re-wraps.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.remeasure();
    }

    /// Size the box to the container's inner width and center it there.
    /// The source text is left as typed; only the layout wraps.
    pub fn fit_to_container(&mut self, container: Rect) {
        self.width = (container.width() - 2.0 * CONTAINER_PADDING).max(self.font_size);
        self.remeasure();
        let center = container.center();
        self.x = center.x - self.width / 2.0;
        self.y = center.y - self.height / 2.0;
    }

    /// Content as laid out. Bound text wraps to its width; free text only
    /// breaks at newlines.
    pub fn wrapped_text(&self) -> String {
        if self.container_id.is_none() {
            return self.text.clone();
        }
        let per_char = self.font_size * CHAR_WIDTH_FACTOR;
        wrap_text(&self.text, ((self.width + 1e-9) / per_char).floor() as usize)
    }

    pub fn lines(&self) -> Vec<String> {
        self.wrapped_text().split('\n').map(str::to_string).collect()
    }

    fn remeasure(&mut self) {
        let size = measure_text(&self.wrapped_text(), self.font_size);
        if self.container_id.is_none() {
            self.width = size.width;
        }
        self.height = size.height;
    }
}

impl ShapeTrait for Text {
    fn meta(&self) -> &ShapeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ShapeMeta {
        &mut self.meta
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.x + self.width.max(self.font_size * CHAR_WIDTH_FACTOR),
            self.y + self.height.max(self.font_size * LINE_HEIGHT),
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let bounds = self.bounds();
        let point = unrotate(point, bounds.center(), self.meta.angle);
        bounds.inflate(tolerance, tolerance).contains(point)
    }

    /// Text box outline (selection/hit area; glyphs are drawn by the renderer).
    fn to_path(&self) -> BezPath {
        let bounds = self.bounds();
        let path = bounds.to_path(0.1);
        if self.meta.angle == 0.0 {
            path
        } else {
            Affine::rotate_about(self.meta.angle, bounds.center()) * path
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
        if self.height > f64::EPSILON {
            self.font_size = (self.font_size * bounds.height() / self.height).max(1.0);
        }
        self.remeasure();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_uses_widest_line() {
        let size = measure_text("ab\nabcd", 10.0);
        assert!((size.width - 24.0).abs() < 1e-9);
        assert!((size.height - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_measure_empty() {
        let size = measure_text("", 20.0);
        assert!(size.width.abs() < f64::EPSILON);
        assert!((size.height - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_at_word_boundaries() {
        assert_eq!(wrap_text("Acme Holdings Group", 12), "Acme\nHoldings\nGroup");
        assert_eq!(wrap_text("Internationalization", 12), "Internationa\nlization");
        assert_eq!(wrap_text("one two three", 7), "one two\nthree");
        assert_eq!(wrap_text("short", 24), "short");
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        assert_eq!(wrap_text("a b\nc", 10), "a b\nc");
    }

    #[test]
    fn test_set_text_remeasures() {
        let mut t = Text::new(ShapeMeta::default(), Point::ZERO, "hi", 20.0);
        t.set_text("hello world");
        assert!((t.width - 11.0 * 20.0 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_container_centers_and_wraps() {
        let mut t = Text::new(ShapeMeta::default(), Point::ZERO, "quarterly revenue review", 10.0);
        t.container_id = Some(ShapeId::from("box"));
        t.fit_to_container(Rect::new(0.0, 0.0, 100.0, 100.0));
        // 90px usable at 6px per char leaves 15 chars per line
        assert_eq!(t.wrapped_text(), "quarterly\nrevenue review");
        assert_eq!(t.text, "quarterly revenue review");
        let b = t.bounds();
        assert!((b.center().x - 50.0).abs() < 1e-9);
        assert!((b.center().y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_container_resize_keeps_paragraphs() {
        let mut t = Text::new(ShapeMeta::default(), Point::ZERO, "Pros\nCons", 10.0);
        t.container_id = Some(ShapeId::from("box"));
        t.fit_to_container(Rect::new(0.0, 0.0, 40.0, 100.0));
        t.fit_to_container(Rect::new(0.0, 0.0, 400.0, 100.0));
        assert_eq!(t.text, "Pros\nCons");
        assert_eq!(t.lines(), vec!["Pros", "Cons"]);
        assert!((t.height - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_narrow_container_wraps_then_unwraps() {
        let mut t = Text::new(ShapeMeta::default(), Point::ZERO, "alpha beta", 10.0);
        t.container_id = Some(ShapeId::from("box"));
        t.fit_to_container(Rect::new(0.0, 0.0, 50.0, 100.0));
        assert_eq!(t.lines(), vec!["alpha", "beta"]);
        t.fit_to_container(Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(t.lines(), vec!["alpha beta"]);
    }
}
