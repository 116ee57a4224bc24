//! Renderer trait abstraction.

use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;
use scrawl_core::shapes::{LINE_HEIGHT, SerializableColor, Shape, ShapeStyle};
use scrawl_core::style::RenderableShape;
use thiserror::Error;

/// Padding around exported content, in world units.
pub const EXPORT_PADDING: f64 = 20.0;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Nothing to render")]
    Empty,
    #[error("Output too large: {0}x{1}")]
    TooLarge(u32, u32),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Everything needed to draw one export.
pub struct RenderContext<'a> {
    /// Shapes bottom first, as built by the style engine.
    pub shapes: &'a [RenderableShape],
    /// Output pixels per world unit.
    pub scale: f64,
    pub padding: f64,
    pub background_color: Color,
    /// Draw grid lines at this spacing.
    pub grid: Option<f64>,
}

impl<'a> RenderContext<'a> {
    pub fn new(shapes: &'a [RenderableShape]) -> Self {
        Self {
            shapes,
            scale: 1.0,
            padding: EXPORT_PADDING,
            background_color: Color::WHITE,
            grid: None,
        }
    }

    /// Set the export resolution multiplier (1 = 1x, 2 = 2x, ...).
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding.max(0.0);
        self
    }

    pub fn with_grid(mut self, grid: Option<f64>) -> Self {
        self.grid = grid.filter(|g| *g > 0.0);
        self
    }

    /// Union of shape bounds, padding excluded.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(|r| r.shape.bounds())
            .reduce(|a, b| a.union(b))
    }

    /// World area that ends up in the output.
    pub fn frame(&self) -> Option<Rect> {
        self.content_bounds()
            .map(|b| b.inflate(self.padding, self.padding))
    }

    /// World to output transform: translate the frame to the origin, then scale.
    pub fn transform(&self) -> Option<Affine> {
        let frame = self.frame()?;
        Some(Affine::scale(self.scale) * Affine::translate((-frame.x0, -frame.y0)))
    }

    /// Output size in pixels.
    pub fn output_size(&self) -> Option<Size> {
        let frame = self.frame()?;
        Some(Size::new(
            (frame.width() * self.scale).ceil(),
            (frame.height() * self.scale).ceil(),
        ))
    }
}

/// Trait for export backends.
pub trait Renderer {
    type Output;

    fn render(&mut self, ctx: &RenderContext<'_>) -> RenderResult<Self::Output>;
}

/// Straight RGBA bytes of a color.
pub(crate) fn rgba(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// Fill color of a shape, opacity applied.
pub(crate) fn fill_rgba(style: &ShapeStyle) -> Option<[u8; 4]> {
    style.fill_with_opacity().map(rgba)
}

pub(crate) fn stroke_rgba(style: &ShapeStyle) -> [u8; 4] {
    rgba(style.stroke_with_opacity())
}

pub(crate) fn hex(color: [u8; 4]) -> String {
    SerializableColor::new(color[0], color[1], color[2], 255).to_hex()
}

/// Dash pattern for a stroke style, scaled by stroke width.
pub(crate) fn dash_pattern(style: &ShapeStyle) -> Option<[f64; 2]> {
    use scrawl_core::shapes::StrokeStyle;
    let w = style.stroke_width.max(1.0);
    match style.stroke_style {
        StrokeStyle::Solid => None,
        StrokeStyle::Dashed => Some([w * 4.0, w * 3.0]),
        StrokeStyle::Dotted => Some([w, w * 2.0]),
    }
}

/// Laid-out label of a text-bearing shape, in world coordinates.
pub(crate) struct TextBlock {
    pub origin: Point,
    pub font_size: f64,
    pub lines: Vec<String>,
}

impl TextBlock {
    pub fn for_shape(shape: &Shape) -> Option<Self> {
        let (origin, font_size, content) = match shape {
            Shape::Text(t) => (Point::new(t.x, t.y), t.font_size, t.wrapped_text()),
            Shape::StickyNote(n) => (n.text_origin(), n.font_size, n.wrapped_text()),
            Shape::DomainNode(d) => (d.label_origin(), d.font_size, d.label.clone()),
            _ => return None,
        };
        if content.trim().is_empty() {
            return None;
        }
        Some(Self {
            origin,
            font_size,
            lines: content.split('\n').map(str::to_string).collect(),
        })
    }

    /// Baseline of line `index`.
    pub fn baseline(&self, index: usize) -> Point {
        let line_height = self.font_size * LINE_HEIGHT;
        Point::new(
            self.origin.x,
            self.origin.y + line_height * index as f64 + self.font_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::EditorConfig;
    use scrawl_core::shapes::{ShapeFactory, ShapeKind, ShapeSpec};
    use scrawl_core::style::StyleEngine;

    #[test]
    fn test_frame_and_output_size() {
        let mut factory = ShapeFactory::default();
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(&ShapeSpec::boxed(
            ShapeKind::Rectangle,
            Rect::new(10.0, 10.0, 110.0, 60.0),
        ));
        let shapes = vec![style.render(&shape)];
        let ctx = RenderContext::new(&shapes).with_scale(2.0);
        assert_eq!(ctx.frame(), Some(Rect::new(-10.0, -10.0, 130.0, 80.0)));
        assert_eq!(ctx.output_size(), Some(Size::new(280.0, 180.0)));
        assert_eq!(
            ctx.transform().unwrap() * kurbo::Point::new(-10.0, -10.0),
            kurbo::Point::ZERO
        );
    }

    #[test]
    fn test_empty_context_has_no_frame() {
        let ctx = RenderContext::new(&[]);
        assert!(ctx.frame().is_none());
        assert!(ctx.output_size().is_none());
    }

    #[test]
    fn test_color_helpers() {
        assert_eq!(rgba(Color::WHITE), [255, 255, 255, 255]);
        assert_eq!(hex([0x1e, 0x1e, 0x1e, 10]), "#1e1e1e");
    }
}
