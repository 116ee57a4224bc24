//! Raster export on tiny-skia, encoded to PNG.
//!
//! Text glyphs are not rasterized; labels only appear in vector export.

use crate::renderer::{
    RenderContext, RenderResult, Renderer, RendererError, dash_pattern, fill_rgba, rgba,
    stroke_rgba,
};
use kurbo::{Affine, BezPath, PathEl, Rect};
use scrawl_core::style::{FragmentRole, RenderableShape};
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Stroke, StrokeDash, Transform,
};

/// Largest width or height we will allocate.
pub const MAX_DIMENSION: u32 = 8192;

const GRID_RGBA: [u8; 4] = [0xe5, 0xe5, 0xe5, 0xff];

/// Rendered image. Pixels read back as straight (non-premultiplied) RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    inner: tiny_skia::Pixmap,
}

impl Pixmap {
    /// Blank image filled with `background`; `None` for a zero or oversized area.
    pub fn new(width: u32, height: u32, background: [u8; 4]) -> Option<Self> {
        let mut inner = tiny_skia::Pixmap::new(width, height)?;
        let [r, g, b, a] = background;
        inner.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        Some(Self { inner })
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.inner.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Straight RGBA8 rows, top to bottom.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.inner
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Fill `path` (already in pixel space) with nonzero winding.
    pub fn fill_path(&mut self, path: &BezPath, color: [u8; 4]) {
        let Some(path) = build_path(path) else {
            return;
        };
        self.inner.fill_path(
            &path,
            &paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Stroke `path` (already in pixel space).
    pub fn stroke_path(&mut self, path: &BezPath, color: [u8; 4], stroke: &Stroke) {
        let Some(path) = build_path(path) else {
            return;
        };
        self.inner
            .stroke_path(&path, &paint(color), stroke, Transform::identity(), None);
    }

    fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let Some(rect) = tiny_skia::Rect::from_ltrb(
            rect.x0 as f32,
            rect.y0 as f32,
            rect.x1 as f32,
            rect.y1 as f32,
        ) else {
            return;
        };
        self.inner
            .fill_rect(rect, &paint(color), Transform::identity(), None);
    }

    /// Encode as an 8-bit RGBA PNG.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        let mut data = Vec::new();
        let mut encoder = png::Encoder::new(&mut data, self.width(), self.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(|e| {
            log::error!("Failed to write PNG header: {e}");
            RendererError::Encode(e.to_string())
        })?;
        writer.write_image_data(&self.to_rgba8()).map_err(|e| {
            log::error!("Failed to write PNG data: {e}");
            RendererError::Encode(e.to_string())
        })?;
        writer
            .finish()
            .map_err(|e| RendererError::Encode(e.to_string()))?;
        Ok(data)
    }
}

fn paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    let [r, g, b, a] = color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// kurbo path to a tiny-skia path; `None` when nothing would be drawn.
fn build_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => {
                builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32)
            }
            PathEl::CurveTo(c1, c2, p) => builder.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

/// Rasterizes shapes into a [`Pixmap`].
#[derive(Debug, Clone, Default)]
pub struct RasterRenderer;

impl RasterRenderer {
    pub fn new() -> Self {
        Self
    }

    fn draw_shape(&self, pixmap: &mut Pixmap, shape: &RenderableShape, transform: Affine, scale: f64) {
        let style = shape.shape.style();
        let stroke_color = stroke_rgba(style);
        let width = (style.stroke_width * scale).max(0.5) as f32;
        for fragment in &shape.fragments {
            let path = transform * fragment.path.clone();
            match fragment.role {
                FragmentRole::Fill => {
                    if let Some(fill) = fill_rgba(style) {
                        pixmap.fill_path(&path, fill);
                    }
                }
                FragmentRole::Ink => pixmap.fill_path(&path, stroke_color),
                FragmentRole::Stroke | FragmentRole::Arrowhead => {
                    let mut stroke = Stroke {
                        width,
                        line_cap: LineCap::Round,
                        line_join: LineJoin::Round,
                        ..Stroke::default()
                    };
                    if fragment.role == FragmentRole::Stroke && fragment.roughness == 0.0 {
                        if let Some([on, off]) = dash_pattern(style) {
                            stroke.dash = StrokeDash::new(
                                vec![(on * scale) as f32, (off * scale) as f32],
                                0.0,
                            );
                        }
                    }
                    pixmap.stroke_path(&path, stroke_color, &stroke);
                }
            }
        }
    }

    fn draw_grid(&self, pixmap: &mut Pixmap, frame: Rect, spacing: f64, scale: f64) {
        let (width, height) = (pixmap.width() as f64, pixmap.height() as f64);
        let mut x = (frame.x0 / spacing).ceil() * spacing;
        while x <= frame.x1 {
            let sx = ((x - frame.x0) * scale).floor();
            pixmap.fill_rect(Rect::new(sx, 0.0, sx + 1.0, height), GRID_RGBA);
            x += spacing;
        }
        let mut y = (frame.y0 / spacing).ceil() * spacing;
        while y <= frame.y1 {
            let sy = ((y - frame.y0) * scale).floor();
            pixmap.fill_rect(Rect::new(0.0, sy, width, sy + 1.0), GRID_RGBA);
            y += spacing;
        }
    }
}

impl Renderer for RasterRenderer {
    type Output = Pixmap;

    fn render(&mut self, ctx: &RenderContext<'_>) -> RenderResult<Pixmap> {
        let (Some(frame), Some(size), Some(transform)) =
            (ctx.frame(), ctx.output_size(), ctx.transform())
        else {
            return Err(RendererError::Empty);
        };
        let width = size.width as u32;
        let height = size.height as u32;
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RendererError::TooLarge(width, height));
        }
        let mut pixmap = Pixmap::new(width.max(1), height.max(1), rgba(ctx.background_color))
            .ok_or(RendererError::TooLarge(width, height))?;
        if let Some(spacing) = ctx.grid {
            self.draw_grid(&mut pixmap, frame, spacing, ctx.scale);
        }
        for shape in ctx.shapes.iter().filter(|s| !s.shape.is_deleted()) {
            self.draw_shape(&mut pixmap, shape, transform, ctx.scale);
        }
        log::debug!("raster export: {width}x{height}, {} shapes", ctx.shapes.len());
        Ok(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Shape as _};
    use scrawl_core::EditorConfig;
    use scrawl_core::shapes::{SerializableColor, ShapeFactory, ShapeKind, ShapeSpec};
    use scrawl_core::style::StyleEngine;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    fn red_box() -> Vec<RenderableShape> {
        let mut factory = ShapeFactory::default();
        factory.active_style_mut().fill_color = Some(SerializableColor::new(255, 0, 0, 255));
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(&ShapeSpec::boxed(
            ShapeKind::Rectangle,
            Rect::new(0.0, 0.0, 100.0, 50.0),
        ));
        vec![style.render(&shape)]
    }

    #[test]
    fn test_fill_square() {
        let mut pixmap = Pixmap::new(10, 10, WHITE).unwrap();
        pixmap.fill_path(&Rect::new(2.0, 2.0, 6.0, 6.0).to_path(0.1), RED);
        assert_eq!(pixmap.pixel(3, 3), Some(RED));
        assert_eq!(pixmap.pixel(4, 4), Some(RED));
        assert_eq!(pixmap.pixel(7, 7), Some(WHITE));
        assert_eq!(pixmap.pixel(0, 3), Some(WHITE));
        assert_eq!(pixmap.pixel(10, 0), None);
    }

    #[test]
    fn test_empty_path_is_ignored() {
        let mut pixmap = Pixmap::new(4, 4, WHITE).unwrap();
        pixmap.fill_path(&BezPath::new(), RED);
        assert!(pixmap.to_rgba8().chunks(4).all(|px| px == WHITE));
    }

    #[test]
    fn test_render_rectangle() {
        let shapes = red_box();
        let pixmap = RasterRenderer::new().render(&RenderContext::new(&shapes)).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (140, 90));
        assert_eq!(pixmap.pixel(70, 45), Some(RED));
        assert_eq!(pixmap.pixel(2, 2), Some(WHITE));
        let edge = pixmap.pixel(20, 45).unwrap();
        assert_ne!(edge, RED);
        assert_ne!(edge, WHITE);
    }

    #[test]
    fn test_scale_doubles_output() {
        let shapes = red_box();
        let pixmap = RasterRenderer::new()
            .render(&RenderContext::new(&shapes).with_scale(2.0))
            .unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (280, 180));
        assert_eq!(pixmap.pixel(140, 90), Some(RED));
    }

    #[test]
    fn test_text_glyphs_are_skipped() {
        let mut factory = ShapeFactory::default();
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(
            &ShapeSpec::new(ShapeKind::Text, Point::new(0.0, 0.0)).with_text("hello"),
        );
        let shapes = [style.render(&shape)];
        let pixmap = RasterRenderer::new().render(&RenderContext::new(&shapes)).unwrap();
        assert!(pixmap.to_rgba8().chunks(4).all(|px| px == WHITE));
    }

    #[test]
    fn test_too_large() {
        let shapes = red_box();
        let result = RasterRenderer::new().render(&RenderContext::new(&shapes).with_scale(100.0));
        assert!(matches!(result, Err(RendererError::TooLarge(14000, 9000))));
    }

    #[test]
    fn test_encode_png() {
        let shapes = red_box();
        let pixmap = RasterRenderer::new().render(&RenderContext::new(&shapes)).unwrap();
        let bytes = pixmap.encode_png().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 140);
        assert_eq!(reader.info().height, 90);
    }
}
