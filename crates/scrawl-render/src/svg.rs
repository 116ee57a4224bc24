//! Vector export.

use crate::renderer::{
    RenderContext, RenderResult, Renderer, RendererError, TextBlock, dash_pattern, fill_rgba, hex,
    rgba, stroke_rgba,
};
use kurbo::{Affine, BezPath};
use scrawl_core::style::{FragmentRole, RenderableShape};
use std::fmt::Write;

const FONT_FAMILY: &str = "Virgil, Segoe UI, sans-serif";
const GRID_COLOR: &str = "#e5e5e5";

/// Writes a standalone SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    /// Emit shape ids as `data-id` attributes.
    pub tag_ids: bool,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, tag_ids: bool) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    fn write_shape(&self, out: &mut String, shape: &RenderableShape, transform: Affine, scale: f64) {
        let style = shape.shape.style();
        if self.tag_ids {
            let _ = writeln!(out, r#"<g data-id="{}">"#, escape(shape.shape.id().as_str()));
        } else {
            out.push_str("<g>\n");
        }
        let stroke = stroke_rgba(style);
        let width = style.stroke_width * scale;
        for fragment in &shape.fragments {
            let d = path_data(&fragment.path, transform);
            match fragment.role {
                FragmentRole::Fill => {
                    if let Some(fill) = fill_rgba(style) {
                        let _ = writeln!(out, r#"<path d="{d}" {} stroke="none"/>"#, paint("fill", fill));
                    }
                }
                FragmentRole::Ink => {
                    let _ = writeln!(out, r#"<path d="{d}" {} stroke="none"/>"#, paint("fill", stroke));
                }
                FragmentRole::Stroke | FragmentRole::Arrowhead => {
                    let mut attrs = format!(
                        r#"fill="none" {} stroke-width="{}" stroke-linecap="round" stroke-linejoin="round""#,
                        paint("stroke", stroke),
                        num(width)
                    );
                    if fragment.role == FragmentRole::Stroke && fragment.roughness == 0.0 {
                        if let Some([on, off]) = dash_pattern(style) {
                            let _ = write!(attrs, r#" stroke-dasharray="{} {}""#, num(on * scale), num(off * scale));
                        }
                    }
                    let _ = writeln!(out, r#"<path d="{d}" {attrs}/>"#);
                }
            }
        }
        if let Some(block) = TextBlock::for_shape(&shape.shape) {
            let size = block.font_size * scale;
            for (index, line) in block.lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let at = transform * block.baseline(index);
                let _ = writeln!(
                    out,
                    r#"<text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{}" {} xml:space="preserve">{}</text>"#,
                    num(at.x),
                    num(at.y),
                    num(size),
                    paint("fill", stroke),
                    escape(line)
                );
            }
        }
        out.push_str("</g>\n");
    }
}

impl Renderer for SvgRenderer {
    type Output = String;

    fn render(&mut self, ctx: &RenderContext<'_>) -> RenderResult<String> {
        let (Some(frame), Some(size), Some(transform)) =
            (ctx.frame(), ctx.output_size(), ctx.transform())
        else {
            return Err(RendererError::Empty);
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(size.width),
            h = num(size.height)
        );
        let _ = writeln!(
            out,
            r#"<rect width="100%" height="100%" {}/>"#,
            paint("fill", rgba(ctx.background_color))
        );

        if let Some(spacing) = ctx.grid {
            out.push_str("<g class=\"grid\">\n");
            let mut x = (frame.x0 / spacing).ceil() * spacing;
            while x <= frame.x1 {
                let sx = (x - frame.x0) * ctx.scale;
                let _ = writeln!(
                    out,
                    r#"<line x1="{0}" y1="0" x2="{0}" y2="{1}" stroke="{GRID_COLOR}" stroke-width="1"/>"#,
                    num(sx),
                    num(size.height)
                );
                x += spacing;
            }
            let mut y = (frame.y0 / spacing).ceil() * spacing;
            while y <= frame.y1 {
                let sy = (y - frame.y0) * ctx.scale;
                let _ = writeln!(
                    out,
                    r#"<line x1="0" y1="{0}" x2="{1}" y2="{0}" stroke="{GRID_COLOR}" stroke-width="1"/>"#,
                    num(sy),
                    num(size.width)
                );
                y += spacing;
            }
            out.push_str("</g>\n");
        }

        for shape in ctx.shapes.iter().filter(|s| !s.shape.is_deleted()) {
            self.write_shape(&mut out, shape, transform, ctx.scale);
        }
        out.push_str("</svg>\n");
        log::debug!("svg export: {} shapes, {} bytes", ctx.shapes.len(), out.len());
        Ok(out)
    }
}

fn path_data(path: &BezPath, transform: Affine) -> String {
    (transform * path.clone()).to_svg()
}

/// `fill="#rrggbb"` plus an opacity attribute when not opaque.
fn paint(attr: &str, color: [u8; 4]) -> String {
    if color[3] == 255 {
        format!(r#"{attr}="{}""#, hex(color))
    } else {
        format!(
            r#"{attr}="{}" {attr}-opacity="{}""#,
            hex(color),
            num(color[3] as f64 / 255.0)
        )
    }
}

/// Compact number formatting: at most two decimals, no trailing zeros.
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{rounded:.2}");
        s.trim_end_matches('0').to_string()
    }
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Rect};
    use scrawl_core::EditorConfig;
    use scrawl_core::shapes::{SerializableColor, ShapeFactory, ShapeKind, ShapeSpec, StrokeStyle};
    use scrawl_core::style::StyleEngine;

    fn render(shapes: &[RenderableShape]) -> String {
        SvgRenderer::new().render(&RenderContext::new(shapes)).unwrap()
    }

    #[test]
    fn test_empty_is_error() {
        let result = SvgRenderer::new().render(&RenderContext::new(&[]));
        assert!(matches!(result, Err(RendererError::Empty)));
    }

    #[test]
    fn test_rectangle_document() {
        let mut factory = ShapeFactory::default();
        factory.active_style_mut().fill_color = Some(SerializableColor::new(255, 0, 0, 255));
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(&ShapeSpec::boxed(
            ShapeKind::Rectangle,
            Rect::new(0.0, 0.0, 100.0, 50.0),
        ));
        let svg = render(&[style.render(&shape)]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="140" height="90""#));
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains("stroke-linecap"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut factory = ShapeFactory::default();
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(
            &ShapeSpec::new(ShapeKind::Text, Point::new(10.0, 10.0)).with_text("a < b & c\nsecond"),
        );
        let svg = render(&[style.render(&shape)]);
        assert!(svg.contains("a &lt; b &amp; c</text>"));
        assert!(svg.contains(">second</text>"));
        assert_eq!(svg.matches("<text").count(), 2);
    }

    #[test]
    fn test_dashed_stroke() {
        let mut factory = ShapeFactory::default();
        factory.active_style_mut().stroke_style = StrokeStyle::Dashed;
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(&ShapeSpec::boxed(
            ShapeKind::Ellipse,
            Rect::new(0.0, 0.0, 40.0, 40.0),
        ));
        assert!(render(&[style.render(&shape)]).contains("stroke-dasharray"));
    }

    #[test]
    fn test_arrow_has_head_path() {
        let mut factory = ShapeFactory::default();
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(&ShapeSpec::arrow(Point::ZERO, Point::new(100.0, 0.0)));
        let svg = render(&[style.render(&shape)]);
        assert_eq!(svg.matches("<path").count(), 2);
    }

    #[test]
    fn test_ids_and_grid() {
        let mut factory = ShapeFactory::default();
        let style = StyleEngine::new(&EditorConfig::default());
        let shape = factory.create(&ShapeSpec::boxed(
            ShapeKind::Diamond,
            Rect::new(0.0, 0.0, 60.0, 60.0),
        ));
        let shapes = [style.render(&shape)];
        let svg = SvgRenderer::new()
            .with_ids(true)
            .render(&RenderContext::new(&shapes).with_grid(Some(20.0)))
            .unwrap();
        assert!(svg.contains(&format!(r#"data-id="{}""#, shape.id())));
        assert!(svg.contains(r#"class="grid""#));
    }

    #[test]
    fn test_number_format() {
        assert_eq!(num(3.0), "3");
        assert_eq!(num(2.5), "2.5");
        assert_eq!(num(1.23456), "1.23");
        assert_eq!(num(-0.0), "0");
    }
}
