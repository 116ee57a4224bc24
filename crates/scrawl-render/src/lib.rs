//! Scrawl Render Library
//!
//! Export surfaces for Scrawl documents. Shapes arrive as
//! [`RenderableShape`]s built by the core style engine, so exports look the
//! same as the canvas in either style mode.

mod print;
mod raster;
mod renderer;
mod svg;

pub use print::{print_page, render_print_page};
pub use raster::{MAX_DIMENSION, Pixmap, RasterRenderer};
pub use renderer::{EXPORT_PADDING, RenderContext, RenderResult, Renderer, RendererError};
pub use svg::SvgRenderer;

use scrawl_core::format::DocumentJson;
use scrawl_core::style::{RenderableShape, StyleEngine};

/// Renderables for every live element of a document, bottom first.
pub fn document_renderables(document: &DocumentJson, style: &StyleEngine) -> Vec<RenderableShape> {
    document
        .live_elements()
        .map(|shape| style.render(shape))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::EditorConfig;
    use serde_json::json;

    #[test]
    fn test_document_export_pipeline() {
        let value = json!({
            "elements": [
                {"type": "rectangle", "id": "a", "x": 0, "y": 0, "width": 50, "height": 40},
                {"type": "rectangle", "id": "b", "x": 10, "y": 10, "width": 5, "height": 5, "isDeleted": true}
            ]
        });
        let document = scrawl_core::read_document(&value).unwrap().document;
        let style = StyleEngine::new(&EditorConfig::default());
        let shapes = document_renderables(&document, &style);
        assert_eq!(shapes.len(), 1);

        let ctx = RenderContext::new(&shapes);
        let svg = SvgRenderer::new().render(&ctx).unwrap();
        assert!(svg.contains("<path"));
        let png = RasterRenderer::new().render(&ctx).unwrap().encode_png().unwrap();
        assert!(!png.is_empty());
    }
}
