//! Print export: an HTML page holding the vector drawing that opens the
//! browser's print dialog once loaded.

use crate::renderer::{RenderContext, RenderResult, Renderer};
use crate::svg::{SvgRenderer, escape};

const PRINT_CSS: &str = "\
@page { margin: 12mm; }
html, body { margin: 0; padding: 0; background: #ffffff; }
.sheet { display: flex; justify-content: center; align-items: flex-start; }
.sheet svg { max-width: 100%; height: auto; }
@media print {
  .sheet svg { max-height: 100vh; page-break-inside: avoid; }
}
";

/// Wrap an already rendered SVG document in a printable page.
pub fn print_page(svg: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{PRINT_CSS}</style>\n</head>\n<body>\n<div class=\"sheet\">\n{}</div>\n<script>window.addEventListener('load', function () {{ window.print(); }});</script>\n</body>\n</html>\n",
        escape(title),
        svg
    )
}

/// Render `ctx` to SVG and wrap it for printing.
pub fn render_print_page(ctx: &RenderContext<'_>, title: &str) -> RenderResult<String> {
    let svg = SvgRenderer::new().render(ctx)?;
    Ok(print_page(&svg, title))
}
