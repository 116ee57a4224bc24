//! Subcommand implementations, kept free of argument parsing.

use clap::ValueEnum;
use kurbo::Rect;
use peniko::Color;
use scrawl_core::format::{Dialect, DocumentJson};
use scrawl_core::style::{RoughGenerator, StyleEngine};
use scrawl_core::{EditorConfig, FormatError, read_document};
use scrawl_render::{
    RasterRenderer, RenderContext, Renderer, RendererError, SvgRenderer, document_renderables,
    print_page,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unreadable document: {0}")]
    Format(#[from] FormatError),
    #[error("export failed: {0}")]
    Render(#[from] RendererError),
    #[error("invalid color {0:?}")]
    Color(String),
}

pub type CliResult<T> = Result<T, CliError>;

pub fn read_file(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Editor config from a JSON file, or defaults.
pub fn load_config(path: Option<&Path>) -> CliResult<EditorConfig> {
    match path {
        Some(path) => Ok(EditorConfig::from_json(&read_file(path)?)?),
        None => Ok(EditorConfig::default()),
    }
}

/// Stored payload: either a bare document or a canvas record with `data`.
pub fn read_payload(path: &Path) -> CliResult<Value> {
    let value: Value = serde_json::from_str(&read_file(path)?)?;
    match value {
        Value::Object(mut record) if record.contains_key("data") && !record.contains_key("elements") => {
            Ok(record.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

/// What `inspect` reports about a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub dialect: Dialect,
    pub skipped: usize,
    pub counts: BTreeMap<&'static str, usize>,
    pub bounds: Option<Rect>,
    pub zoom: Option<f64>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dialect:  {}", self.dialect.name())?;
        writeln!(f, "elements: {}", self.total())?;
        for (kind, count) in &self.counts {
            writeln!(f, "  {kind:12} {count}")?;
        }
        if self.skipped > 0 {
            writeln!(f, "skipped:  {}", self.skipped)?;
        }
        if let Some(b) = self.bounds {
            writeln!(
                f,
                "bounds:   ({:.0}, {:.0}) - ({:.0}, {:.0})",
                b.x0, b.y0, b.x1, b.y1
            )?;
        }
        if let Some(zoom) = self.zoom {
            writeln!(f, "zoom:     {zoom}")?;
        }
        Ok(())
    }
}

pub fn inspect(value: &Value) -> CliResult<Summary> {
    let migrated = read_document(value)?;
    let document = &migrated.document;
    let mut counts = BTreeMap::new();
    for shape in document.live_elements() {
        *counts.entry(shape.kind().name()).or_insert(0) += 1;
    }
    let bounds = document
        .live_elements()
        .map(|s| s.bounds())
        .reduce(|a, b| a.union(b));
    Ok(Summary {
        dialect: migrated.dialect,
        skipped: migrated.skipped,
        counts,
        bounds,
        zoom: document.app_state.zoom,
    })
}

/// Rewrite any accepted dialect as canonical JSON.
pub fn migrate(value: &Value) -> CliResult<String> {
    let migrated = read_document(value)?;
    if migrated.skipped > 0 {
        log::warn!("{} entries could not be converted", migrated.skipped);
    }
    log::info!(
        "migrated {} document with {} elements",
        migrated.dialect.name(),
        migrated.document.elements.len()
    );
    let canonical = migrated.document.without_tombstones().to_value()?;
    Ok(serde_json::to_string_pretty(&canonical)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Svg,
    Png,
    /// HTML page that opens the print dialog.
    Print,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub scale: f64,
    pub grid: bool,
    /// Overrides the document's background color.
    pub background: Option<String>,
    pub title: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Svg,
            scale: 1.0,
            grid: false,
            background: None,
            title: "Canvas".to_string(),
        }
    }
}

fn background(document: &DocumentJson, options: &ExportOptions) -> CliResult<Color> {
    match &options.background {
        Some(raw) => scrawl_core::shapes::SerializableColor::parse(raw)
            .map(Color::from)
            .ok_or_else(|| CliError::Color(raw.clone())),
        None => Ok(Color::from(document.app_state.view_background_color)),
    }
}

pub fn export(value: &Value, config: &EditorConfig, options: &ExportOptions) -> CliResult<Vec<u8>> {
    let document = read_document(value)?.document;
    // Shapes keep their own roughness; the generator only has to be present.
    let style = StyleEngine::with_generator(config, Rc::new(RoughGenerator::default()));
    let shapes = document_renderables(&document, &style);
    let ctx = RenderContext::new(&shapes)
        .with_scale(options.scale)
        .with_background(background(&document, options)?)
        .with_grid(options.grid.then_some(config.grid_size));

    let bytes = match options.format {
        ExportFormat::Svg => SvgRenderer::new().render(&ctx)?.into_bytes(),
        ExportFormat::Png => RasterRenderer::new().render(&ctx)?.encode_png()?,
        ExportFormat::Print => {
            let svg = SvgRenderer::new().render(&ctx)?;
            print_page(&svg, &options.title).into_bytes()
        }
    };
    log::info!(
        "exported {} shapes as {:?} ({} bytes)",
        shapes.len(),
        options.format,
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy() -> Value {
        json!({
            "elements": {
                "nodes": [
                    {"data": {"id": "n1", "type": "company", "label": "Acme Corp", "entity_id": "c-1"},
                     "position": {"x": 100, "y": 100}},
                    {"data": {"id": "n2", "type": "note", "label": "Follow up"},
                     "position": {"x": 400, "y": 250}}
                ],
                "edges": [{"data": {"id": "e1", "source": "n1", "target": "n2"}}]
            }
        })
    }

    fn boxes() -> Value {
        json!({
            "elements": [
                {"type": "rectangle", "id": "a", "x": 0, "y": 0, "width": 100, "height": 60},
                {"type": "ellipse", "id": "b", "x": 150, "y": 0, "width": 80, "height": 80}
            ],
            "appState": {"viewBackgroundColor": "#fafafa", "zoom": 2.0}
        })
    }

    #[test]
    fn test_inspect_legacy() {
        let summary = inspect(&legacy()).unwrap();
        assert_eq!(summary.dialect, Dialect::LegacyGraph);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.counts.len(), 3);
        let printed = summary.to_string();
        assert!(printed.contains("legacy-graph"));
    }

    #[test]
    fn test_inspect_canonical_view() {
        let summary = inspect(&boxes()).unwrap();
        assert_eq!(summary.dialect, Dialect::Canonical);
        assert_eq!(summary.zoom, Some(2.0));
        assert_eq!(summary.bounds, Some(Rect::new(0.0, 0.0, 230.0, 80.0)));
    }

    #[test]
    fn test_migrate_writes_canonical() {
        let out = migrate(&legacy()).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert!(value["elements"].is_array());
        assert_eq!(inspect(&value).unwrap().dialect, Dialect::Canonical);
        assert_eq!(inspect(&value).unwrap().total(), 3);
    }

    #[test]
    fn test_export_formats() {
        let config = EditorConfig::default();
        let svg = export(&boxes(), &config, &ExportOptions::default()).unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains(r##"fill="#fafafa""##));

        let png = export(
            &boxes(),
            &config,
            &ExportOptions {
                format: ExportFormat::Png,
                scale: 0.5,
                ..ExportOptions::default()
            },
        )
        .unwrap();
        assert_eq!(&png[..4], b"\x89PNG");

        let page = export(
            &boxes(),
            &config,
            &ExportOptions {
                format: ExportFormat::Print,
                title: "Board".to_string(),
                ..ExportOptions::default()
            },
        )
        .unwrap();
        assert!(String::from_utf8(page).unwrap().contains("window.print()"));
    }

    #[test]
    fn test_bad_background() {
        let options = ExportOptions {
            background: Some("not-a-color".to_string()),
            ..ExportOptions::default()
        };
        assert!(matches!(
            export(&boxes(), &EditorConfig::default(), &options),
            Err(CliError::Color(_))
        ));
    }

    #[test]
    fn test_read_payload_unwraps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = json!({"id": "c1", "title": "t", "data": boxes()});
        std::fs::write(&path, record.to_string()).unwrap();
        assert_eq!(read_payload(&path).unwrap(), boxes());

        let missing = dir.path().join("missing.json");
        assert!(matches!(read_payload(&missing), Err(CliError::Read { .. })));
    }

    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"gridSize": 40}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.grid_size, 40.0);
        assert_eq!(config.history_limit, 50);
    }
}
