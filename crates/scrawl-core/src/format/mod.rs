//! Persisted document JSON: the canonical dialect and readers for older ones.
//!
//! Three shapes of `data` are accepted on read:
//! - canonical `{ elements: Shape[], appState }`
//! - the object-canvas dialect `{ objects: [...] }`
//! - the legacy node/edge graph, either `{ elements: { nodes, edges } }`,
//!   `{ nodes, edges }`, or a flat array tagged by `group`
//!
//! Only the canonical dialect is ever written.

mod canonical;
mod legacy;
mod objects;

use crate::shapes::{SerializableColor, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while reading a persisted document.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("malformed document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document layout: {0}")]
    Unsupported(String),
}

pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Document-level view settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub theme: Theme,
    pub view_background_color: SerializableColor,
    /// Pan offset and zoom, only present in saved documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            view_background_color: SerializableColor::white(),
            scroll_x: None,
            scroll_y: None,
            zoom: None,
        }
    }
}

/// The canonical document: shapes in z-order (first is bottom) plus app state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentJson {
    pub elements: Vec<Shape>,
    #[serde(default)]
    pub app_state: AppState,
}

impl DocumentJson {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes that are not tombstoned.
    pub fn live_elements(&self) -> impl Iterator<Item = &Shape> {
        self.elements.iter().filter(|s| !s.is_deleted())
    }

    /// Drop tombstones; used before a document leaves the session.
    pub fn without_tombstones(mut self) -> Self {
        self.elements.retain(|s| !s.is_deleted());
        self
    }

    pub fn to_value(&self) -> FormatResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> FormatResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Which on-disk layout a payload uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Canonical,
    ObjectCanvas,
    LegacyGraph,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Canonical => "canonical",
            Dialect::ObjectCanvas => "object-canvas",
            Dialect::LegacyGraph => "legacy-graph",
        }
    }
}

/// Result of reading a payload in any dialect.
#[derive(Debug, Clone)]
pub struct Migrated {
    pub document: DocumentJson,
    pub dialect: Dialect,
    /// Entries that could not be converted and were left out.
    pub skipped: usize,
}

fn is_graph_entry(value: &Value) -> bool {
    matches!(
        value.get("group").and_then(Value::as_str),
        Some("nodes") | Some("edges")
    )
}

/// Decide the dialect of a `data` payload.
pub fn sniff(data: &Value) -> Option<Dialect> {
    match data {
        Value::Null => Some(Dialect::Canonical),
        Value::Array(items) if !items.is_empty() && items.iter().all(is_graph_entry) => {
            Some(Dialect::LegacyGraph)
        }
        Value::Object(map) => match (map.get("elements"), map.get("objects")) {
            (Some(_), Some(_)) => None,
            (Some(Value::Array(items)), None) => {
                if items.iter().any(is_graph_entry) {
                    Some(Dialect::LegacyGraph)
                } else {
                    Some(Dialect::Canonical)
                }
            }
            (Some(Value::Object(graph)), None)
                if graph.contains_key("nodes") || graph.contains_key("edges") =>
            {
                Some(Dialect::LegacyGraph)
            }
            (Some(_), None) => None,
            (None, Some(Value::Array(_))) => Some(Dialect::ObjectCanvas),
            (None, Some(_)) => None,
            (None, None) if map.get("nodes").is_some_and(Value::is_array) => {
                Some(Dialect::LegacyGraph)
            }
            (None, None) if map.is_empty() => Some(Dialect::Canonical),
            (None, None) => None,
        },
        _ => None,
    }
}

/// Read a `data` payload in any accepted dialect into the canonical document.
pub fn read_document(data: &Value) -> FormatResult<Migrated> {
    let dialect = sniff(data).ok_or_else(|| {
        FormatError::Unsupported("expected an `elements` or `objects` list".to_string())
    })?;
    let (document, skipped) = match dialect {
        Dialect::Canonical => canonical::read(data),
        Dialect::ObjectCanvas => objects::read(data),
        Dialect::LegacyGraph => legacy::read(data)?,
    };
    if dialect != Dialect::Canonical {
        log::info!(
            "migrated {} document: {} shapes, {} entries skipped",
            dialect.name(),
            document.elements.len(),
            skipped
        );
    }
    Ok(Migrated {
        document,
        dialect,
        skipped,
    })
}

/// Parse a JSON string and read it with [`read_document`].
pub fn parse_document(json: &str) -> FormatResult<Migrated> {
    let value: Value = serde_json::from_str(json)?;
    read_document(&value)
}

fn num(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Parse CSS colors seen in old documents: hex, `rgb()`/`rgba()` and a few names.
pub(crate) fn parse_css_color(color: &str) -> Option<SerializableColor> {
    if let Some(c) = SerializableColor::parse(color) {
        return Some(c);
    }
    let color = color.trim().to_ascii_lowercase();
    if let Some(args) = color
        .strip_prefix("rgba(")
        .or_else(|| color.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts = args
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        let channel = |v: f64| v.clamp(0.0, 255.0).round() as u8;
        return match parts.as_slice() {
            [r, g, b] => Some(SerializableColor::new(channel(*r), channel(*g), channel(*b), 255)),
            [r, g, b, a] => Some(SerializableColor::new(
                channel(*r),
                channel(*g),
                channel(*b),
                channel(a * 255.0),
            )),
            _ => None,
        };
    }
    match color.as_str() {
        "black" => Some(SerializableColor::black()),
        "white" => Some(SerializableColor::white()),
        "red" => Some(SerializableColor::new(255, 0, 0, 255)),
        "green" => Some(SerializableColor::new(0, 128, 0, 255)),
        "blue" => Some(SerializableColor::new(0, 0, 255, 255)),
        "yellow" => Some(SerializableColor::new(255, 255, 0, 255)),
        "gray" | "grey" => Some(SerializableColor::new(128, 128, 128, 255)),
        _ => None,
    }
}
