//! Editor tunables. Every field has a default so partial JSON configs load.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Quiet period before an autosave fires.
    pub save_debounce_ms: u64,
    /// Undo snapshots kept, baseline included.
    pub history_limit: usize,
    /// Size given to rect/circle/diamond when the drag was below the noise threshold.
    pub min_shape_width: f64,
    pub min_shape_height: f64,
    /// Drags shorter than this on both axes count as a click.
    pub drag_noise_threshold: f64,
    /// Second line click must be further than this from the first.
    pub line_min_distance: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub grid_size: f64,
    /// Hit-test slop in screen pixels.
    pub hit_tolerance: f64,
    pub note_width: f64,
    pub note_height: f64,
    /// Characters per line before a dropped entity's label wraps.
    pub label_wrap_chars: usize,
    /// Offset applied to duplicated shapes.
    pub duplicate_offset: f64,
    /// Roughness stamped on shapes drawn in hand-drawn mode.
    pub sketch_roughness: f64,
    pub sketch_bowing: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: 2000,
            history_limit: 50,
            min_shape_width: 120.0,
            min_shape_height: 80.0,
            drag_noise_threshold: 10.0,
            line_min_distance: 5.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            grid_size: 20.0,
            hit_tolerance: 5.0,
            note_width: 200.0,
            note_height: 160.0,
            label_wrap_chars: 24,
            duplicate_offset: 16.0,
            sketch_roughness: 1.0,
            sketch_bowing: 1.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}
