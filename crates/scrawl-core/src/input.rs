//! Pointer/keyboard events and keyboard shortcut resolution.

use crate::clock::{Duration, Instant};
use crate::tools::ToolKind;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Double-click detection constants.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates relative to the canvas element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Wheel {
        position: Point,
        delta_y: f64,
    },
}

/// A key press. `key` uses DOM key names ("a", "Delete", "Escape").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

/// Where keyboard focus is. Shortcuts only apply on the active canvas tab
/// with focus outside text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub tab_active: bool,
    pub text_focused: bool,
}

impl Default for KeyContext {
    fn default() -> Self {
        Self {
            tab_active: true,
            text_focused: false,
        }
    }
}

/// Editor command a shortcut maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Delete,
    Undo,
    Redo,
    Group,
    Ungroup,
    SelectAll,
    Escape,
    ToggleGrid,
    SetTool(ToolKind),
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub command: Command,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        command: Command,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        let mods = event.modifiers;
        if self.ctrl != mods.command() || self.shift != mods.shift || mods.alt {
            return false;
        }
        // Case-insensitive so caps lock still resolves.
        self.key.eq_ignore_ascii_case(&event.key)
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        let mut shortcuts = vec![
            Shortcut::new("Z", true, false, Command::Undo, "Undo"),
            Shortcut::new("Z", true, true, Command::Redo, "Redo"),
            Shortcut::new("Y", true, false, Command::Redo, "Redo"),
            Shortcut::new("G", true, false, Command::Group, "Group selected shapes"),
            Shortcut::new("G", true, true, Command::Ungroup, "Ungroup selected shapes"),
            Shortcut::new("A", true, false, Command::SelectAll, "Select all shapes"),
            Shortcut::new("Delete", false, false, Command::Delete, "Delete selected shapes"),
            Shortcut::new("Backspace", false, false, Command::Delete, "Delete selected shapes"),
            Shortcut::new("Escape", false, false, Command::Escape, "Cancel current action"),
            Shortcut::new("G", false, false, Command::ToggleGrid, "Toggle grid"),
        ];
        shortcuts.extend(ToolKind::ALL.into_iter().map(|tool| {
            Shortcut::new(
                tool_key(tool),
                false,
                false,
                Command::SetTool(tool),
                tool_description(tool),
            )
        }));
        shortcuts
    }

    /// Command for `event`, if shortcuts apply in `context`.
    pub fn resolve(event: &KeyEvent, context: KeyContext) -> Option<Command> {
        if !context.tab_active || context.text_focused {
            return None;
        }
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(event))
            .map(|shortcut| shortcut.command)
    }

    /// Print all shortcuts to stdout.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

fn tool_key(tool: ToolKind) -> &'static str {
    match tool {
        ToolKind::Select => "V",
        ToolKind::Pan => "H",
        ToolKind::Freehand => "P",
        ToolKind::Line => "L",
        ToolKind::Rectangle => "R",
        ToolKind::Circle => "O",
        ToolKind::Diamond => "D",
        ToolKind::Text => "T",
        ToolKind::Note => "N",
    }
}

fn tool_description(tool: ToolKind) -> &'static str {
    match tool {
        ToolKind::Select => "Select tool",
        ToolKind::Pan => "Pan tool",
        ToolKind::Freehand => "Freehand pen",
        ToolKind::Line => "Arrow connector",
        ToolKind::Rectangle => "Rectangle",
        ToolKind::Circle => "Ellipse",
        ToolKind::Diamond => "Diamond",
        ToolKind::Text => "Text",
        ToolKind::Note => "Sticky note",
    }
}

/// Detects double clicks from a stream of primary-button presses.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last: Option<(Instant, Point)>,
}

impl ClickTracker {
    /// Record a press; true if it completes a double click.
    pub fn press(&mut self, at: Instant, position: Point) -> bool {
        if let Some((time, pos)) = self.last {
            if at.saturating_duration_since(time) < DOUBLE_CLICK_TIME
                && pos.distance(position) < DOUBLE_CLICK_DISTANCE
            {
                // Reset so a triple click is not a second double click.
                self.last = None;
                return true;
            }
        }
        self.last = Some((at, position));
        false
    }
}
