//! Tool state machine: turns pointer gestures into document mutations.

pub mod context_menu;
pub mod select;

pub use context_menu::{ContextMenu, MenuAction};
pub use select::{Corner, HANDLE_HIT_TOLERANCE, Selection, corner_at, expand_group, movable};

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::input::Modifiers;
use crate::scene::{SceneAdapter, SceneResult, ShapePatch};
use crate::shapes::{SYNTHETIC_PRESSURE, ShapeFactory, ShapeId, ShapeKind, ShapeSpec};
use crate::style::{StyleEngine, StyleOverrides};
use kurbo::{Point, Rect, Size, Vec2};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Freehand,
    Line,
    Rectangle,
    Circle,
    Diamond,
    Text,
    Note,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Select,
        ToolKind::Pan,
        ToolKind::Freehand,
        ToolKind::Line,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Diamond,
        ToolKind::Text,
        ToolKind::Note,
    ];

    /// Bare-letter shortcut.
    pub fn shortcut(self) -> char {
        match self {
            ToolKind::Select => 'v',
            ToolKind::Pan => 'h',
            ToolKind::Freehand => 'p',
            ToolKind::Line => 'l',
            ToolKind::Rectangle => 'r',
            ToolKind::Circle => 'o',
            ToolKind::Diamond => 'd',
            ToolKind::Text => 't',
            ToolKind::Note => 'n',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|tool| tool.shortcut() == key)
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Freehand => "freehand",
            ToolKind::Line => "line",
            ToolKind::Rectangle => "rect",
            ToolKind::Circle => "circle",
            ToolKind::Diamond => "diamond",
            ToolKind::Text => "text",
            ToolKind::Note => "note",
        }
    }

    /// Shape drawn by a drag-to-size tool.
    fn boxed_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Circle => Some(ShapeKind::Ellipse),
            ToolKind::Diamond => Some(ShapeKind::Diamond),
            _ => None,
        }
    }
}

/// Everything a tool may touch while handling one event.
pub struct ToolContext<'a> {
    pub scene: &'a mut dyn SceneAdapter,
    pub camera: &'a mut Camera,
    pub factory: &'a mut ShapeFactory,
    pub style: &'a StyleEngine,
    pub overrides: &'a StyleOverrides,
    pub selection: &'a mut Selection,
    pub config: &'a EditorConfig,
}

impl ToolContext<'_> {
    /// Hit slop in world units at the current zoom.
    fn tolerance(&self) -> f64 {
        self.config.hit_tolerance / self.camera.zoom
    }
}

/// A pointer sample in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub screen: Point,
    pub world: Point,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn at(camera: &Camera, screen: Point, modifiers: Modifiers) -> Self {
        Self {
            screen,
            world: camera.screen_to_world(screen),
            modifiers,
        }
    }
}

/// In-progress gesture. Never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Drag-to-size for rect/circle/diamond.
    Boxing { anchor: Point, current: Point },
    /// First line click placed, waiting for the second.
    LineStart { start: Point },
    Inking { points: Vec<Point>, pressures: Vec<f64> },
    /// Screen-space pan drag.
    Panning { last: Point },
    Marquee { anchor: Point, current: Point, additive: bool },
    Moving { last: Point, moved: bool },
    Resizing { id: ShapeId, corner: Corner, origin: Rect, start: Point },
}

/// What an event did, so the session knows what to follow up with.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Idle,
    /// Only the overlay changed.
    Preview,
    Created(ShapeId),
    /// Shape placed and waiting for its text.
    Edit(ShapeId),
    /// Existing shapes were moved or resized.
    Changed,
    /// Camera moved.
    View,
    Selection,
}

#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    tool: ToolKind,
    gesture: Gesture,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// A gesture is in progress and has not been committed yet.
    pub fn is_busy(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Switch tools. Resets the gesture; only select makes shapes pickable.
    pub fn set_tool(&mut self, tool: ToolKind, scene: &mut dyn SceneAdapter) {
        if self.tool != tool {
            log::debug!("tool {} -> {}", self.tool.name(), tool.name());
        }
        self.tool = tool;
        self.gesture = Gesture::Idle;
        scene.overlay_mut().clear_gesture();
        scene.set_interactive(tool == ToolKind::Select);
    }

    /// Drop the current gesture. Returns true if there was one.
    pub fn cancel(&mut self, scene: &mut dyn SceneAdapter) -> bool {
        let busy = self.is_busy();
        self.gesture = Gesture::Idle;
        scene.overlay_mut().clear_gesture();
        busy
    }

    pub fn pointer_down(&mut self, cx: &mut ToolContext<'_>, input: PointerInput) -> SceneResult<ToolOutcome> {
        let world = input.world;
        match self.tool {
            ToolKind::Select => Ok(self.select_down(cx, input)),
            ToolKind::Pan => {
                self.gesture = Gesture::Panning { last: input.screen };
                Ok(ToolOutcome::Idle)
            }
            ToolKind::Freehand => {
                self.gesture = Gesture::Inking {
                    points: vec![world],
                    pressures: vec![SYNTHETIC_PRESSURE],
                };
                cx.scene.overlay_mut().ink = vec![world];
                Ok(ToolOutcome::Preview)
            }
            ToolKind::Line => match std::mem::take(&mut self.gesture) {
                Gesture::LineStart { start } => {
                    cx.scene.overlay_mut().clear_gesture();
                    if start.distance(world) <= cx.config.line_min_distance {
                        return Ok(ToolOutcome::Idle);
                    }
                    let id = place(cx, &ShapeSpec::arrow(start, world))?;
                    Ok(ToolOutcome::Created(id))
                }
                _ => {
                    self.gesture = Gesture::LineStart { start: world };
                    Ok(ToolOutcome::Preview)
                }
            },
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::Diamond => {
                self.gesture = Gesture::Boxing {
                    anchor: world,
                    current: world,
                };
                Ok(ToolOutcome::Preview)
            }
            ToolKind::Text => {
                let id = place(cx, &ShapeSpec::new(ShapeKind::Text, world))?;
                self.finish_placement(cx, &id);
                Ok(ToolOutcome::Edit(id))
            }
            ToolKind::Note => {
                let size = Size::new(cx.config.note_width, cx.config.note_height);
                let id = place(cx, &ShapeSpec::new(ShapeKind::StickyNote, world).with_size(size))?;
                self.finish_placement(cx, &id);
                Ok(ToolOutcome::Edit(id))
            }
        }
    }

    pub fn pointer_move(&mut self, cx: &mut ToolContext<'_>, input: PointerInput) -> SceneResult<ToolOutcome> {
        let world = input.world;
        match &mut self.gesture {
            Gesture::Idle => Ok(ToolOutcome::Idle),
            Gesture::Boxing { anchor, current } => {
                *current = world;
                let Some(kind) = self.tool.boxed_kind() else {
                    return Ok(ToolOutcome::Idle);
                };
                let spec = ShapeSpec::boxed(kind, Rect::from_points(*anchor, world));
                let preview = cx.style.preview(cx.factory.clone().create(&spec));
                cx.scene.overlay_mut().preview = Some(preview);
                Ok(ToolOutcome::Preview)
            }
            Gesture::LineStart { start } => {
                let spec = ShapeSpec::arrow(*start, world);
                let preview = cx.style.preview(cx.factory.clone().create(&spec));
                cx.scene.overlay_mut().preview = Some(preview);
                Ok(ToolOutcome::Preview)
            }
            Gesture::Inking { points, pressures } => {
                points.push(world);
                pressures.push(SYNTHETIC_PRESSURE);
                cx.scene.overlay_mut().ink.push(world);
                Ok(ToolOutcome::Preview)
            }
            Gesture::Panning { last } => {
                let delta = input.screen - *last;
                *last = input.screen;
                cx.camera.pan(delta);
                Ok(ToolOutcome::View)
            }
            Gesture::Marquee { anchor, current, .. } => {
                *current = world;
                cx.scene.overlay_mut().marquee = Some(Rect::from_points(*anchor, world));
                Ok(ToolOutcome::Preview)
            }
            Gesture::Moving { last, moved } => {
                let delta = world - *last;
                if delta == Vec2::ZERO {
                    return Ok(ToolOutcome::Idle);
                }
                *last = world;
                *moved = true;
                for id in movable(cx.scene, cx.selection) {
                    cx.scene.update(&id, ShapePatch::Translate(delta))?;
                }
                Ok(ToolOutcome::Changed)
            }
            Gesture::Resizing { id, corner, origin, start } => {
                let bounds = corner.resize(*origin, world - *start);
                cx.scene.update(id, ShapePatch::Bounds(bounds))?;
                Ok(ToolOutcome::Changed)
            }
        }
    }

    pub fn pointer_up(&mut self, cx: &mut ToolContext<'_>, input: PointerInput) -> SceneResult<ToolOutcome> {
        let world = input.world;
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Ok(ToolOutcome::Idle),
            // Line waits for its second click.
            gesture @ Gesture::LineStart { .. } => {
                self.gesture = gesture;
                Ok(ToolOutcome::Idle)
            }
            Gesture::Boxing { anchor, .. } => {
                cx.scene.overlay_mut().clear_gesture();
                let Some(kind) = self.tool.boxed_kind() else {
                    return Ok(ToolOutcome::Idle);
                };
                let mut rect = Rect::from_points(anchor, world);
                let noise = cx.config.drag_noise_threshold / cx.camera.zoom;
                if rect.width() < noise && rect.height() < noise {
                    rect = Rect::from_origin_size(
                        anchor,
                        (cx.config.min_shape_width, cx.config.min_shape_height),
                    );
                }
                let id = place(cx, &ShapeSpec::boxed(kind, rect))?;
                self.finish_placement(cx, &id);
                Ok(ToolOutcome::Created(id))
            }
            Gesture::Inking { points, pressures } => {
                cx.scene.overlay_mut().clear_gesture();
                if points.len() < 2 {
                    return Ok(ToolOutcome::Idle);
                }
                let id = place(cx, &ShapeSpec::ink(points, pressures))?;
                Ok(ToolOutcome::Created(id))
            }
            Gesture::Panning { .. } => Ok(ToolOutcome::View),
            Gesture::Marquee { anchor, additive, .. } => {
                cx.scene.overlay_mut().marquee = None;
                let rect = Rect::from_points(anchor, world);
                let mut ids = Vec::new();
                for id in cx.scene.shapes_in_rect(rect) {
                    for member in expand_group(cx.scene, &id) {
                        if !ids.contains(&member) {
                            ids.push(member);
                        }
                    }
                }
                if additive {
                    cx.selection.extend(ids);
                } else {
                    cx.selection.set(ids);
                }
                Ok(ToolOutcome::Selection)
            }
            Gesture::Moving { moved, .. } => Ok(if moved {
                ToolOutcome::Changed
            } else {
                ToolOutcome::Idle
            }),
            Gesture::Resizing { .. } => Ok(ToolOutcome::Changed),
        }
    }

    fn select_down(&mut self, cx: &mut ToolContext<'_>, input: PointerInput) -> ToolOutcome {
        let world = input.world;
        let zoom = cx.camera.zoom;

        if let Some(shape) = cx.selection.single().and_then(|id| cx.scene.get(id)) {
            if let Some(corner) = corner_at(shape, world, HANDLE_HIT_TOLERANCE / zoom) {
                self.gesture = Gesture::Resizing {
                    id: shape.id().clone(),
                    corner,
                    origin: shape.bounds(),
                    start: world,
                };
                return ToolOutcome::Idle;
            }
        }

        match cx.scene.hit_test(world, cx.tolerance()) {
            Some(id) => {
                let ids = expand_group(cx.scene, &id);
                if input.modifiers.shift {
                    cx.selection.toggle(ids);
                } else {
                    if !cx.selection.contains(&id) {
                        cx.selection.set(ids);
                    }
                    self.gesture = Gesture::Moving {
                        last: world,
                        moved: false,
                    };
                }
            }
            None => {
                if !input.modifiers.shift {
                    cx.selection.clear();
                }
                self.gesture = Gesture::Marquee {
                    anchor: world,
                    current: world,
                    additive: input.modifiers.shift,
                };
            }
        }
        ToolOutcome::Selection
    }

    /// After a one-shot placement: select the new shape and go back to select.
    fn finish_placement(&mut self, cx: &mut ToolContext<'_>, id: &ShapeId) {
        self.set_tool(ToolKind::Select, cx.scene);
        cx.selection.set(vec![id.clone()]);
    }
}

/// Build a shape in the engine's current mode and add it to the scene.
fn place(cx: &mut ToolContext<'_>, spec: &ShapeSpec) -> SceneResult<ShapeId> {
    let renderable = cx.style.build_shape(cx.factory, spec, cx.overrides);
    let id = renderable.shape.id().clone();
    cx.scene.add(renderable.shape)?;
    Ok(id)
}
