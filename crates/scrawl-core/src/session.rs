//! An open canvas: the scene plus everything that edits, records and saves it.
//!
//! The session is single-threaded. Hosts feed it pointer and key events,
//! poll [`CanvasSession::take_due_save`] from a timer and hand the returned
//! request to a [`CanvasStore`] without awaiting the outcome.
//!
//! History is recorded on *settle*: after an event, if the scene changed and
//! no gesture or text edit is still open, the serialized document is pushed.
//! A drag therefore produces one entry however many moves it contained.

use crate::camera::Camera;
use crate::clock::{Clock, SystemClock};
use crate::config::EditorConfig;
use crate::dropzone::{self, DropOutcome, DropZone};
use crate::format::{self, DocumentJson};
use crate::history::History;
use crate::input::{ClickTracker, Command, KeyContext, KeyEvent, MouseButton, PointerEvent, ShortcutRegistry};
use crate::notice::{Hooks, Notice};
use crate::scene::{SceneAdapter, SceneIndex, SceneResult, ShapePatch};
use crate::shapes::{DomainEntity, Shape, ShapeFactory, ShapeId, StyleMode};
use crate::storage::{AutoSaver, CanvasStore, SaveRequest};
use crate::style::{GeneratorLoader, RenderableShape, SketchGenerator, StyleEngine, StyleOverrides};
use crate::tools::{ContextMenu, MenuAction, PointerInput, Selection, ToolContext, ToolKind, ToolManager, ToolOutcome, expand_group};
use kurbo::{Point, Vec2};
use serde_json::Value;
use std::rc::Rc;

/// Builds the scene adapter for each canvas that is opened.
pub type AdapterFactory = Box<dyn Fn() -> Box<dyn SceneAdapter>>;

/// Identifies one load so late results for an older canvas can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// What a context-menu action asks the host to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEffect {
    /// Show the detail view for this external record.
    OpenDetail(String),
    /// A text editor should open over this shape.
    Edit(ShapeId),
}

pub struct CanvasSession {
    config: EditorConfig,
    make_scene: AdapterFactory,
    scene: Box<dyn SceneAdapter>,
    camera: Camera,
    factory: ShapeFactory,
    style: StyleEngine,
    overrides: StyleOverrides,
    tools: ToolManager,
    selection: Selection,
    history: History,
    autosave: AutoSaver,
    clock: Rc<dyn Clock>,
    hooks: Hooks,
    notices: Vec<Notice>,
    canvas_id: Option<String>,
    load_generation: u64,
    editing: Option<ShapeId>,
    menu: Option<ContextMenu>,
    drop_zone: DropZone,
    clicks: ClickTracker,
    key_context: KeyContext,
    dirty: bool,
}

impl CanvasSession {
    pub fn new(config: EditorConfig) -> Self {
        let make_scene: AdapterFactory = Box::new(|| Box::new(SceneIndex::new()) as Box<dyn SceneAdapter>);
        let mut history = History::new(config.history_limit);
        let scene = make_scene();
        history.reset(scene.serialize());
        Self {
            camera: Camera::with_limits(config.min_zoom, config.max_zoom),
            factory: ShapeFactory::default(),
            style: StyleEngine::new(&config),
            overrides: StyleOverrides::default(),
            tools: ToolManager::new(),
            selection: Selection::default(),
            history,
            autosave: AutoSaver::new(config.save_debounce()),
            clock: Rc::new(SystemClock),
            hooks: Hooks::default(),
            notices: Vec::new(),
            canvas_id: None,
            load_generation: 0,
            editing: None,
            menu: None,
            drop_zone: DropZone::default(),
            clicks: ClickTracker::default(),
            key_context: KeyContext::default(),
            dirty: false,
            config,
            make_scene,
            scene,
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different adapter implementation; replaces the current scene.
    pub fn with_adapter<F>(mut self, make_scene: F) -> Self
    where
        F: Fn() -> Box<dyn SceneAdapter> + 'static,
    {
        self.make_scene = Box::new(make_scene);
        self.scene = (self.make_scene)();
        self.history.reset(self.scene.serialize());
        self
    }

    pub fn with_generator(mut self, generator: Rc<dyn SketchGenerator>) -> Self {
        self.style.install_generator(generator);
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &dyn SceneAdapter {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> &mut dyn SceneAdapter {
        self.scene.as_mut()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn style(&self) -> &StyleEngine {
        &self.style
    }

    /// Stroke/fill applied to shapes drawn from now on.
    pub fn style_overrides_mut(&mut self) -> &mut StyleOverrides {
        &mut self.overrides
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.tool()
    }

    pub fn canvas_id(&self) -> Option<&str> {
        self.canvas_id.as_deref()
    }

    /// Shape whose text is being edited.
    pub fn editing(&self) -> Option<&ShapeId> {
        self.editing.as_ref()
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_key_context(&mut self, context: KeyContext) {
        self.key_context = context;
    }

    /// Client position of the canvas element, for drag-drop mapping.
    pub fn set_viewport_origin(&mut self, origin: Point) {
        self.drop_zone = DropZone::new(origin);
    }

    /// The canvas tab became visible again.
    pub fn tab_shown(&mut self) {
        self.key_context.tab_active = true;
        self.hooks.tab_shown();
    }

    pub fn tab_hidden(&mut self) {
        self.key_context.tab_active = false;
    }

    fn notify(&mut self, notice: Notice) {
        log::info!("{notice}");
        self.hooks.notice(&notice);
        self.notices.push(notice);
    }

    // --- loading -------------------------------------------------------

    /// Switch to `canvas_id`. The old adapter is dropped and an empty one
    /// takes its place until [`CanvasSession::finish_load`] delivers data.
    pub fn begin_load(&mut self, canvas_id: impl Into<String>) -> LoadTicket {
        self.load_generation += 1;
        let canvas_id = canvas_id.into();
        log::debug!("loading canvas {canvas_id}");
        self.autosave.cancel();
        self.scene = (self.make_scene)();
        self.tools.set_tool(self.tools.tool(), self.scene.as_mut());
        self.selection.clear();
        self.editing = None;
        self.menu = None;
        self.dirty = false;
        self.canvas_id = Some(canvas_id);
        LoadTicket(self.load_generation)
    }

    /// Apply fetched canvas data. Returns false if `ticket` is stale.
    ///
    /// Payloads in an older dialect are migrated; unreadable ones leave an
    /// empty canvas and raise a notice.
    pub fn finish_load(&mut self, ticket: LoadTicket, data: &Value) -> bool {
        if ticket.0 != self.load_generation {
            log::debug!("discarding stale load {}", ticket.0);
            return false;
        }
        let mut document = match format::read_document(data) {
            Ok(migrated) => {
                if migrated.skipped > 0 {
                    self.notify(Notice::warning(format!(
                        "{} item(s) could not be converted and were left out",
                        migrated.skipped
                    )));
                }
                migrated.document
            }
            Err(err) => {
                log::warn!("unreadable canvas data: {err}");
                self.notify(Notice::warning(
                    "This canvas could not be read; starting with an empty canvas",
                ));
                DocumentJson::new()
            }
        };
        self.restore_view(&mut document);
        self.hydrate(&document);
        self.history.reset(self.scene.serialize());
        true
    }

    /// Report a failed fetch for `ticket`; leaves an empty canvas.
    pub fn fail_load(&mut self, ticket: LoadTicket, message: &str) -> bool {
        if ticket.0 != self.load_generation {
            return false;
        }
        log::warn!("canvas load failed: {message}");
        self.notify(Notice::error(format!("Could not load canvas: {message}")));
        self.history.reset(self.scene.serialize());
        true
    }

    /// Fetch `canvas_id` from `store` and open it.
    pub async fn open_from<S: CanvasStore + ?Sized>(&mut self, store: &S, canvas_id: &str) -> bool {
        let ticket = self.begin_load(canvas_id);
        match store.get(canvas_id).await {
            Ok(record) => self.finish_load(ticket, &record.data),
            Err(err) => self.fail_load(ticket, &err.to_string()),
        }
    }

    /// Move the persisted pan/zoom into the camera; snapshots never carry it.
    fn restore_view(&mut self, document: &mut DocumentJson) {
        let state = &mut document.app_state;
        match (state.scroll_x.take(), state.scroll_y.take(), state.zoom.take()) {
            (None, None, None) => self.camera.reset(),
            (x, y, zoom) => self.camera.restore(
                Vec2::new(x.unwrap_or(0.0), y.unwrap_or(0.0)),
                zoom.unwrap_or(1.0),
            ),
        }
    }

    fn hydrate(&mut self, document: &DocumentJson) {
        for shape in &document.elements {
            self.factory.observe_version(shape.meta().version);
        }
        self.scene.hydrate(document);
        self.scene.drain_events();
        self.selection.retain_live(self.scene.as_ref());
        self.dirty = false;
    }

    // --- history and saving ---------------------------------------------

    /// Record pending scene changes once nothing is in flight.
    fn settle(&mut self) {
        if !self.scene.drain_events().is_empty() {
            self.dirty = true;
        }
        if !self.dirty || self.tools.is_busy() || self.editing.is_some() {
            return;
        }
        self.dirty = false;
        self.selection.retain_live(self.scene.as_ref());
        if self.history.push(self.scene.serialize()) {
            self.autosave.schedule(self.clock.now());
        }
    }

    pub fn undo(&mut self) -> bool {
        self.interrupt();
        match self.history.undo() {
            Some(snapshot) => {
                self.replay(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.interrupt();
        match self.history.redo() {
            Some(snapshot) => {
                self.replay(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Hydrate a history snapshot without recording it again.
    fn replay(&mut self, snapshot: &DocumentJson) {
        self.history.begin_replay();
        self.hydrate(snapshot);
        self.history.end_replay();
        self.autosave.schedule(self.clock.now());
    }

    /// Close open gestures and edits before history moves.
    fn interrupt(&mut self) {
        self.tools.cancel(self.scene.as_mut());
        if self.editing.is_some() {
            self.finish_edit();
        }
        self.settle();
    }

    /// The canonical document with the current view folded into `appState`.
    pub fn document(&self) -> DocumentJson {
        let mut document = self.scene.serialize();
        document.app_state.scroll_x = Some(self.camera.offset.x);
        document.app_state.scroll_y = Some(self.camera.offset.y);
        document.app_state.zoom = Some(self.camera.zoom);
        document
    }

    fn save_request(&mut self) -> Option<SaveRequest> {
        let canvas_id = self.canvas_id.clone()?;
        let request = SaveRequest {
            canvas_id,
            document: self.document(),
        };
        self.hooks.save_requested(&request);
        Some(request)
    }

    /// The save to send now, if the debounce window has elapsed.
    pub fn take_due_save(&mut self) -> Option<SaveRequest> {
        if !self.autosave.take_due(self.clock.now()) {
            return None;
        }
        self.save_request()
    }

    /// Save immediately if one is pending, e.g. before closing the canvas.
    pub fn flush_save(&mut self) -> Option<SaveRequest> {
        if !self.autosave.is_pending() {
            return None;
        }
        self.autosave.cancel();
        self.save_request()
    }

    pub fn save_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    // --- style -----------------------------------------------------------

    /// Switch the style for new shapes. Without a generator this reports a
    /// notice and stays clean.
    pub fn set_style_mode(&mut self, mode: StyleMode) -> StyleMode {
        match self.style.set_mode(mode) {
            Ok(mode) => mode,
            Err(err) => {
                log::warn!("style toggle rejected: {err}");
                self.notify(Notice::warning(
                    "Hand-drawn style is unavailable; new shapes will be drawn clean",
                ));
                StyleMode::Clean
            }
        }
    }

    /// Wait for `loader` and install its generator.
    pub async fn load_generator(&mut self, loader: &GeneratorLoader) -> bool {
        match loader.load().await {
            Ok(generator) => {
                self.style.install_generator(generator);
                true
            }
            Err(err) => {
                log::warn!("sketch generator failed to load: {err}");
                self.notify(Notice::warning("Hand-drawn style could not be loaded"));
                false
            }
        }
    }

    /// Draw list for the live shapes, bottom first.
    pub fn renderables(&self) -> Vec<RenderableShape> {
        self.scene
            .shapes()
            .iter()
            .filter(|s| !s.is_deleted())
            .map(|s| self.style.render(s))
            .collect()
    }

    // --- input -----------------------------------------------------------

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool, self.scene.as_mut());
        self.menu = None;
        self.settle();
    }

    fn with_tools<R>(&mut self, f: impl FnOnce(&mut ToolManager, &mut ToolContext<'_>) -> R) -> R {
        let mut cx = ToolContext {
            scene: self.scene.as_mut(),
            camera: &mut self.camera,
            factory: &mut self.factory,
            style: &self.style,
            overrides: &self.overrides,
            selection: &mut self.selection,
            config: &self.config,
        };
        f(&mut self.tools, &mut cx)
    }

    pub fn pointer(&mut self, event: PointerEvent) -> ToolOutcome {
        let result = match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Right,
                ..
            } => {
                self.open_context_menu(position);
                Ok(ToolOutcome::Idle)
            }
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                modifiers,
            } => {
                self.menu = None;
                if self.editing.is_some() {
                    self.finish_edit();
                }
                let input = PointerInput::at(&self.camera, position, modifiers);
                let double = self.clicks.press(self.clock.now(), position);
                match self.double_click_target(double, input.world) {
                    Some(id) => {
                        self.selection.set(vec![id.clone()]);
                        Ok(ToolOutcome::Edit(id))
                    }
                    None => self.with_tools(|tools, cx| tools.pointer_down(cx, input)),
                }
            }
            PointerEvent::Down { .. } => Ok(ToolOutcome::Idle),
            PointerEvent::Move { position, modifiers } => {
                let input = PointerInput::at(&self.camera, position, modifiers);
                self.with_tools(|tools, cx| tools.pointer_move(cx, input))
            }
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
                modifiers,
            } => {
                let input = PointerInput::at(&self.camera, position, modifiers);
                self.with_tools(|tools, cx| tools.pointer_up(cx, input))
            }
            PointerEvent::Up { .. } => Ok(ToolOutcome::Idle),
            PointerEvent::Wheel { position, delta_y } => {
                self.camera.wheel_zoom(position, delta_y);
                Ok(ToolOutcome::View)
            }
        };
        let outcome = self.handle_result(result);
        if let ToolOutcome::Edit(id) = &outcome {
            self.editing = Some(id.clone());
        }
        self.settle();
        outcome
    }

    fn handle_result(&mut self, result: SceneResult<ToolOutcome>) -> ToolOutcome {
        result.unwrap_or_else(|err| {
            log::warn!("tool action failed: {err}");
            self.tools.cancel(self.scene.as_mut());
            ToolOutcome::Idle
        })
    }

    /// Text-bearing shape under a double click with the select tool.
    fn double_click_target(&self, double: bool, world: Point) -> Option<ShapeId> {
        if !double || self.tools.tool() != ToolKind::Select {
            return None;
        }
        let tolerance = self.config.hit_tolerance / self.camera.zoom;
        let id = self.scene.hit_test(world, tolerance)?;
        match self.scene.get(&id)? {
            Shape::Text(_) | Shape::StickyNote(_) => Some(id),
            _ => None,
        }
    }

    /// Run a keyboard shortcut. Returns the command it resolved to.
    pub fn key(&mut self, event: &KeyEvent) -> Option<Command> {
        let context = KeyContext {
            text_focused: self.key_context.text_focused || self.editing.is_some(),
            ..self.key_context
        };
        let command = ShortcutRegistry::resolve(event, context)?;
        self.execute(command);
        Some(command)
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Undo => {
                self.undo();
            }
            Command::Redo => {
                self.redo();
            }
            Command::Delete => self.delete_selection(),
            Command::Group => self.group_selection(),
            Command::Ungroup => self.ungroup_selection(),
            Command::SelectAll => {
                let ids = self
                    .scene
                    .shapes()
                    .iter()
                    .filter(|s| !s.is_deleted())
                    .map(|s| s.id().clone())
                    .collect();
                self.selection.set(ids);
            }
            Command::Escape => {
                self.menu = None;
                if self.editing.is_some() {
                    self.finish_edit();
                } else {
                    self.tools.cancel(self.scene.as_mut());
                    self.tools.set_tool(ToolKind::Select, self.scene.as_mut());
                    self.selection.clear();
                }
            }
            Command::ToggleGrid => {
                let overlay = self.scene.overlay_mut();
                overlay.grid = match overlay.grid {
                    Some(_) => None,
                    None => Some(self.config.grid_size),
                };
            }
            Command::SetTool(tool) => self.tools.set_tool(tool, self.scene.as_mut()),
        }
        self.settle();
    }

    fn delete_selection(&mut self) {
        for id in self.selection.ids().to_vec() {
            if let Err(err) = self.scene.remove(&id) {
                log::warn!("delete failed: {err}");
            }
        }
        self.selection.clear();
    }

    fn group_selection(&mut self) {
        if self.selection.len() < 2 {
            return;
        }
        let group = uuid::Uuid::new_v4().to_string();
        for id in self.selection.ids().to_vec() {
            let Some(shape) = self.scene.get(&id) else {
                continue;
            };
            let mut groups = shape.meta().group_ids.clone();
            groups.push(group.clone());
            if let Err(err) = self.scene.update(&id, ShapePatch::GroupIds(groups)) {
                log::warn!("grouping failed: {err}");
            }
        }
    }

    /// Peel off the outermost group of every selected shape.
    fn ungroup_selection(&mut self) {
        for id in self.selection.ids().to_vec() {
            let Some(shape) = self.scene.get(&id) else {
                continue;
            };
            let mut groups = shape.meta().group_ids.clone();
            if groups.pop().is_none() {
                continue;
            }
            if let Err(err) = self.scene.update(&id, ShapePatch::GroupIds(groups)) {
                log::warn!("ungrouping failed: {err}");
            }
        }
    }

    // --- text editing ------------------------------------------------------

    /// Open the text editor on `id`.
    pub fn begin_edit(&mut self, id: &ShapeId) -> bool {
        let editable = self.scene.get(id).is_some_and(|s| s.label().is_some());
        if editable {
            self.editing = Some(id.clone());
        }
        editable
    }

    /// Store the edited text. Empty text shapes are removed; an empty note
    /// stays as a blank note.
    pub fn commit_text(&mut self, content: &str) {
        let Some(id) = self.editing.take() else {
            return;
        };
        let is_text = matches!(self.scene.get(&id), Some(Shape::Text(_)));
        let result = if is_text && content.trim().is_empty() {
            self.scene.remove(&id)
        } else if self.scene.get(&id).is_some() {
            self.scene.update(&id, ShapePatch::Label(content.to_string()))
        } else {
            Ok(())
        };
        if let Err(err) = result {
            log::warn!("text commit failed: {err}");
        }
        self.selection.retain_live(self.scene.as_ref());
        self.settle();
    }

    /// Close the editor keeping whatever text the shape holds.
    fn finish_edit(&mut self) {
        let Some(current) = self
            .editing
            .as_ref()
            .and_then(|id| self.scene.get(id))
            .and_then(Shape::label)
            .map(str::to_string)
        else {
            self.editing = None;
            return;
        };
        self.commit_text(&current);
    }

    // --- drag and drop -------------------------------------------------------

    /// Drop `entity` at a client (page) position.
    pub fn drop_entity(&mut self, client: Point, entity: &DomainEntity) -> Option<DropOutcome> {
        let world = self.drop_zone.to_world(&self.camera, client);
        let result = dropzone::drop_entity(
            self.scene.as_mut(),
            &mut self.factory,
            &self.style,
            entity,
            world,
            self.config.label_wrap_chars,
        );
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("drop failed: {err}");
                return None;
            }
        };
        match &outcome {
            DropOutcome::Inserted(id) => self.selection.set(vec![id.clone()]),
            DropOutcome::Duplicate(_) => {
                self.notify(Notice::info(format!("{} is already on this canvas", entity.name)))
            }
        }
        self.settle();
        Some(outcome)
    }

    /// Drop a raw drag payload; malformed payloads raise a notice.
    pub fn drop_payload(&mut self, client: Point, payload: &str) -> Option<DropOutcome> {
        match dropzone::parse_payload(payload) {
            Ok(entity) => self.drop_entity(client, &entity),
            Err(err) => {
                log::warn!("ignoring drop payload: {err}");
                self.notify(Notice::warning("Dropped item is not a recognised entity"));
                None
            }
        }
    }

    // --- context menu --------------------------------------------------------

    /// Open the menu for the shape under `screen`, under any tool.
    pub fn open_context_menu(&mut self, screen: Point) -> Option<&ContextMenu> {
        let world = self.camera.screen_to_world(screen);
        let tolerance = self.config.hit_tolerance / self.camera.zoom;
        self.menu = self
            .scene
            .topmost_at(world, tolerance)
            .and_then(|id| self.scene.get(&id))
            .map(|shape| ContextMenu::for_shape(shape, screen));
        self.menu.as_ref()
    }

    pub fn close_context_menu(&mut self) {
        self.menu = None;
    }

    pub fn apply_menu_action(&mut self, action: MenuAction) -> Option<MenuEffect> {
        let menu = self.menu.take()?;
        if !menu.offers(action) {
            return None;
        }
        let id = menu.target;
        let mut effect = None;
        let result = match action {
            MenuAction::OpenDetail => {
                effect = self
                    .scene
                    .get(&id)
                    .and_then(Shape::external_ref)
                    .map(|r| MenuEffect::OpenDetail(r.to_string()));
                Ok(())
            }
            MenuAction::EditText => {
                if self.begin_edit(&id) {
                    effect = Some(MenuEffect::Edit(id.clone()));
                }
                Ok(())
            }
            MenuAction::Duplicate => self.duplicate(&id),
            MenuAction::Delete => {
                let ids = expand_group(self.scene.as_ref(), &id);
                self.selection.set(ids);
                self.delete_selection();
                Ok(())
            }
            order => match order.z_order() {
                Some(order) => self.scene.reorder(&id, order),
                None => Ok(()),
            },
        };
        if let Err(err) = result {
            log::warn!("menu action {} failed: {err}", action.label());
        }
        self.settle();
        effect
    }

    fn duplicate(&mut self, id: &ShapeId) -> SceneResult<()> {
        let Some(shape) = self.scene.get(id) else {
            return Ok(());
        };
        let offset = Vec2::new(self.config.duplicate_offset, self.config.duplicate_offset);
        let mut copy = self.factory.duplicate(shape, offset);
        copy.meta_mut().group_ids.clear();
        let copy_id = copy.id().clone();
        self.scene.add(copy)?;
        self.selection.set(vec![copy_id]);
        Ok(())
    }
}
