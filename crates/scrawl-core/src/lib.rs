//! Scrawl Core Library
//!
//! Document model, tools, history and persistence for the Scrawl canvas
//! editor. Nothing here draws pixels; export surfaces live in `scrawl-render`.

pub mod camera;
pub mod clock;
pub mod config;
pub mod dropzone;
pub mod format;
pub mod history;
pub mod input;
pub mod notice;
pub mod scene;
pub mod session;
pub mod shapes;
pub mod storage;
pub mod style;
pub mod tools;

pub use camera::Camera;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EditorConfig;
pub use dropzone::{DropOutcome, DropZone};
pub use format::{DocumentJson, FormatError, read_document};
pub use history::{History, MAX_UNDO_HISTORY};
pub use input::{Command, KeyContext, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use notice::{Notice, NoticeLevel};
pub use scene::{SceneAdapter, SceneError, SceneEvent, SceneIndex};
pub use session::{CanvasSession, LoadTicket, MenuEffect};
pub use shapes::{DomainEntity, Shape, ShapeFactory, ShapeId, ShapeKind, StyleMode};
pub use storage::{CanvasStore, SaveRequest, StorageError};
pub use style::{RenderableShape, StyleEngine, StyleError};
pub use tools::{ToolKind, ToolManager, ToolOutcome};
