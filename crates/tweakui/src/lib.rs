#![forbid(unsafe_code)]

//! tweakui public facade crate.
//!
//! Re-exports the types a host needs to embed the overlay, plus a prelude.
//!
//! ```
//! use tweakui::prelude::*;
//!
//! let mut gui = Gui::new(GuiConfig::default().persistence(PersistenceConfig::disabled()));
//! let mut bridge = RecordingBridge::new();
//!
//! // Every frame:
//! gui.handle_event(&PointerEvent::moved(40.0, 40.0).into());
//! let speed = gui.slider_range("physics/speed", 5.0, 0.0, 10.0);
//! let debug = gui.toggle("physics/debug draw", false);
//! gui.render(&mut bridge);
//!
//! assert_eq!(speed, 5.0);
//! assert!(!debug);
//! ```

// --- Core re-exports -------------------------------------------------------

pub use tweakui_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton, PointerEvent,
    PointerEventKind,
};
pub use tweakui_core::geometry::{Point, Rect, Size};
pub use tweakui_core::path::{PathError, PathKey};

// --- Tree re-exports -------------------------------------------------------

pub use tweakui_tree::{
    Color, GradientStop, LayoutMetrics, Node, NodeId, NodeKind, NodeResponse, NodeValue,
    NodeVariant, TreeError, ValueError,
};

// --- Runtime re-exports ----------------------------------------------------

pub use tweakui_runtime::{
    DrawCommand, FileStorage, Gui, GuiConfig, GuiError, GuiResult, JsonCodec, MemoryStorage,
    PersistenceBridge, PersistenceConfig, RecordingBridge, RenderBridge, SaveInfo,
    StorageBackend, StorageError, Window, WindowId,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Color, Event, Gui, GuiConfig, GuiError, KeyEvent, NodeValue, PersistenceConfig, Point,
        PointerEvent, RecordingBridge, RenderBridge, Window,
    };

    pub use crate::{core, runtime, tree};
}

pub use tweakui_core as core;
pub use tweakui_runtime as runtime;
pub use tweakui_tree as tree;
