#![forbid(unsafe_code)]

//! tweakui runtime
//!
//! Ties the node tree to windows, input and storage.
//!
//! # Key Components
//!
//! - [`Gui`] - The overlay context and its declarative accessors
//! - [`WindowManager`] - Ordered stack of folder windows
//! - [`EventRouter`] - Hit testing, hover and drag latching
//! - [`RenderBridge`] - Host drawing surface driven by [`render_frame`]
//! - [`PersistenceBridge`] / [`StorageBackend`] - Save format and save files
//! - [`GuiConfig`] - Construction options and environment overrides
//!
//! # Frame protocol
//!
//! Each frame the host feeds input with [`Gui::handle_event`], declares its
//! controls through the accessors, and finishes with [`Gui::render`].

pub mod config;
pub mod gui;
pub mod persistence;
pub mod render;
pub mod router;
pub mod window;
pub mod window_manager;

pub use config::{DEFAULT_HIDE_KEY, DEFAULT_SAVES_FOLDER, GuiConfig, PersistenceConfig};
pub use gui::{Gui, GuiError, GuiResult, SAVE_NOW_LABEL};
pub use persistence::{
    FileStorage, JsonCodec, MemoryStorage, PersistenceBridge, SaveInfo, StorageBackend,
    StorageError, StorageResult, ValueSnapshot, snapshot_values,
};
pub use render::{DrawCommand, RecordingBridge, RenderBridge, layout_windows, render_frame};
pub use router::{EventRouter, HitTarget, Latch, RouteOutcome};
pub use window::{Window, WindowId, WindowRegion, WindowState};
pub use window_manager::{WindowError, WindowManager};
