#![forbid(unsafe_code)]

//! The overlay context and its declarative accessors.
//!
//! A [`Gui`] owns the node tree, the window stack, the router and the
//! persistence plumbing. The host drives it once per frame:
//!
//! ```text
//! handle_event(..)*   input, in arrival order
//! slider(..) etc.     declarations, in any order, every frame
//! render(..)          layout, paint, end of frame
//! ```
//!
//! Declaring a path for the first time creates the node and any missing
//! folders. Declaring it again returns the live value; the default passed
//! on later calls is ignored.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Malformed path | `"a//b"`, `""` | Accessors panic; `try_declare` returns `GuiError::Tree` |
//! | Variant clash | Same path, different control | Accessors panic; `try_declare` returns `GuiError::Tree` |
//! | Rejected saved value | Wrong type, out of range | Node keeps its default, `warn!` logged |
//! | No storage | Save/load without a backend | `GuiError::NoStorage` |

use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use tweakui_core::event::{Event, KeyEventKind};
use tweakui_core::geometry::Point;
use tweakui_core::path::{PathError, PathKey};
use tweakui_tree::{
    Color, GradientStop, NodeId, NodeKind, NodeResponse, NodeTree, NodeValue, NodeVariant,
    TreeError,
};

use crate::config::GuiConfig;
use crate::persistence::{
    FileStorage, JsonCodec, PersistenceBridge, StorageBackend, StorageError, ValueSnapshot,
    snapshot_values,
};
use crate::render::{RenderBridge, render_frame};
use crate::router::{EventRouter, RouteOutcome};
use crate::window::WindowId;
use crate::window_manager::{WindowError, WindowManager};

/// Label of the button inside the saves folder.
pub const SAVE_NOW_LABEL: &str = "save now";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum GuiError {
    Tree(TreeError),
    Window(WindowError),
    Storage(StorageError),
    /// A save or load was requested but no storage backend is configured.
    NoStorage,
}

impl fmt::Display for GuiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuiError::Tree(e) => write!(f, "{e}"),
            GuiError::Window(e) => write!(f, "{e}"),
            GuiError::Storage(e) => write!(f, "{e}"),
            GuiError::NoStorage => f.write_str("no storage backend configured"),
        }
    }
}

impl std::error::Error for GuiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuiError::Tree(e) => Some(e),
            GuiError::Window(e) => Some(e),
            GuiError::Storage(e) => Some(e),
            GuiError::NoStorage => None,
        }
    }
}

impl From<TreeError> for GuiError {
    fn from(e: TreeError) -> Self {
        GuiError::Tree(e)
    }
}

impl From<PathError> for GuiError {
    fn from(e: PathError) -> Self {
        GuiError::Tree(e.into())
    }
}

impl From<WindowError> for GuiError {
    fn from(e: WindowError) -> Self {
        GuiError::Window(e)
    }
}

impl From<StorageError> for GuiError {
    fn from(e: StorageError) -> Self {
        GuiError::Storage(e)
    }
}

pub type GuiResult<T> = Result<T, GuiError>;

// ─────────────────────────────────────────────────────────────────────────────
// Gui
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SavesFolder {
    folder: NodeId,
    path: PathKey,
    save_now: NodeId,
}

/// The overlay context.
pub struct Gui {
    tree: NodeTree,
    windows: WindowManager,
    router: EventRouter,
    /// Loaded values whose paths have not been declared yet.
    pending: HashMap<PathKey, NodeValue>,
    codec: Box<dyn PersistenceBridge>,
    storage: Option<Box<dyn StorageBackend>>,
    config: GuiConfig,
    visible: bool,
    root_window: WindowId,
    saves: Option<SavesFolder>,
    frame: u64,
}

impl fmt::Debug for Gui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gui")
            .field("nodes", &self.tree.len())
            .field("windows", &self.windows.len())
            .field("pending", &self.pending.len())
            .field("storage", &self.storage.as_ref().map(|s| s.name()))
            .field("visible", &self.visible)
            .field("frame", &self.frame)
            .finish()
    }
}

impl Default for Gui {
    fn default() -> Self {
        Self::new(GuiConfig::default())
    }
}

impl Gui {
    /// Create the overlay. File storage is used when the config names a
    /// directory.
    #[must_use]
    pub fn new(config: GuiConfig) -> Self {
        Self::with_codec(config, JsonCodec::new().pretty())
    }

    /// Create the overlay with a host save format. File storage is used when
    /// the config names a directory; the startup load already goes through
    /// `codec`.
    #[must_use]
    pub fn with_codec(config: GuiConfig, codec: impl PersistenceBridge + 'static) -> Self {
        let storage = config
            .persistence
            .storage_dir
            .as_ref()
            .map(|dir| Box::new(FileStorage::new(dir)) as Box<dyn StorageBackend>);
        Self::build(config, storage, Box::new(codec))
    }

    /// Create the overlay with a host-supplied storage backend.
    #[must_use]
    pub fn with_storage(config: GuiConfig, storage: impl StorageBackend + 'static) -> Self {
        Self::with_storage_and_codec(config, storage, JsonCodec::new().pretty())
    }

    /// Create the overlay with a host-supplied storage backend and save
    /// format.
    #[must_use]
    pub fn with_storage_and_codec(
        config: GuiConfig,
        storage: impl StorageBackend + 'static,
        codec: impl PersistenceBridge + 'static,
    ) -> Self {
        Self::build(config, Some(Box::new(storage)), Box::new(codec))
    }

    fn build(
        config: GuiConfig,
        storage: Option<Box<dyn StorageBackend>>,
        codec: Box<dyn PersistenceBridge>,
    ) -> Self {
        let mut tree = NodeTree::new();
        let mut windows = WindowManager::new(&config.metrics)
            .with_default_width(config.window_width)
            .with_max_content_height(config.max_window_height)
            .with_cascade(config.cascade_origin, config.cascade_step);
        let root_window = windows.open_root(config.root_position);

        let saves = match &storage {
            Some(_) => declare_saves_folder(&mut tree, &config.saves_folder),
            None => None,
        };

        let mut gui = Self {
            tree,
            windows,
            router: EventRouter::new(),
            pending: HashMap::new(),
            codec,
            visible: config.visible_by_default,
            storage,
            config,
            root_window,
            saves,
            frame: 0,
        };

        if gui.storage.is_some() && gui.config.persistence.auto_load {
            match gui.load_most_recent() {
                Ok(Some(name)) => tracing::info!(save = %name, "loaded most recent save"),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "failed to load most recent save"),
            }
        }
        gui
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    /// Unconstrained float slider.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn slider(&mut self, path: &str, default: f32) -> f32 {
        let id = self.declare_or_panic(path, NodeVariant::Slider, || NodeKind::slider(default));
        self.slider_value(id).unwrap_or(default)
    }

    /// Float slider clamped to `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn slider_range(&mut self, path: &str, default: f32, min: f32, max: f32) -> f32 {
        let id = self.declare_or_panic(path, NodeVariant::Slider, || {
            NodeKind::slider_range(default, min, max)
        });
        self.slider_value(id).unwrap_or(default)
    }

    /// Unconstrained integer slider.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn slider_int(&mut self, path: &str, default: i32) -> i32 {
        let id = self.declare_or_panic(path, NodeVariant::SliderInt, || {
            NodeKind::slider_int(default)
        });
        self.slider_value(id).map_or(default, |v| v as i32)
    }

    /// Integer slider clamped to `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn slider_int_range(&mut self, path: &str, default: i32, min: i32, max: i32) -> i32 {
        let id = self.declare_or_panic(path, NodeVariant::SliderInt, || {
            NodeKind::slider_int_range(default, min, max)
        });
        self.slider_value(id).map_or(default, |v| v as i32)
    }

    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn toggle(&mut self, path: &str, default: bool) -> bool {
        let id = self.declare_or_panic(path, NodeVariant::Toggle, || NodeKind::toggle(default));
        match self.tree.node(id).and_then(|n| n.value()) {
            Some(NodeValue::Bool(v)) => v,
            _ => default,
        }
    }

    /// True only during the frame in which the button was pressed.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn button(&mut self, path: &str) -> bool {
        let id = self.declare_or_panic(path, NodeVariant::Button, NodeKind::button);
        matches!(
            self.tree.node(id).map(|n| n.kind()),
            Some(NodeKind::Button(b)) if b.pressed
        )
    }

    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn color_picker(&mut self, path: &str, default: Color) -> Color {
        let id = self.declare_or_panic(path, NodeVariant::ColorPicker, || {
            NodeKind::color_picker(default)
        });
        self.color_value(id).unwrap_or(default)
    }

    /// Color picker whose default is given as packed `0xAARRGGBB`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn color_picker_hex(&mut self, path: &str, default_argb: u32) -> Color {
        self.color_picker(path, Color::from_argb(default_argb))
    }

    /// Overwrite a picker's value, creating the picker if needed.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn color_picker_set(&mut self, path: &str, color: Color) {
        let id = self.declare_or_panic(path, NodeVariant::ColorPicker, || {
            NodeKind::color_picker(color)
        });
        if let Some(node) = self.tree.node_mut(id)
            && let Err(e) = node.apply_value(&NodeValue::Color(color))
        {
            tracing::warn!(path = %node.path(), error = %e, "color not applied");
        }
    }

    /// Gradient stops. `alpha` applies to the default stops.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn gradient(&mut self, path: &str, alpha: f32) -> Vec<GradientStop> {
        let id = self.declare_or_panic(path, NodeVariant::Gradient, || NodeKind::gradient(alpha));
        match self.tree.node(id).map(|n| n.kind()) {
            Some(NodeKind::Gradient(g)) => g.stops.clone(),
            _ => Vec::new(),
        }
    }

    /// Path of the picked image file.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn image_picker(&mut self, path: &str, default_file: &str) -> String {
        let id = self.declare_or_panic(path, NodeVariant::ImagePicker, || {
            NodeKind::image_picker(default_file)
        });
        match self.tree.node(id).map(|n| n.kind()) {
            Some(NodeKind::ImagePicker(i)) => i.file_path.clone(),
            _ => default_file.to_owned(),
        }
    }

    /// Declare a folder without any controls in it.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or already holds another control.
    pub fn folder(&mut self, path: &str) -> NodeId {
        self.declare_or_panic(path, NodeVariant::Folder, NodeKind::folder)
    }

    /// Declare `kind` at `path` without panicking.
    pub fn try_declare(&mut self, path: &str, kind: NodeKind) -> GuiResult<NodeId> {
        let variant = kind.variant();
        self.declare(path, variant, || kind)
    }

    fn declare_or_panic(
        &mut self,
        path: &str,
        variant: NodeVariant,
        make: impl FnOnce() -> NodeKind,
    ) -> NodeId {
        match self.declare(path, variant, make) {
            Ok(id) => id,
            Err(e) => panic!("tweakui: cannot declare {variant} at {path:?}: {e}"),
        }
    }

    fn declare(
        &mut self,
        path: &str,
        variant: NodeVariant,
        make: impl FnOnce() -> NodeKind,
    ) -> GuiResult<NodeId> {
        let key = PathKey::parse(path)?;
        let declared = self.tree.get_or_create(&key, variant, make)?;
        let id = declared.id();
        if declared.is_created() {
            tracing::debug!(path = %key, %variant, node = %id, "control created");
            if let Some(value) = self.pending.remove(&key) {
                self.apply_loaded(id, &value);
            }
        }
        Ok(id)
    }

    fn slider_value(&self, id: NodeId) -> Option<f32> {
        self.tree.node(id).and_then(|n| n.slider_value())
    }

    fn color_value(&self, id: NodeId) -> Option<Color> {
        match self.tree.node(id).map(|n| n.kind()) {
            Some(NodeKind::ColorPicker(c)) => Some(c.color),
            _ => None,
        }
    }

    /// Current persisted value at `path`.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<NodeValue> {
        let key = PathKey::parse(path).ok()?;
        self.tree.get(&key).and_then(|n| n.value())
    }

    // ─── Frame protocol ──────────────────────────────────────────────────────

    /// Feed one input event. Returns whether the overlay consumed it.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        if let Event::Key(key) = event
            && key.kind == KeyEventKind::Press
            && key.modifiers.is_empty()
            && key.is_char(self.config.hide_key)
        {
            self.toggle_visible();
            return true;
        }
        if !self.visible {
            return false;
        }

        let outcome = self
            .router
            .route(event, &mut self.tree, &mut self.windows);
        if let RouteOutcome::Node {
            window,
            node,
            response,
        } = &outcome
        {
            self.on_node_response(*window, *node, response);
        }
        outcome.is_consumed()
    }

    fn on_node_response(&mut self, window: WindowId, node: NodeId, response: &NodeResponse) {
        match response {
            NodeResponse::OpenWindow { folder } => {
                let anchor = self.anchor_beside(window, node);
                if let Err(e) = self.open_folder(*folder, anchor) {
                    tracing::warn!(error = %e, "failed to open folder window");
                }
            }
            NodeResponse::LoadSave { name } => {
                if let Err(e) = self.load_save(name) {
                    tracing::warn!(save = %name, error = %e, "failed to load save");
                }
            }
            NodeResponse::Pressed if self.saves.as_ref().is_some_and(|s| s.save_now == node) => {
                if let Err(e) = self.save_now() {
                    tracing::warn!(error = %e, "failed to save");
                }
            }
            NodeResponse::Pressed | NodeResponse::Changed | NodeResponse::None => {}
        }
    }

    /// Screen point at the right end of a node's row.
    fn anchor_beside(&self, window: WindowId, node: NodeId) -> Option<Point> {
        let window = self.windows.get(window)?;
        let row = window.content_rect_to_screen(self.tree.node(node)?.layout());
        Some(Point::new(window.bounds().right(), row.y))
    }

    /// Lay out and paint the frame, then end it. Returns node rows drawn.
    pub fn render(&mut self, bridge: &mut dyn RenderBridge) -> usize {
        let drawn = if self.visible {
            render_frame(&mut self.tree, &mut self.windows, &self.config.metrics, bridge)
        } else {
            0
        };
        self.end_frame();
        drawn
    }

    /// Clear one-frame state without drawing.
    pub fn end_frame(&mut self) {
        self.tree.release_buttons();
        self.frame += 1;
    }

    /// Frames completed so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ─── Windows and visibility ──────────────────────────────────────────────

    /// Open (or uncover) the window for the folder at `path`, creating the
    /// folder if needed.
    pub fn open_window(&mut self, path: &str) -> GuiResult<WindowId> {
        let id = self.declare(path, NodeVariant::Folder, NodeKind::folder)?;
        self.open_folder(id, None)
    }

    fn open_folder(&mut self, folder: NodeId, anchor: Option<Point>) -> GuiResult<WindowId> {
        if self.saves.as_ref().is_some_and(|s| s.folder == folder) {
            self.refresh_save_entries();
        }
        Ok(self.windows.open(&self.tree, folder, anchor)?)
    }

    /// Close a window. Permanent windows ignore this and return `false`.
    pub fn close_window(&mut self, window: WindowId) -> bool {
        let closed = self.windows.close(window);
        if closed {
            self.router.forget_window(window, &mut self.tree);
        }
        closed
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if !visible {
            self.router.reset(&mut self.tree, &mut self.windows);
        }
        tracing::debug!(visible, "overlay visibility changed");
    }

    pub fn toggle_visible(&mut self) {
        self.set_visible(!self.visible);
    }

    #[must_use]
    pub fn root_window(&self) -> WindowId {
        self.root_window
    }

    // ─── Persistence ─────────────────────────────────────────────────────────

    /// Encode every value, including loaded values not yet declared.
    pub fn export_values(&self) -> GuiResult<Vec<u8>> {
        let mut snapshot = snapshot_values(&self.tree);
        for (path, value) in &self.pending {
            snapshot
                .entry(path.to_string())
                .or_insert_with(|| value.clone());
        }
        Ok(self.codec.serialize(&snapshot)?)
    }

    /// Decode and apply a blob. Returns how many values reached existing
    /// nodes; the rest wait for their paths to be declared.
    pub fn import_values(&mut self, bytes: &[u8]) -> GuiResult<usize> {
        let snapshot = self.codec.deserialize(bytes)?;
        Ok(self.apply_snapshot(snapshot))
    }

    /// Apply a decoded snapshot, replacing any values still pending from an
    /// earlier load.
    pub fn apply_snapshot(&mut self, snapshot: ValueSnapshot) -> usize {
        self.pending.clear();
        let mut applied = 0;
        for (text, value) in snapshot {
            let key = match PathKey::parse(&text) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(path = %text, error = %e, "skipping saved value with bad path");
                    continue;
                }
            };
            match self.tree.find_by_path(&key) {
                Some(id) => {
                    if self.apply_loaded(id, &value) {
                        applied += 1;
                    }
                }
                None => {
                    self.pending.insert(key, value);
                }
            }
        }
        applied
    }

    /// Apply a loaded value; on rejection restore the declared default.
    fn apply_loaded(&mut self, id: NodeId, value: &NodeValue) -> bool {
        let Some(node) = self.tree.node_mut(id) else {
            return false;
        };
        match node.apply_value(value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %node.path(),
                    error = %e,
                    "saved value rejected, using declared default"
                );
                node.reset_to_default();
                false
            }
        }
    }

    /// Number of loaded values waiting for their paths.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn storage(&self) -> GuiResult<&dyn StorageBackend> {
        self.storage.as_deref().ok_or(GuiError::NoStorage)
    }

    #[must_use]
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Write every value to the save named `name`.
    pub fn save(&mut self, name: &str) -> GuiResult<()> {
        let bytes = self.export_values()?;
        self.storage()?.write(name, &bytes)?;
        tracing::info!(save = %name, bytes = bytes.len(), "values saved");

        let saves_open = self
            .saves
            .as_ref()
            .and_then(|s| self.windows.find_by_folder(s.folder))
            .and_then(|w| self.windows.get(w))
            .is_some_and(|w| w.is_visible());
        if saves_open {
            self.refresh_save_entries();
        }
        Ok(())
    }

    /// Save under a timestamped name. Returns the name.
    pub fn save_now(&mut self) -> GuiResult<String> {
        let name = timestamp_name(SystemTime::now());
        self.save(&name)?;
        Ok(name)
    }

    /// Load the save named `name`. Returns values applied to existing nodes.
    pub fn load_save(&mut self, name: &str) -> GuiResult<usize> {
        let bytes = self.storage()?.read(name)?;
        let applied = self.import_values(&bytes)?;
        tracing::info!(save = %name, applied, pending = self.pending.len(), "save loaded");
        Ok(applied)
    }

    /// Load the most recent save, if there is one. Returns its name.
    pub fn load_most_recent(&mut self) -> GuiResult<Option<String>> {
        let Some(latest) = self.storage()?.latest()? else {
            return Ok(None);
        };
        self.load_save(&latest.name)?;
        Ok(Some(latest.name))
    }

    /// Rebuild the transient save entries from the storage listing,
    /// newest first.
    fn refresh_save_entries(&mut self) {
        let Some(saves) = self.saves.clone() else {
            return;
        };
        let Some(storage) = self.storage.as_deref() else {
            return;
        };
        let listing = match storage.list() {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list saves");
                return;
            }
        };
        self.tree.remove_transient_children(saves.folder);
        for info in listing.iter().rev() {
            let entry = saves
                .path
                .child(&info.name)
                .map_err(GuiError::from)
                .and_then(|key| {
                    self.tree
                        .insert_at_path(&key, NodeKind::save_entry(info.name.as_str()))
                        .map_err(GuiError::from)
                });
            if let Err(e) = entry {
                tracing::warn!(save = %info.name, error = %e, "save not listed");
            }
        }
    }

    // ─── Inspection ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    #[must_use]
    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> &mut WindowManager {
        &mut self.windows
    }

    #[must_use]
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    #[must_use]
    pub fn config(&self) -> &GuiConfig {
        &self.config
    }
}

fn declare_saves_folder(tree: &mut NodeTree, name: &str) -> Option<SavesFolder> {
    let declared = PathKey::parse(name)
        .map_err(TreeError::from)
        .and_then(|path| {
            let folder = tree.insert_at_path(&path, NodeKind::folder())?;
            let button = path.child(SAVE_NOW_LABEL)?;
            let save_now = tree.insert_at_path(&button, NodeKind::button())?;
            Ok(SavesFolder {
                folder,
                path,
                save_now,
            })
        });
    match declared {
        Ok(saves) => Some(saves),
        Err(e) => {
            tracing::warn!(folder = %name, error = %e, "saves folder disabled");
            None
        }
    }
}

fn timestamp_name(now: SystemTime) -> String {
    let since = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("save-{}-{:03}", since.as_secs(), since.subsec_millis())
}
