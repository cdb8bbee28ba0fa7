#![forbid(unsafe_code)]

//! The window stack.
//!
//! Windows are kept in a single vector ordered bottom to top; the last
//! element draws last and is hit-tested first. Hidden windows keep their
//! slot but are skipped by iteration, drawing and hit testing.
//!
//! # Invariants
//!
//! 1. At most one window per folder. Opening a folder that already has a
//!    window unhides and raises it.
//! 2. Permanent windows are never removed by `close`.
//! 3. `iter_top_down` is exactly `iter_bottom_up` reversed.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `WindowError::NotAFolder` | Opening a leaf node | Returned, stack unchanged |
//! | `WindowError::UnknownNode` | Stale node id | Returned, stack unchanged |
//! | Close on permanent window | Root window | `close` returns `false` |

use std::fmt;

use tweakui_core::geometry::Point;
use tweakui_core::path::PathKey;
use tweakui_tree::{LayoutMetrics, NodeId, NodeTree, NodeVariant};

use crate::window::{Window, WindowId};

/// Default width of a new window.
pub const DEFAULT_WINDOW_WIDTH: f32 = 240.0;
/// Where the first cascaded window opens.
pub const DEFAULT_CASCADE_ORIGIN: Point = Point::new(280.0, 40.0);
/// Offset between successive cascaded windows.
pub const DEFAULT_CASCADE_STEP: Point = Point::new(24.0, 24.0);

#[derive(Debug, Clone, PartialEq)]
pub enum WindowError {
    /// Only folders can be bound to a window.
    NotAFolder {
        path: PathKey,
        variant: NodeVariant,
    },
    /// The node id does not resolve to a live node.
    UnknownNode(NodeId),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::NotAFolder { path, variant } => {
                write!(f, "cannot open a window for {variant} node {path}")
            }
            WindowError::UnknownNode(id) => write!(f, "cannot open a window for unknown node {id}"),
        }
    }
}

impl std::error::Error for WindowError {}

/// Ordered stack of windows.
#[derive(Debug, Clone)]
pub struct WindowManager {
    stack: Vec<Window>,
    next_id: u32,
    opened: u32,
    title_height: f32,
    default_width: f32,
    max_content_height: f32,
    cascade_origin: Point,
    cascade_step: Point,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new(&LayoutMetrics::default())
    }
}

impl WindowManager {
    /// Create an empty stack whose title bars are one cell high.
    #[must_use]
    pub fn new(metrics: &LayoutMetrics) -> Self {
        Self {
            stack: Vec::new(),
            next_id: 1,
            opened: 0,
            title_height: metrics.cell,
            default_width: DEFAULT_WINDOW_WIDTH,
            max_content_height: f32::INFINITY,
            cascade_origin: DEFAULT_CASCADE_ORIGIN,
            cascade_step: DEFAULT_CASCADE_STEP,
        }
    }

    #[must_use]
    pub fn with_default_width(mut self, width: f32) -> Self {
        self.default_width = width;
        self
    }

    /// Cap on visible content height; taller content scrolls.
    #[must_use]
    pub fn with_max_content_height(mut self, height: f32) -> Self {
        self.max_content_height = height;
        self
    }

    #[must_use]
    pub fn with_cascade(mut self, origin: Point, step: Point) -> Self {
        self.cascade_origin = origin;
        self.cascade_step = step;
        self
    }

    #[must_use]
    pub fn default_width(&self) -> f32 {
        self.default_width
    }

    /// Open a window for `folder`, or unhide and raise its existing one.
    ///
    /// New windows open at `anchor` when given, otherwise at the next
    /// cascade position.
    pub fn open(
        &mut self,
        tree: &NodeTree,
        folder: NodeId,
        anchor: Option<Point>,
    ) -> Result<WindowId, WindowError> {
        self.open_with(tree, folder, anchor, true)
    }

    /// Open a window that `close` will refuse to remove.
    pub fn open_permanent(
        &mut self,
        tree: &NodeTree,
        folder: NodeId,
        position: Point,
    ) -> Result<WindowId, WindowError> {
        self.open_with(tree, folder, Some(position), false)
    }

    fn open_with(
        &mut self,
        tree: &NodeTree,
        folder: NodeId,
        anchor: Option<Point>,
        closeable: bool,
    ) -> Result<WindowId, WindowError> {
        let node = tree.node(folder).ok_or(WindowError::UnknownNode(folder))?;
        if !node.is_folder() {
            return Err(WindowError::NotAFolder {
                path: node.path().clone(),
                variant: node.variant(),
            });
        }

        if let Some(id) = self.find_by_folder(folder) {
            self.show(id);
            self.raise(id);
            tracing::debug!(window = %id, folder = %node.path(), "window uncovered");
            return Ok(id);
        }

        let position = anchor.unwrap_or_else(|| self.next_cascade());
        Ok(self.push_window(folder, node.path().clone(), position, closeable))
    }

    /// Open the permanent window for the root folder, which always exists.
    pub fn open_root(&mut self, position: Point) -> WindowId {
        if let Some(id) = self.find_by_folder(NodeId::ROOT) {
            return id;
        }
        self.push_window(NodeId::ROOT, PathKey::root(), position, false)
    }

    fn push_window(
        &mut self,
        folder: NodeId,
        path: PathKey,
        position: Point,
        closeable: bool,
    ) -> WindowId {
        let id = WindowId::new(self.next_id);
        self.next_id += 1;
        tracing::debug!(window = %id, folder = %path, closeable, "window opened");
        let window = Window::new(
            id,
            folder,
            path,
            position,
            self.default_width,
            self.title_height,
            closeable,
        )
        .with_max_content_height(self.max_content_height);
        self.stack.push(window);
        id
    }

    fn next_cascade(&mut self) -> Point {
        let n = self.opened as f32;
        self.opened += 1;
        Point::new(
            self.cascade_origin.x + self.cascade_step.x * n,
            self.cascade_origin.y + self.cascade_step.y * n,
        )
    }

    /// Remove a closeable window. Returns `false` for permanent or unknown
    /// windows.
    pub fn close(&mut self, id: WindowId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !self.stack[index].is_closeable() {
            tracing::debug!(window = %id, "close ignored for permanent window");
            return false;
        }
        let window = self.stack.remove(index);
        tracing::debug!(window = %id, folder = %window.folder_path(), "window closed");
        true
    }

    /// Move a window to the top of the stack.
    pub fn raise(&mut self, id: WindowId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if index + 1 != self.stack.len() {
            let window = self.stack.remove(index);
            self.stack.push(window);
        }
        true
    }

    pub fn hide(&mut self, id: WindowId) -> bool {
        self.get_mut(id).map(Window::hide).is_some()
    }

    pub fn show(&mut self, id: WindowId) -> bool {
        self.get_mut(id).map(Window::show).is_some()
    }

    /// Flip between hidden and visible. Returns the new visibility.
    pub fn toggle_hidden(&mut self, id: WindowId) -> Option<bool> {
        let window = self.get_mut(id)?;
        if window.is_visible() {
            window.hide();
        } else {
            window.show();
        }
        Some(window.is_visible())
    }

    #[must_use]
    pub fn find_by_folder(&self, folder: NodeId) -> Option<WindowId> {
        self.stack
            .iter()
            .find(|w| w.folder() == folder)
            .map(Window::id)
    }

    #[must_use]
    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.stack.iter().find(|w| w.id() == id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.stack.iter_mut().find(|w| w.id() == id)
    }

    /// Visible windows, bottom first (draw order).
    pub fn iter_bottom_up(&self) -> impl DoubleEndedIterator<Item = &Window> {
        self.stack.iter().filter(|w| w.is_visible())
    }

    /// Visible windows, top first (hit-test order).
    pub fn iter_top_down(&self) -> impl Iterator<Item = &Window> {
        self.iter_bottom_up().rev()
    }

    /// Ids of visible windows bottom first, safe to hold across mutation.
    #[must_use]
    pub fn ids_bottom_up(&self) -> Vec<WindowId> {
        self.iter_bottom_up().map(Window::id).collect()
    }

    /// Topmost visible window.
    #[must_use]
    pub fn top(&self) -> Option<&Window> {
        self.iter_top_down().next()
    }

    /// Topmost visible window whose bounds contain `point`.
    #[must_use]
    pub fn window_at(&self, point: Point) -> Option<WindowId> {
        self.iter_top_down()
            .find(|w| w.bounds().contains(point))
            .map(Window::id)
    }

    /// Number of windows, hidden ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn index_of(&self, id: WindowId) -> Option<usize> {
        self.stack.iter().position(|w| w.id() == id)
    }
}
