#![forbid(unsafe_code)]

//! Frame traversal for drawing.
//!
//! The runtime never rasterizes anything itself. [`render_frame`] lays out
//! every visible window and walks the stack bottom-up, calling a
//! host-provided [`RenderBridge`] once per window and once per visible
//! node row, in declaration order.

use tweakui_core::geometry::Rect;
use tweakui_tree::{LayoutMetrics, Node, NodeId, NodeTree, NodeVariant};

use crate::window::{Window, WindowId};
use crate::window_manager::WindowManager;

/// Drawing surface supplied by the host.
pub trait RenderBridge {
    /// Draw a window's frame, title bar and close button.
    fn draw_window_chrome(&mut self, window: &Window);

    /// Draw one node row. `screen_rect` is the row in screen pixels.
    fn draw_node_background(&mut self, node: &Node, screen_rect: Rect);
}

/// Lay out the visible windows: size each to its folder's content.
pub fn layout_windows(tree: &mut NodeTree, windows: &mut WindowManager, metrics: &LayoutMetrics) {
    let min_width = windows.default_width();
    for id in windows.ids_bottom_up() {
        let Some(folder) = windows.get(id).map(Window::folder) else {
            continue;
        };
        let content = tree.layout_folder(folder, min_width, metrics);
        if let Some(window) = windows.get_mut(id) {
            window.set_content_size(content);
        }
    }
}

/// Lay out and paint one frame. Returns the number of node rows drawn.
pub fn render_frame(
    tree: &mut NodeTree,
    windows: &mut WindowManager,
    metrics: &LayoutMetrics,
    bridge: &mut dyn RenderBridge,
) -> usize {
    layout_windows(tree, windows, metrics);

    let mut drawn = 0;
    for window in windows.iter_bottom_up() {
        bridge.draw_window_chrome(window);
        let view = window.content_rect();
        for child in tree.children_snapshot(window.folder()) {
            let Some(node) = tree.node(child) else {
                continue;
            };
            let rect = window.content_rect_to_screen(node.layout());
            if !rect.intersects(&view) {
                continue;
            }
            bridge.draw_node_background(node, rect);
            drawn += 1;
        }
    }
    drawn
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    WindowChrome {
        window: WindowId,
        title: String,
        bounds: Rect,
        closeable: bool,
    },
    NodeBackground {
        node: NodeId,
        path: String,
        variant: NodeVariant,
        rect: Rect,
        hovered: bool,
        dragged: bool,
    },
}

/// Bridge that records draw calls instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    commands: Vec<DrawCommand>,
}

impl RecordingBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Paths of recorded node rows, in draw order.
    #[must_use]
    pub fn node_paths(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::NodeBackground { path, .. } => Some(path.as_str()),
                DrawCommand::WindowChrome { .. } => None,
            })
            .collect()
    }
}

impl RenderBridge for RecordingBridge {
    fn draw_window_chrome(&mut self, window: &Window) {
        self.commands.push(DrawCommand::WindowChrome {
            window: window.id(),
            title: window.title().to_owned(),
            bounds: window.bounds(),
            closeable: window.is_closeable(),
        });
    }

    fn draw_node_background(&mut self, node: &Node, screen_rect: Rect) {
        self.commands.push(DrawCommand::NodeBackground {
            node: node.id(),
            path: node.path().to_string(),
            variant: node.variant(),
            rect: screen_rect,
            hovered: node.is_hovered(),
            dragged: node.is_dragged(),
        });
    }
}
