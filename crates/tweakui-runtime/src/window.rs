#![forbid(unsafe_code)]

//! A movable surface displaying one folder's children.
//!
//! # Regions
//!
//! ```text
//! ┌──────────────────────────────┬───┐  ─┐
//! │ title / drag handle          │ x │   │ title_height
//! ├──────────────────────────────┴───┤  ─┘
//! │ content (scrolled rows)          │
//! └──────────────────────────────────┘
//! ```
//!
//! The close square exists only on closeable windows. Content coordinates
//! are relative to the top-left of the content rect, shifted by `scroll`.
//!
//! # State machine
//!
//! `Visible -> Dragging` on pointer-down in the drag handle,
//! `Dragging -> Visible` on release, any state `-> Hidden` on hide.

use std::fmt;

use tweakui_core::geometry::{Point, Rect, Size};
use tweakui_core::path::PathKey;
use tweakui_tree::NodeId;

/// Stable window identity, unique for the lifetime of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u32);

impl WindowId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Interaction state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WindowState {
    #[default]
    Visible,
    /// Title bar held; `offset` is the pointer position relative to the
    /// window origin at grab time.
    Dragging { offset: Point },
    Hidden,
}

/// Part of a window under a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRegion {
    CloseButton,
    DragHandle,
    Content,
}

#[derive(Debug, Clone)]
pub struct Window {
    id: WindowId,
    folder: NodeId,
    folder_path: PathKey,
    title: String,
    position: Point,
    size: Size,
    title_height: f32,
    max_content_height: f32,
    content_size: Size,
    closeable: bool,
    state: WindowState,
    scroll: Point,
}

impl Window {
    pub(crate) fn new(
        id: WindowId,
        folder: NodeId,
        folder_path: PathKey,
        position: Point,
        width: f32,
        title_height: f32,
        closeable: bool,
    ) -> Self {
        let title = if folder_path.is_root() {
            String::from("tweakui")
        } else {
            folder_path.name().to_owned()
        };
        Self {
            id,
            folder,
            folder_path,
            title,
            position,
            size: Size::new(width, title_height),
            title_height,
            max_content_height: f32::INFINITY,
            content_size: Size::ZERO,
            closeable,
            state: WindowState::Visible,
            scroll: Point::ZERO,
        }
    }

    #[must_use]
    pub(crate) fn with_max_content_height(mut self, height: f32) -> Self {
        self.max_content_height = height.max(0.0);
        self
    }

    #[must_use]
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The folder this window displays.
    #[must_use]
    pub fn folder(&self) -> NodeId {
        self.folder
    }

    #[must_use]
    pub fn folder_path(&self) -> &PathKey {
        &self.folder_path
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub fn is_closeable(&self) -> bool {
        self.closeable
    }

    #[must_use]
    pub fn state(&self) -> WindowState {
        self.state
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self.state, WindowState::Hidden)
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, WindowState::Dragging { .. })
    }

    #[must_use]
    pub fn scroll(&self) -> Point {
        self.scroll
    }

    // ─── Regions ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    #[must_use]
    pub fn title_bar(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.width, self.title_height)
    }

    /// Square at the right end of the title bar, on closeable windows.
    #[must_use]
    pub fn close_button(&self) -> Option<Rect> {
        self.closeable.then(|| {
            let bar = self.title_bar();
            Rect::new(
                bar.right() - self.title_height,
                bar.y,
                self.title_height,
                self.title_height,
            )
        })
    }

    /// The title bar minus the close button.
    #[must_use]
    pub fn drag_handle(&self) -> Rect {
        let mut bar = self.title_bar();
        if self.closeable {
            bar.width = (bar.width - self.title_height).max(0.0);
        }
        bar
    }

    #[must_use]
    pub fn content_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y + self.title_height,
            self.size.width,
            (self.size.height - self.title_height).max(0.0),
        )
    }

    /// Which region contains `point`, if any.
    #[must_use]
    pub fn region_at(&self, point: Point) -> Option<WindowRegion> {
        if self.close_button().is_some_and(|r| r.contains(point)) {
            Some(WindowRegion::CloseButton)
        } else if self.drag_handle().contains(point) {
            Some(WindowRegion::DragHandle)
        } else if self.content_rect().contains(point) {
            Some(WindowRegion::Content)
        } else {
            None
        }
    }

    // ─── Coordinate spaces ───────────────────────────────────────────────────

    /// Screen point to content-local point (undoes position, title and scroll).
    #[must_use]
    pub fn to_content_space(&self, screen: Point) -> Point {
        screen - self.content_rect().origin() + self.scroll
    }

    #[must_use]
    pub fn content_to_screen(&self, local: Point) -> Point {
        local + self.content_rect().origin() - self.scroll
    }

    /// Content-local rect in screen space.
    #[must_use]
    pub fn content_rect_to_screen(&self, local: Rect) -> Rect {
        Rect::from_origin_size(self.content_to_screen(local.origin()), local.size())
    }

    // ─── Sizing and scrolling ────────────────────────────────────────────────

    /// Fit the window to laid-out content. Height is capped; the rest
    /// scrolls.
    pub fn set_content_size(&mut self, content: Size) {
        self.content_size = content;
        let visible = content.height.min(self.max_content_height);
        self.size = Size::new(content.width, self.title_height + visible);
        self.clamp_scroll();
    }

    #[must_use]
    pub fn content_size(&self) -> Size {
        self.content_size
    }

    /// Scroll content by a wheel delta. Returns whether the offset moved.
    pub fn scroll_by(&mut self, delta: Point) -> bool {
        let before = self.scroll;
        self.scroll = self.scroll + delta;
        self.clamp_scroll();
        self.scroll != before
    }

    pub fn reset_scroll(&mut self) {
        self.scroll = Point::ZERO;
    }

    fn clamp_scroll(&mut self) {
        let view = self.content_rect();
        let max_x = (self.content_size.width - view.width).max(0.0);
        let max_y = (self.content_size.height - view.height).max(0.0);
        self.scroll.x = self.scroll.x.clamp(0.0, max_x);
        self.scroll.y = self.scroll.y.clamp(0.0, max_y);
    }

    // ─── State transitions ───────────────────────────────────────────────────

    pub(crate) fn begin_drag(&mut self, pointer: Point) {
        if self.is_visible() {
            self.state = WindowState::Dragging {
                offset: pointer - self.position,
            };
        }
    }

    /// Follow the pointer while dragging. Returns false when not dragging.
    pub(crate) fn drag_to(&mut self, pointer: Point) -> bool {
        match self.state {
            WindowState::Dragging { offset } => {
                self.position = pointer - offset;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn end_drag(&mut self) {
        if self.is_dragging() {
            self.state = WindowState::Visible;
        }
    }

    pub(crate) fn hide(&mut self) {
        self.state = WindowState::Hidden;
    }

    pub(crate) fn show(&mut self) {
        if !self.is_visible() {
            self.state = WindowState::Visible;
        }
    }
}
