#![forbid(unsafe_code)]

//! Pointer and key dispatch over the window stack.
//!
//! The router is a small state machine with one drag latch:
//!
//! ```text
//!            Down on drag handle                Up
//!   Idle ─────────────────────────▶ Window ─────────────▶ Idle
//!     │       Down on a node                    Up
//!     └─────────────────────────────▶ Node ─────────────▶ Idle
//! ```
//!
//! While latched, every move goes to the latched target regardless of
//! where the pointer is. Otherwise moves recompute hover.
//!
//! # Invariants
//!
//! 1. **Exclusivity**: a pointer event reaches at most one window and at
//!    most one node.
//! 2. **Single hover**: at most one node carries the `hovered` flag.
//! 3. **Latch validity**: a latch whose window was closed or hidden is
//!    dropped at the next event instead of being followed.
//!
//! # Failure Modes
//!
//! Routing never fails. "Nothing under the pointer" is
//! [`RouteOutcome::Unhandled`], which tells the host the event is its own.

use tweakui_core::event::{Event, KeyEvent, KeyEventKind, PointerEvent, PointerEventKind};
use tweakui_core::geometry::Point;
use tweakui_tree::{NodeId, NodeResponse, NodeTree};

use crate::window::{WindowId, WindowRegion};
use crate::window_manager::WindowManager;

/// What lies under a screen point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// A node row inside a window's content.
    Node { window: WindowId, node: NodeId },
    CloseButton(WindowId),
    DragHandle(WindowId),
    /// Window content with no node under the point.
    Content(WindowId),
}

impl HitTarget {
    #[must_use]
    pub const fn window(self) -> WindowId {
        match self {
            HitTarget::Node { window, .. }
            | HitTarget::CloseButton(window)
            | HitTarget::DragHandle(window)
            | HitTarget::Content(window) => window,
        }
    }
}

/// Result of routing one event.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The event did not touch the overlay.
    Unhandled,
    /// The overlay used the event; no node reacted.
    Consumed,
    /// A node handled the event.
    Node {
        window: WindowId,
        node: NodeId,
        response: NodeResponse,
    },
}

impl RouteOutcome {
    /// Whether the host should treat the event as taken by the overlay.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        !matches!(self, RouteOutcome::Unhandled)
    }
}

/// The drag latch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Latch {
    #[default]
    Idle,
    Window(WindowId),
    Node {
        window: WindowId,
        node: NodeId,
        last: Point,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    latch: Latch,
    hovered: Option<(WindowId, NodeId)>,
    pointer: Point,
}

impl EventRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn latch(&self) -> Latch {
        self.latch
    }

    #[must_use]
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered.map(|(_, node)| node)
    }

    /// Last pointer position seen.
    #[must_use]
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// Topmost target under `point`. Pure.
    #[must_use]
    pub fn hit_test(point: Point, tree: &NodeTree, windows: &WindowManager) -> Option<HitTarget> {
        let window = windows
            .iter_top_down()
            .find(|w| w.bounds().contains(point))?;
        let id = window.id();
        let target = match window.region_at(point)? {
            WindowRegion::CloseButton => HitTarget::CloseButton(id),
            WindowRegion::DragHandle => HitTarget::DragHandle(id),
            WindowRegion::Content => {
                let local = window.to_content_space(point);
                tree.children(window.folder())
                    .iter()
                    .rev()
                    .copied()
                    .find(|&child| {
                        tree.node(child)
                            .is_some_and(|n| n.layout().contains(local))
                    })
                    .map_or(HitTarget::Content(id), |node| HitTarget::Node {
                        window: id,
                        node,
                    })
            }
        };
        Some(target)
    }

    /// Dispatch one event.
    pub fn route(
        &mut self,
        event: &Event,
        tree: &mut NodeTree,
        windows: &mut WindowManager,
    ) -> RouteOutcome {
        match event {
            Event::Pointer(pointer) => self.route_pointer(pointer, tree, windows),
            Event::Key(key) => self.route_key(key, tree, windows),
        }
    }

    /// Drop the latch and hover, clearing the node flags they set.
    pub fn reset(&mut self, tree: &mut NodeTree, windows: &mut WindowManager) {
        self.reset_latch(tree, windows);
        self.set_hover(tree, None);
    }

    /// Forget anything tied to a window that was closed or hidden.
    pub fn forget_window(&mut self, window: WindowId, tree: &mut NodeTree) {
        let latched = match self.latch {
            Latch::Window(w) => w == window,
            Latch::Node { window: w, node, .. } => {
                if w == window {
                    set_dragged(tree, node, false);
                }
                w == window
            }
            Latch::Idle => false,
        };
        if latched {
            self.latch = Latch::Idle;
        }
        if self.hovered.is_some_and(|(w, _)| w == window) {
            self.set_hover(tree, None);
        }
    }

    // ─── Pointer ─────────────────────────────────────────────────────────────

    fn route_pointer(
        &mut self,
        event: &PointerEvent,
        tree: &mut NodeTree,
        windows: &mut WindowManager,
    ) -> RouteOutcome {
        let point = event.position();
        self.pointer = point;
        self.drop_stale_latch(tree, windows);

        match event.kind {
            PointerEventKind::Down => self.pointer_down(point, tree, windows),
            PointerEventKind::Move => self.pointer_move(point, tree, windows),
            PointerEventKind::Up => self.pointer_up(point, tree, windows),
            PointerEventKind::Scroll { delta_x, delta_y } => {
                match windows.window_at(point).and_then(|id| windows.get_mut(id)) {
                    Some(window) => {
                        window.scroll_by(Point::new(delta_x, delta_y));
                        RouteOutcome::Consumed
                    }
                    None => RouteOutcome::Unhandled,
                }
            }
        }
    }

    fn pointer_down(
        &mut self,
        point: Point,
        tree: &mut NodeTree,
        windows: &mut WindowManager,
    ) -> RouteOutcome {
        // A down while latched means the matching up was lost.
        self.reset_latch(tree, windows);

        let Some(target) = Self::hit_test(point, tree, windows) else {
            return RouteOutcome::Unhandled;
        };
        let window = target.window();
        windows.raise(window);

        match target {
            HitTarget::CloseButton(_) => {
                if windows.close(window) {
                    self.forget_window(window, tree);
                }
                RouteOutcome::Consumed
            }
            HitTarget::DragHandle(_) => {
                if let Some(w) = windows.get_mut(window) {
                    w.begin_drag(point);
                    self.latch = Latch::Window(window);
                }
                RouteOutcome::Consumed
            }
            HitTarget::Content(_) => RouteOutcome::Consumed,
            HitTarget::Node { node, .. } => {
                let Some(local) = windows.get(window).map(|w| w.to_content_space(point)) else {
                    return RouteOutcome::Consumed;
                };
                let Some(n) = tree.node_mut(node) else {
                    return RouteOutcome::Consumed;
                };
                n.set_dragged(true);
                let response = n.on_pointer_down(local);
                self.latch = Latch::Node {
                    window,
                    node,
                    last: point,
                };
                tracing::trace!(%node, %window, ?response, "pointer down on node");
                RouteOutcome::Node {
                    window,
                    node,
                    response,
                }
            }
        }
    }

    fn pointer_move(
        &mut self,
        point: Point,
        tree: &mut NodeTree,
        windows: &mut WindowManager,
    ) -> RouteOutcome {
        match self.latch {
            Latch::Window(window) => {
                if let Some(w) = windows.get_mut(window) {
                    w.drag_to(point);
                }
                RouteOutcome::Consumed
            }
            Latch::Node { window, node, last } => {
                let Some(local) = windows.get(window).map(|w| w.to_content_space(point)) else {
                    return RouteOutcome::Consumed;
                };
                let response = tree
                    .node_mut(node)
                    .map_or(NodeResponse::None, |n| n.on_drag_continue(local, point - last));
                self.latch = Latch::Node {
                    window,
                    node,
                    last: point,
                };
                RouteOutcome::Node {
                    window,
                    node,
                    response,
                }
            }
            Latch::Idle => {
                if self.hover_at(point, tree, windows).is_some() {
                    RouteOutcome::Consumed
                } else {
                    RouteOutcome::Unhandled
                }
            }
        }
    }

    fn pointer_up(
        &mut self,
        point: Point,
        tree: &mut NodeTree,
        windows: &mut WindowManager,
    ) -> RouteOutcome {
        match std::mem::take(&mut self.latch) {
            Latch::Window(window) => {
                if let Some(w) = windows.get_mut(window) {
                    w.end_drag();
                }
                self.hover_at(point, tree, windows);
                RouteOutcome::Consumed
            }
            Latch::Node { window, node, .. } => {
                let local = windows
                    .get(window)
                    .map_or(point, |w| w.to_content_space(point));
                let response = tree.node_mut(node).map_or(NodeResponse::None, |n| {
                    n.set_dragged(false);
                    n.on_drag_end(local)
                });
                // Keys follow the pointer again once the drag lets go.
                self.hover_at(point, tree, windows);
                RouteOutcome::Node {
                    window,
                    node,
                    response,
                }
            }
            Latch::Idle => {
                if windows.window_at(point).is_some() {
                    RouteOutcome::Consumed
                } else {
                    RouteOutcome::Unhandled
                }
            }
        }
    }

    // ─── Keys ────────────────────────────────────────────────────────────────

    fn route_key(
        &mut self,
        key: &KeyEvent,
        tree: &mut NodeTree,
        windows: &mut WindowManager,
    ) -> RouteOutcome {
        if key.kind != KeyEventKind::Press {
            return RouteOutcome::Unhandled;
        }

        if let Some((window, node)) = self.hovered
            && windows.get(window).is_some_and(|w| w.is_visible())
            && let Some(n) = tree.node_mut(node)
        {
            let response = n.on_key(key);
            return RouteOutcome::Node {
                window,
                node,
                response,
            };
        }

        if key.is_char('r')
            && let Some(window) = windows
                .window_at(self.pointer)
                .and_then(|id| windows.get_mut(id))
        {
            window.reset_scroll();
            return RouteOutcome::Consumed;
        }
        RouteOutcome::Unhandled
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    /// Hover whatever node row lies under `point` and return the hit.
    fn hover_at(
        &mut self,
        point: Point,
        tree: &mut NodeTree,
        windows: &WindowManager,
    ) -> Option<HitTarget> {
        let hit = Self::hit_test(point, tree, windows);
        let hover = match hit {
            Some(HitTarget::Node { window, node }) => Some((window, node)),
            _ => None,
        };
        self.set_hover(tree, hover);
        hit
    }

    fn set_hover(&mut self, tree: &mut NodeTree, next: Option<(WindowId, NodeId)>) {
        if self.hovered == next {
            return;
        }
        if let Some((_, old)) = self.hovered.take()
            && let Some(n) = tree.node_mut(old)
        {
            n.set_hovered(false);
        }
        if let Some((_, new)) = next
            && let Some(n) = tree.node_mut(new)
        {
            n.set_hovered(true);
        }
        self.hovered = next;
    }

    fn reset_latch(&mut self, tree: &mut NodeTree, windows: &mut WindowManager) {
        match std::mem::take(&mut self.latch) {
            Latch::Idle => {}
            Latch::Window(window) => {
                if let Some(w) = windows.get_mut(window) {
                    w.end_drag();
                }
            }
            Latch::Node { node, .. } => set_dragged(tree, node, false),
        }
    }

    fn drop_stale_latch(&mut self, tree: &mut NodeTree, windows: &WindowManager) {
        let window = match self.latch {
            Latch::Idle => return,
            Latch::Window(window) | Latch::Node { window, .. } => window,
        };
        if !windows.get(window).is_some_and(|w| w.is_visible()) {
            tracing::debug!(%window, "dropping drag latch on closed or hidden window");
            self.forget_window(window, tree);
        }
    }
}

fn set_dragged(tree: &mut NodeTree, node: NodeId, dragged: bool) {
    if let Some(n) = tree.node_mut(node) {
        n.set_dragged(dragged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tweakui_core::event::KeyEvent;
    use tweakui_core::path::PathKey;
    use tweakui_tree::{LayoutMetrics, NodeKind, NodeValue};

    struct Fixture {
        tree: NodeTree,
        windows: WindowManager,
        router: EventRouter,
        root_window: WindowId,
        speed: NodeId,
        toggle: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let metrics = LayoutMetrics::default();
            let mut tree = NodeTree::new();
            let speed = tree
                .insert_at_path(&key("speed"), NodeKind::slider_range(5.0, 0.0, 10.0))
                .unwrap();
            let toggle = tree.insert_at_path(&key("on"), NodeKind::toggle(false)).unwrap();
            let mut windows = WindowManager::new(&metrics);
            let root_window = windows
                .open_permanent(&tree, NodeId::ROOT, Point::ZERO)
                .unwrap();
            let mut f = Self {
                tree,
                windows,
                router: EventRouter::new(),
                root_window,
                speed,
                toggle,
            };
            f.layout();
            f
        }

        fn layout(&mut self) {
            let metrics = LayoutMetrics::default();
            for id in self.windows.ids_bottom_up() {
                let folder = self.windows.get(id).unwrap().folder();
                let size = self.tree.layout_folder(folder, 200.0, &metrics);
                self.windows.get_mut(id).unwrap().set_content_size(size);
            }
        }

        fn send(&mut self, event: impl Into<Event>) -> RouteOutcome {
            self.router
                .route(&event.into(), &mut self.tree, &mut self.windows)
        }

        /// Screen point at the middle of a node's row.
        fn center_of(&self, window: WindowId, node: NodeId) -> Point {
            let w = self.windows.get(window).unwrap();
            let rect = w.content_rect_to_screen(self.tree.node(node).unwrap().layout());
            Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
        }
    }

    fn key(s: &str) -> PathKey {
        PathKey::parse(s).unwrap()
    }

    #[test]
    fn down_on_toggle_flips_it() {
        let mut f = Fixture::new();
        let p = f.center_of(f.root_window, f.toggle);
        let out = f.send(PointerEvent::down(p.x, p.y));
        assert_eq!(
            out,
            RouteOutcome::Node {
                window: f.root_window,
                node: f.toggle,
                response: NodeResponse::Changed
            }
        );
        assert_eq!(f.tree.node(f.toggle).unwrap().value(), Some(NodeValue::Bool(true)));
    }

    #[test]
    fn slider_drag_is_latched_and_clamped() {
        let mut f = Fixture::new();
        let p = f.center_of(f.root_window, f.speed);
        f.send(PointerEvent::down(p.x, p.y));
        assert!(f.tree.node(f.speed).unwrap().is_dragged());
        // Far outside every window: the latch still receives the move.
        f.send(PointerEvent::moved(p.x + 100.0, p.y + 900.0));
        assert_eq!(f.tree.node(f.speed).unwrap().slider_value(), Some(10.0));
        f.send(PointerEvent::up(p.x + 100.0, p.y + 900.0));
        assert_eq!(f.router.latch(), Latch::Idle);
        assert!(!f.tree.node(f.speed).unwrap().is_dragged());
    }

    #[test]
    fn release_off_the_row_moves_keys_off_the_dragged_slider() {
        let mut f = Fixture::new();
        let p = f.center_of(f.root_window, f.speed);
        f.send(PointerEvent::moved(p.x, p.y));
        f.send(PointerEvent::down(p.x, p.y));
        f.send(PointerEvent::moved(p.x + 30.0, p.y + 900.0));
        let dragged = f.tree.node(f.speed).unwrap().slider_value();
        assert_ne!(dragged, Some(5.0));
        assert_eq!(f.router.hovered(), Some(f.speed));

        f.send(PointerEvent::up(p.x + 30.0, p.y + 900.0));
        assert_eq!(f.router.hovered(), None);
        assert!(!f.tree.node(f.speed).unwrap().is_hovered());
        assert_eq!(f.send(KeyEvent::char('r')), RouteOutcome::Unhandled);
        assert_eq!(f.tree.node(f.speed).unwrap().slider_value(), dragged);
    }

    #[test]
    fn release_over_another_row_hovers_it() {
        let mut f = Fixture::new();
        let a = f.center_of(f.root_window, f.speed);
        let b = f.center_of(f.root_window, f.toggle);
        f.send(PointerEvent::down(a.x, a.y));
        f.send(PointerEvent::moved(b.x, b.y));
        f.send(PointerEvent::up(b.x, b.y));
        assert_eq!(f.router.hovered(), Some(f.toggle));
        assert_eq!(f.tree.iter().filter(|n| n.is_hovered()).count(), 1);
    }

    #[test]
    fn hover_is_exclusive() {
        let mut f = Fixture::new();
        let a = f.center_of(f.root_window, f.speed);
        let b = f.center_of(f.root_window, f.toggle);
        f.send(PointerEvent::moved(a.x, a.y));
        assert_eq!(f.router.hovered(), Some(f.speed));
        f.send(PointerEvent::moved(b.x, b.y));
        assert_eq!(f.router.hovered(), Some(f.toggle));
        let hovered = f.tree.iter().filter(|n| n.is_hovered()).count();
        assert_eq!(hovered, 1);
        assert_eq!(f.send(PointerEvent::moved(5000.0, 5000.0)), RouteOutcome::Unhandled);
        assert_eq!(f.tree.iter().filter(|n| n.is_hovered()).count(), 0);
    }

    #[test]
    fn window_drag_moves_window() {
        let mut f = Fixture::new();
        let handle = f.windows.get(f.root_window).unwrap().drag_handle();
        let grab = Point::new(handle.x + 10.0, handle.y + 5.0);
        f.send(PointerEvent::down(grab.x, grab.y));
        assert_eq!(f.router.latch(), Latch::Window(f.root_window));
        f.send(PointerEvent::moved(grab.x + 40.0, grab.y + 30.0));
        f.send(PointerEvent::up(grab.x + 40.0, grab.y + 30.0));
        assert_eq!(f.windows.get(f.root_window).unwrap().position(), Point::new(40.0, 30.0));
    }

    #[test]
    fn hidden_window_drops_latch() {
        let mut f = Fixture::new();
        let p = f.center_of(f.root_window, f.speed);
        f.send(PointerEvent::down(p.x, p.y));
        f.windows.hide(f.root_window);
        let out = f.send(PointerEvent::moved(p.x + 50.0, p.y));
        assert_eq!(out, RouteOutcome::Unhandled);
        assert_eq!(f.router.latch(), Latch::Idle);
        assert_eq!(f.tree.node(f.speed).unwrap().slider_value(), Some(5.0));
        assert!(!f.tree.node(f.speed).unwrap().is_dragged());
    }

    #[test]
    fn keys_go_to_hovered_node_and_ignore_repeats() {
        let mut f = Fixture::new();
        let p = f.center_of(f.root_window, f.speed);
        f.send(PointerEvent::down(p.x, p.y));
        f.send(PointerEvent::moved(p.x + 20.0, p.y));
        f.send(PointerEvent::up(p.x + 20.0, p.y));
        f.send(PointerEvent::moved(p.x, p.y));
        assert_eq!(f.tree.node(f.speed).unwrap().slider_value(), Some(7.0));

        let repeat = KeyEvent::char('r').with_kind(KeyEventKind::Repeat);
        assert_eq!(f.send(repeat), RouteOutcome::Unhandled);
        assert_eq!(f.tree.node(f.speed).unwrap().slider_value(), Some(7.0));

        let out = f.send(KeyEvent::char('r'));
        assert!(matches!(out, RouteOutcome::Node { response: NodeResponse::Changed, .. }));
        assert_eq!(f.tree.node(f.speed).unwrap().slider_value(), Some(5.0));
    }

    #[test]
    fn close_button_closes_and_clears_hover() {
        let mut f = Fixture::new();
        let fx = f.tree.insert_at_path(&key("fx"), NodeKind::folder()).unwrap();
        f.tree.insert_at_path(&key("fx/gain"), NodeKind::slider(1.0)).unwrap();
        let fx_win = f.windows.open(&f.tree, fx, Some(Point::new(400.0, 0.0))).unwrap();
        f.layout();
        let gain = f.tree.find_by_path(&key("fx/gain")).unwrap();
        let p = f.center_of(fx_win, gain);
        f.send(PointerEvent::moved(p.x, p.y));
        assert_eq!(f.router.hovered(), Some(gain));

        let close = f.windows.get(fx_win).unwrap().close_button().unwrap();
        f.send(PointerEvent::down(close.x + 1.0, close.y + 1.0));
        assert!(f.windows.get(fx_win).is_none());
        assert_eq!(f.router.hovered(), None);
        assert!(!f.tree.node(gain).unwrap().is_hovered());
    }

    #[test]
    fn scroll_and_reset_key() {
        let mut f = Fixture::new();
        f.windows = WindowManager::new(&LayoutMetrics::default()).with_max_content_height(24.0);
        f.root_window = f
            .windows
            .open_permanent(&f.tree, NodeId::ROOT, Point::ZERO)
            .unwrap();
        f.layout();
        let inside = Point::new(10.0, 30.0);
        f.send(PointerEvent::scroll(inside.x, inside.y, 0.0, 24.0));
        assert_eq!(f.windows.get(f.root_window).unwrap().scroll(), Point::new(0.0, 24.0));
        // The second row is now under the first row's screen position.
        assert_eq!(
            EventRouter::hit_test(inside, &f.tree, &f.windows),
            Some(HitTarget::Node { window: f.root_window, node: f.toggle })
        );
        f.send(PointerEvent::moved(2000.0, 2000.0));
        f.send(PointerEvent::moved(inside.x, 2.0));
        assert_eq!(f.send(KeyEvent::char('r')), RouteOutcome::Consumed);
        assert_eq!(f.windows.get(f.root_window).unwrap().scroll(), Point::ZERO);
    }
}
