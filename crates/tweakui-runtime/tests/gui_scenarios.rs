#![forbid(unsafe_code)]

//! End-to-end overlay scenarios driven through the public frame protocol.

use proptest::prelude::*;
use tweakui_core::event::{KeyEvent, PointerEvent};
use tweakui_core::geometry::Point;
use tweakui_core::path::PathKey;
use tweakui_runtime::{
    EventRouter, Gui, GuiConfig, HitTarget, MemoryStorage, PersistenceConfig, RecordingBridge,
    SAVE_NOW_LABEL, StorageBackend, WindowId,
};
use tweakui_tree::{NodeId, NodeVariant};

// ============================================================================
// Helpers
// ============================================================================

fn headless() -> Gui {
    Gui::new(GuiConfig::default().persistence(PersistenceConfig::disabled()))
}

fn frame(gui: &mut Gui) -> RecordingBridge {
    let mut bridge = RecordingBridge::new();
    gui.render(&mut bridge);
    bridge
}

fn node_id(gui: &Gui, path: &str) -> NodeId {
    gui.tree()
        .find_by_path(&PathKey::parse(path).unwrap())
        .unwrap()
}

fn window_for(gui: &Gui, folder: &str) -> WindowId {
    gui.windows().find_by_folder(node_id(gui, folder)).unwrap()
}

/// Screen point at the middle of a node's row in `window`.
fn row_center(gui: &Gui, window: WindowId, path: &str) -> Point {
    let node = gui.tree().node(node_id(gui, path)).unwrap();
    let rect = gui
        .windows()
        .get(window)
        .unwrap()
        .content_rect_to_screen(node.layout());
    Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
}

fn click(gui: &mut Gui, p: Point) -> bool {
    let down = gui.handle_event(&PointerEvent::down(p.x, p.y).into());
    gui.handle_event(&PointerEvent::up(p.x, p.y).into());
    down
}

// ============================================================================
// Declaration
// ============================================================================

#[test]
fn redeclaring_every_frame_keeps_one_node_per_path() {
    let mut gui = headless();
    for _ in 0..5 {
        gui.slider("fx/bloom/strength", 1.0);
        gui.toggle("fx/bloom/enabled", true);
        gui.button("reset");
        frame(&mut gui);
    }
    // root, fx, bloom, strength, enabled, reset
    assert_eq!(gui.tree().len(), 6);
    gui.tree().validate().unwrap();
}

#[test]
fn rows_are_drawn_in_declaration_order() {
    let mut gui = headless();
    gui.toggle("zeta", false);
    gui.toggle("alpha", false);
    gui.folder("mid");
    let bridge = frame(&mut gui);
    assert_eq!(bridge.node_paths(), ["/zeta", "/alpha", "/mid"]);
}

// ============================================================================
// Interaction
// ============================================================================

#[test]
fn dragging_a_ranged_slider_clamps_at_max() {
    let mut gui = headless();
    assert_eq!(gui.slider_range("speed", 5.0, 0.0, 10.0), 5.0);
    frame(&mut gui);

    let root = gui.root_window();
    let p = row_center(&gui, root, "speed");
    assert!(gui.handle_event(&PointerEvent::down(p.x, p.y).into()));
    // Latched: the move counts even far outside the window.
    gui.handle_event(&PointerEvent::moved(p.x + 500.0, p.y + 300.0).into());
    gui.handle_event(&PointerEvent::up(p.x + 500.0, p.y + 300.0).into());

    assert_eq!(gui.slider_range("speed", 5.0, 0.0, 10.0), 10.0);
}

#[test]
fn integer_slider_reports_floor_of_dragged_value() {
    let mut gui = headless();
    gui.slider_int("count", 3);
    frame(&mut gui);

    let p = row_center(&gui, gui.root_window(), "count");
    gui.handle_event(&PointerEvent::down(p.x, p.y).into());
    gui.handle_event(&PointerEvent::moved(p.x + 2.5, p.y).into());
    gui.handle_event(&PointerEvent::up(p.x + 2.5, p.y).into());

    assert_eq!(gui.slider_int("count", 3), 5);
}

#[test]
fn clicking_a_folder_twice_leaves_one_window_on_top() {
    let mut gui = headless();
    gui.toggle("fx/bloom", true);
    frame(&mut gui);

    let root = gui.root_window();
    let p = row_center(&gui, root, "fx");
    assert!(click(&mut gui, p));
    frame(&mut gui);
    assert_eq!(gui.windows().len(), 2);

    assert!(click(&mut gui, p));
    frame(&mut gui);
    assert_eq!(gui.windows().len(), 2);
    let top = gui.windows().top().unwrap();
    assert_eq!(top.folder_path().to_string(), "/fx");
    assert_eq!(top.id(), window_for(&gui, "fx"));
}

#[test]
fn folder_window_opens_beside_the_clicked_row() {
    let mut gui = headless();
    gui.toggle("fx/bloom", true);
    frame(&mut gui);

    let root = gui.root_window();
    let p = row_center(&gui, root, "fx");
    click(&mut gui, p);
    let fx = gui.windows().get(window_for(&gui, "fx")).unwrap();
    let root_bounds = gui.windows().get(root).unwrap().bounds();
    assert_eq!(fx.position().x, root_bounds.right());
    assert!(!fx.bounds().intersects(&root_bounds));
}

#[test]
fn close_button_removes_folder_window_but_not_root() {
    let mut gui = headless();
    gui.toggle("fx/bloom", true);
    gui.open_window("fx").unwrap();
    frame(&mut gui);

    let fx = window_for(&gui, "fx");
    let close = gui.windows().get(fx).unwrap().close_button().unwrap();
    click(
        &mut gui,
        Point::new(close.x + close.width / 2.0, close.y + close.height / 2.0),
    );
    assert_eq!(gui.windows().len(), 1);
    assert!(gui.windows().get(gui.root_window()).is_some());
    assert!(!gui.close_window(gui.root_window()));
}

#[test]
fn dragging_the_title_bar_moves_the_window() {
    let mut gui = headless();
    gui.toggle("on", false);
    frame(&mut gui);

    let root = gui.root_window();
    let before = gui.windows().get(root).unwrap().position();
    let handle = gui.windows().get(root).unwrap().drag_handle();
    let start = Point::new(handle.x + 4.0, handle.y + 4.0);
    gui.handle_event(&PointerEvent::down(start.x, start.y).into());
    gui.handle_event(&PointerEvent::moved(start.x + 50.0, start.y + 30.0).into());
    gui.handle_event(&PointerEvent::up(start.x + 50.0, start.y + 30.0).into());

    let after = gui.windows().get(root).unwrap().position();
    assert_eq!(after, Point::new(before.x + 50.0, before.y + 30.0));
}

#[test]
fn button_is_pressed_for_exactly_one_frame() {
    let mut gui = headless();
    assert!(!gui.button("fire"));
    frame(&mut gui);

    let p = row_center(&gui, gui.root_window(), "fire");
    click(&mut gui, p);
    assert!(gui.button("fire"));
    assert!(gui.button("fire"));
    frame(&mut gui);
    assert!(!gui.button("fire"));
}

#[test]
fn hovered_slider_resets_on_r() {
    let mut gui = headless();
    gui.slider("gain", 2.0);
    frame(&mut gui);

    let p = row_center(&gui, gui.root_window(), "gain");
    gui.handle_event(&PointerEvent::down(p.x, p.y).into());
    gui.handle_event(&PointerEvent::moved(p.x + 30.0, p.y).into());
    gui.handle_event(&PointerEvent::up(p.x + 30.0, p.y).into());
    assert_ne!(gui.slider("gain", 2.0), 2.0);

    gui.handle_event(&PointerEvent::moved(p.x, p.y).into());
    assert_eq!(gui.router().hovered(), Some(node_id(&gui, "gain")));
    assert!(gui.handle_event(&KeyEvent::char('r').into()));
    assert_eq!(gui.slider("gain", 2.0), 2.0);
}

#[test]
fn slider_released_outside_the_overlay_ignores_r() {
    let mut gui = headless();
    gui.slider("gain", 2.0);
    frame(&mut gui);

    let p = row_center(&gui, gui.root_window(), "gain");
    gui.handle_event(&PointerEvent::moved(p.x, p.y).into());
    gui.handle_event(&PointerEvent::down(p.x, p.y).into());
    gui.handle_event(&PointerEvent::moved(p.x + 30.0, p.y + 2000.0).into());
    gui.handle_event(&PointerEvent::up(p.x + 30.0, p.y + 2000.0).into());
    let dragged = gui.slider("gain", 2.0);
    assert_ne!(dragged, 2.0);

    assert_eq!(gui.router().hovered(), None);
    assert!(!gui.handle_event(&KeyEvent::char('r').into()));
    assert_eq!(gui.slider("gain", 2.0), dragged);
}

#[test]
fn hidden_overlay_draws_nothing_and_passes_clicks_through() {
    let mut gui = headless();
    gui.toggle("on", false);
    frame(&mut gui);
    let p = row_center(&gui, gui.root_window(), "on");

    assert!(gui.handle_event(&KeyEvent::char('h').into()));
    assert!(!click(&mut gui, p));
    assert!(!gui.toggle("on", false));
    assert!(frame(&mut gui).commands().is_empty());

    gui.handle_event(&KeyEvent::char('h').into());
    assert!(click(&mut gui, p));
    assert!(gui.toggle("on", false));
}

// ============================================================================
// Saves folder
// ============================================================================

#[test]
fn loaded_value_for_undeclared_path_applies_on_declaration() {
    let storage = MemoryStorage::new();
    storage
        .write("start", br#"{"format_version":1,"values":{"/speed":7}}"#)
        .unwrap();
    let mut gui = Gui::with_storage(GuiConfig::default(), storage);
    assert_eq!(gui.pending_count(), 1);
    assert_eq!(gui.slider("speed", 5.0), 7.0);
}

#[test]
fn save_now_button_writes_and_lists_a_save() {
    let mut gui = Gui::with_storage(GuiConfig::default(), MemoryStorage::new());
    gui.slider("speed", 5.0);
    frame(&mut gui);

    let root = gui.root_window();
    let open_saves = row_center(&gui, root, "saves");
    click(&mut gui, open_saves);
    frame(&mut gui);
    let saves = window_for(&gui, "saves");
    let save_now = row_center(&gui, saves, &format!("saves/{SAVE_NOW_LABEL}"));
    click(&mut gui, save_now);
    frame(&mut gui);

    let entries: Vec<_> = gui
        .tree()
        .children(node_id(&gui, "saves"))
        .iter()
        .map(|&id| gui.tree().node(id).unwrap())
        .filter(|n| n.variant() == NodeVariant::SaveEntry)
        .map(|n| n.name().to_owned())
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("save-"));
}

#[test]
fn clicking_a_save_entry_loads_it() {
    let mut gui = Gui::with_storage(GuiConfig::default(), MemoryStorage::new());
    gui.toggle("on", false);
    gui.save("off").unwrap();
    gui.import_values(br#"{"format_version":1,"values":{"/on":true}}"#)
        .unwrap();
    assert!(gui.toggle("on", false));

    gui.open_window("saves").unwrap();
    frame(&mut gui);
    let saves = window_for(&gui, "saves");
    let entry = row_center(&gui, saves, "saves/off");
    click(&mut gui, entry);
    assert!(!gui.toggle("on", false));
}

// ============================================================================
// Properties
// ============================================================================

/// Three overlapping folder windows over the root window.
fn crowded() -> Gui {
    let mut gui = headless();
    for folder in ["a", "b", "c"] {
        for leaf in ["x", "y", "z"] {
            gui.toggle(&format!("{folder}/{leaf}"), false);
        }
        gui.open_window(folder).unwrap();
    }
    frame(&mut gui);
    gui
}

#[derive(Debug, Clone)]
enum StackOp {
    Open(usize),
    Close(usize),
    Hide(usize),
    ToggleHidden(usize),
    Raise(usize),
}

fn stack_op() -> impl Strategy<Value = StackOp> {
    prop_oneof![
        (0..3usize).prop_map(StackOp::Open),
        (0..3usize).prop_map(StackOp::Close),
        (0..3usize).prop_map(StackOp::Hide),
        (0..3usize).prop_map(StackOp::ToggleHidden),
        (0..3usize).prop_map(StackOp::Raise),
    ]
}

const FOLDERS: [&str; 3] = ["a", "b", "c"];

proptest! {
    #[test]
    fn pointer_reaches_only_the_topmost_window_and_one_node(
        points in prop::collection::vec((0.0f32..700.0, 0.0f32..400.0), 1..40)
    ) {
        let mut gui = crowded();
        for (x, y) in points {
            let p = Point::new(x, y);
            gui.handle_event(&PointerEvent::moved(x, y).into());

            let hovered = gui.tree().iter().filter(|n| n.is_hovered()).count();
            prop_assert!(hovered <= 1);

            let topmost = gui
                .windows()
                .iter_top_down()
                .find(|w| w.bounds().contains(p))
                .map(|w| w.id());
            match EventRouter::hit_test(p, gui.tree(), gui.windows()) {
                Some(HitTarget::Node { window, node }) => {
                    prop_assert_eq!(Some(window), topmost);
                    prop_assert_eq!(gui.router().hovered(), Some(node));
                }
                Some(other) => {
                    prop_assert_eq!(Some(other.window()), topmost);
                    prop_assert_eq!(gui.router().hovered(), None);
                }
                None => {
                    prop_assert_eq!(topmost, None);
                    prop_assert_eq!(gui.router().hovered(), None);
                }
            }
        }
    }

    #[test]
    fn window_stack_stays_consistent(ops in prop::collection::vec(stack_op(), 0..60)) {
        let mut gui = crowded();
        let root = gui.root_window();
        for op in ops {
            match op {
                StackOp::Open(i) => {
                    gui.open_window(FOLDERS[i]).unwrap();
                }
                StackOp::Close(i) => {
                    if let Some(w) = gui.windows().find_by_folder(node_id(&gui, FOLDERS[i])) {
                        gui.close_window(w);
                    }
                }
                StackOp::Hide(i) => {
                    if let Some(w) = gui.windows().find_by_folder(node_id(&gui, FOLDERS[i])) {
                        gui.windows_mut().hide(w);
                    }
                }
                StackOp::ToggleHidden(i) => {
                    if let Some(w) = gui.windows().find_by_folder(node_id(&gui, FOLDERS[i])) {
                        gui.windows_mut().toggle_hidden(w);
                    }
                }
                StackOp::Raise(i) => {
                    if let Some(w) = gui.windows().find_by_folder(node_id(&gui, FOLDERS[i])) {
                        gui.windows_mut().raise(w);
                    }
                }
            }

            prop_assert_eq!(gui.windows().find_by_folder(NodeId::ROOT), Some(root));
            prop_assert!(gui.windows().len() <= 4);

            let mut folders: Vec<NodeId> =
                gui.windows().ids_bottom_up().iter().map(|&w| gui.windows().get(w).unwrap().folder()).collect();
            let count = folders.len();
            folders.sort_by_key(|f| f.index());
            folders.dedup();
            prop_assert_eq!(folders.len(), count);

            let bottom_up: Vec<WindowId> = gui.windows().iter_bottom_up().map(|w| w.id()).collect();
            let mut top_down: Vec<WindowId> = gui.windows().iter_top_down().map(|w| w.id()).collect();
            top_down.reverse();
            prop_assert_eq!(bottom_up, top_down);
        }
    }
}
