//! Nodes and per-variant interaction behavior.
//!
//! A [`Node`] is one entry of the tree: its identity (`id`, `path`), its
//! place in the hierarchy (`parent`), the variant payload ([`NodeKind`]) and
//! the per-frame interaction fields that the router drives (`hovered`,
//! `dragged`, `layout`).
//!
//! Behavior is dispatched by `match` over the closed [`NodeKind`] enum. A
//! handler never reaches into windows or storage; it reports what happened
//! as a [`NodeResponse`] and the caller acts on it.
//!
//! # Invariants
//!
//! 1. A node's `path` never changes after creation.
//! 2. Unconstrained sliders never clamp; constrained sliders keep
//!    `min <= value <= max` through every interaction.
//! 3. An integer slider's precision is never below 1.
//! 4. Only folders have children.

use std::fmt;

use tweakui_core::event::{KeyCode, KeyEvent};
use tweakui_core::geometry::{Point, Rect, Size};
use tweakui_core::path::PathKey;

use crate::error::ValueError;
use crate::layout::{FOLDER_ICON_CELLS, LayoutMetrics, VALUE_AREA_CELLS};
use crate::value::{Color, GradientStop, NodeValue};

/// Default drag precision of a float slider (value change per pixel).
pub const DEFAULT_PRECISION: f32 = 0.1;
/// Default drag precision of an integer slider.
pub const DEFAULT_INT_PRECISION: f32 = 1.0;
/// Lowest precision a float slider can be stepped down to.
pub const MIN_PRECISION: f32 = 0.0001;
/// Highest precision any slider can be stepped up to.
pub const MAX_PRECISION: f32 = 10_000.0;

/// Hue change per horizontal pixel of a color drag.
pub const HUE_PER_PIXEL: f32 = 0.002;
/// Brightness change per vertical pixel of a color drag. Dragging down darkens.
pub const BRIGHTNESS_PER_PIXEL: f32 = 0.005;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Index of a node slot in its [`NodeTree`](crate::NodeTree).
///
/// Slots are never reused, so a stale id resolves to nothing rather than to
/// an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The root folder.
    pub const ROOT: NodeId = NodeId(0);

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fieldless discriminant of [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeVariant {
    Folder,
    Slider,
    SliderInt,
    Toggle,
    Button,
    ColorPicker,
    Gradient,
    ImagePicker,
    SaveEntry,
}

impl NodeVariant {
    /// Lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NodeVariant::Folder => "folder",
            NodeVariant::Slider => "slider",
            NodeVariant::SliderInt => "slider_int",
            NodeVariant::Toggle => "toggle",
            NodeVariant::Button => "button",
            NodeVariant::ColorPicker => "color_picker",
            NodeVariant::Gradient => "gradient",
            NodeVariant::ImagePicker => "image_picker",
            NodeVariant::SaveEntry => "save_entry",
        }
    }

    /// Transient variants are rebuilt on demand and never persisted.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, NodeVariant::SaveEntry)
    }
}

impl fmt::Display for NodeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Variant payloads ────────────────────────────────────────────────────────

/// Folder payload: ordered child ids, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folder {
    pub(crate) children: Vec<NodeId>,
}

impl Folder {
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Shared payload of float and integer sliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    pub value: f32,
    pub min: f32,
    pub max: f32,
    /// Whether `min`/`max` are enforced.
    pub constrained: bool,
    /// Value change per pixel of horizontal drag.
    pub precision: f32,
}

impl Slider {
    /// Unconstrained slider with the float default precision.
    #[must_use]
    pub fn new(default: f32) -> Self {
        Self {
            value: default,
            min: -f32::MAX,
            max: f32::MAX,
            constrained: false,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Slider constrained to `[min, max]`. Swapped bounds are reordered and
    /// the default is clamped into range.
    #[must_use]
    pub fn ranged(default: f32, min: f32, max: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            value: default.clamp(min, max),
            min,
            max,
            constrained: true,
            precision: DEFAULT_PRECISION,
        }
    }

    #[must_use]
    pub fn with_precision(mut self, precision: f32) -> Self {
        self.precision = precision;
        self
    }

    fn set(&mut self, value: f32) -> bool {
        let value = if self.constrained {
            value.clamp(self.min, self.max)
        } else {
            value
        };
        if !value.is_finite() || value == self.value {
            return false;
        }
        self.value = value;
        true
    }

    fn check(&self, value: f32) -> Result<(), ValueError> {
        let in_range = !self.constrained || (self.min..=self.max).contains(&value);
        if value.is_finite() && in_range {
            Ok(())
        } else {
            Err(ValueError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggle {
    pub value: bool,
}

/// A momentary button. `pressed` is a one-frame pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Button {
    pub pressed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorPicker {
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    /// Black-to-white gradient with the given alpha on both stops.
    #[must_use]
    pub fn with_alpha(alpha: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            stops: vec![
                GradientStop::new(0.0, Color::hsba(0.0, 0.0, 0.0, alpha)),
                GradientStop::new(1.0, Color::hsba(0.0, 0.0, 1.0, alpha)),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePicker {
    pub file_path: String,
}

/// Transient entry naming one save file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    pub name: String,
}

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Folder(Folder),
    Slider(Slider),
    SliderInt(Slider),
    Toggle(Toggle),
    Button(Button),
    ColorPicker(ColorPicker),
    Gradient(Gradient),
    ImagePicker(ImagePicker),
    SaveEntry(SaveEntry),
}

impl NodeKind {
    #[must_use]
    pub fn folder() -> Self {
        NodeKind::Folder(Folder::default())
    }

    #[must_use]
    pub fn slider(default: f32) -> Self {
        NodeKind::Slider(Slider::new(default))
    }

    #[must_use]
    pub fn slider_range(default: f32, min: f32, max: f32) -> Self {
        NodeKind::Slider(Slider::ranged(default, min, max))
    }

    #[must_use]
    pub fn slider_int(default: i32) -> Self {
        NodeKind::SliderInt(
            Slider::new(default as f32).with_precision(DEFAULT_INT_PRECISION),
        )
    }

    #[must_use]
    pub fn slider_int_range(default: i32, min: i32, max: i32) -> Self {
        NodeKind::SliderInt(
            Slider::ranged(default as f32, min as f32, max as f32)
                .with_precision(DEFAULT_INT_PRECISION),
        )
    }

    #[must_use]
    pub fn toggle(default: bool) -> Self {
        NodeKind::Toggle(Toggle { value: default })
    }

    #[must_use]
    pub fn button() -> Self {
        NodeKind::Button(Button::default())
    }

    #[must_use]
    pub fn color_picker(default: Color) -> Self {
        NodeKind::ColorPicker(ColorPicker { color: default })
    }

    #[must_use]
    pub fn gradient(alpha: f32) -> Self {
        NodeKind::Gradient(Gradient::with_alpha(alpha))
    }

    #[must_use]
    pub fn image_picker(default_path: impl Into<String>) -> Self {
        NodeKind::ImagePicker(ImagePicker {
            file_path: default_path.into(),
        })
    }

    #[must_use]
    pub fn save_entry(name: impl Into<String>) -> Self {
        NodeKind::SaveEntry(SaveEntry { name: name.into() })
    }

    #[must_use]
    pub const fn variant(&self) -> NodeVariant {
        match self {
            NodeKind::Folder(_) => NodeVariant::Folder,
            NodeKind::Slider(_) => NodeVariant::Slider,
            NodeKind::SliderInt(_) => NodeVariant::SliderInt,
            NodeKind::Toggle(_) => NodeVariant::Toggle,
            NodeKind::Button(_) => NodeVariant::Button,
            NodeKind::ColorPicker(_) => NodeVariant::ColorPicker,
            NodeKind::Gradient(_) => NodeVariant::Gradient,
            NodeKind::ImagePicker(_) => NodeVariant::ImagePicker,
            NodeKind::SaveEntry(_) => NodeVariant::SaveEntry,
        }
    }

    /// The persisted value, or `None` for variants that have none.
    #[must_use]
    pub fn value(&self) -> Option<NodeValue> {
        match self {
            NodeKind::Slider(s) | NodeKind::SliderInt(s) => Some(NodeValue::Float(s.value)),
            NodeKind::Toggle(t) => Some(NodeValue::Bool(t.value)),
            NodeKind::ColorPicker(c) => Some(NodeValue::Color(c.color)),
            NodeKind::Gradient(g) => Some(NodeValue::Gradient(g.stops.clone())),
            NodeKind::ImagePicker(i) => Some(NodeValue::Image(i.file_path.clone())),
            NodeKind::Folder(_) | NodeKind::Button(_) | NodeKind::SaveEntry(_) => None,
        }
    }

    /// Validate `value` against this variant and store it.
    ///
    /// On error the payload is left untouched.
    pub fn apply_value(&mut self, value: &NodeValue) -> Result<(), ValueError> {
        let variant = self.variant();
        match (self, value) {
            (NodeKind::Slider(s) | NodeKind::SliderInt(s), NodeValue::Float(v)) => {
                s.check(*v)?;
                s.value = *v;
            }
            (NodeKind::Toggle(t), NodeValue::Bool(v)) => t.value = *v,
            (NodeKind::ColorPicker(c), NodeValue::Color(v)) => {
                check_color(v)?;
                c.color = *v;
            }
            (NodeKind::Gradient(g), NodeValue::Gradient(stops)) => {
                for stop in stops {
                    check_unit(stop.position)?;
                    check_color(&stop.color)?;
                }
                g.stops = stops.clone();
            }
            (NodeKind::ImagePicker(i), NodeValue::Image(path)) => i.file_path = path.clone(),
            (NodeKind::Folder(_) | NodeKind::Button(_) | NodeKind::SaveEntry(_), _) => {
                return Err(ValueError::NotPersisted(variant));
            }
            (_, other) => {
                return Err(ValueError::TypeMismatch {
                    variant,
                    found: other.kind_name(),
                });
            }
        }
        Ok(())
    }
}

fn check_unit(value: f32) -> Result<(), ValueError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValueError::OutOfRange {
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

fn check_color(color: &Color) -> Result<(), ValueError> {
    [color.hue, color.saturation, color.brightness, color.alpha]
        .into_iter()
        .try_for_each(check_unit)
}

// ─── Node ────────────────────────────────────────────────────────────────────

/// What an interaction did, for the caller to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeResponse {
    /// Nothing observable changed.
    None,
    /// The node's value changed.
    Changed,
    /// A button fired.
    Pressed,
    /// A folder asks for its window.
    OpenWindow { folder: NodeId },
    /// A save entry asks for its file to be loaded.
    LoadSave { name: String },
}

/// One entry of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    path: PathKey,
    parent: Option<NodeId>,
    kind: NodeKind,
    default_value: Option<NodeValue>,
    layout: Rect,
    hovered: bool,
    dragged: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, path: PathKey, parent: Option<NodeId>, kind: NodeKind) -> Self {
        let default_value = kind.value();
        Self {
            id,
            path,
            parent,
            kind,
            default_value,
            layout: Rect::default(),
            hovered: false,
            dragged: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn path(&self) -> &PathKey {
        &self.path
    }

    /// Display name: the last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Containing folder. `None` only for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    #[must_use]
    pub fn variant(&self) -> NodeVariant {
        self.kind.variant()
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder(_))
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.variant().is_transient()
    }

    /// Child ids in declaration order. Empty for non-folders.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Folder(folder) => folder.children(),
            _ => &[],
        }
    }

    /// The value declared at creation.
    #[must_use]
    pub fn default_value(&self) -> Option<&NodeValue> {
        self.default_value.as_ref()
    }

    /// Current persisted value.
    #[must_use]
    pub fn value(&self) -> Option<NodeValue> {
        self.kind.value()
    }

    pub fn apply_value(&mut self, value: &NodeValue) -> Result<(), ValueError> {
        self.kind.apply_value(value)
    }

    /// Restore the value declared at creation. Returns whether anything changed.
    pub fn reset_to_default(&mut self) -> bool {
        let Some(default) = self.default_value.clone() else {
            return false;
        };
        if self.kind.value().as_ref() == Some(&default) {
            return false;
        }
        self.kind.apply_value(&default).is_ok()
    }

    /// Row rect in window-local content space.
    #[must_use]
    pub fn layout(&self) -> Rect {
        self.layout
    }

    pub fn set_layout(&mut self, rect: Rect) {
        self.layout = rect;
    }

    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    #[must_use]
    pub fn is_dragged(&self) -> bool {
        self.dragged
    }

    pub fn set_dragged(&mut self, dragged: bool) {
        self.dragged = dragged;
    }

    // ─── Behavior ────────────────────────────────────────────────────────────

    /// Pointer pressed on this node. `_local` is in window content space.
    pub fn on_pointer_down(&mut self, _local: Point) -> NodeResponse {
        match &mut self.kind {
            NodeKind::Folder(_) => NodeResponse::OpenWindow { folder: self.id },
            NodeKind::Toggle(t) => {
                t.value = !t.value;
                NodeResponse::Changed
            }
            NodeKind::Button(b) => {
                b.pressed = true;
                NodeResponse::Pressed
            }
            NodeKind::SaveEntry(entry) => NodeResponse::LoadSave {
                name: entry.name.clone(),
            },
            NodeKind::Slider(_)
            | NodeKind::SliderInt(_)
            | NodeKind::ColorPicker(_)
            | NodeKind::Gradient(_)
            | NodeKind::ImagePicker(_) => NodeResponse::None,
        }
    }

    /// Pointer moved while this node holds the drag latch.
    pub fn on_drag_continue(&mut self, _local: Point, delta: Point) -> NodeResponse {
        let changed = match &mut self.kind {
            NodeKind::Slider(s) | NodeKind::SliderInt(s) => {
                let next = s.value + delta.x * s.precision;
                s.set(next)
            }
            NodeKind::ColorPicker(c) => {
                let before = c.color;
                c.color.hue = (c.color.hue + delta.x * HUE_PER_PIXEL).rem_euclid(1.0);
                c.color.brightness =
                    (c.color.brightness - delta.y * BRIGHTNESS_PER_PIXEL).clamp(0.0, 1.0);
                c.color != before
            }
            _ => false,
        };
        if changed {
            NodeResponse::Changed
        } else {
            NodeResponse::None
        }
    }

    /// The drag latch on this node was released.
    pub fn on_drag_end(&mut self, _local: Point) -> NodeResponse {
        NodeResponse::None
    }

    /// Key press routed to this node while hovered.
    pub fn on_key(&mut self, key: &KeyEvent) -> NodeResponse {
        let KeyCode::Char(c) = key.code else {
            return NodeResponse::None;
        };
        if c == 'r' {
            return if self.reset_to_default() {
                NodeResponse::Changed
            } else {
                NodeResponse::None
            };
        }
        let (slider, floor) = match &mut self.kind {
            NodeKind::Slider(s) => (s, MIN_PRECISION),
            NodeKind::SliderInt(s) => (s, DEFAULT_INT_PRECISION),
            _ => return NodeResponse::None,
        };
        match c {
            '+' | '=' => slider.precision = (slider.precision * 10.0).min(MAX_PRECISION),
            '-' => slider.precision = (slider.precision / 10.0).max(floor),
            _ => {}
        }
        NodeResponse::None
    }

    /// Size of this node's row for the given metrics.
    #[must_use]
    pub fn compute_layout(&self, metrics: &LayoutMetrics) -> Size {
        let extra = match self.kind {
            NodeKind::Folder(_) => FOLDER_ICON_CELLS,
            NodeKind::Button(_) | NodeKind::SaveEntry(_) => 0.0,
            _ => VALUE_AREA_CELLS,
        };
        Size::new(metrics.row_width(self.name(), extra), metrics.cell)
    }

    /// Slider value as reported to the host. Integer sliders floor.
    #[must_use]
    pub fn slider_value(&self) -> Option<f32> {
        match &self.kind {
            NodeKind::Slider(s) => Some(s.value),
            NodeKind::SliderInt(s) => Some(s.value.floor()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &str, kind: NodeKind) -> Node {
        Node::new(NodeId(1), PathKey::parse(path).unwrap(), Some(NodeId::ROOT), kind)
    }

    fn drag(n: &mut Node, dx: f32, dy: f32) -> NodeResponse {
        n.on_drag_continue(Point::ZERO, Point::new(dx, dy))
    }

    #[test]
    fn variant_names_are_lowercase() {
        assert_eq!(NodeVariant::Slider.to_string(), "slider");
        assert_eq!(NodeVariant::SliderInt.to_string(), "slider_int");
        assert_eq!(NodeVariant::SaveEntry.to_string(), "save_entry");
        assert!(NodeVariant::SaveEntry.is_transient());
        assert!(!NodeVariant::Folder.is_transient());
        assert_eq!(NodeId(4).to_string(), "#4");
    }

    #[test]
    fn constrained_drag_clamps() {
        let mut n = node("speed", NodeKind::slider_range(5.0, 0.0, 10.0));
        assert_eq!(drag(&mut n, 100.0, 0.0), NodeResponse::Changed);
        assert_eq!(n.slider_value(), Some(10.0));
        assert_eq!(drag(&mut n, 10.0, 0.0), NodeResponse::None);
        drag(&mut n, -1000.0, 0.0);
        assert_eq!(n.slider_value(), Some(0.0));
    }

    #[test]
    fn unconstrained_drag_never_clamps() {
        let mut n = node("x", NodeKind::slider(0.0));
        drag(&mut n, -500.0, 0.0);
        assert!((n.slider_value().unwrap() + 50.0).abs() < 1e-3);
    }

    #[test]
    fn ranged_reorders_bounds_and_clamps_default() {
        let s = Slider::ranged(20.0, 10.0, 0.0);
        assert_eq!((s.min, s.max, s.value), (0.0, 10.0, 10.0));
    }

    #[test]
    fn int_slider_floors_and_keeps_precision_at_least_one() {
        let mut n = node("count", NodeKind::slider_int(3));
        drag(&mut n, 2.0, 0.0);
        assert_eq!(n.slider_value(), Some(5.0));
        n.on_key(&KeyEvent::char('-'));
        let NodeKind::SliderInt(s) = n.kind() else {
            panic!("expected int slider");
        };
        assert_eq!(s.precision, 1.0);

        n.apply_value(&NodeValue::Float(7.9)).unwrap();
        assert_eq!(n.slider_value(), Some(7.0));
    }

    #[test]
    fn precision_keys_scale_by_ten() {
        let mut n = node("x", NodeKind::slider(0.0));
        n.on_key(&KeyEvent::char('+'));
        n.on_key(&KeyEvent::char('='));
        let NodeKind::Slider(s) = n.kind() else {
            panic!("expected slider");
        };
        assert!((s.precision - 10.0).abs() < 1e-4);
        for _ in 0..20 {
            n.on_key(&KeyEvent::char('-'));
        }
        let NodeKind::Slider(s) = n.kind() else {
            panic!("expected slider");
        };
        assert_eq!(s.precision, MIN_PRECISION);
    }

    #[test]
    fn reset_key_restores_declared_default() {
        let mut n = node("speed", NodeKind::slider_range(5.0, 0.0, 10.0));
        drag(&mut n, 20.0, 0.0);
        assert_eq!(n.on_key(&KeyEvent::char('r')), NodeResponse::Changed);
        assert_eq!(n.slider_value(), Some(5.0));
        assert_eq!(n.on_key(&KeyEvent::char('r')), NodeResponse::None);
    }

    #[test]
    fn toggle_flips_on_down() {
        let mut n = node("on", NodeKind::toggle(false));
        assert_eq!(n.on_pointer_down(Point::ZERO), NodeResponse::Changed);
        assert_eq!(n.value(), Some(NodeValue::Bool(true)));
        n.on_pointer_down(Point::ZERO);
        assert_eq!(n.value(), Some(NodeValue::Bool(false)));
    }

    #[test]
    fn button_pulses() {
        let mut n = node("go", NodeKind::button());
        assert_eq!(n.on_pointer_down(Point::ZERO), NodeResponse::Pressed);
        assert!(matches!(n.kind(), NodeKind::Button(Button { pressed: true })));
        assert_eq!(n.value(), None);
    }

    #[test]
    fn folder_and_save_entry_responses() {
        let mut folder = node("fx", NodeKind::folder());
        assert_eq!(
            folder.on_pointer_down(Point::ZERO),
            NodeResponse::OpenWindow { folder: NodeId(1) }
        );
        let mut entry = node("saves/a", NodeKind::save_entry("a"));
        assert_eq!(
            entry.on_pointer_down(Point::ZERO),
            NodeResponse::LoadSave { name: "a".into() }
        );
    }

    #[test]
    fn color_drag_wraps_hue_and_clamps_brightness() {
        let mut n = node("tint", NodeKind::color_picker(Color::hsba(0.9, 1.0, 0.5, 1.0)));
        drag(&mut n, 100.0, 0.0);
        let NodeKind::ColorPicker(c) = n.kind() else {
            panic!("expected color picker");
        };
        assert!((c.color.hue - 0.1).abs() < 1e-4);

        drag(&mut n, 0.0, -1000.0);
        let NodeKind::ColorPicker(c) = n.kind() else {
            panic!("expected color picker");
        };
        assert_eq!(c.color.brightness, 1.0);
    }

    #[test]
    fn apply_value_rejects_mismatch_and_range() {
        let mut n = node("speed", NodeKind::slider_range(5.0, 0.0, 10.0));
        assert_eq!(
            n.apply_value(&NodeValue::Bool(true)),
            Err(ValueError::TypeMismatch {
                variant: NodeVariant::Slider,
                found: "bool"
            })
        );
        assert!(matches!(
            n.apply_value(&NodeValue::Float(15.0)),
            Err(ValueError::OutOfRange { .. })
        ));
        assert!(n.apply_value(&NodeValue::Float(f32::NAN)).is_err());
        assert_eq!(n.slider_value(), Some(5.0));

        let mut folder = node("fx", NodeKind::folder());
        assert_eq!(
            folder.apply_value(&NodeValue::Float(1.0)),
            Err(ValueError::NotPersisted(NodeVariant::Folder))
        );
    }

    #[test]
    fn gradient_validates_stops() {
        let mut n = node("grad", NodeKind::gradient(1.0));
        let bad = vec![GradientStop::new(1.5, Color::WHITE)];
        assert!(n.apply_value(&NodeValue::Gradient(bad)).is_err());
        let good = vec![GradientStop::new(0.5, Color::gray(0.5))];
        n.apply_value(&NodeValue::Gradient(good.clone())).unwrap();
        assert_eq!(n.value(), Some(NodeValue::Gradient(good)));
    }

    #[test]
    fn default_value_is_recorded_at_creation() {
        let mut n = node("img", NodeKind::image_picker("a.png"));
        n.apply_value(&NodeValue::Image("b.png".into())).unwrap();
        assert_eq!(n.default_value(), Some(&NodeValue::Image("a.png".into())));
        assert!(n.reset_to_default());
        assert_eq!(n.value(), Some(NodeValue::Image("a.png".into())));
    }

    #[test]
    fn compute_layout_uses_label_width() {
        let m = LayoutMetrics::default();
        let short = node("a", NodeKind::slider(0.0)).compute_layout(&m);
        let long = node("a_much_longer_label", NodeKind::slider(0.0)).compute_layout(&m);
        assert_eq!(short.height, m.cell);
        assert!(long.width > short.width);
        let button = node("a", NodeKind::button()).compute_layout(&m);
        assert!(button.width < short.width);
    }
}
