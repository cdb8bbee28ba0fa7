#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! The host application owns the real input source (window system, game
//! loop, test script) and translates whatever it receives into these types
//! before handing them to the router.
//!
//! # Design Notes
//!
//! - Pointer coordinates are screen pixels, origin top-left.
//! - `KeyEventKind::Repeat` marks synthetic auto-repeat; the router ignores it.
//! - `Modifiers` use bitflags for easy combination.

use crate::geometry::Point;
use bitflags::bitflags;

/// Canonical input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A pointer (mouse, pen, touch) event.
    Pointer(PointerEvent),

    /// A keyboard event.
    Key(KeyEvent),
}

impl From<PointerEvent> for Event {
    fn from(event: PointerEvent) -> Self {
        Event::Pointer(event)
    }
}

impl From<KeyEvent> for Event {
    fn from(event: KeyEvent) -> Self {
        Event::Key(event)
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Shorthand for a character key press.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Whether this event was synthesized by keyboard auto-repeat.
    #[must_use]
    pub const fn is_repeat(&self) -> bool {
        matches!(self.kind, KeyEventKind::Repeat)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Up,
    Down,
    Left,
    Right,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (auto-repeat).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,

    /// X coordinate in screen pixels.
    pub x: f32,

    /// Y coordinate in screen pixels.
    pub y: f32,

    /// The button involved (for moves, the button held if any).
    pub button: PointerButton,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a new pointer event for the primary button.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    /// Primary button pressed at `(x, y)`.
    #[must_use]
    pub const fn down(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Down, x, y)
    }

    /// Pointer moved to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Move, x, y)
    }

    /// Primary button released at `(x, y)`.
    #[must_use]
    pub const fn up(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Up, x, y)
    }

    /// Wheel scrolled at `(x, y)`.
    #[must_use]
    pub const fn scroll(x: f32, y: f32, delta_x: f32, delta_y: f32) -> Self {
        Self::new(PointerEventKind::Scroll { delta_x, delta_y }, x, y)
    }

    /// Create a pointer event with a specific button.
    #[must_use]
    pub const fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Create a pointer event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Get the position as a point.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down,

    /// Pointer moved, with or without a button held.
    Move,

    /// Button released.
    Up,

    /// Wheel or trackpad scroll, in pixels.
    Scroll { delta_x: f32, delta_y: f32 },
}

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    /// Left mouse button or primary touch.
    #[default]
    Primary,

    /// Right mouse button.
    Secondary,

    /// Middle mouse button (scroll wheel click).
    Middle,
}
