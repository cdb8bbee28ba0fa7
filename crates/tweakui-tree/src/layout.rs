//! Row metrics for laying out nodes inside a window.
//!
//! Every node occupies one row of `cell` height. Widths are measured from
//! the display name with `unicode-width`, so wide glyphs count double.

use unicode_width::UnicodeWidthStr;

/// Space reserved to the right of the label for the value readout, in cells.
pub const VALUE_AREA_CELLS: f32 = 3.0;

/// Space reserved to the right of a folder label for its window icon, in cells.
pub const FOLDER_ICON_CELLS: f32 = 1.0;

/// Pixel metrics shared by layout and hit testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Row height and the unit for window chrome (title bar, close button).
    pub cell: f32,
    /// Advance of one narrow character.
    pub char_width: f32,
    /// Horizontal padding on each side of a label.
    pub padding: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            cell: 24.0,
            char_width: 8.0,
            padding: 6.0,
        }
    }
}

impl LayoutMetrics {
    /// Create metrics for a given cell size, deriving the other fields.
    #[must_use]
    pub fn with_cell(cell: f32) -> Self {
        Self {
            cell,
            char_width: cell / 3.0,
            padding: cell / 4.0,
        }
    }

    /// Rendered width of `text` in pixels.
    #[must_use]
    pub fn text_width(&self, text: &str) -> f32 {
        text.width() as f32 * self.char_width
    }

    /// Width needed for a label followed by `extra_cells` of fixed content.
    #[must_use]
    pub fn row_width(&self, label: &str, extra_cells: f32) -> f32 {
        self.text_width(label) + self.padding * 2.0 + extra_cells * self.cell
    }
}
