#![forbid(unsafe_code)]

//! Overlay configuration.
//!
//! # Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TWEAKUI_HIDDEN` | `1`/`true` starts the overlay hidden |
//! | `TWEAKUI_SAVE_DIR` | Directory for save files; enables file storage |

use std::env;
use std::path::PathBuf;

use tweakui_core::geometry::Point;
use tweakui_tree::LayoutMetrics;

use crate::window_manager::{DEFAULT_CASCADE_ORIGIN, DEFAULT_CASCADE_STEP, DEFAULT_WINDOW_WIDTH};

/// Name of the folder that lists save files.
pub const DEFAULT_SAVES_FOLDER: &str = "saves";
/// Key that shows and hides the whole overlay.
pub const DEFAULT_HIDE_KEY: char = 'h';

/// Save and load behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Load the most recent save when the overlay is created.
    pub auto_load: bool,
    /// Directory for file storage. `None` leaves storage to the host.
    pub storage_dir: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            auto_load: true,
            storage_dir: None,
        }
    }
}

impl PersistenceConfig {
    /// No file storage and no auto-load.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            auto_load: false,
            storage_dir: None,
        }
    }

    /// File storage in `dir`.
    #[must_use]
    pub fn with_storage_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Enable or disable loading the latest save at startup.
    #[must_use]
    pub fn auto_load(mut self, enabled: bool) -> Self {
        self.auto_load = enabled;
        self
    }
}

/// Configuration for a [`Gui`](crate::Gui).
#[derive(Debug, Clone, PartialEq)]
pub struct GuiConfig {
    pub metrics: LayoutMetrics,
    /// Top-left of the root window.
    pub root_position: Point,
    /// Minimum width of every window.
    pub window_width: f32,
    /// Cap on visible content height; taller windows scroll.
    pub max_window_height: f32,
    /// First position for windows opened without an anchor.
    pub cascade_origin: Point,
    pub cascade_step: Point,
    pub visible_by_default: bool,
    pub hide_key: char,
    /// Name of the root-level folder listing saves.
    pub saves_folder: String,
    pub persistence: PersistenceConfig,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            metrics: LayoutMetrics::default(),
            root_position: Point::new(10.0, 10.0),
            window_width: DEFAULT_WINDOW_WIDTH,
            max_window_height: 600.0,
            cascade_origin: DEFAULT_CASCADE_ORIGIN,
            cascade_step: DEFAULT_CASCADE_STEP,
            visible_by_default: true,
            hide_key: DEFAULT_HIDE_KEY,
            saves_folder: DEFAULT_SAVES_FOLDER.to_owned(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl GuiConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let hidden = env::var("TWEAKUI_HIDDEN").ok();
        let save_dir = env::var("TWEAKUI_SAVE_DIR").ok();
        Self::default().with_env_values(hidden.as_deref(), save_dir.as_deref())
    }

    /// Apply already-read environment values.
    #[must_use]
    pub fn with_env_values(mut self, hidden: Option<&str>, save_dir: Option<&str>) -> Self {
        if let Some(value) = hidden {
            let value = value.trim();
            self.visible_by_default = !(value == "1" || value.eq_ignore_ascii_case("true"));
        }
        if let Some(dir) = save_dir.map(str::trim).filter(|d| !d.is_empty()) {
            self.persistence.storage_dir = Some(PathBuf::from(dir));
        }
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: LayoutMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn root_position(mut self, position: Point) -> Self {
        self.root_position = position;
        self
    }

    #[must_use]
    pub fn window_width(mut self, width: f32) -> Self {
        self.window_width = width;
        self
    }

    #[must_use]
    pub fn max_window_height(mut self, height: f32) -> Self {
        self.max_window_height = height;
        self
    }

    #[must_use]
    pub fn cascade(mut self, origin: Point, step: Point) -> Self {
        self.cascade_origin = origin;
        self.cascade_step = step;
        self
    }

    #[must_use]
    pub fn visible_by_default(mut self, visible: bool) -> Self {
        self.visible_by_default = visible;
        self
    }

    #[must_use]
    pub fn hide_key(mut self, key: char) -> Self {
        self.hide_key = key;
        self
    }

    #[must_use]
    pub fn saves_folder(mut self, name: impl Into<String>) -> Self {
        self.saves_folder = name.into();
        self
    }

    #[must_use]
    pub fn persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = persistence;
        self
    }
}
