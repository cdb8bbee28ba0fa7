//! Persisted value payloads.
//!
//! A [`NodeValue`] is the part of a node that survives a restart. It carries
//! no layout, hover or drag information, and transient variants have none.

use serde::{Deserialize, Serialize};

/// A color in normalized hue/saturation/brightness/alpha.
///
/// All channels are in `[0, 1]`. Hue wraps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub alpha: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::hsba(0.0, 0.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::hsba(0.0, 0.0, 0.0, 1.0);

    /// Create a color from normalized channels.
    #[must_use]
    pub const fn hsba(hue: f32, saturation: f32, brightness: f32, alpha: f32) -> Self {
        Self {
            hue,
            saturation,
            brightness,
            alpha,
        }
    }

    /// Opaque gray of the given brightness.
    #[must_use]
    pub const fn gray(brightness: f32) -> Self {
        Self::hsba(0.0, 0.0, brightness, 1.0)
    }

    /// Convert from packed `0xAARRGGBB`.
    #[must_use]
    pub fn from_argb(argb: u32) -> Self {
        let channel = |shift: u32| ((argb >> shift) & 0xFF) as f32 / 255.0;
        let (a, r, g, b) = (channel(24), channel(16), channel(8), channel(0));

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let saturation = if max <= 0.0 { 0.0 } else { delta / max };
        let hue = if delta <= 0.0 {
            0.0
        } else if max == r {
            ((g - b) / delta).rem_euclid(6.0) / 6.0
        } else if max == g {
            ((b - r) / delta + 2.0) / 6.0
        } else {
            ((r - g) / delta + 4.0) / 6.0
        };

        Self::hsba(hue, saturation, max, a)
    }

    /// Convert to packed `0xAARRGGBB`.
    #[must_use]
    pub fn to_argb(&self) -> u32 {
        let s = self.saturation.clamp(0.0, 1.0);
        let v = self.brightness.clamp(0.0, 1.0);
        let h = self.hue.rem_euclid(1.0) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (byte(self.alpha) << 24) | (byte(r) << 16) | (byte(g) << 8) | byte(b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One stop of a color gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub position: f32,
    pub color: Color,
}

impl GradientStop {
    #[must_use]
    pub const fn new(position: f32, color: Color) -> Self {
        Self { position, color }
    }
}

/// The persisted value of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NodeValue {
    /// Slider and integer slider value.
    Float(f32),
    /// Toggle state.
    Bool(bool),
    Color(Color),
    Gradient(Vec<GradientStop>),
    /// Image picker source path.
    Image(String),
}

impl NodeValue {
    /// Short name of the value kind, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            NodeValue::Float(_) => "float",
            NodeValue::Bool(_) => "bool",
            NodeValue::Color(_) => "color",
            NodeValue::Gradient(_) => "gradient",
            NodeValue::Image(_) => "image",
        }
    }
}
