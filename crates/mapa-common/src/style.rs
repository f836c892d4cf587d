//! Render styling: colours, boundary style, marker symbols.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default boundary fill.
pub const DEFAULT_FILL: Color = Color::rgb(0x04, 0x4c, 0x6d);
/// Default boundary stroke.
pub const DEFAULT_BORDER: Color = Color::rgb(0xff, 0xff, 0xff);
/// Default glyph marker colour.
pub const DEFAULT_MARKER: Color = Color::rgb(0xf9, 0xb3, 0x47);
/// Default boundary stroke width in points.
pub const DEFAULT_BORDER_THICKNESS: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid colour '{0}': expected #rgb, #rrggbb, #rrggbbaa or a named colour")]
pub struct ColorParseError(pub String);

/// An sRGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    fn from_named(name: &str) -> Option<Self> {
        let color = match name {
            "white" => Self::WHITE,
            "black" => Self::BLACK,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            _ => return None,
        };
        Some(color)
    }
}

fn hex_pair(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

fn hex_nibble(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok().map(|v| v * 17)
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim().to_ascii_lowercase();
        let err = || ColorParseError(input.to_string());

        let Some(hex) = s.strip_prefix('#') else {
            return Self::from_named(&s).ok_or_else(err);
        };
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }

        let parsed = match hex.len() {
            3 => (|| {
                Some(Color::rgb(
                    hex_nibble(&hex[0..1])?,
                    hex_nibble(&hex[1..2])?,
                    hex_nibble(&hex[2..3])?,
                ))
            })(),
            6 | 8 => (|| {
                let a = if hex.len() == 8 {
                    hex_pair(&hex[6..8])?
                } else {
                    255
                };
                Some(Color::rgba(
                    hex_pair(&hex[0..2])?,
                    hex_pair(&hex[2..4])?,
                    hex_pair(&hex[4..6])?,
                    a,
                ))
            })(),
            _ => None,
        };
        parsed.ok_or_else(err)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Boundary styling and panel toggles for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub fill_color: Color,
    pub border_color: Color,
    /// Stroke width in points. Zero disables the border entirely.
    pub border_thickness: f32,
    pub show_axes: bool,
    pub show_legend: bool,
    pub show_compass: bool,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            fill_color: DEFAULT_FILL,
            border_color: DEFAULT_BORDER,
            border_thickness: DEFAULT_BORDER_THICKNESS,
            show_axes: false,
            show_legend: true,
            show_compass: true,
        }
    }
}

impl RenderStyle {
    /// Stroke width, with negative or non-finite input treated as zero.
    pub fn effective_border_thickness(&self) -> f32 {
        if self.border_thickness.is_finite() && self.border_thickness > 0.0 {
            self.border_thickness
        } else {
            0.0
        }
    }

    pub fn draws_border(&self) -> bool {
        self.effective_border_thickness() > 0.0
    }
}

/// Glyph shapes available for point markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarkerSymbol {
    #[default]
    #[serde(rename = "o", alias = "circle")]
    Circle,
    #[serde(rename = "s", alias = "square")]
    Square,
    #[serde(rename = "^", alias = "triangle")]
    Triangle,
    #[serde(rename = "D", alias = "diamond")]
    Diamond,
    #[serde(rename = "*", alias = "star")]
    Star,
}

impl MarkerSymbol {
    pub const ALL: [MarkerSymbol; 5] = [
        MarkerSymbol::Circle,
        MarkerSymbol::Square,
        MarkerSymbol::Triangle,
        MarkerSymbol::Diamond,
        MarkerSymbol::Star,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            MarkerSymbol::Circle => "o",
            MarkerSymbol::Square => "s",
            MarkerSymbol::Triangle => "^",
            MarkerSymbol::Diamond => "D",
            MarkerSymbol::Star => "*",
        }
    }
}
