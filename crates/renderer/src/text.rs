//! Label rendering with a TrueType font loaded at runtime.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use mapa_common::Color;
use rusttype::{point, Font, Scale};
use std::path::{Path, PathBuf};
use tiny_skia::{Pixmap, PixmapPaint, Transform};
use tracing::{debug, warn};

use crate::figure::rgba_image_to_pixmap;

/// Locations tried when no font path is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Width of one character relative to the font size, used without a font.
const FALLBACK_CHAR_WIDTH: f32 = 0.6;

/// Draws text onto pixmaps. Without a font every draw is a no-op, but
/// measurements still return estimates so layout stays stable.
#[derive(Clone, Default)]
pub struct TextRenderer {
    font: Option<Font<'static>>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl TextRenderer {
    /// Load the configured font, else the first system font found.
    pub fn load(font_path: Option<&Path>) -> Self {
        if let Some(path) = font_path {
            match read_font(path) {
                Some(font) => return Self { font: Some(font) },
                None => warn!(path = %path.display(), "Configured font could not be loaded"),
            }
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = PathBuf::from(candidate);
            if path.exists() {
                if let Some(font) = read_font(&path) {
                    debug!(path = %path.display(), "Using system font");
                    return Self { font: Some(font) };
                }
            }
        }

        warn!("No TrueType font available, labels will not be drawn");
        Self { font: None }
    }

    /// A renderer that never draws text.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(bytes).map(|font| Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height in pixels of `text` at `size_px`.
    pub fn measure(&self, text: &str, size_px: f32) -> (f32, f32) {
        match &self.font {
            Some(font) => {
                let scale = Scale::uniform(size_px);
                let v = font.v_metrics(scale);
                let width = font
                    .layout(text, scale, point(0.0, v.ascent))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0);
                (width, v.ascent - v.descent)
            }
            None => (
                text.chars().count() as f32 * size_px * FALLBACK_CHAR_WIDTH,
                size_px,
            ),
        }
    }

    /// Draw `text` with its top-left corner at (`x`, `y`).
    pub fn draw(&self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32, size_px: f32, color: Color) {
        let Some(font) = &self.font else {
            return;
        };
        if text.is_empty() || size_px <= 0.0 {
            return;
        }

        let (w, h) = self.measure(text, size_px);
        let pad = (size_px * 0.25).ceil();
        let patch_w = (w + 2.0 * pad).ceil().max(1.0) as u32;
        let patch_h = (h + 2.0 * pad).ceil().max(1.0) as u32;

        // Transparent patch in the text colour so edge blending has no fringe.
        let mut patch = RgbaImage::from_pixel(patch_w, patch_h, Rgba([color.r, color.g, color.b, 0]));
        draw_text_mut(
            &mut patch,
            Rgba(color.to_array()),
            pad as i32,
            pad as i32,
            Scale::uniform(size_px),
            font,
            text,
        );

        if let Some(patch) = rgba_image_to_pixmap(&patch) {
            pixmap.draw_pixmap(
                (x - pad).round() as i32,
                (y - pad).round() as i32,
                patch.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }
}

fn read_font(path: &Path) -> Option<Font<'static>> {
    let bytes = std::fs::read(path).ok()?;
    Font::try_from_vec(bytes)
}
