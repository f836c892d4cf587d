//! Compass rose artwork for the legend panel.

use mapa_common::MapError;
use std::path::Path;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::{debug, error};

use crate::figure::{rgba_image_to_pixmap, PixelRect};

const BUNDLED_SVG: &str = include_str!("../assets/compass_rose.svg");

/// Longer side of the rasterized artwork.
const RASTER_SIDE: f32 = 512.0;

/// A rasterized compass rose, ready to be scaled into the legend panel.
#[derive(Clone)]
pub struct Compass {
    pixmap: Pixmap,
}

impl std::fmt::Debug for Compass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compass")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish()
    }
}

impl Compass {
    /// The artwork shipped with the crate.
    pub fn bundled() -> Result<Self, MapError> {
        Self::from_svg(BUNDLED_SVG)
    }

    /// Load from a PNG or SVG file, else the bundled artwork.
    pub fn load(path: Option<&Path>) -> Result<Self, MapError> {
        let Some(path) = path else {
            return Self::bundled();
        };

        let bytes = std::fs::read(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Compass image not readable");
            MapError::AssetMissing(format!("{}: {e}", path.display()))
        })?;

        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);

        if is_svg {
            let text = String::from_utf8(bytes)
                .map_err(|e| MapError::AssetMissing(format!("{}: {e}", path.display())))?;
            Self::from_svg(&text)
        } else {
            Self::from_image_bytes(&bytes)
        }
    }

    pub fn from_svg(svg: &str) -> Result<Self, MapError> {
        let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
            .map_err(|e| MapError::AssetMissing(format!("compass SVG: {e}")))?;

        let size = tree.size();
        let scale = RASTER_SIDE / size.width().max(size.height());
        let width = (size.width() * scale).round() as u32;
        let height = (size.height() * scale).round() as u32;

        let mut pixmap = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| MapError::Draw("cannot allocate compass raster".to_string()))?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        debug!(width, height, "Compass rasterized");
        Ok(Self { pixmap })
    }

    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, MapError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| MapError::AssetMissing(format!("compass image: {e}")))?
            .to_rgba8();
        let pixmap = rgba_image_to_pixmap(&img)
            .ok_or_else(|| MapError::AssetMissing("compass image is empty".to_string()))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Draw scaled to fit `rect`, keeping the aspect ratio, centred.
    pub fn draw(&self, target: &mut Pixmap, rect: PixelRect) {
        let (w, h) = (self.pixmap.width() as f32, self.pixmap.height() as f32);
        let scale = (rect.width / w).min(rect.height / h);
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        let (cx, cy) = rect.center();
        let transform = Transform::from_row(scale, 0.0, 0.0, scale, cx - w * scale / 2.0, cy - h * scale / 2.0);

        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, transform, None);
    }
}
