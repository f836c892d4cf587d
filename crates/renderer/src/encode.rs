//! Figure to PNG and data URI.

use base64::Engine;
use mapa_common::MapError;
use rayon::prelude::*;
use tiny_skia::Pixmap;
use tracing::{debug, error};

use crate::figure::Figure;
use crate::png::{create_png_auto_with, PngOptions};

/// Padding kept around the drawn content when cropping.
pub const TIGHT_PADDING_INCHES: f32 = 0.1;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// A finished render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMap {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedMap {
    /// `data:image/png;base64,<payload>`
    pub fn data_uri(&self) -> String {
        let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + self.png.len() * 4 / 3 + 4);
        uri.push_str(DATA_URI_PREFIX);
        base64::engine::general_purpose::STANDARD.encode_string(&self.png, &mut uri);
        uri
    }

    /// Decode the PNG bytes back out of a data URI.
    pub fn payload_from_data_uri(uri: &str) -> Result<Vec<u8>, MapError> {
        let (_, payload) = uri
            .split_once(',')
            .ok_or_else(|| MapError::invalid_parameter("image", "expected a data URI"))?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| MapError::invalid_parameter("image", format!("invalid base64: {e}")))
    }
}

/// Crop to the drawn content and encode as PNG.
///
/// Takes the figure by value; its pixel buffer is dropped when this returns,
/// whatever the outcome.
pub fn encode_figure(figure: Figure) -> Result<RenderedMap, MapError> {
    let padding = figure.points_to_px(TIGHT_PADDING_INCHES * 72.0).round() as u32;
    let dpi = figure.dpi();
    let pixmap = figure.into_pixmap();

    let (x0, y0, x1, y1) = match content_bounds(&pixmap) {
        Some((x0, y0, x1, y1)) => (
            x0.saturating_sub(padding),
            y0.saturating_sub(padding),
            (x1 + padding).min(pixmap.width() - 1),
            (y1 + padding).min(pixmap.height() - 1),
        ),
        // Nothing drawn: keep the whole canvas.
        None => (0, 0, pixmap.width() - 1, pixmap.height() - 1),
    };

    let width = x1 - x0 + 1;
    let height = y1 - y0 + 1;
    let rgba = crop_demultiplied(&pixmap, x0, y0, width, height);
    drop(pixmap);

    let png = create_png_auto_with(&rgba, width as usize, height as usize, &PngOptions::with_dpi(dpi))
        .map_err(|e| {
            error!(error = %e, width, height, "PNG encoding failed");
            MapError::Draw(format!("PNG encoding failed: {e}"))
        })?;

    debug!(width, height, bytes = png.len(), "Figure encoded");
    Ok(RenderedMap { png, width, height })
}

/// Inclusive bounds of pixels that differ from opaque white.
fn content_bounds(pixmap: &Pixmap) -> Option<(u32, u32, u32, u32)> {
    let width = pixmap.width() as usize;
    let rows: Vec<Option<(u32, u32)>> = pixmap
        .pixels()
        .par_chunks(width)
        .map(|row| {
            let is_ink = |p: &tiny_skia::PremultipliedColorU8| {
                !(p.red() == 255 && p.green() == 255 && p.blue() == 255 && p.alpha() == 255)
            };
            let first = row.iter().position(is_ink)?;
            let last = row.iter().rposition(is_ink)?;
            Some((first as u32, last as u32))
        })
        .collect();

    let y0 = rows.iter().position(Option::is_some)? as u32;
    let y1 = rows.iter().rposition(Option::is_some)? as u32;
    let (x0, x1) = rows
        .iter()
        .flatten()
        .fold((u32::MAX, 0u32), |(lo, hi), &(a, b)| (lo.min(a), hi.max(b)));
    Some((x0, y0, x1, y1))
}

/// Straight-alpha RGBA bytes of a sub-rectangle.
fn crop_demultiplied(pixmap: &Pixmap, x0: u32, y0: u32, width: u32, height: u32) -> Vec<u8> {
    let stride = pixmap.width() as usize;
    let pixels = pixmap.pixels();
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in y0..y0 + height {
        let start = y as usize * stride + x0 as usize;
        for p in &pixels[start..start + width as usize] {
            let c = p.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::RenderConfig;
    use tiny_skia::{Paint, Rect, Transform};

    fn config() -> RenderConfig {
        RenderConfig {
            figure_inches: 2.0,
            dpi: 50.0,
            ..Default::default()
        }
    }

    fn figure_with_square() -> Figure {
        let mut figure = Figure::new(&config()).unwrap();
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        figure.pixmap_mut().fill_rect(
            Rect::from_xywh(40.0, 30.0, 10.0, 20.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );
        figure
    }

    #[test]
    fn test_crop_adds_padding() {
        // 0.1 in at 50 dpi is 5 px on each side.
        let map = encode_figure(figure_with_square()).unwrap();
        assert_eq!((map.width, map.height), (20, 30));
    }

    #[test]
    fn test_blank_figure_is_not_cropped() {
        let map = encode_figure(Figure::new(&config()).unwrap()).unwrap();
        assert_eq!((map.width, map.height), (100, 100));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = encode_figure(figure_with_square()).unwrap();
        let b = encode_figure(figure_with_square()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let map = encode_figure(figure_with_square()).unwrap();
        let uri = map.data_uri();
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
        assert_eq!(RenderedMap::payload_from_data_uri(&uri).unwrap(), map.png);
    }

    #[test]
    fn test_payload_rejects_garbage() {
        assert!(RenderedMap::payload_from_data_uri("not a uri").is_err());
        assert!(RenderedMap::payload_from_data_uri("data:image/png;base64,!!").is_err());
    }
}
