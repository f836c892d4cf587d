//! Point markers: vector glyphs or a user-supplied icon.

use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use mapa_common::style::DEFAULT_MARKER;
use mapa_common::{Color, MapError, MarkerSymbol, PointSet};
use tiny_skia::{
    FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Transform,
};
use tracing::{debug, warn};

use crate::figure::{rgba_image_to_pixmap, DrawingContext};
use crate::png::create_png_auto;

/// Legend label used when a marker layer has no name.
pub const DEFAULT_LAYER_NAME: &str = "Pontos";

/// Icons larger than this (encoded) are thumbnailed.
pub const ICON_MAX_BYTES: usize = 5 * 1024;

/// Icons larger than this on either side are thumbnailed.
pub const ICON_MAX_SIDE: u32 = 32;

/// Glyph diameter in points per unit of marker size.
const POINTS_PER_SIZE: f32 = 10.0;

/// Inner/outer radius ratio of the five-pointed star.
const STAR_INNER_RATIO: f32 = 0.381966;

/// A vector marker drawn once per point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMarker {
    pub symbol: MarkerSymbol,
    pub color: Color,
    pub size: f32,
}

impl Default for GlyphMarker {
    fn default() -> Self {
        Self {
            symbol: MarkerSymbol::Circle,
            color: DEFAULT_MARKER,
            size: 1.0,
        }
    }
}

impl GlyphMarker {
    pub fn new(symbol: MarkerSymbol, color: Color, size: f32) -> Result<Self, MapError> {
        validate_size(size)?;
        Ok(Self {
            symbol,
            color,
            size,
        })
    }

    /// Glyph diameter in points.
    pub fn diameter_points(&self) -> f32 {
        self.size * POINTS_PER_SIZE
    }
}

fn validate_size(size: f32) -> Result<(), MapError> {
    if !size.is_finite() || size <= 0.0 {
        return Err(MapError::invalid_parameter(
            "marker.size",
            format!("must be a positive number, got {size}"),
        ));
    }
    Ok(())
}

/// A decoded marker image, already reduced to icon size.
#[derive(Clone)]
pub struct MarkerIcon {
    png: Vec<u8>,
    pixmap: Pixmap,
}

impl std::fmt::Debug for MarkerIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerIcon")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("bytes", &self.png.len())
            .finish()
    }
}

impl MarkerIcon {
    /// Decode a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, MapError> {
        let (_, payload) = uri.split_once(',').ok_or_else(|| {
            MapError::invalid_parameter("marker.image", "expected a data URI with a ',' separator")
        })?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| MapError::invalid_parameter("marker.image", format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Decode PNG, JPEG or GIF bytes and optimize them for use as an icon.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MapError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| MapError::invalid_parameter("marker.image", format!("undecodable image: {e}")))?;

        let (w, h) = img.dimensions();
        let needs_thumbnail = bytes.len() > ICON_MAX_BYTES || w > ICON_MAX_SIDE || h > ICON_MAX_SIDE;
        let img = if needs_thumbnail {
            let thumb = thumbnail(&img);
            debug!(
                from_bytes = bytes.len(),
                from_width = w,
                from_height = h,
                to_width = thumb.width(),
                to_height = thumb.height(),
                "Marker icon thumbnailed"
            );
            thumb
        } else {
            img
        };

        let rgba = img.to_rgba8();
        let png = create_png_auto(rgba.as_raw(), rgba.width() as usize, rgba.height() as usize)
            .map_err(|e| MapError::Draw(format!("icon re-encode failed: {e}")))?;
        let pixmap = rgba_image_to_pixmap(&rgba)
            .ok_or_else(|| MapError::invalid_parameter("marker.image", "image has no pixels"))?;

        Ok(Self { png, pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// The optimized icon as PNG.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Draw the icon scaled by `scale`, centred on (`cx`, `cy`), limited
    /// to `clip` when given.
    pub fn draw_at(&self, target: &mut Pixmap, cx: f32, cy: f32, scale: f32, clip: Option<&Mask>) {
        let (w, h) = (self.pixmap.width() as f32, self.pixmap.height() as f32);
        let transform = Transform::from_row(scale, 0.0, 0.0, scale, cx - w * scale / 2.0, cy - h * scale / 2.0);
        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, transform, clip);
    }
}

/// Fit within 32×32 keeping the aspect ratio, never enlarging.
fn thumbnail(img: &DynamicImage) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= ICON_MAX_SIDE && h <= ICON_MAX_SIDE {
        return img.clone();
    }
    img.resize(ICON_MAX_SIDE, ICON_MAX_SIDE, FilterType::Lanczos3)
}

/// How points are drawn.
#[derive(Debug, Clone)]
pub enum MarkerSpec {
    Glyph(GlyphMarker),
    Image { icon: MarkerIcon, size: f32 },
}

/// A marker style plus its legend label.
#[derive(Debug, Clone)]
pub struct MarkerLayer {
    pub spec: MarkerSpec,
    pub layer_name: String,
}

impl MarkerLayer {
    pub fn glyph(marker: GlyphMarker) -> Self {
        Self {
            spec: MarkerSpec::Glyph(marker),
            layer_name: DEFAULT_LAYER_NAME.to_string(),
        }
    }

    pub fn image(icon: MarkerIcon, size: f32) -> Result<Self, MapError> {
        validate_size(size)?;
        Ok(Self {
            spec: MarkerSpec::Image { icon, size },
            layer_name: DEFAULT_LAYER_NAME.to_string(),
        })
    }

    /// Set the legend label; blank names keep the default.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.layer_name = name;
        }
        self
    }
}

/// Outline of one glyph of diameter `d` pixels centred on (`cx`, `cy`).
pub(crate) fn push_glyph(pb: &mut PathBuilder, symbol: MarkerSymbol, cx: f32, cy: f32, d: f32) {
    let r = d / 2.0;
    match symbol {
        MarkerSymbol::Circle => pb.push_circle(cx, cy, r),
        MarkerSymbol::Square => {
            pb.move_to(cx - r, cy - r);
            pb.line_to(cx + r, cy - r);
            pb.line_to(cx + r, cy + r);
            pb.line_to(cx - r, cy + r);
            pb.close();
        }
        MarkerSymbol::Triangle => {
            pb.move_to(cx, cy - r);
            pb.line_to(cx + r, cy + r);
            pb.line_to(cx - r, cy + r);
            pb.close();
        }
        MarkerSymbol::Diamond => {
            let half = d * std::f32::consts::SQRT_2 / 2.0;
            pb.move_to(cx, cy - half);
            pb.line_to(cx + half, cy);
            pb.line_to(cx, cy + half);
            pb.line_to(cx - half, cy);
            pb.close();
        }
        MarkerSymbol::Star => {
            let inner = r * STAR_INNER_RATIO;
            for i in 0..10 {
                let radius = if i % 2 == 0 { r } else { inner };
                let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
                let (x, y) = (cx + radius * angle.cos(), cy + radius * angle.sin());
                if i == 0 {
                    pb.move_to(x, y);
                } else {
                    pb.line_to(x, y);
                }
            }
            pb.close();
        }
    }
}

pub(crate) fn glyph_path(symbol: MarkerSymbol, cx: f32, cy: f32, d: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    push_glyph(&mut pb, symbol, cx, cy, d);
    pb.finish()
}

pub(crate) fn fill_path(pixmap: &mut Pixmap, path: &Path, color: Color) {
    fill_path_clipped(pixmap, path, color, None);
}

fn fill_path_clipped(pixmap: &mut Pixmap, path: &Path, color: Color, clip: Option<&Mask>) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), clip);
}

/// Mask covering the map axes, so markers never spill into the margins or
/// the legend panel.
fn axes_mask(pixmap: &Pixmap, ctx: &DrawingContext) -> Option<Mask> {
    let rect = ctx.axes().to_skia()?;
    let mut mask = Mask::new(pixmap.width(), pixmap.height())?;
    mask.fill_path(
        &PathBuilder::from_rect(rect),
        FillRule::Winding,
        false,
        Transform::identity(),
    );
    Some(mask)
}

/// Draw every point with the layer's marker and return how many were drawn.
///
/// `bbox_width` is the width of the area in degrees; icon zoom scales with
/// it so icons keep a similar footprint on country and city maps.
pub fn draw_markers(
    pixmap: &mut Pixmap,
    ctx: &DrawingContext,
    points: &PointSet,
    layer: &MarkerLayer,
    bbox_width: f64,
    dpi: f32,
) -> usize {
    if points.is_empty() {
        return 0;
    }

    let clip = axes_mask(pixmap, ctx);
    if clip.is_none() {
        warn!("Axes clip unavailable, drawing markers unclipped");
    }

    match &layer.spec {
        MarkerSpec::Glyph(marker) => {
            let d = marker.diameter_points() * dpi / 72.0;
            let mut pb = PathBuilder::new();
            for (lat, lon) in points.iter() {
                let (x, y) = ctx.project(lon, lat);
                push_glyph(&mut pb, marker.symbol, x, y, d);
            }
            match pb.finish() {
                Some(path) => fill_path_clipped(pixmap, &path, marker.color, clip.as_ref()),
                None => warn!(points = points.len(), "Marker path is empty"),
            }
        }
        MarkerSpec::Image { icon, size } => {
            let zoom = *size as f64 * (bbox_width / 100.0);
            let scale = icon_scale(icon, zoom as f32, dpi);
            for (lat, lon) in points.iter() {
                let (x, y) = ctx.project(lon, lat);
                icon.draw_at(pixmap, x, y, scale, clip.as_ref());
            }
        }
    }

    debug!(count = points.len(), layer = %layer.layer_name, "Markers drawn");
    points.len()
}

/// Pixel scale for an icon at `zoom`, never smaller than one pixel across.
fn icon_scale(icon: &MarkerIcon, zoom: f32, dpi: f32) -> f32 {
    let scale = zoom * dpi / 72.0;
    let min_scale = 1.0 / icon.width().min(icon.height()).max(1) as f32;
    if scale.is_finite() {
        scale.max(min_scale)
    } else {
        min_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use mapa_common::BoundingBox;
    use std::io::Cursor;

    use crate::figure::PixelRect;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    fn noisy_png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8, 255])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_small_icon_kept_at_size() {
        let icon = MarkerIcon::from_bytes(&png_bytes(16, 8)).unwrap();
        assert_eq!((icon.width(), icon.height()), (16, 8));
        assert!(icon.png_bytes().starts_with(&[137, 80, 78, 71]));
    }

    #[test]
    fn test_large_icon_thumbnailed_keeping_aspect() {
        let icon = MarkerIcon::from_bytes(&png_bytes(128, 64)).unwrap();
        assert_eq!((icon.width(), icon.height()), (32, 16));
    }

    #[test]
    fn test_thumbnail_never_enlarges() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 12, Rgba([0, 0, 0, 255])));
        assert_eq!(thumbnail(&img).dimensions(), (20, 12));
    }

    #[test]
    fn test_noisy_icon_is_reencoded() {
        let bytes = noisy_png_bytes(30, 30);
        let icon = MarkerIcon::from_bytes(&bytes).unwrap();
        assert_eq!((icon.width(), icon.height()), (30, 30));
        assert!(icon.png_bytes().starts_with(&[137, 80, 78, 71]));
    }

    #[test]
    fn test_data_uri_errors() {
        let err = MarkerIcon::from_data_uri("no-comma").unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");

        let err = MarkerIcon::from_data_uri("data:image/png;base64,@@@").unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");

        let err = MarkerIcon::from_data_uri("data:image/png;base64,aGVsbG8=").unwrap_err();
        assert_eq!(err.kind(), "InvalidParameter");
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png_bytes(4, 4))
        );
        let icon = MarkerIcon::from_data_uri(&uri).unwrap();
        assert_eq!(icon.width(), 4);
    }

    #[test]
    fn test_glyph_size_validation() {
        assert!(GlyphMarker::new(MarkerSymbol::Star, DEFAULT_MARKER, 0.0).is_err());
        assert!(GlyphMarker::new(MarkerSymbol::Star, DEFAULT_MARKER, f32::NAN).is_err());
        let glyph = GlyphMarker::new(MarkerSymbol::Star, DEFAULT_MARKER, 2.5).unwrap();
        assert_eq!(glyph.diameter_points(), 25.0);
    }

    #[test]
    fn test_every_symbol_has_a_path() {
        for symbol in MarkerSymbol::ALL {
            let path = glyph_path(symbol, 50.0, 50.0, 20.0).unwrap();
            let bounds = path.bounds();
            assert!(bounds.width() > 10.0 && bounds.width() <= 29.0, "{symbol:?}");
            assert!(((bounds.left() + bounds.right()) / 2.0 - 50.0).abs() < 1.0);
        }
    }

    #[test]
    fn test_layer_name_default_and_override() {
        let layer = MarkerLayer::glyph(GlyphMarker::default());
        assert_eq!(layer.layer_name, DEFAULT_LAYER_NAME);
        assert_eq!(layer.clone().with_name("  ").layer_name, DEFAULT_LAYER_NAME);
        assert_eq!(layer.with_name("Escolas").layer_name, "Escolas");
    }

    #[test]
    fn test_glyphs_drawn_at_projected_points() {
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        let ctx = DrawingContext::new(
            PixelRect::new(0.0, 0.0, 100.0, 100.0),
            &BoundingBox::new(-1.0, -1.0, 1.0, 1.0),
        );
        let points = PointSet::from_pairs(vec![(0.0, 0.0)]);
        let layer = MarkerLayer::glyph(GlyphMarker::new(MarkerSymbol::Square, Color::BLACK, 1.0).unwrap());

        let drawn = draw_markers(&mut pixmap, &ctx, &points, &layer, 2.0, 72.0);
        assert_eq!(drawn, 1);
        // 10 pt at 72 dpi is a 10 px square around the centre.
        assert_eq!(pixmap.pixel(50, 50).unwrap().alpha(), 255);
        assert_eq!(pixmap.pixel(50, 60).unwrap().alpha(), 0);
    }

    #[test]
    fn test_markers_clipped_to_axes() {
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        let ctx = DrawingContext::new(
            PixelRect::new(20.0, 20.0, 60.0, 60.0),
            &BoundingBox::new(-1.0, -1.0, 1.0, 1.0),
        );
        let axes = ctx.axes();
        // Corners of the area sit near the axes edges; 30 px squares spill out.
        let points = PointSet::from_pairs(vec![(-1.0, -1.0), (1.0, 1.0), (1.0, -1.0)]);
        let layer = MarkerLayer::glyph(GlyphMarker::new(MarkerSymbol::Square, Color::BLACK, 3.0).unwrap());

        draw_markers(&mut pixmap, &ctx, &points, &layer, 2.0, 72.0);

        let mut inside = 0;
        for y in 0..100u32 {
            for x in 0..100u32 {
                let alpha = pixmap.pixel(x, y).unwrap().alpha();
                let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
                let in_axes = fx >= axes.x && fx <= axes.right() && fy >= axes.y && fy <= axes.bottom();
                if in_axes {
                    inside += (alpha > 0) as usize;
                } else {
                    assert_eq!(alpha, 0, "marker pixel outside the axes at ({x}, {y})");
                }
            }
        }
        assert!(inside > 0);
    }

    #[test]
    fn test_icons_clipped_to_axes() {
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        let ctx = DrawingContext::new(
            PixelRect::new(20.0, 20.0, 60.0, 60.0),
            &BoundingBox::new(-1.0, -1.0, 1.0, 1.0),
        );
        let axes = ctx.axes();
        let icon = MarkerIcon::from_bytes(&png_bytes(10, 10)).unwrap();
        let layer = MarkerLayer::image(icon, 1.0).unwrap();
        let points = PointSet::from_pairs(vec![(1.0, 1.0)]);

        // Width 300 degrees gives a zoom of 3: a 30 px icon on the corner.
        draw_markers(&mut pixmap, &ctx, &points, &layer, 300.0, 72.0);

        let outside_colored = (0..100u32)
            .flat_map(|y| (0..100u32).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
                !(fx >= axes.x && fx <= axes.right() && fy >= axes.y && fy <= axes.bottom())
            })
            .filter(|&(x, y)| pixmap.pixel(x, y).unwrap().alpha() > 0)
            .count();
        assert_eq!(outside_colored, 0);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0));
    }

    #[test]
    fn test_icon_scale_has_one_pixel_floor() {
        let icon = MarkerIcon::from_bytes(&png_bytes(10, 10)).unwrap();
        assert_eq!(icon_scale(&icon, 0.0, 300.0), 0.1);
        assert!((icon_scale(&icon, 0.5, 144.0) - 1.0).abs() < 1e-6);
    }
}
