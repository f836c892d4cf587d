//! Canvas, layout and coordinate transforms.
//!
//! The canvas is a square [`tiny_skia::Pixmap`] of `figure_inches × dpi`
//! pixels. Layout is expressed in figure fractions (origin bottom-left, as
//! plotting libraries do) and converted to pixel rectangles (origin
//! top-left) on demand.

use image::RgbaImage;
use mapa_common::{BoundingBox, MapError};
use std::path::PathBuf;
use tiny_skia::{Color, IntSize, Paint, Pixmap, Rect, Transform};
use tracing::error;

/// Largest canvas side accepted, in pixels.
pub const MAX_CANVAS_PX: u32 = 12_000;

/// Map axes, as a fraction of the figure: left, bottom, width, height.
pub const MAP_AXES: FracRect = FracRect::new(0.04, 0.05, 0.80, 0.90);

/// Panel holding the legend box and the compass.
pub const LEGEND_PANEL: FracRect = FracRect::new(0.86, 0.15, 0.13, 0.70);

/// Compass inset, as a fraction of the legend panel.
pub const COMPASS_INSET: FracRect = FracRect::new(0.3, 0.0, 0.5, 0.3);

/// Fraction of the data range left empty on each side of the boundary.
const DATA_MARGIN: f64 = 0.05;

/// Canvas size and assets for a render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Side of the square figure in inches.
    pub figure_inches: f32,
    pub dpi: f32,
    /// TrueType font for legend and axis labels.
    pub font_path: Option<PathBuf>,
    /// PNG or SVG compass rose replacing the bundled one.
    pub compass_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            figure_inches: 8.0,
            dpi: 300.0,
            font_path: None,
            compass_path: None,
        }
    }
}

impl RenderConfig {
    /// Side of the canvas in pixels.
    pub fn canvas_px(&self) -> u32 {
        (self.figure_inches * self.dpi).round().max(1.0) as u32
    }

    /// Convert typographic points to pixels at this resolution.
    pub fn points_to_px(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if !self.figure_inches.is_finite() || self.figure_inches <= 0.0 {
            return Err(MapError::invalid_parameter(
                "figure_inches",
                format!("must be positive, got {}", self.figure_inches),
            ));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(MapError::invalid_parameter(
                "dpi",
                format!("must be positive, got {}", self.dpi),
            ));
        }
        let side = self.figure_inches as f64 * self.dpi as f64;
        if side > MAX_CANVAS_PX as f64 {
            return Err(MapError::invalid_parameter(
                "dpi",
                format!("canvas of {side:.0} px exceeds {MAX_CANVAS_PX} px"),
            ));
        }
        Ok(())
    }
}

/// Rectangle in fractional coordinates, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FracRect {
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl FracRect {
    pub const fn new(left: f32, bottom: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            bottom,
            width,
            height,
        }
    }

    /// Pixel rectangle on a square canvas of `side` pixels.
    pub fn to_pixels(&self, side: u32) -> PixelRect {
        PixelRect::new(0.0, 0.0, side as f32, side as f32).inset(*self)
    }

    pub fn overlaps(&self, other: &FracRect) -> bool {
        self.left < other.left + other.width
            && other.left < self.left + self.width
            && self.bottom < other.bottom + other.height
            && other.bottom < self.bottom + self.height
    }
}

/// Rectangle in pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Sub-rectangle given in fractions of this one.
    pub fn inset(&self, frac: FracRect) -> PixelRect {
        PixelRect {
            x: self.x + frac.left * self.width,
            y: self.y + (1.0 - frac.bottom - frac.height) * self.height,
            width: frac.width * self.width,
            height: frac.height * self.height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn to_skia(&self) -> Option<Rect> {
        Rect::from_xywh(self.x, self.y, self.width, self.height)
    }
}

/// The raster being drawn, plus its resolution.
pub struct Figure {
    pixmap: Pixmap,
    dpi: f32,
}

impl Figure {
    /// Allocate a white canvas.
    pub fn new(config: &RenderConfig) -> Result<Self, MapError> {
        config.validate()?;
        let side = config.canvas_px();
        let mut pixmap = match Pixmap::new(side, side) {
            Some(p) => p,
            None => {
                error!(side, "Failed to allocate canvas");
                return Err(MapError::Draw(format!(
                    "cannot allocate a {side}x{side} canvas"
                )));
            }
        };
        pixmap.fill(Color::WHITE);
        Ok(Self {
            pixmap,
            dpi: config.dpi,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    pub fn points_to_px(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Paint a region back to the background colour.
    pub fn clear_rect(&mut self, rect: PixelRect) {
        let Some(rect) = rect.to_skia() else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(Color::WHITE);
        // Source blending so translucent pixels are replaced, not mixed.
        paint.blend_mode = tiny_skia::BlendMode::Source;
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }
}

/// Geographic to pixel transform for the map axes.
///
/// Longitude runs left to right and latitude bottom to top. One degree of
/// latitude is `1 / cos(mean latitude)` times longer on screen than one
/// degree of longitude so distances look right near the equator and in the
/// south alike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingContext {
    axes: PixelRect,
    view: BoundingBox,
    px_per_lon: f64,
    px_per_lat: f64,
    origin_x: f64,
    origin_y: f64,
}

impl DrawingContext {
    pub fn new(axes: PixelRect, bbox: &BoundingBox) -> Self {
        let view = padded_view(bbox);
        let aspect = bbox.geographic_aspect();

        let scale = (axes.width as f64 / view.width())
            .min(axes.height as f64 / (view.height() * aspect));
        let px_per_lon = scale;
        let px_per_lat = scale * aspect;

        let plotted_w = view.width() * px_per_lon;
        let plotted_h = view.height() * px_per_lat;
        let origin_x = axes.x as f64 + (axes.width as f64 - plotted_w) / 2.0;
        let origin_y = axes.y as f64 + (axes.height as f64 - plotted_h) / 2.0;

        Self {
            axes,
            view,
            px_per_lon,
            px_per_lat,
            origin_x,
            origin_y,
        }
    }

    /// Pixel position of a longitude/latitude pair.
    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let x = self.origin_x + (lon - self.view.min_x) * self.px_per_lon;
        let y = self.origin_y + (self.view.max_y - lat) * self.px_per_lat;
        (x as f32, y as f32)
    }

    /// Pixel rectangle covered by the visible data range.
    pub fn plot_rect(&self) -> PixelRect {
        PixelRect::new(
            self.origin_x as f32,
            self.origin_y as f32,
            (self.view.width() * self.px_per_lon) as f32,
            (self.view.height() * self.px_per_lat) as f32,
        )
    }

    /// Visible data range, the boundary bbox plus margins.
    pub fn view(&self) -> &BoundingBox {
        &self.view
    }

    pub fn axes(&self) -> PixelRect {
        self.axes
    }
}

fn padded_view(bbox: &BoundingBox) -> BoundingBox {
    // A point-like area still gets a visible extent.
    let width = bbox.width().max(1e-3);
    let height = bbox.height().max(1e-3);
    let (cx, cy) = bbox.center();
    let half_w = width * (0.5 + DATA_MARGIN);
    let half_h = height * (0.5 + DATA_MARGIN);
    BoundingBox::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
}

/// Where the legend panel sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendContext {
    pub panel: PixelRect,
    pub dpi: f32,
}

impl LegendContext {
    pub fn new(canvas_side: u32, dpi: f32) -> Self {
        Self {
            panel: LEGEND_PANEL.to_pixels(canvas_side),
            dpi,
        }
    }

    pub fn compass_rect(&self) -> PixelRect {
        self.panel.inset(COMPASS_INSET)
    }
}

/// Convert a straight-alpha RGBA image into a premultiplied pixmap.
pub fn rgba_image_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut data = Vec::with_capacity(img.as_raw().len());
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        data.extend_from_slice(&[premultiply(r, a), premultiply(g, a), premultiply(b, a), a]);
    }
    Pixmap::from_vec(data, size)
}

#[inline]
fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u16 * a as u16 + 127) / 255) as u8
}
