//! Legend box and compass in the side panel.

use mapa_common::{Color, RenderStyle};
use tiny_skia::{Paint, Path, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;

use crate::compass::Compass;
use crate::figure::{Figure, FracRect, LegendContext, PixelRect};
use crate::markers::{fill_path, glyph_path, GlyphMarker, MarkerIcon, MarkerLayer, MarkerSpec};
use crate::text::TextRenderer;

pub const LEGEND_TITLE: &str = "Legenda";

/// Label and title size in points.
const FONT_POINTS: f32 = 14.0;
/// Diameter of the glyph sample in points.
const SAMPLE_GLYPH_POINTS: f32 = 10.0;

// Box metrics in units of the font size.
const BORDER_PAD: f32 = 0.4;
const LABEL_SPACING: f32 = 0.5;
const HANDLE_LENGTH: f32 = 2.0;
const HANDLE_HEIGHT: f32 = 0.7;
const HANDLE_TEXT_PAD: f32 = 0.8;
const CORNER_RADIUS: f32 = 0.2;

const SHADOW_OFFSET_POINTS: f32 = 2.0;
const FRAME_EDGE_POINTS: f32 = 0.8;
const FRAME_EDGE: Color = Color::rgb(0xcc, 0xcc, 0xcc);
const FRAME_FACE: Color = Color::rgba(0xff, 0xff, 0xff, 0xcc);
const SHADOW: Color = Color::rgba(0, 0, 0, 0x80);

/// Part of the panel above the compass where the box is centred.
const BOX_REGION: FracRect = FracRect::new(0.0, 0.3, 1.0, 0.7);

/// One row of the legend.
#[derive(Debug, Clone)]
pub enum LegendEntry {
    /// Filled rectangle in the area colour.
    AreaSwatch { color: Color, label: String },
    /// Sample of the glyph used for points.
    Glyph { marker: GlyphMarker, label: String },
    /// Thumbnail of the icon used for points.
    Icon { icon: MarkerIcon, label: String },
}

impl LegendEntry {
    pub fn label(&self) -> &str {
        match self {
            LegendEntry::AreaSwatch { label, .. }
            | LegendEntry::Glyph { label, .. }
            | LegendEntry::Icon { label, .. } => label,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(LegendEntry::label).collect()
    }
}

/// Legend content for a render, or `None` when the legend is hidden.
///
/// The area swatch always comes first. A marker layer adds one entry,
/// whether or not any point survived filtering.
pub fn build_legend(area_name: &str, layer: Option<&MarkerLayer>, style: &RenderStyle) -> Option<Legend> {
    if !style.show_legend {
        return None;
    }

    let mut entries = vec![LegendEntry::AreaSwatch {
        color: style.fill_color,
        label: area_name.to_string(),
    }];

    if let Some(layer) = layer {
        let label = layer.layer_name.clone();
        entries.push(match &layer.spec {
            MarkerSpec::Glyph(marker) => LegendEntry::Glyph {
                marker: *marker,
                label,
            },
            MarkerSpec::Image { icon, .. } => LegendEntry::Icon {
                icon: icon.clone(),
                label,
            },
        });
    }

    Some(Legend {
        title: LEGEND_TITLE.to_string(),
        entries,
    })
}

/// Sizes of the legend box for a given font size, in pixels.
struct BoxMetrics {
    font_px: f32,
    width: f32,
    height: f32,
    title_h: f32,
    row_h: f32,
}

fn measure_box(legend: &Legend, text: &TextRenderer, font_px: f32) -> BoxMetrics {
    let pad = BORDER_PAD * font_px;
    let (title_w, title_h) = text.measure(&legend.title, font_px);
    let label_w = legend
        .entries
        .iter()
        .map(|e| text.measure(e.label(), font_px).0)
        .fold(0.0f32, f32::max);
    let row_h = text.measure("Ag", font_px).1.max(HANDLE_HEIGHT * font_px);

    let content_w = title_w.max(HANDLE_LENGTH * font_px + HANDLE_TEXT_PAD * font_px + label_w);
    let n = legend.entries.len() as f32;
    BoxMetrics {
        font_px,
        width: content_w + 2.0 * pad,
        height: 2.0 * pad + title_h + n * (row_h + LABEL_SPACING * font_px),
        title_h,
        row_h,
    }
}

/// Draw the legend and compass into the side panel.
///
/// `None` clears the panel and draws nothing, compass included. Otherwise
/// the box is drawn over whatever the panel holds. Returns the rectangle of
/// the legend box when one was drawn.
pub fn draw_legend(
    figure: &mut Figure,
    ctx: &LegendContext,
    legend: Option<&Legend>,
    compass: Option<&Compass>,
    text: &TextRenderer,
) -> Option<PixelRect> {
    let Some(legend) = legend else {
        figure.clear_rect(ctx.panel);
        return None;
    };

    let canvas_w = figure.width() as f32;
    let mut metrics = measure_box(legend, text, figure.points_to_px(FONT_POINTS));
    let available = canvas_w - ctx.panel.x - 2.0;
    if metrics.width > available && available > 0.0 {
        let shrunk = metrics.font_px * available / metrics.width;
        metrics = measure_box(legend, text, shrunk);
        debug!(font_px = shrunk, "Legend font reduced to fit canvas");
    }

    let region = ctx.panel.inset(BOX_REGION);
    let (_, cy) = region.center();
    let frame = PixelRect::new(ctx.panel.x, cy - metrics.height / 2.0, metrics.width, metrics.height);

    draw_frame(figure, frame, metrics.font_px);

    let f = metrics.font_px;
    let pad = BORDER_PAD * f;
    let pixmap = figure.pixmap_mut();

    let (title_w, _) = text.measure(&legend.title, f);
    text.draw(pixmap, &legend.title, frame.x + (frame.width - title_w) / 2.0, frame.y + pad, f, Color::BLACK);

    let mut row_y = frame.y + pad + metrics.title_h + LABEL_SPACING * f;
    for entry in &legend.entries {
        let handle = PixelRect::new(frame.x + pad, row_y, HANDLE_LENGTH * f, metrics.row_h);
        draw_handle(pixmap, entry, handle, f);
        let label_x = handle.right() + HANDLE_TEXT_PAD * f;
        let (_, label_h) = text.measure(entry.label(), f);
        text.draw(pixmap, entry.label(), label_x, row_y + (metrics.row_h - label_h) / 2.0, f, Color::BLACK);
        row_y += metrics.row_h + LABEL_SPACING * f;
    }

    if let Some(compass) = compass {
        compass.draw(figure.pixmap_mut(), ctx.compass_rect());
    }

    Some(frame)
}

fn draw_frame(figure: &mut Figure, frame: PixelRect, font_px: f32) {
    let radius = CORNER_RADIUS * font_px;
    let offset = figure.points_to_px(SHADOW_OFFSET_POINTS);
    let edge_width = figure.points_to_px(FRAME_EDGE_POINTS);
    let pixmap = figure.pixmap_mut();

    let shadow_rect = PixelRect::new(frame.x + offset, frame.y + offset, frame.width, frame.height);
    if let Some(shadow) = rounded_rect(shadow_rect, radius) {
        fill_path(pixmap, &shadow, SHADOW);
    }

    let Some(path) = rounded_rect(frame, radius) else {
        return;
    };
    fill_path(pixmap, &path, FRAME_FACE);

    let mut edge = Paint::default();
    edge.set_color_rgba8(FRAME_EDGE.r, FRAME_EDGE.g, FRAME_EDGE.b, FRAME_EDGE.a);
    edge.anti_alias = true;
    let stroke = Stroke {
        width: edge_width,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &edge, &stroke, Transform::identity(), None);
}

fn draw_handle(pixmap: &mut Pixmap, entry: &LegendEntry, handle: PixelRect, font_px: f32) {
    let (cx, cy) = handle.center();
    match entry {
        LegendEntry::AreaSwatch { color, .. } => {
            let h = HANDLE_HEIGHT * font_px;
            let swatch = PixelRect::new(handle.x, cy - h / 2.0, handle.width, h);
            if let Some(rect) = swatch.to_skia() {
                let mut paint = Paint::default();
                paint.set_color_rgba8(color.r, color.g, color.b, color.a);
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
        LegendEntry::Glyph { marker, .. } => {
            // Scales with the font when the legend is shrunk to fit.
            let d = SAMPLE_GLYPH_POINTS / FONT_POINTS * font_px;
            if let Some(path) = glyph_path(marker.symbol, cx, cy, d) {
                fill_path(pixmap, &path, marker.color);
            }
        }
        LegendEntry::Icon { icon, .. } => {
            let scale = (handle.width / icon.width() as f32).min(handle.height / icon.height() as f32);
            icon.draw_at(pixmap, cx, cy, scale, None);
        }
    }
}

/// Rectangle with quadratic corners of radius `r`.
fn rounded_rect(rect: PixelRect, r: f32) -> Option<Path> {
    let r = r.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let (x0, y0, x1, y1) = (rect.x, rect.y, rect.right(), rect.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(x0 + r, y0);
    pb.line_to(x1 - r, y0);
    pb.quad_to(x1, y0, x1, y0 + r);
    pb.line_to(x1, y1 - r);
    pb.quad_to(x1, y1, x1 - r, y1);
    pb.line_to(x0 + r, y1);
    pb.quad_to(x0, y1, x0, y1 - r);
    pb.line_to(x0, y0 + r);
    pb.quad_to(x0, y0, x0 + r, y0);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::RenderConfig;
    use crate::markers::DEFAULT_LAYER_NAME;
    use mapa_common::MarkerSymbol;

    fn small_config() -> RenderConfig {
        RenderConfig {
            figure_inches: 8.0,
            dpi: 50.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_area_only_legend() {
        let legend = build_legend("Brasil", None, &RenderStyle::default()).unwrap();
        assert_eq!(legend.title, "Legenda");
        assert_eq!(legend.labels(), vec!["Brasil"]);
    }

    #[test]
    fn test_marker_layer_adds_one_entry() {
        let layer = MarkerLayer::glyph(GlyphMarker::default());
        let legend = build_legend("São Paulo", Some(&layer), &RenderStyle::default()).unwrap();
        assert_eq!(legend.labels(), vec!["São Paulo", DEFAULT_LAYER_NAME]);
        assert!(matches!(legend.entries[1], LegendEntry::Glyph { .. }));
    }

    #[test]
    fn test_hidden_legend() {
        let style = RenderStyle {
            show_legend: false,
            ..Default::default()
        };
        assert!(build_legend("Brasil", None, &style).is_none());
    }

    #[test]
    fn test_no_legend_leaves_panel_blank() {
        let config = small_config();
        let mut figure = Figure::new(&config).unwrap();
        let ctx = LegendContext::new(figure.width(), config.dpi);
        let compass = Compass::bundled().unwrap();

        let drawn = draw_legend(&mut figure, &ctx, None, Some(&compass), &TextRenderer::without_font());
        assert!(drawn.is_none());
        assert!(figure
            .pixmap()
            .pixels()
            .iter()
            .all(|p| p.red() == 255 && p.green() == 255 && p.blue() == 255));
    }

    #[test]
    fn test_shown_legend_keeps_panel_content() {
        let config = small_config();
        let mut figure = Figure::new(&config).unwrap();
        let ctx = LegendContext::new(figure.width(), config.dpi);
        let corner = PixelRect::new(ctx.panel.right() - 4.0, ctx.panel.bottom() - 4.0, 3.0, 3.0);
        fill_path(
            figure.pixmap_mut(),
            &PathBuilder::from_rect(corner.to_skia().unwrap()),
            Color::rgb(255, 0, 0),
        );

        let legend = build_legend("Brasil", None, &RenderStyle::default()).unwrap();
        let frame = draw_legend(&mut figure, &ctx, Some(&legend), None, &TextRenderer::without_font()).unwrap();
        assert!(frame.bottom() < corner.y);

        let (x, y) = (corner.x as u32 + 1, corner.y as u32 + 1);
        let pixel = figure.pixmap().pixel(x, y).unwrap();
        assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (255, 0, 0));
    }

    #[test]
    fn test_legend_box_starts_in_panel_and_fits_canvas() {
        let config = small_config();
        let mut figure = Figure::new(&config).unwrap();
        let ctx = LegendContext::new(figure.width(), config.dpi);
        let layer = MarkerLayer::glyph(GlyphMarker::new(MarkerSymbol::Star, Color::BLACK, 1.0).unwrap())
            .with_name("A fairly long layer name for the panel");
        let legend = build_legend("Brasil", Some(&layer), &RenderStyle::default()).unwrap();

        let frame = draw_legend(&mut figure, &ctx, Some(&legend), None, &TextRenderer::without_font()).unwrap();
        assert_eq!(frame.x, ctx.panel.x);
        assert!(frame.right() <= figure.width() as f32);
        assert!(frame.y >= ctx.panel.y);
    }

    #[test]
    fn test_swatch_uses_fill_color() {
        let config = small_config();
        let mut figure = Figure::new(&config).unwrap();
        let ctx = LegendContext::new(figure.width(), config.dpi);
        let style = RenderStyle {
            fill_color: Color::rgb(0, 128, 0),
            ..Default::default()
        };
        let legend = build_legend("Brasil", None, &style).unwrap();
        draw_legend(&mut figure, &ctx, Some(&legend), None, &TextRenderer::without_font());

        assert!(figure
            .pixmap()
            .pixels()
            .iter()
            .any(|p| p.red() == 0 && p.green() == 128 && p.blue() == 0));
    }

    #[test]
    fn test_rounded_rect_bounds() {
        let path = rounded_rect(PixelRect::new(10.0, 20.0, 30.0, 40.0), 5.0).unwrap();
        let b = path.bounds();
        assert_eq!((b.left(), b.top(), b.right(), b.bottom()), (10.0, 20.0, 40.0, 60.0));
    }
}
