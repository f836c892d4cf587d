//! Base map: filled boundary polygons and optional axes.

use geo::{LineString, Polygon};
use mapa_common::{BoundaryArea, Color, MapError, RenderStyle};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, warn};

use crate::figure::{DrawingContext, Figure, LegendContext, RenderConfig, MAP_AXES};
use crate::text::TextRenderer;

const AXIS_LINE_POINTS: f32 = 0.8;
const TICK_LENGTH_POINTS: f32 = 3.5;
const TICK_LABEL_POINTS: f32 = 10.0;
const TARGET_TICKS: f64 = 5.0;

/// A figure with the boundary drawn, plus the transforms needed to add
/// markers and the legend.
pub struct BaseMap {
    pub figure: Figure,
    pub drawing: DrawingContext,
    pub legend: LegendContext,
}

/// Draw the area on a fresh canvas.
pub fn render_base(
    area: &BoundaryArea,
    style: &RenderStyle,
    config: &RenderConfig,
    text: &TextRenderer,
) -> Result<BaseMap, MapError> {
    let mut figure = Figure::new(config)?;
    let side = figure.width();
    let drawing = DrawingContext::new(MAP_AXES.to_pixels(side), area.bbox());
    let legend = LegendContext::new(side, config.dpi);

    let border_px = figure.points_to_px(style.effective_border_thickness());
    let pixmap = figure.pixmap_mut();

    let mut drawn = 0usize;
    for polygon in area.polygons() {
        let Some(path) = polygon_path(polygon, &drawing) else {
            continue;
        };
        fill(pixmap, &path, style.fill_color);
        if style.draws_border() {
            stroke(pixmap, &path, style.border_color, border_px);
        }
        drawn += 1;
    }

    if drawn == 0 {
        warn!(area = %area.area(), "No drawable polygon in boundary");
    }

    if style.show_axes {
        draw_axes(&mut figure, &drawing, text);
    }

    debug!(
        area = %area.area(),
        polygons = drawn,
        border_px,
        "Base map rendered"
    );

    Ok(BaseMap {
        figure,
        drawing,
        legend,
    })
}

/// One closed subpath per ring. Filled with even-odd so holes stay empty.
fn polygon_path(polygon: &Polygon<f64>, ctx: &DrawingContext) -> Option<Path> {
    let mut pb = PathBuilder::new();
    push_ring(&mut pb, polygon.exterior(), ctx);
    for ring in polygon.interiors() {
        push_ring(&mut pb, ring, ctx);
    }
    pb.finish()
}

fn push_ring(pb: &mut PathBuilder, ring: &LineString<f64>, ctx: &DrawingContext) {
    let mut coords = ring.coords().filter(|c| c.x.is_finite() && c.y.is_finite());
    let Some(first) = coords.next() else {
        return;
    };
    let (x, y) = ctx.project(first.x, first.y);
    pb.move_to(x, y);
    for c in coords {
        let (x, y) = ctx.project(c.x, c.y);
        pb.line_to(x, y);
    }
    pb.close();
}

fn fill(pixmap: &mut Pixmap, path: &Path, color: Color) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    pixmap.fill_path(path, &paint, FillRule::EvenOdd, Transform::identity(), None);
}

fn stroke(pixmap: &mut Pixmap, path: &Path, color: Color, width: f32) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;

    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
}

/// Frame around the plotted range with longitude/latitude ticks.
fn draw_axes(figure: &mut Figure, ctx: &DrawingContext, text: &TextRenderer) {
    let line_px = figure.points_to_px(AXIS_LINE_POINTS);
    let tick_px = figure.points_to_px(TICK_LENGTH_POINTS);
    let label_px = figure.points_to_px(TICK_LABEL_POINTS);
    let plot = ctx.plot_rect();
    let view = *ctx.view();
    let pixmap = figure.pixmap_mut();

    let mut pb = PathBuilder::new();
    if let Some(rect) = plot.to_skia() {
        pb.push_rect(rect);
    }

    let lon_ticks = tick_values(view.min_x, view.max_x);
    let lat_ticks = tick_values(view.min_y, view.max_y);

    for &lon in &lon_ticks {
        let (x, _) = ctx.project(lon, view.min_y);
        pb.move_to(x, plot.bottom());
        pb.line_to(x, plot.bottom() + tick_px);
    }
    for &lat in &lat_ticks {
        let (_, y) = ctx.project(view.min_x, lat);
        pb.move_to(plot.x, y);
        pb.line_to(plot.x - tick_px, y);
    }

    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: line_px,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    for &lon in &lon_ticks {
        let (x, _) = ctx.project(lon, view.min_y);
        let label = format_degrees(lon);
        let (w, _) = text.measure(&label, label_px);
        text.draw(pixmap, &label, x - w / 2.0, plot.bottom() + tick_px * 1.5, label_px, Color::BLACK);
    }
    for &lat in &lat_ticks {
        let (_, y) = ctx.project(view.min_x, lat);
        let label = format_degrees(lat);
        let (w, h) = text.measure(&label, label_px);
        text.draw(pixmap, &label, plot.x - tick_px * 1.5 - w, y - h / 2.0, label_px, Color::BLACK);
    }
}

/// Round tick positions inside `[min, max]`.
fn tick_values(min: f64, max: f64) -> Vec<f64> {
    let step = nice_step(max - min);
    if step <= 0.0 || !step.is_finite() {
        return Vec::new();
    }
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// 1, 2 or 5 times a power of ten, giving about five ticks over `range`.
fn nice_step(range: f64) -> f64 {
    if range <= 0.0 || !range.is_finite() {
        return 0.0;
    }
    let raw = range / TARGET_TICKS;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.5 {
        2.0
    } else if normalized < 7.5 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_degrees(value: f64) -> String {
    let value = if value.abs() < 1e-9 { 0.0 } else { value };
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}°")
}
