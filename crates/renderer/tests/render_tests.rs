//! End-to-end render tests: area + points + marker layer to PNG bytes.

use geo::{polygon, MultiPolygon};
use image::RgbaImage;
use mapa_common::{AreaRef, BoundaryArea, BoundingBox, Color, Crs, MarkerSymbol, PointSet, RenderStyle};
use renderer::figure::MAP_AXES;
use renderer::{
    build_legend, composite, DrawingContext, GlyphMarker, LegendEntry, MarkerIcon, MarkerLayer,
    RenderAssets, RenderConfig, RenderedMap,
};
use test_utils::fixtures::{bbox, points};
use test_utils::{assert_approx_eq, assert_coords_approx_eq, create_icon_png, create_point_grid};

// ============================================================================
// Helper functions
// ============================================================================

fn rect_area(area: AreaRef, name: &str, b: (f64, f64, f64, f64)) -> BoundaryArea {
    let (x0, y0, x1, y1) = b;
    BoundaryArea::new(
        area,
        name,
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]]),
        Crs::default(),
    )
    .unwrap()
}

fn config() -> RenderConfig {
    RenderConfig {
        figure_inches: 4.0,
        dpi: 60.0,
        ..Default::default()
    }
}

fn render(
    area: &BoundaryArea,
    points: &PointSet,
    layer: Option<&MarkerLayer>,
    style: &RenderStyle,
) -> RenderedMap {
    composite(
        area,
        points,
        layer,
        style,
        &config(),
        &RenderAssets::minimal(),
        area.display_name(),
    )
    .unwrap()
}

fn decode(map: &RenderedMap) -> RgbaImage {
    let bytes = RenderedMap::payload_from_data_uri(&map.data_uri()).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

fn count_pixels(img: &RgbaImage, pred: impl Fn([u8; 4]) -> bool) -> usize {
    img.pixels().filter(|p| pred(p.0)).count()
}

fn is_magenta(p: [u8; 4]) -> bool {
    p[0] > 230 && p[1] < 25 && p[2] > 230
}

fn magenta_icon_layer() -> MarkerLayer {
    let icon = MarkerIcon::from_bytes(&create_icon_png(16, 16, [255, 0, 255, 255])).unwrap();
    MarkerLayer::image(icon, 5.0).unwrap().with_name("Escolas")
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_projection_centers_area_with_north_up() {
    let (x0, y0, x1, y1) = bbox::SAO_PAULO_STATE;
    let bbox = BoundingBox::new(x0, y0, x1, y1);
    let axes = MAP_AXES.to_pixels(config().canvas_px());
    let ctx = DrawingContext::new(axes, &bbox);

    let (cx, cy) = bbox.center();
    assert_coords_approx_eq!(ctx.project(cx, cy), ctx.plot_rect().center(), 0.01);

    let (_, north) = ctx.project(cx, y1);
    let (_, south) = ctx.project(cx, y0);
    assert!(north < south);
}

#[test]
fn test_projection_stretches_latitude_by_geographic_aspect() {
    let (x0, y0, x1, y1) = bbox::SAO_PAULO_STATE;
    let bbox = BoundingBox::new(x0, y0, x1, y1);
    let ctx = DrawingContext::new(MAP_AXES.to_pixels(240), &bbox);

    let (ax, ay) = ctx.project(-48.0, -22.0);
    let (bx, _) = ctx.project(-47.0, -22.0);
    let (_, cy) = ctx.project(-48.0, -23.0);
    let ratio = (cy - ay) / (bx - ax);
    assert_approx_eq!(ratio, bbox.geographic_aspect(), 1e-3);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_country_without_points() {
    let brazil = rect_area(AreaRef::country(), "Brasil", bbox::BRAZIL);
    let map = render(&brazil, &PointSet::empty(), None, &RenderStyle::default());

    assert!(map.data_uri().len() > "data:image/png;base64,".len());
    let legend = build_legend("Brasil", None, &RenderStyle::default()).unwrap();
    assert_eq!(legend.labels(), vec!["Brasil"]);
}

#[test]
fn test_rendering_is_deterministic() {
    let state = rect_area(AreaRef::state("35"), "São Paulo", bbox::SAO_PAULO_STATE);
    let points = create_point_grid(bbox::SAO_PAULO_STATE, 4, 4);
    let layer = MarkerLayer::glyph(GlyphMarker::default());

    let a = render(&state, &points, Some(&layer), &RenderStyle::default());
    let b = render(&state, &points, Some(&layer), &RenderStyle::default());
    assert_eq!(a.png, b.png);
}

#[test]
fn test_zero_thickness_has_no_border_pixels() {
    let state = rect_area(AreaRef::state("35"), "São Paulo", bbox::SAO_PAULO_STATE);
    let style = RenderStyle {
        border_color: Color::rgb(255, 0, 0),
        border_thickness: 0.0,
        ..Default::default()
    };
    let img = decode(&render(&state, &PointSet::empty(), None, &style));
    assert_eq!(count_pixels(&img, |p| p[0] > 200 && p[1] < 60 && p[2] < 60), 0);

    let bordered = RenderStyle {
        border_thickness: 3.0,
        ..style
    };
    let img = decode(&render(&state, &PointSet::empty(), None, &bordered));
    assert!(count_pixels(&img, |p| p[0] > 200 && p[1] < 60 && p[2] < 60) > 0);
}

#[test]
fn test_icon_layer_without_points_only_in_legend() {
    // Icon zoom grows with the area width, so use the state to get icons
    // several pixels across.
    let state = rect_area(AreaRef::state("35"), "São Paulo", bbox::SAO_PAULO_STATE);
    let layer = magenta_icon_layer();

    let legend = build_legend("São Paulo", Some(&layer), &RenderStyle::default()).unwrap();
    assert!(matches!(legend.entries[1], LegendEntry::Icon { .. }));
    assert_eq!(legend.labels(), vec!["São Paulo", "Escolas"]);

    let no_points = decode(&render(&state, &PointSet::empty(), Some(&layer), &RenderStyle::default()));
    let with_points = decode(&render(
        &state,
        &PointSet::from_pairs(vec![points::SAO_PAULO_CITY]),
        Some(&layer),
        &RenderStyle::default(),
    ));
    let hidden_legend = decode(&render(
        &state,
        &PointSet::empty(),
        Some(&layer),
        &RenderStyle {
            show_legend: false,
            ..Default::default()
        },
    ));

    let legend_only = count_pixels(&no_points, is_magenta);
    assert!(legend_only > 0, "legend sample must be drawn");
    assert!(count_pixels(&with_points, is_magenta) > legend_only);
    assert_eq!(count_pixels(&hidden_legend, is_magenta), 0);
}

#[test]
fn test_glyph_markers_are_drawn_in_marker_color() {
    let state = rect_area(AreaRef::state("35"), "São Paulo", bbox::SAO_PAULO_STATE);
    let marker = GlyphMarker::new(MarkerSymbol::Square, Color::rgb(255, 0, 255), 1.0).unwrap();
    let layer = MarkerLayer::glyph(marker);
    let hidden = RenderStyle {
        show_legend: false,
        ..Default::default()
    };

    let none = decode(&render(&state, &PointSet::empty(), Some(&layer), &hidden));
    let some = decode(&render(
        &state,
        &PointSet::from_pairs(vec![points::SAO_PAULO_CITY, points::CAMPINAS]),
        Some(&layer),
        &hidden,
    ));
    assert_eq!(count_pixels(&none, is_magenta), 0);
    assert!(count_pixels(&some, is_magenta) > 0);
}

#[test]
fn test_hidden_legend_crops_narrower() {
    let state = rect_area(AreaRef::state("35"), "São Paulo", bbox::SAO_PAULO_STATE);
    let shown = render(&state, &PointSet::empty(), None, &RenderStyle::default());
    let hidden = render(
        &state,
        &PointSet::empty(),
        None,
        &RenderStyle {
            show_legend: false,
            show_compass: false,
            ..Default::default()
        },
    );
    assert!(hidden.width < shown.width);
}
