//! Full render: base map, markers, legend, encoding.

use mapa_common::{BoundaryArea, MapError, PointSet, RenderStyle};
use std::time::Instant;
use tracing::{info, warn};

use crate::compass::Compass;
use crate::encode::{encode_figure, RenderedMap};
use crate::figure::RenderConfig;
use crate::legend::{build_legend, draw_legend};
use crate::map::render_base;
use crate::markers::{draw_markers, MarkerLayer};
use crate::text::TextRenderer;

/// Font and compass artwork, loaded once and shared by every render.
#[derive(Debug, Clone)]
pub struct RenderAssets {
    pub text: TextRenderer,
    pub compass: Option<Compass>,
}

impl RenderAssets {
    /// Load the assets named by `config`. Missing assets are logged and
    /// the feature that needs them is skipped.
    pub fn load(config: &RenderConfig) -> Self {
        let text = TextRenderer::load(config.font_path.as_deref());
        let compass = match Compass::load(config.compass_path.as_deref()) {
            Ok(compass) => Some(compass),
            Err(e) => {
                warn!(error = %e, "Compass unavailable, maps will be drawn without it");
                None
            }
        };
        Self { text, compass }
    }

    /// No font, bundled compass.
    pub fn minimal() -> Self {
        Self {
            text: TextRenderer::without_font(),
            compass: Compass::bundled().ok(),
        }
    }
}

/// Render `area` with `points` drawn using `layer` and encode the result.
///
/// Points are expected to be filtered already. With no layer, or no points,
/// nothing is drawn on the map but the layer still gets its legend entry.
pub fn composite(
    area: &BoundaryArea,
    points: &PointSet,
    layer: Option<&MarkerLayer>,
    style: &RenderStyle,
    config: &RenderConfig,
    assets: &RenderAssets,
    area_name: &str,
) -> Result<RenderedMap, MapError> {
    let start = Instant::now();
    let mut base = render_base(area, style, config, &assets.text)?;

    let mut drawn = 0;
    if let Some(layer) = layer {
        let dpi = base.figure.dpi();
        drawn = draw_markers(
            base.figure.pixmap_mut(),
            &base.drawing,
            points,
            layer,
            area.bbox().width(),
            dpi,
        );
    }

    let legend = build_legend(area_name, layer, style);
    let compass = if style.show_compass {
        assets.compass.as_ref()
    } else {
        None
    };
    draw_legend(&mut base.figure, &base.legend, legend.as_ref(), compass, &assets.text);

    let rendered = encode_figure(base.figure)?;

    info!(
        area = %area.area(),
        points = drawn,
        width = rendered.width,
        height = rendered.height,
        bytes = rendered.png.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Map rendered"
    );

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use mapa_common::{AreaRef, Crs};

    use crate::markers::GlyphMarker;

    fn area() -> BoundaryArea {
        BoundaryArea::new(
            AreaRef::country(),
            "Brasil",
            MultiPolygon::new(vec![polygon![
                (x: -74.0, y: -33.7),
                (x: -34.8, y: -33.7),
                (x: -34.8, y: 5.3),
                (x: -74.0, y: 5.3),
                (x: -74.0, y: -33.7),
            ]]),
            Crs::default(),
        )
        .unwrap()
    }

    fn config() -> RenderConfig {
        RenderConfig {
            figure_inches: 3.0,
            dpi: 40.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_composite_without_points() {
        let map = composite(
            &area(),
            &PointSet::empty(),
            None,
            &RenderStyle::default(),
            &config(),
            &RenderAssets::minimal(),
            "Brasil",
        )
        .unwrap();
        assert!(map.width > 0 && map.height > 0);
        assert!(map.data_uri().len() > "data:image/png;base64,".len());
    }

    #[test]
    fn test_markers_change_output() {
        let points = PointSet::from_pairs(vec![(-15.0, -50.0), (-10.0, -40.0)]);
        let layer = MarkerLayer::glyph(GlyphMarker::default());
        let render = |layer: Option<&MarkerLayer>| {
            composite(
                &area(),
                &points,
                layer,
                &RenderStyle::default(),
                &config(),
                &RenderAssets::minimal(),
                "Brasil",
            )
            .unwrap()
        };
        assert_ne!(render(None).png, render(Some(&layer)).png);
    }
}
