//! Request to rendered map: fetch, filter, composite, encode.

use geodata::{filter_points, FilteredPoints};
use mapa_common::style::DEFAULT_MARKER;
use mapa_common::{AreaRef, Color, MapError, MarkerSymbol, PointSet, RenderStyle};
use renderer::{composite, GlyphMarker, MarkerIcon, MarkerLayer, RenderedMap};
use serde::Deserialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::metrics;
use crate::state::AppState;

/// Body of `POST /api/map`.
#[derive(Debug, Clone, Deserialize)]
pub struct MapRequest {
    pub area: AreaRef,
    #[serde(default)]
    pub style: RenderStyle,
    #[serde(default)]
    pub points: Option<PointSet>,
    #[serde(default)]
    pub marker: Option<MarkerRequest>,
}

/// How the points should be drawn.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerRequest {
    #[serde(default)]
    pub symbol: MarkerSymbol,
    #[serde(default = "default_marker_color")]
    pub color: Color,
    #[serde(default = "default_marker_size")]
    pub size: f32,
    /// Data URI of an icon. Replaces the glyph when present.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub layer_name: Option<String>,
}

fn default_marker_color() -> Color {
    DEFAULT_MARKER
}

fn default_marker_size() -> f32 {
    1.0
}

impl MarkerRequest {
    /// Decode the icon, if any, and validate the size.
    pub fn to_layer(&self) -> Result<MarkerLayer, MapError> {
        let layer = match &self.image {
            Some(uri) => MarkerLayer::image(MarkerIcon::from_data_uri(uri)?, self.size)?,
            None => MarkerLayer::glyph(GlyphMarker::new(self.symbol, self.color, self.size)?),
        };
        Ok(match &self.layer_name {
            Some(name) => layer.with_name(name.clone()),
            None => layer,
        })
    }
}

/// A rendered map and what happened to the points.
#[derive(Debug, Clone)]
pub struct MapOutcome {
    pub rendered: RenderedMap,
    /// `filtered` or `unfiltered`; `None` when no points were sent.
    pub filter: Option<&'static str>,
    pub points_drawn: usize,
}

/// Render the map described by `request`.
#[instrument(skip(state, request), fields(area = %request.area))]
pub async fn render_map(state: &AppState, request: MapRequest) -> Result<MapOutcome, MapError> {
    let start = Instant::now();
    let result = run(state, request).await;

    match &result {
        Ok(outcome) => {
            metrics::record_render("ok", start.elapsed(), outcome.points_drawn);
            info!(
                points_drawn = outcome.points_drawn,
                filter = outcome.filter.unwrap_or("none"),
                bytes = outcome.rendered.png.len(),
                "Map request completed"
            );
        }
        Err(e) => {
            metrics::record_render(e.kind(), start.elapsed(), 0);
            warn!(error = %e, kind = e.kind(), "Map request failed");
        }
    }
    result
}

async fn run(state: &AppState, request: MapRequest) -> Result<MapOutcome, MapError> {
    let MapRequest {
        area,
        style,
        points,
        marker,
    } = request;

    // Bad area codes and marker input fail before any network traffic.
    area.validate()?;
    let mut layer = marker.as_ref().map(MarkerRequest::to_layer).transpose()?;
    let points = points.unwrap_or_default();
    let has_points = !points.is_empty();
    if layer.is_none() && has_points {
        layer = Some(MarkerLayer::glyph(GlyphMarker::default()));
    }

    let boundary = state.fetcher.fetch(&area).await?;
    let area_name = boundary.display_name().to_string();

    let assets = state.assets.clone();
    let config = state.render_config.clone();

    tokio::task::spawn_blocking(move || -> Result<MapOutcome, MapError> {
        let (kept, filter) = if has_points {
            let filtered = filter_points(&points, &boundary);
            if let FilteredPoints::Unfiltered { reason, .. } = &filtered {
                warn!(error = %reason, "Drawing unfiltered points");
                metrics::record_unfiltered();
            }
            let label = filtered.label();
            (filtered.into_points(), Some(label))
        } else {
            (PointSet::empty(), None)
        };

        let rendered = composite(
            &boundary,
            &kept,
            layer.as_ref(),
            &style,
            &config,
            &assets,
            &area_name,
        )?;

        Ok(MapOutcome {
            rendered,
            filter,
            points_drawn: kept.len(),
        })
    })
    .await
    .map_err(|e| MapError::Draw(format!("render task failed: {e}")))?
}
