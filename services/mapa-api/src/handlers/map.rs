//! Map rendering endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mapa_common::MapError;
use serde::Serialize;

use super::error_response;
use crate::pipeline::{render_map, MapRequest};
use crate::state::AppState;

/// File name offered by the download endpoint.
pub const DOWNLOAD_FILENAME: &str = "mapa.png";

#[derive(Debug, Serialize)]
pub struct MapResponse {
    /// `data:image/png;base64,...`
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<&'static str>,
    pub points_drawn: usize,
    pub width: u32,
    pub height: u32,
}

fn parse_body(body: Result<Json<MapRequest>, JsonRejection>) -> Result<MapRequest, MapError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| MapError::invalid_parameter("body", rejection.body_text()))
}

/// POST /api/map - Render and return the map as a data URI
pub async fn map_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<MapRequest>, JsonRejection>,
) -> Response {
    let request = match parse_body(body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    match render_map(&state, request).await {
        Ok(outcome) => Json(MapResponse {
            image: outcome.rendered.data_uri(),
            filter: outcome.filter,
            points_drawn: outcome.points_drawn,
            width: outcome.rendered.width,
            height: outcome.rendered.height,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/map/download - Render and return the PNG as an attachment
pub async fn download_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<MapRequest>, JsonRejection>,
) -> Response {
    let request = match parse_body(body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    match render_map(&state, request).await {
        Ok(outcome) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{DOWNLOAD_FILENAME}\""),
                ),
            ],
            outcome.rendered.png,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
