//! HTTP request handlers for the Mapa API.

pub mod areas;
pub mod health;
pub mod map;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mapa_common::MapError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

/// JSON error body with the status matching the error kind.
pub fn error_response(err: &MapError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse {
        error: err.kind(),
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}
