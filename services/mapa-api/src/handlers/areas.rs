//! Area selection listings.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use geodata::AreaListing;
use mapa_common::{is_locality_code, MapError};
use serde::Deserialize;

use super::error_response;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatesQuery {
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MunicipalitiesQuery {
    pub state: Option<String>,
}

/// Non-blank parent code from a query, refusing anything but an IBGE code.
fn parent_code(param: &str, value: Option<String>) -> Result<Option<String>, MapError> {
    match value.filter(|id| !id.trim().is_empty()) {
        Some(code) if is_locality_code(code.trim()) => Ok(Some(code.trim().to_string())),
        Some(code) => Err(MapError::invalid_parameter(
            param,
            format!("'{code}' is not an IBGE locality code"),
        )),
        None => Ok(None),
    }
}

async fn list(state: &AppState, listing: AreaListing) -> Response {
    match state.fetcher.list_areas(&listing).await {
        Ok(options) => Json(options).into_response(),
        Err(e) => error_response(&MapError::from(e)),
    }
}

/// GET /api/areas/regions
pub async fn regions_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    list(&state, AreaListing::Regions).await
}

/// GET /api/areas/states?region=3
pub async fn states_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<StatesQuery>,
) -> Response {
    let listing = match parent_code("region", query.region) {
        Ok(Some(region)) => AreaListing::StatesOfRegion(region),
        Ok(None) => AreaListing::States,
        Err(e) => return error_response(&e),
    };
    list(&state, listing).await
}

/// GET /api/areas/municipalities?state=35
pub async fn municipalities_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<MunicipalitiesQuery>,
) -> Response {
    let listing = match parent_code("state", query.state) {
        Ok(Some(uf)) => AreaListing::MunicipalitiesOfState(uf),
        Ok(None) => AreaListing::Municipalities,
        Err(e) => return error_response(&e),
    };
    list(&state, listing).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_code() {
        assert_eq!(parent_code("state", Some(" 35 ".into())).unwrap(), Some("35".into()));
        assert_eq!(parent_code("state", Some("  ".into())).unwrap(), None);
        assert_eq!(parent_code("state", None).unwrap(), None);

        let err = parent_code("region", Some("3/estados".into())).unwrap_err();
        assert_eq!(err.http_status_code(), 400);
        assert!(err.to_string().contains("'region'"));
    }
}
