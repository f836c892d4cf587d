//! IBGE-shaped fixtures.
//!
//! Geometry is deliberately coarse: rectangles and a rough country outline
//! that are easy to reason about in containment and pixel tests.

use serde_json::{json, Value};

/// Region code of Sudeste.
pub const SUDESTE_ID: &str = "3";
/// State code of São Paulo.
pub const SAO_PAULO_STATE_ID: &str = "35";
/// Municipality code of São Paulo city.
pub const SAO_PAULO_CITY_ID: &str = "3550308";

/// Well-known points as (latitude, longitude).
pub mod points {
    /// São Paulo city centre, inside every São Paulo fixture.
    pub const SAO_PAULO_CITY: (f64, f64) = (-23.55, -46.63);
    /// Campinas, inside the state but outside the city.
    pub const CAMPINAS: (f64, f64) = (-22.91, -47.06);
    /// Rio de Janeiro, inside Sudeste but outside São Paulo state.
    pub const RIO: (f64, f64) = (-22.91, -43.17);
    /// Gulf of Guinea, outside everything.
    pub const NULL_ISLAND: (f64, f64) = (0.0, 0.0);
}

/// Bounding boxes of the fixtures as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    pub const BRAZIL: (f64, f64, f64, f64) = (-74.0, -33.7, -34.8, 5.3);
    pub const SUDESTE: (f64, f64, f64, f64) = (-53.0, -25.5, -39.7, -14.2);
    pub const SAO_PAULO_STATE: (f64, f64, f64, f64) = (-53.0, -25.5, -44.0, -19.5);
    pub const SAO_PAULO_CITY: (f64, f64, f64, f64) = (-46.83, -24.0, -46.36, -23.36);
}

fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Value {
    json!([[
        [min_lon, min_lat],
        [max_lon, min_lat],
        [max_lon, max_lat],
        [min_lon, max_lat],
        [min_lon, min_lat]
    ]])
}

fn feature(codarea: &str, geometry: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": {"codarea": codarea},
        "geometry": geometry
    })
}

fn collection(features: Vec<Value>) -> Value {
    json!({"type": "FeatureCollection", "features": features})
}

/// Country mesh: a coarse outline split into a northern and a southern
/// part that share the edge at latitude -15.
pub fn brazil_geojson() -> Value {
    let north = json!({
        "type": "Polygon",
        "coordinates": [[
            [-74.0, -15.0], [-74.0, -7.0], [-70.0, 2.0], [-60.0, 5.3],
            [-51.0, 4.0], [-35.0, -5.0], [-34.8, -8.0], [-39.0, -15.0],
            [-74.0, -15.0]
        ]]
    });
    let south = json!({
        "type": "Polygon",
        "coordinates": [[
            [-74.0, -15.0], [-39.0, -15.0], [-40.0, -22.0], [-48.0, -28.0],
            [-53.0, -33.7], [-57.0, -30.0], [-58.0, -20.0], [-74.0, -15.0]
        ]]
    });
    collection(vec![feature("N", north), feature("S", south)])
}

/// Sudeste mesh: São Paulo state plus a block standing in for the rest.
pub fn sudeste_geojson() -> Value {
    collection(vec![
        feature(
            "35",
            json!({"type": "Polygon", "coordinates": rectangle(-53.0, -25.5, -44.0, -19.5)}),
        ),
        feature(
            "33",
            json!({"type": "Polygon", "coordinates": rectangle(-44.0, -25.5, -39.7, -14.2)}),
        ),
    ])
}

/// São Paulo state mesh: two municipalities tiling the state rectangle,
/// sharing the meridian -48.5.
pub fn sao_paulo_state_geojson() -> Value {
    json!({
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4674"}},
        "features": [
            feature(
                "3500001",
                json!({"type": "Polygon", "coordinates": rectangle(-53.0, -25.5, -48.5, -19.5)}),
            ),
            feature(
                "3500002",
                json!({"type": "MultiPolygon", "coordinates": [rectangle(-48.5, -25.5, -44.0, -19.5)]}),
            )
        ]
    })
}

/// São Paulo city mesh: one small rectangle.
pub fn sao_paulo_city_geojson() -> Value {
    collection(vec![feature(
        SAO_PAULO_CITY_ID,
        json!({"type": "Polygon", "coordinates": rectangle(-46.83, -24.0, -46.36, -23.36)}),
    )])
}

/// A mesh whose only feature is a point, so it has no polygons.
pub fn pointless_geojson() -> Value {
    collection(vec![feature(
        "0",
        json!({"type": "Point", "coordinates": [-46.63, -23.55]}),
    )])
}

/// Locality metadata as returned by `/v1/localidades/...`.
pub fn name_json(id: &str, nome: &str) -> Value {
    json!({"id": id.parse::<u64>().ok(), "nome": nome})
}

pub fn regions_json() -> Value {
    json!([
        {"id": 1, "sigla": "N", "nome": "Norte"},
        {"id": 2, "sigla": "NE", "nome": "Nordeste"},
        {"id": 3, "sigla": "SE", "nome": "Sudeste"},
        {"id": 4, "sigla": "S", "nome": "Sul"},
        {"id": 5, "sigla": "CO", "nome": "Centro-Oeste"}
    ])
}

pub fn sudeste_states_json() -> Value {
    json!([
        {"id": 31, "sigla": "MG", "nome": "Minas Gerais"},
        {"id": 32, "sigla": "ES", "nome": "Espírito Santo"},
        {"id": 33, "sigla": "RJ", "nome": "Rio de Janeiro"},
        {"id": 35, "sigla": "SP", "nome": "São Paulo"}
    ])
}

pub fn sao_paulo_municipalities_json() -> Value {
    json!([
        {"id": 3509502, "nome": "Campinas"},
        {"id": 3548708, "nome": "São Bernardo do Campo"},
        {"id": 3550308, "nome": "São Paulo"}
    ])
}
