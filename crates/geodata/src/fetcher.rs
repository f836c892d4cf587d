//! Boundary and locality lookups against the IBGE API, through the cache.

use geo::{MultiPolygon, Polygon};
use geojson::GeoJson;
use mapa_common::area::COUNTRY_NAME;
use mapa_common::{is_locality_code, AreaRef, BoundaryArea, Crs, FetchError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cache::MetadataCache;
use crate::endpoints::{AreaListing, IbgeEndpoints};
use crate::source::GeoDataSource;

/// Name used when a locality lookup fails.
pub const UNKNOWN_AREA_NAME: &str = "unknown area";

/// One selectable area: display label plus IBGE code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaOption {
    pub label: String,
    pub value: String,
}

/// Fetches boundaries, names and listings, sharing one metadata cache.
pub struct BoundaryFetcher {
    source: Arc<dyn GeoDataSource>,
    cache: Arc<MetadataCache>,
    endpoints: IbgeEndpoints,
}

impl BoundaryFetcher {
    pub fn new(
        source: Arc<dyn GeoDataSource>,
        cache: Arc<MetadataCache>,
        endpoints: IbgeEndpoints,
    ) -> Self {
        Self {
            source,
            cache,
            endpoints,
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn endpoints(&self) -> &IbgeEndpoints {
        &self.endpoints
    }

    /// Fetch JSON through the cache. Only successfully decoded documents
    /// that pass `accept` are stored.
    async fn get_json_cached<T>(
        &self,
        url: &str,
        accept: impl Fn(&Value) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        if let Some(value) = self.cache.get(url).await {
            debug!(url = %url, "Metadata cache hit");
            return accept(&value);
        }

        let value = self.source.get_json(url).await?;
        let parsed = accept(&value)?;
        self.cache.insert(url, value).await;
        Ok(parsed)
    }

    /// Fetch and parse the boundary mesh of an area, named after the
    /// locality service's `nome` for it.
    #[instrument(skip(self), fields(area = %area))]
    pub async fn fetch(&self, area: &AreaRef) -> Result<BoundaryArea, FetchError> {
        check_area(area)?;
        let url = self.endpoints.boundary_url(area);
        let (polygons, crs) = self
            .get_json_cached(&url, |value| parse_boundary(&url, value))
            .await?;

        let display_name = self.get_area_name(area).await;

        let polygon_count = polygons.0.len();
        let boundary = BoundaryArea::new(area.clone(), display_name, polygons, crs)
            .map_err(|_| FetchError::Empty { url: url.clone() })?;

        info!(
            polygons = polygon_count,
            crs = %boundary.crs().code,
            "Boundary loaded"
        );
        Ok(boundary)
    }

    /// Human-readable name of an area. Never fails: lookup problems degrade
    /// to [`UNKNOWN_AREA_NAME`].
    #[instrument(skip(self), fields(area = %area))]
    pub async fn get_area_name(&self, area: &AreaRef) -> String {
        if let Err(e) = check_area(area) {
            warn!(error = %e, "Refusing name lookup");
            return UNKNOWN_AREA_NAME.to_string();
        }
        let Some(url) = self.endpoints.name_url(area) else {
            return COUNTRY_NAME.to_string();
        };

        match self.get_json_cached(&url, |value| read_name(&url, value)).await {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Area name lookup failed, using placeholder");
                UNKNOWN_AREA_NAME.to_string()
            }
        }
    }

    /// Selectable areas for a listing, in service order.
    #[instrument(skip(self))]
    pub async fn list_areas(&self, listing: &AreaListing) -> Result<Vec<AreaOption>, FetchError> {
        if let Some(code) = listing.parent_code() {
            if !is_locality_code(code) {
                return Err(FetchError::InvalidCode {
                    code: code.to_string(),
                });
            }
        }
        let url = self.endpoints.listing_url(listing);
        self.get_json_cached(&url, |value| parse_options(&url, value))
            .await
    }
}

fn check_area(area: &AreaRef) -> Result<(), FetchError> {
    area.validate().map_err(|_| FetchError::InvalidCode {
        code: area.id.clone(),
    })
}

fn malformed(url: &str, message: impl Into<String>) -> FetchError {
    FetchError::Malformed {
        url: url.to_string(),
        message: message.into(),
    }
}

/// Declared CRS of a GeoJSON document; WGS84 when absent or projected.
fn read_crs(value: &Value) -> Crs {
    let declared = value
        .pointer("/crs/properties/name")
        .and_then(Value::as_str)
        .map(Crs::from_name);

    match declared {
        Some(crs) if crs.is_geographic() => crs,
        Some(crs) => {
            warn!(crs = %crs.code, "Boundary declares a projected CRS, assuming WGS84 degrees");
            Crs::wgs84()
        }
        None => Crs::wgs84(),
    }
}

fn geometry_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn collect_polygons(
    url: &str,
    geometry: geojson::Value,
    out: &mut Vec<Polygon<f64>>,
) -> Result<(), FetchError> {
    match geometry {
        value @ geojson::Value::Polygon(_) => {
            let polygon = Polygon::<f64>::try_from(value).map_err(|e| malformed(url, e.to_string()))?;
            out.push(polygon);
        }
        value @ geojson::Value::MultiPolygon(_) => {
            let multi =
                MultiPolygon::<f64>::try_from(value).map_err(|e| malformed(url, e.to_string()))?;
            out.extend(multi.0);
        }
        geojson::Value::GeometryCollection(members) => {
            for member in members {
                collect_polygons(url, member.value, out)?;
            }
        }
        other => {
            debug!(geometry_type = geometry_type(&other), "Skipping non-polygon geometry");
        }
    }
    Ok(())
}

/// Parse a boundary document into polygons and its CRS.
pub(crate) fn parse_boundary(url: &str, value: &Value) -> Result<(MultiPolygon<f64>, Crs), FetchError> {
    let crs = read_crs(value);
    let geojson = GeoJson::from_json_value(value.clone()).map_err(|e| malformed(url, e.to_string()))?;

    let mut polygons = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(geometry) = feature.geometry {
                    collect_polygons(url, geometry.value, &mut polygons)?;
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_polygons(url, geometry.value, &mut polygons)?;
            }
        }
        GeoJson::Geometry(geometry) => collect_polygons(url, geometry.value, &mut polygons)?,
    }

    if polygons.is_empty() {
        return Err(FetchError::Empty {
            url: url.to_string(),
        });
    }
    Ok((MultiPolygon::new(polygons), crs))
}

fn read_name(url: &str, value: &Value) -> Result<String, FetchError> {
    value
        .get("nome")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(url, "missing 'nome' field"))
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_options(url: &str, value: &Value) -> Result<Vec<AreaOption>, FetchError> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(url, "expected a JSON array"))?;

    items
        .iter()
        .map(|item| {
            let label = item.get("nome").and_then(Value::as_str);
            let id = item.get("id").and_then(id_to_string);
            match (label, id) {
                (Some(label), Some(value)) => Ok(AreaOption {
                    label: label.to_string(),
                    value,
                }),
                _ => Err(malformed(url, "listing item without 'id' and 'nome'")),
            }
        })
        .collect()
}
