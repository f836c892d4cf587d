//! Administrative areas and their boundary geometry.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bbox::BoundingBox;
use crate::error::{GeometryError, MapError};

/// Level of the Brazilian administrative hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaKind {
    #[serde(alias = "pais")]
    Country,
    #[serde(alias = "regiao")]
    Region,
    #[serde(alias = "uf")]
    State,
    #[serde(alias = "municipio")]
    Municipality,
}

impl AreaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaKind::Country => "country",
            AreaKind::Region => "region",
            AreaKind::State => "state",
            AreaKind::Municipality => "municipality",
        }
    }
}

impl fmt::Display for AreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of the code used by the boundary service for the whole country.
pub const COUNTRY_ID: &str = "BR";

/// Display name of the country area.
pub const COUNTRY_NAME: &str = "Brasil";

/// Longest IBGE locality code (municipalities use seven digits).
pub const MAX_CODE_DIGITS: usize = 7;

/// Whether `code` looks like an IBGE locality code: one to seven ASCII digits.
///
/// Codes are interpolated into upstream URL paths, so anything else
/// (separators, dots, query characters) is refused.
pub fn is_locality_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= MAX_CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}

/// Reference to one administrative area: its level plus the IBGE code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAreaRef")]
pub struct AreaRef {
    pub kind: AreaKind,
    pub id: String,
}

#[derive(Deserialize)]
struct RawAreaRef {
    kind: AreaKind,
    #[serde(default = "default_area_id")]
    id: String,
}

fn default_area_id() -> String {
    COUNTRY_ID.to_string()
}

impl TryFrom<RawAreaRef> for AreaRef {
    type Error = MapError;

    fn try_from(raw: RawAreaRef) -> Result<Self, Self::Error> {
        let area = AreaRef::new(raw.kind, raw.id);
        area.validate()?;
        Ok(area)
    }
}

impl AreaRef {
    pub fn new(kind: AreaKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn country() -> Self {
        Self::new(AreaKind::Country, COUNTRY_ID)
    }

    pub fn region(id: impl Into<String>) -> Self {
        Self::new(AreaKind::Region, id)
    }

    pub fn state(id: impl Into<String>) -> Self {
        Self::new(AreaKind::State, id)
    }

    pub fn municipality(id: impl Into<String>) -> Self {
        Self::new(AreaKind::Municipality, id)
    }

    /// Check the code before it is used to build an upstream URL.
    pub fn validate(&self) -> Result<(), MapError> {
        let valid = match self.kind {
            AreaKind::Country => self.id == COUNTRY_ID,
            _ => is_locality_code(&self.id),
        };
        if valid {
            Ok(())
        } else {
            Err(MapError::invalid_parameter(
                "area.id",
                format!("'{}' is not a valid {} code", self.id, self.kind),
            ))
        }
    }
}

impl fmt::Display for AreaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Coordinate reference declared by a boundary payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub code: String,
}

impl Crs {
    pub fn wgs84() -> Self {
        Self {
            code: "EPSG:4326".to_string(),
        }
    }

    /// Build from a GeoJSON `crs.properties.name` value.
    ///
    /// Accepts both `EPSG:4674` and the OGC URN form
    /// `urn:ogc:def:crs:EPSG::4674`.
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        let code = if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:") {
            rest.replace("::", ":")
        } else {
            upper
        };
        Self { code }
    }

    /// Whether coordinates are unprojected longitude/latitude degrees.
    pub fn is_geographic(&self) -> bool {
        matches!(
            self.code.as_str(),
            "EPSG:4326" | "EPSG:4674" | "OGC:1.3:CRS84" | "OGC:CRS84" | "CRS84"
        )
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// An administrative area with its boundary polygons.
///
/// Created per render request and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct BoundaryArea {
    area: AreaRef,
    display_name: String,
    polygons: MultiPolygon<f64>,
    bbox: BoundingBox,
    crs: Crs,
}

impl BoundaryArea {
    /// Build an area, rejecting an empty polygon collection.
    pub fn new(
        area: AreaRef,
        display_name: impl Into<String>,
        polygons: MultiPolygon<f64>,
        crs: Crs,
    ) -> Result<Self, GeometryError> {
        if polygons.0.is_empty() {
            return Err(GeometryError::EmptyUnion);
        }
        let bbox = BoundingBox::of_polygons(&polygons).ok_or(GeometryError::EmptyUnion)?;

        Ok(Self {
            area,
            display_name: display_name.into(),
            polygons,
            bbox,
            crs,
        })
    }

    /// Same geometry under a different display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn area(&self) -> &AreaRef {
        &self.area
    }

    pub fn kind(&self) -> AreaKind {
        self.area.kind
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn polygons(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }
}
