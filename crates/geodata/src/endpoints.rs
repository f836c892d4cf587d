//! URL construction for the IBGE `servicodados` API.

use mapa_common::{AreaKind, AreaRef};

/// Public IBGE API root.
pub const DEFAULT_BASE_URL: &str = "https://servicodados.ibge.gov.br/api";

const GEOJSON_FORMAT: &str = "application/vnd.geo+json";

/// A list of selectable areas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AreaListing {
    Regions,
    States,
    StatesOfRegion(String),
    Municipalities,
    MunicipalitiesOfState(String),
}

impl AreaListing {
    /// Code of the enclosing area, for listings scoped to one.
    pub fn parent_code(&self) -> Option<&str> {
        match self {
            AreaListing::StatesOfRegion(code) | AreaListing::MunicipalitiesOfState(code) => {
                Some(code)
            }
            AreaListing::Regions | AreaListing::States | AreaListing::Municipalities => None,
        }
    }
}

/// Deterministic URL builder for boundary meshes and locality metadata.
#[derive(Debug, Clone)]
pub struct IbgeEndpoints {
    base_url: String,
}

impl Default for IbgeEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl IbgeEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn malhas(&self) -> String {
        format!("{}/v3/malhas", self.base_url)
    }

    fn localidades(&self) -> String {
        format!("{}/v1/localidades", self.base_url)
    }

    /// GeoJSON boundary mesh for an area, subdivided one level down.
    pub fn boundary_url(&self, area: &AreaRef) -> String {
        let malhas = self.malhas();
        match area.kind {
            AreaKind::Country => format!(
                "{malhas}/paises/{}?intrarregiao=UF&formato={GEOJSON_FORMAT}",
                area.id
            ),
            AreaKind::Region => format!(
                "{malhas}/regioes/{}?intrarregiao=UF&formato={GEOJSON_FORMAT}",
                area.id
            ),
            AreaKind::State => format!(
                "{malhas}/estados/{}?intrarregiao=municipio&formato={GEOJSON_FORMAT}",
                area.id
            ),
            AreaKind::Municipality => {
                format!("{malhas}/municipios/{}?formato={GEOJSON_FORMAT}", area.id)
            }
        }
    }

    /// Locality metadata carrying the `nome` field. `None` for the country,
    /// whose name is fixed.
    pub fn name_url(&self, area: &AreaRef) -> Option<String> {
        let localidades = self.localidades();
        let path = match area.kind {
            AreaKind::Country => return None,
            AreaKind::Region => "regioes",
            AreaKind::State => "estados",
            AreaKind::Municipality => "municipios",
        };
        Some(format!("{localidades}/{path}/{}", area.id))
    }

    pub fn listing_url(&self, listing: &AreaListing) -> String {
        let localidades = self.localidades();
        match listing {
            AreaListing::Regions => format!("{localidades}/regioes"),
            AreaListing::States => format!("{localidades}/estados"),
            AreaListing::StatesOfRegion(region) => {
                format!("{localidades}/regioes/{region}/estados")
            }
            AreaListing::Municipalities => format!("{localidades}/municipios"),
            AreaListing::MunicipalitiesOfState(state) => {
                format!("{localidades}/estados/{state}/municipios")
            }
        }
    }
}
