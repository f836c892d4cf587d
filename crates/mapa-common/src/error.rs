//! Error types for the map compositing pipeline.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Failure to obtain or decode data from the boundary/name service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Malformed payload from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("Boundary payload from {url} contains no polygons")]
    Empty { url: String },

    #[error("'{code}' is not an IBGE locality code")]
    InvalidCode { code: String },
}

impl FetchError {
    /// URL of the request that failed. `None` when no request was made.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Malformed { url, .. }
            | FetchError::Empty { url } => Some(url),
            FetchError::InvalidCode { .. } => None,
        }
    }
}

/// Problems with boundary geometry or point input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Boundary union is empty")]
    EmptyUnion,

    #[error("Polygon {index} has a ring with {coords} coordinates (need at least 4)")]
    InvalidRing { index: usize, coords: usize },

    #[error("Polygon {index} contains a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    #[error("Point set is unpaired: {latitudes} latitudes vs {longitudes} longitudes")]
    Unpaired { latitudes: usize, longitudes: usize },
}

/// Primary error type returned by a render.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Boundary fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Asset unavailable: {0}")]
    AssetMissing(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

impl MapError {
    /// Stable error kind name used in logs and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            MapError::Fetch(_) => "FetchError",
            MapError::Geometry(_) => "GeometryError",
            MapError::Draw(_) => "DrawError",
            MapError::AssetMissing(_) => "AssetMissing",
            MapError::InvalidParameter { .. } => "InvalidParameter",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MapError::InvalidParameter { .. }
            | MapError::Geometry(GeometryError::Unpaired { .. })
            | MapError::Fetch(FetchError::InvalidCode { .. }) => 400,
            MapError::Fetch(FetchError::Status { status: 404, .. }) => 404,
            MapError::Fetch(FetchError::Timeout { .. }) => 504,
            MapError::Fetch(_) => 502,
            _ => 500,
        }
    }

    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        MapError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        let fetch = MapError::from(FetchError::Timeout {
            url: "http://x".to_string(),
        });
        assert_eq!(fetch.kind(), "FetchError");
        assert_eq!(MapError::Draw("oops".into()).kind(), "DrawError");
        assert_eq!(MapError::AssetMissing("compass".into()).kind(), "AssetMissing");
        assert_eq!(MapError::from(GeometryError::EmptyUnion).kind(), "GeometryError");
    }

    #[test]
    fn test_http_status_codes() {
        let upstream_500 = MapError::from(FetchError::Status {
            url: "http://x".into(),
            status: 500,
        });
        assert_eq!(upstream_500.http_status_code(), 502);

        let upstream_404 = MapError::from(FetchError::Status {
            url: "http://x".into(),
            status: 404,
        });
        assert_eq!(upstream_404.http_status_code(), 404);

        let timeout = MapError::from(FetchError::Timeout { url: "http://x".into() });
        assert_eq!(timeout.http_status_code(), 504);

        let unpaired = MapError::from(GeometryError::Unpaired {
            latitudes: 2,
            longitudes: 1,
        });
        assert_eq!(unpaired.http_status_code(), 400);
        assert_eq!(MapError::Draw("x".into()).http_status_code(), 500);

        let bad_code = MapError::from(FetchError::InvalidCode { code: "35/x".into() });
        assert_eq!(bad_code.http_status_code(), 400);
    }

    #[test]
    fn test_fetch_error_url() {
        let err = FetchError::Empty {
            url: "https://servicodados.ibge.gov.br/x".into(),
        };
        assert_eq!(err.url(), Some("https://servicodados.ibge.gov.br/x"));
        assert_eq!(FetchError::InvalidCode { code: "x".into() }.url(), None);
    }
}
