//! Scripted stand-in for the IBGE service.

use async_trait::async_trait;
use geodata::GeoDataSource;
use mapa_common::FetchError;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::fixtures;

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Status(u16),
    Timeout,
}

/// A [`GeoDataSource`] that answers from fixed routes and counts calls.
///
/// Routes match when the URL path (query stripped) ends with the route
/// suffix. Later registrations win, so builders can override defaults.
/// Unmatched URLs answer HTTP 404.
#[derive(Debug, Default)]
pub struct FakeSource {
    routes: Mutex<Vec<(String, Reply)>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes for the fixture areas in [`fixtures`].
    pub fn ibge() -> Self {
        use fixtures::*;
        Self::new()
            .with_json("/malhas/paises/BR", brazil_geojson())
            .with_json(format!("/malhas/regioes/{SUDESTE_ID}"), sudeste_geojson())
            .with_json(format!("/malhas/estados/{SAO_PAULO_STATE_ID}"), sao_paulo_state_geojson())
            .with_json(format!("/malhas/municipios/{SAO_PAULO_CITY_ID}"), sao_paulo_city_geojson())
            .with_json(format!("/localidades/regioes/{SUDESTE_ID}"), name_json(SUDESTE_ID, "Sudeste"))
            .with_json(
                format!("/localidades/estados/{SAO_PAULO_STATE_ID}"),
                name_json(SAO_PAULO_STATE_ID, "São Paulo"),
            )
            .with_json(
                format!("/localidades/municipios/{SAO_PAULO_CITY_ID}"),
                name_json(SAO_PAULO_CITY_ID, "São Paulo"),
            )
            .with_json("/localidades/regioes", regions_json())
            .with_json(format!("/localidades/regioes/{SUDESTE_ID}/estados"), sudeste_states_json())
            .with_json("/localidades/estados", sudeste_states_json())
            .with_json(
                format!("/localidades/estados/{SAO_PAULO_STATE_ID}/municipios"),
                sao_paulo_municipalities_json(),
            )
            .with_json("/localidades/municipios", sao_paulo_municipalities_json())
    }

    /// A source where every request fails with `status`.
    pub fn failing_status(status: u16) -> Self {
        Self::new().with_status("", status)
    }

    fn with_reply(self, suffix: impl Into<String>, reply: Reply) -> Self {
        self.routes
            .lock()
            .expect("routes lock poisoned")
            .push((suffix.into(), reply));
        self
    }

    pub fn with_json(self, suffix: impl Into<String>, body: Value) -> Self {
        self.with_reply(suffix, Reply::Json(body))
    }

    pub fn with_status(self, suffix: impl Into<String>, status: u16) -> Self {
        self.with_reply(suffix, Reply::Status(status))
    }

    pub fn with_timeout(self, suffix: impl Into<String>) -> Self {
        self.with_reply(suffix, Reply::Timeout)
    }

    /// Total number of requests served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests whose URL contains `fragment`.
    pub fn calls_matching(&self, fragment: &str) -> usize {
        self.requested_urls()
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().expect("requests lock poisoned").clone()
    }
}

#[async_trait]
impl GeoDataSource for FakeSource {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .expect("requests lock poisoned")
            .push(url.to_string());

        let path = url.split('?').next().unwrap_or(url);
        let reply = self
            .routes
            .lock()
            .expect("routes lock poisoned")
            .iter()
            .rev()
            .find(|(suffix, _)| path.ends_with(suffix.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(Reply::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_match_by_path_suffix() {
        let source = FakeSource::ibge();
        let body = source
            .get_json("http://x/api/v1/localidades/estados/35")
            .await
            .unwrap();
        assert_eq!(body["nome"], "São Paulo");

        let listing = source
            .get_json("http://x/api/v1/localidades/estados/35/municipios")
            .await
            .unwrap();
        assert!(listing.is_array());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_later_routes_override() {
        let source = FakeSource::ibge().with_status("/malhas/paises/BR", 500);
        let err = source
            .get_json("http://x/api/v3/malhas/paises/BR?intrarregiao=UF")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let source = FakeSource::new();
        let err = tokio_test::block_on(source.get_json("http://x/nowhere")).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(source.calls_matching("nowhere"), 1);
    }
}
