//! Application state for the Mapa API.

use anyhow::{Context, Result};
use geodata::{BoundaryFetcher, GeoDataSource, HttpSource, IbgeEndpoints, MetadataCache};
use renderer::{RenderAssets, RenderConfig};
use std::sync::Arc;
use tracing::info;

use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// Boundary, name and listing lookups with the metadata cache.
    pub fetcher: BoundaryFetcher,

    /// Font and compass, loaded once at startup.
    pub assets: Arc<RenderAssets>,

    /// Canvas size and asset paths for every render.
    pub render_config: RenderConfig,
}

impl AppState {
    /// Build state that talks to the IBGE API over HTTP.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let source = HttpSource::new(config.fetch_timeout()).context("Failed to build HTTP client")?;
        let render_config = config.render_config();
        render_config
            .validate()
            .context("Invalid render configuration")?;
        let assets = RenderAssets::load(&render_config);
        Ok(Self::with_source(config, Arc::new(source), assets))
    }

    /// Build state around any data source, e.g. a scripted one in tests.
    pub fn with_source(config: &ServiceConfig, source: Arc<dyn GeoDataSource>, assets: RenderAssets) -> Self {
        let cache = Arc::new(MetadataCache::new(config.cache_config()));
        let endpoints = IbgeEndpoints::new(config.ibge_base_url.clone());

        info!(
            base_url = %endpoints.base_url(),
            cache_capacity = cache.capacity(),
            cache_ttl_secs = cache.ttl().as_secs(),
            "Application state initialized"
        );

        Self {
            fetcher: BoundaryFetcher::new(source, cache, endpoints),
            assets: Arc::new(assets),
            render_config: config.render_config(),
        }
    }
}
