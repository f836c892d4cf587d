//! Service configuration from command line and `MAPA_*` environment variables.

use clap::Parser;
use geodata::endpoints::DEFAULT_BASE_URL;
use geodata::CacheConfig;
use renderer::RenderConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Mapa API Server
#[derive(Parser, Debug, Clone)]
#[command(name = "mapa-api")]
#[command(about = "Renders Brazilian boundary maps with point overlays")]
pub struct ServiceConfig {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "MAPA_LISTEN_ADDR")]
    pub listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Seconds a boundary or name lookup stays cached
    #[arg(long, default_value_t = 3600, env = "MAPA_CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    /// Maximum cached lookups
    #[arg(long, default_value_t = 100, env = "MAPA_CACHE_CAPACITY")]
    pub cache_capacity: usize,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 30, env = "MAPA_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: u64,

    /// Side of the square figure in inches
    #[arg(long, default_value_t = 8.0, env = "MAPA_FIGURE_INCHES")]
    pub figure_inches: f32,

    /// Output resolution
    #[arg(long, default_value_t = 300.0, env = "MAPA_DPI")]
    pub dpi: f32,

    /// TrueType font for labels
    #[arg(long, env = "MAPA_FONT_PATH")]
    pub font_path: Option<PathBuf>,

    /// PNG or SVG compass rose
    #[arg(long, env = "MAPA_COMPASS_PATH")]
    pub compass_path: Option<PathBuf>,

    /// IBGE API root
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "MAPA_IBGE_BASE_URL")]
    pub ibge_base_url: String,

    /// Number of worker threads
    #[arg(long, env = "MAPA_WORKER_THREADS")]
    pub worker_threads: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            cache_ttl_secs: 3600,
            cache_capacity: 100,
            fetch_timeout_secs: 30,
            figure_inches: 8.0,
            dpi: 300.0,
            font_path: None,
            compass_path: None,
            ibge_base_url: DEFAULT_BASE_URL.to_string(),
            worker_threads: None,
        }
    }
}

impl ServiceConfig {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache_capacity,
            ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            figure_inches: self.figure_inches,
            dpi: self.dpi,
            font_path: self.font_path.clone(),
            compass_path: self.compass_path.clone(),
        }
    }
}
