//! Prometheus metrics for renders and the metadata cache.

use geodata::MetadataCacheStats;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Install the global Prometheus recorder.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// A handle that renders metrics without registering a global recorder.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

/// Record one finished render.
pub fn record_render(outcome: &'static str, duration: Duration, points_drawn: usize) {
    counter!("map_renders_total", "outcome" => outcome).increment(1);
    histogram!("map_render_duration_ms").record(duration.as_secs_f64() * 1000.0);
    if outcome == "ok" {
        histogram!("map_points_drawn").record(points_drawn as f64);
    }
}

/// Count renders whose points could not be filtered.
pub fn record_unfiltered() {
    counter!("map_points_unfiltered_total").increment(1);
}

/// Publish the cache counters as gauges.
pub fn record_cache_stats(stats: &MetadataCacheStats, entries: usize) {
    gauge!("metadata_cache_hits").set(stats.hits.load(Ordering::Relaxed) as f64);
    gauge!("metadata_cache_misses").set(stats.misses.load(Ordering::Relaxed) as f64);
    gauge!("metadata_cache_expired").set(stats.expired.load(Ordering::Relaxed) as f64);
    gauge!("metadata_cache_evictions").set(stats.evictions.load(Ordering::Relaxed) as f64);
    gauge!("metadata_cache_hit_rate").set(stats.hit_rate());
    gauge!("metadata_cache_entries").set(entries as f64);
}
