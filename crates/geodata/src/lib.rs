//! Boundary data access for the map compositor.
//!
//! - [`fetcher`]: builds IBGE URLs, consults the metadata cache and parses
//!   GeoJSON into [`mapa_common::BoundaryArea`]
//! - [`cache`]: bounded LRU with a per-entry TTL and an injectable clock
//! - [`geometry`] and [`filter`]: union containment and point filtering

pub mod cache;
pub mod endpoints;
pub mod fetcher;
pub mod filter;
pub mod geometry;
pub mod source;

pub use cache::{CacheConfig, Clock, ManualClock, MetadataCache, MetadataCacheStats, SystemClock};
pub use endpoints::{AreaListing, IbgeEndpoints};
pub use fetcher::{AreaOption, BoundaryFetcher, UNKNOWN_AREA_NAME};
pub use filter::{filter_points, FilteredPoints};
pub use geometry::UnionGeometry;
pub use source::{GeoDataSource, HttpSource};
