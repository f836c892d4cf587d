//! Common types shared by the boundary fetcher, the renderer and the map API.

pub mod area;
pub mod bbox;
pub mod error;
pub mod points;
pub mod style;

pub use area::{is_locality_code, AreaKind, AreaRef, BoundaryArea, Crs};
pub use bbox::BoundingBox;
pub use error::{FetchError, GeometryError, MapError, MapResult};
pub use points::{to_geo_point, PointSet};
pub use style::{Color, ColorParseError, MarkerSymbol, RenderStyle};
