//! Map rasterization for Brazilian boundary maps.
//!
//! Draws the pieces of a map in order:
//! - Boundary polygons with fill and border
//! - Point markers (glyphs or an icon)
//! - Legend box and compass rose
//! - Tight-cropped PNG with a data URI

pub mod compass;
pub mod compose;
pub mod encode;
pub mod figure;
pub mod legend;
pub mod map;
pub mod markers;
pub mod png;
pub mod text;

pub use compass::Compass;
pub use compose::{composite, RenderAssets};
pub use encode::{encode_figure, RenderedMap};
pub use figure::{DrawingContext, Figure, LegendContext, RenderConfig};
pub use legend::{build_legend, draw_legend, Legend, LegendEntry, LEGEND_TITLE};
pub use map::{render_base, BaseMap};
pub use markers::{GlyphMarker, MarkerIcon, MarkerLayer, MarkerSpec, DEFAULT_LAYER_NAME};
pub use text::TextRenderer;
