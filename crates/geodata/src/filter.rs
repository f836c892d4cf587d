//! Keep only the points that fall inside an area.

use mapa_common::{BoundaryArea, GeometryError, PointSet};
use tracing::{debug, warn};

use crate::geometry::UnionGeometry;

/// Outcome of filtering a point set against an area.
#[derive(Debug, Clone, PartialEq)]
pub enum FilteredPoints {
    /// Points inside the area, in input order.
    Filtered(PointSet),
    /// The area geometry could not be used; the input is passed through.
    Unfiltered { points: PointSet, reason: GeometryError },
}

impl FilteredPoints {
    pub fn points(&self) -> &PointSet {
        match self {
            FilteredPoints::Filtered(points) => points,
            FilteredPoints::Unfiltered { points, .. } => points,
        }
    }

    pub fn into_points(self) -> PointSet {
        match self {
            FilteredPoints::Filtered(points) => points,
            FilteredPoints::Unfiltered { points, .. } => points,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FilteredPoints::Unfiltered { .. })
    }

    /// Short label reported to API clients.
    pub fn label(&self) -> &'static str {
        match self {
            FilteredPoints::Filtered(_) => "filtered",
            FilteredPoints::Unfiltered { .. } => "unfiltered",
        }
    }
}

/// Keep the points contained in the union of the area's polygons.
///
/// Order and lat/lon pairing are preserved. A geometry problem degrades to
/// [`FilteredPoints::Unfiltered`] instead of failing the render.
pub fn filter_points(points: &PointSet, area: &BoundaryArea) -> FilteredPoints {
    let out_of_range = points.out_of_range_count();
    if out_of_range > 0 {
        warn!(
            count = out_of_range,
            total = points.len(),
            "Points outside valid latitude/longitude range"
        );
    }

    let union = match UnionGeometry::from_area(area) {
        Ok(union) => union,
        Err(reason) => {
            warn!(error = %reason, area = %area.area(), "Cannot filter points, drawing all of them");
            return FilteredPoints::Unfiltered {
                points: points.clone(),
                reason,
            };
        }
    };

    let mask = union.contains_all(&points.geo_points());
    let kept = points.select(&mask);
    debug!(input = points.len(), kept = kept.len(), "Points filtered by area");
    FilteredPoints::Filtered(kept)
}
