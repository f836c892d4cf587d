//! Union geometry of an area's polygons and point containment.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{coord, BoundingRect, Coord, LineString, Point, Polygon};
use mapa_common::{BoundaryArea, BoundingBox, GeometryError};
use rayon::prelude::*;
use std::f64::consts::TAU;

/// Point count above which containment is tested on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 4096;

/// Directions sampled around a point that sits on a member edge.
const NEIGHBOUR_SAMPLES: usize = 32;

/// Sampling radius as a fraction of the union's larger extent.
const NEIGHBOUR_RADIUS: f64 = 1e-9;

struct Member {
    polygon: Polygon<f64>,
    bbox: BoundingBox,
}

/// The region covered by all polygons of an area, treated as one shape.
///
/// Member polygons of an IBGE mesh tile the area. A point lies in the
/// union when it is inside some member, or when it sits on member edges
/// and every point in a small neighbourhood around it is still covered.
/// The rim of the union (outer ring, holes, rim vertices, corners where
/// members only touch) counts as outside.
pub struct UnionGeometry {
    members: Vec<Member>,
    bbox: BoundingBox,
    radius: f64,
}

fn validate_ring(index: usize, ring: &LineString<f64>) -> Result<(), GeometryError> {
    if ring.0.len() < 4 {
        return Err(GeometryError::InvalidRing {
            index,
            coords: ring.0.len(),
        });
    }
    if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFiniteCoordinate { index });
    }
    Ok(())
}

impl UnionGeometry {
    /// Validate and index the polygons of an area.
    pub fn from_area(area: &BoundaryArea) -> Result<Self, GeometryError> {
        let polygons = &area.polygons().0;
        if polygons.is_empty() {
            return Err(GeometryError::EmptyUnion);
        }

        let mut members = Vec::with_capacity(polygons.len());
        for (index, polygon) in polygons.iter().enumerate() {
            validate_ring(index, polygon.exterior())?;
            for interior in polygon.interiors() {
                validate_ring(index, interior)?;
            }
            let bbox = polygon
                .bounding_rect()
                .map(BoundingBox::from)
                .ok_or(GeometryError::InvalidRing { index, coords: 0 })?;
            members.push(Member {
                polygon: polygon.clone(),
                bbox,
            });
        }

        let bbox = *area.bbox();
        let radius = (bbox.width().max(bbox.height()) * NEIGHBOUR_RADIUS).max(f64::EPSILON);
        Ok(Self {
            members,
            bbox,
            radius,
        })
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Whether a point (x = longitude, y = latitude) lies in the union.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        let (x, y) = (point.x(), point.y());
        if !self.bbox.contains_point(x, y) {
            return false;
        }

        let mut on_edge = false;
        for member in self.members.iter().filter(|m| m.bbox.contains_point(x, y)) {
            match member.polygon.coordinate_position(&point.0) {
                CoordPos::Inside => return true,
                CoordPos::OnBoundary => on_edge = true,
                CoordPos::Outside => {}
            }
        }
        if !on_edge {
            return false;
        }

        // On an edge: interior of the union only if no nearby point escapes it.
        (0..NEIGHBOUR_SAMPLES).all(|k| {
            let angle = TAU * k as f64 / NEIGHBOUR_SAMPLES as f64;
            self.covers(coord! {
                x: x + self.radius * angle.cos(),
                y: y + self.radius * angle.sin(),
            })
        })
    }

    /// Whether some member contains the coordinate or has it on its edge.
    fn covers(&self, c: Coord<f64>) -> bool {
        self.members.iter().any(|m| {
            m.bbox.contains_point(c.x, c.y)
                && !matches!(m.polygon.coordinate_position(&c), CoordPos::Outside)
        })
    }

    /// Containment flag for each point, in input order.
    pub fn contains_all(&self, points: &[Point<f64>]) -> Vec<bool> {
        if points.len() >= PARALLEL_THRESHOLD {
            points.par_iter().map(|p| self.contains(p)).collect()
        } else {
            points.iter().map(|p| self.contains(p)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use mapa_common::{AreaRef, Crs};

    fn area_of(polygons: Vec<Polygon<f64>>) -> BoundaryArea {
        BoundaryArea::new(AreaRef::state("35"), "Test", MultiPolygon::new(polygons), Crs::default())
            .unwrap()
    }

    fn unit_square(x0: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: 0.0),
            (x: x0 + 1.0, y: 0.0),
            (x: x0 + 1.0, y: 1.0),
            (x: x0, y: 1.0),
            (x: x0, y: 0.0),
        ]
    }

    #[test]
    fn test_inside_and_outside() {
        let union = UnionGeometry::from_area(&area_of(vec![unit_square(0.0)])).unwrap();
        assert!(union.contains(&Point::new(0.5, 0.5)));
        assert!(!union.contains(&Point::new(1.5, 0.5)));
        assert!(!union.contains(&Point::new(-10.0, 40.0)));
    }

    #[test]
    fn test_outer_boundary_is_outside() {
        let union = UnionGeometry::from_area(&area_of(vec![unit_square(0.0)])).unwrap();
        assert!(!union.contains(&Point::new(0.0, 0.5)));
    }

    #[test]
    fn test_shared_edge_is_inside_union() {
        let union =
            UnionGeometry::from_area(&area_of(vec![unit_square(0.0), unit_square(1.0)])).unwrap();
        assert!(union.contains(&Point::new(1.0, 0.5)));
        assert!(!union.contains(&Point::new(2.0, 0.5)));
    }

    #[test]
    fn test_rim_vertex_shared_by_two_members_is_outside() {
        let union =
            UnionGeometry::from_area(&area_of(vec![unit_square(0.0), unit_square(1.0)])).unwrap();
        assert!(!union.contains(&Point::new(1.0, 0.0)));
        assert!(!union.contains(&Point::new(1.0, 1.0)));
        assert!(!union.contains(&Point::new(0.5, 0.0)));
    }

    #[test]
    fn test_members_touching_at_a_corner() {
        let diagonal = polygon![
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 2.0),
            (x: 1.0, y: 2.0),
            (x: 1.0, y: 1.0),
        ];
        let union = UnionGeometry::from_area(&area_of(vec![unit_square(0.0), diagonal])).unwrap();
        assert!(!union.contains(&Point::new(1.0, 1.0)));
        assert!(union.contains(&Point::new(0.5, 0.5)));
        assert!(union.contains(&Point::new(1.5, 1.5)));
    }

    #[test]
    fn test_vertex_where_four_members_meet_is_inside() {
        let shifted = |x0: f64, y0: f64| {
            polygon![
                (x: x0, y: y0),
                (x: x0 + 1.0, y: y0),
                (x: x0 + 1.0, y: y0 + 1.0),
                (x: x0, y: y0 + 1.0),
                (x: x0, y: y0),
            ]
        };
        let union = UnionGeometry::from_area(&area_of(vec![
            shifted(0.0, 0.0),
            shifted(1.0, 0.0),
            shifted(0.0, 1.0),
            shifted(1.0, 1.0),
        ]))
        .unwrap();
        assert!(union.contains(&Point::new(1.0, 1.0)));
        assert!(union.contains(&Point::new(1.0, 0.5)));
        assert!(!union.contains(&Point::new(1.0, 0.0)));
        assert!(!union.contains(&Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_hole_is_outside() {
        let with_hole = polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
                (x: 0.0, y: 0.0),
            ],
            interiors: [[
                (x: 4.0, y: 4.0),
                (x: 6.0, y: 4.0),
                (x: 6.0, y: 6.0),
                (x: 4.0, y: 6.0),
                (x: 4.0, y: 4.0),
            ]],
        );
        let union = UnionGeometry::from_area(&area_of(vec![with_hole])).unwrap();
        assert!(union.contains(&Point::new(2.0, 2.0)));
        assert!(!union.contains(&Point::new(5.0, 5.0)));
        assert!(!union.contains(&Point::new(4.0, 5.0)));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let bad = polygon![
            (x: 0.0, y: 0.0),
            (x: f64::NAN, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        let area = area_of(vec![unit_square(5.0), bad]);
        assert!(matches!(
            UnionGeometry::from_area(&area),
            Err(GeometryError::NonFiniteCoordinate { index: 1 })
        ));
    }

    #[test]
    fn test_degenerate_ring_rejected() {
        let degenerate = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]), vec![]);
        let area = area_of(vec![degenerate]);
        assert!(matches!(
            UnionGeometry::from_area(&area),
            Err(GeometryError::InvalidRing { index: 0, .. })
        ));
    }

    #[test]
    fn test_parallel_and_serial_agree() {
        let union = UnionGeometry::from_area(&area_of(vec![unit_square(0.0)])).unwrap();
        let points: Vec<Point<f64>> = (0..PARALLEL_THRESHOLD + 10)
            .map(|i| Point::new((i % 300) as f64 / 100.0 - 1.0, 0.5))
            .collect();
        let parallel = union.contains_all(&points);
        let serial: Vec<bool> = points.iter().map(|p| union.contains(p)).collect();
        assert_eq!(parallel, serial);
    }
}
