//! User-supplied scatter points.
//!
//! The public contract is (latitude, longitude) pairs kept in two parallel
//! vectors. Geometry code works in (x = longitude, y = latitude); the only
//! place that crosses between the two conventions is [`to_geo_point`].

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Convert a (latitude, longitude) pair into a geometric point.
///
/// The returned point has `x = longitude` and `y = latitude`.
#[inline]
pub fn to_geo_point(latitude: f64, longitude: f64) -> Point<f64> {
    Point::new(longitude, latitude)
}

/// Index-paired latitude and longitude sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPointSet")]
pub struct PointSet {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

#[derive(Deserialize)]
struct RawPointSet {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl TryFrom<RawPointSet> for PointSet {
    type Error = GeometryError;

    fn try_from(raw: RawPointSet) -> Result<Self, Self::Error> {
        PointSet::new(raw.latitudes, raw.longitudes)
    }
}

impl PointSet {
    /// Pair two sequences. Fails if their lengths differ.
    ///
    /// Values are not range-checked; see [`PointSet::out_of_range_count`].
    pub fn new(latitudes: Vec<f64>, longitudes: Vec<f64>) -> Result<Self, GeometryError> {
        if latitudes.len() != longitudes.len() {
            return Err(GeometryError::Unpaired {
                latitudes: latitudes.len(),
                longitudes: longitudes.len(),
            });
        }
        Ok(Self {
            latitudes,
            longitudes,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (latitudes, longitudes) = pairs.into_iter().unzip();
        Self {
            latitudes,
            longitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Iterate (latitude, longitude) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.latitudes
            .iter()
            .copied()
            .zip(self.longitudes.iter().copied())
    }

    /// Geometric points in input order (x = longitude, y = latitude).
    pub fn geo_points(&self) -> Vec<Point<f64>> {
        self.iter().map(|(lat, lon)| to_geo_point(lat, lon)).collect()
    }

    /// Keep the pairs whose index is set in `mask`, preserving order.
    pub fn select(&self, mask: &[bool]) -> PointSet {
        PointSet::from_pairs(
            self.iter()
                .zip(mask.iter())
                .filter(|(_, keep)| **keep)
                .map(|(pair, _)| pair),
        )
    }

    /// Number of pairs outside [-90, 90] latitude or [-180, 180] longitude.
    ///
    /// Such points are still accepted; callers log the count.
    pub fn out_of_range_count(&self) -> usize {
        self.iter()
            .filter(|(lat, lon)| {
                !(-90.0..=90.0).contains(lat) || !(-180.0..=180.0).contains(lon)
            })
            .count()
    }
}
