use geo::{BoundingRect, MultiPoint};

use super::Point2D;

/// Axis-aligned envelope of a point set, in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Envelope {
    /// Create the envelope enclosing a set of points
    ///
    /// Returns `None` for an empty set.
    pub fn from_points(points: &[Point2D]) -> Option<Self> {
        let multi: MultiPoint<f64> = points.iter().copied().map(geo::Point::from).collect();
        let rect = multi.bounding_rect()?;

        Some(Self {
            min_lon: rect.min().x,
            max_lon: rect.max().x,
            min_lat: rect.min().y,
            max_lat: rect.max().y,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}
