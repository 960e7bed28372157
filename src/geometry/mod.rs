pub mod envelope;

pub use envelope::Envelope;

/// A (longitude, latitude) pair in either source or target space.
///
/// `x` is longitude and `y` is latitude.
pub type Point2D = geo::Coord<f64>;

/// Build a [`Point2D`] from a longitude and latitude.
pub fn point(longitude: f64, latitude: f64) -> Point2D {
    geo::coord! { x: longitude, y: latitude }
}
