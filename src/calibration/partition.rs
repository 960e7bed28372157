use crate::error::{CorrectionError, CorrectionResult};
use crate::geometry::Point2D;

/// Position of a zone in the grid, as (latitude band, longitude band)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneIndex {
    pub lat: usize,
    pub lon: usize,
}

impl ZoneIndex {
    pub fn new(lat: usize, lon: usize) -> Self {
        Self { lat, lon }
    }
}

/// Compute `zone_count` ascending upper bounds splitting `[min(values), max(values)]`
/// into equal-width bands.
///
/// Bound `i` (1-indexed) is `min + i * (max - min) / zone_count`. When every value
/// is equal the bounds all equal that value.
pub fn compute_bounds(values: &[f64], zone_count: usize) -> CorrectionResult<Vec<f64>> {
    if zone_count < 1 {
        return Err(CorrectionError::invalid("zone count must be at least 1"));
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return Err(CorrectionError::invalid(
            "cannot compute zone bounds from an empty or non-finite value set",
        ));
    }

    Ok(split_range(min, max, zone_count))
}

fn split_range(min: f64, max: f64, zone_count: usize) -> Vec<f64> {
    if min == max {
        return vec![min; zone_count];
    }
    // Each term stays within [min, max], so ranges wider than f64::MAX do not overflow.
    let n = zone_count as f64;
    (1..=zone_count)
        .map(|i| {
            let i = i as f64;
            (min - i * (min / n)) + i * (max / n)
        })
        .collect()
}

/// Upper bounds of the bands along one axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBands {
    bounds: Vec<f64>,
    zero_width: bool,
}

impl AxisBands {
    /// Split the range of `values` into `zone_count` equal bands via [`compute_bounds`].
    pub fn from_values(values: &[f64], zone_count: usize) -> CorrectionResult<Self> {
        let bounds = compute_bounds(values, zone_count)?;
        let zero_width = bounds[0] >= bounds[bounds.len() - 1];
        Ok(Self { bounds, zero_width })
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Index of the first band whose upper bound admits `value`.
    ///
    /// Values above the last bound clamp to the last band. On a zero-width axis
    /// every value lands in the last band.
    pub fn band_of(&self, value: f64) -> usize {
        let last = self.bounds.len() - 1;
        if self.zero_width {
            return last;
        }
        self.bounds.partition_point(|&b| b < value).min(last)
    }
}

/// Grid of longitude bands by latitude bands over the calibration envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    lon: AxisBands,
    lat: AxisBands,
}

impl Partition {
    /// Partition the envelope of `sources` into `horizontal` longitude bands and
    /// `vertical` latitude bands.
    pub fn from_sources(
        sources: &[Point2D],
        horizontal: usize,
        vertical: usize,
    ) -> CorrectionResult<Self> {
        if horizontal < 1 || vertical < 1 {
            return Err(CorrectionError::invalid(format!(
                "zone counts must be at least 1 (got {horizontal} horizontal, {vertical} vertical)"
            )));
        }
        if sources.is_empty() {
            return Err(CorrectionError::invalid("no control points to partition"));
        }
        let lons: Vec<f64> = sources.iter().map(|p| p.x).collect();
        let lats: Vec<f64> = sources.iter().map(|p| p.y).collect();

        Ok(Self {
            lon: AxisBands::from_values(&lons, horizontal)?,
            lat: AxisBands::from_values(&lats, vertical)?,
        })
    }

    pub fn lon_bands(&self) -> &AxisBands {
        &self.lon
    }

    pub fn lat_bands(&self) -> &AxisBands {
        &self.lat
    }

    /// Zone containing `point`. Total over the plane: points outside the
    /// calibration envelope clamp to the nearest edge zone.
    pub fn locate(&self, point: Point2D) -> ZoneIndex {
        ZoneIndex::new(self.lat.band_of(point.y), self.lon.band_of(point.x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point;

    #[test]
    fn test_compute_bounds_equal_width() {
        let bounds = compute_bounds(&[-1.0, 0.3, 1.0], 2).unwrap();
        assert_eq!(bounds, vec![0.0, 1.0]);

        let bounds = compute_bounds(&[0.0, 10.0], 4).unwrap();
        assert_eq!(bounds.len(), 4);
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        assert!((bounds[3] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_compute_bounds_degenerate() {
        let bounds = compute_bounds(&[3.5, 3.5, 3.5], 3).unwrap();
        assert_eq!(bounds, vec![3.5, 3.5, 3.5]);
    }

    #[test]
    fn test_compute_bounds_invalid() {
        assert!(compute_bounds(&[0.0, 1.0], 0).is_err());
        assert!(compute_bounds(&[], 2).is_err());
    }

    #[test]
    fn test_compute_bounds_huge_range_stays_finite() {
        let bounds = compute_bounds(&[-1.7e308, 1.7e308], 2).unwrap();
        assert!(bounds.iter().all(|b| b.is_finite()));
        assert_eq!(bounds[0], 0.0);

        let bands = AxisBands::from_values(&[-1.7e308, 1.7e308], 2).unwrap();
        assert_eq!(bands.band_of(-1e308), 0);
        assert_eq!(bands.band_of(1e308), 1);
    }

    #[test]
    fn test_band_of_clamps() {
        let bands = AxisBands::from_values(&[-1.0, 1.0], 2).unwrap();
        assert_eq!(bands.band_of(-0.5), 0);
        assert_eq!(bands.band_of(0.0), 0);
        assert_eq!(bands.band_of(0.5), 1);
        assert_eq!(bands.band_of(5.0), 1);
        assert_eq!(bands.band_of(-100.0), 0);
    }

    #[test]
    fn test_band_of_zero_width() {
        let bands = AxisBands::from_values(&[2.0, 2.0], 3).unwrap();
        assert_eq!(bands.bounds(), &[2.0, 2.0, 2.0]);
        assert_eq!(bands.band_of(2.0), 2);
        assert_eq!(bands.band_of(-50.0), 2);
        assert_eq!(bands.band_of(50.0), 2);
    }

    #[test]
    fn test_locate_two_by_one() {
        let sources = [point(-1.0, 0.0), point(1.0, 0.0)];
        let partition = Partition::from_sources(&sources, 2, 1).unwrap();

        assert_eq!(partition.lon_bands().bounds(), &[0.0, 1.0]);
        assert_eq!(partition.lat_bands().len(), 1);
        assert_eq!(partition.locate(point(-0.5, 0.0)), ZoneIndex::new(0, 0));
        assert_eq!(partition.locate(point(0.5, 0.0)), ZoneIndex::new(0, 1));
        assert_eq!(partition.locate(point(5.0, 0.0)), ZoneIndex::new(0, 1));
    }

    #[test]
    fn test_locate_is_total() {
        let sources = [point(-118.2, 34.0), point(-118.0, 34.3), point(-118.1, 34.1)];
        let partition = Partition::from_sources(&sources, 3, 4).unwrap();

        let samples = [
            -1e9, -180.0, -118.3, -118.15, -118.1, -118.05, 0.0, 34.0, 34.2, 90.0, 1e9,
        ];
        for &x in &samples {
            for &y in &samples {
                let idx = partition.locate(point(x, y));
                assert!(idx.lat < 4, "lat index out of range for ({x}, {y})");
                assert!(idx.lon < 3, "lon index out of range for ({x}, {y})");
            }
        }

        let idx = partition.locate(point(f64::NAN, f64::INFINITY));
        assert!(idx.lat < 4 && idx.lon < 3);
    }

    #[test]
    fn test_partition_rejects_zero_zones() {
        let sources = [point(0.0, 0.0)];
        assert!(Partition::from_sources(&sources, 0, 1).is_err());
        assert!(Partition::from_sources(&sources, 1, 0).is_err());
        assert!(Partition::from_sources(&[], 1, 1).is_err());
    }
}
