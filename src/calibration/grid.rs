use super::affine::{AffineTransform, ZoneStatus, fit};
use super::control::ControlPointPair;
use super::partition::{Partition, ZoneIndex};
use crate::error::{CorrectionError, CorrectionResult};
use crate::geometry::{Envelope, Point2D};

/// One cell of the correction grid with its control points and fitted transform
#[derive(Debug, Clone)]
pub struct Zone {
    control_points: Vec<ControlPointPair>,
    transform: AffineTransform,
    status: ZoneStatus,
}

impl Zone {
    fn fitted(control_points: Vec<ControlPointPair>) -> Self {
        let (transform, status) = fit(&control_points);
        Self {
            control_points,
            transform,
            status,
        }
    }

    pub fn control_points(&self) -> &[ControlPointPair] {
        &self.control_points
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }
}

/// Piecewise-affine correction over a grid of zones
///
/// Built once from the full control-point set and read-only afterwards, so
/// [`CorrectionGrid::correct`] can be called from many threads at once.
#[derive(Debug, Clone)]
pub struct CorrectionGrid {
    horizontal_zones: usize,
    vertical_zones: usize,
    envelope: Envelope,
    partition: Partition,
    /// Indexed `[lat band][lon band]`
    zones: Vec<Vec<Zone>>,
}

impl CorrectionGrid {
    /// Partition `pairs` by source point into `horizontal × vertical` zones and
    /// fit one transform per zone.
    ///
    /// # Errors
    /// `InvalidInput` if either zone count is zero, `pairs` is empty, or a
    /// control point has a non-finite coordinate.
    pub fn build(
        pairs: &[ControlPointPair],
        horizontal: usize,
        vertical: usize,
    ) -> CorrectionResult<Self> {
        if let Some(i) = pairs.iter().position(|p| {
            !(p.source.x.is_finite()
                && p.source.y.is_finite()
                && p.target.x.is_finite()
                && p.target.y.is_finite())
        }) {
            return Err(CorrectionError::invalid(format!(
                "control point {} has a non-finite coordinate",
                i + 1
            )));
        }

        let sources: Vec<Point2D> = pairs.iter().map(|p| p.source).collect();
        let envelope = Envelope::from_points(&sources)
            .ok_or_else(|| CorrectionError::invalid("no control points to calibrate from"))?;
        let partition = Partition::from_sources(&sources, horizontal, vertical)?;

        // Every pair must be bucketed before any zone is fitted.
        let mut buckets: Vec<Vec<Vec<ControlPointPair>>> =
            vec![vec![Vec::new(); horizontal]; vertical];
        for pair in pairs {
            let idx = partition.locate(pair.source);
            buckets[idx.lat][idx.lon].push(*pair);
        }

        let zones = buckets
            .into_iter()
            .map(|row| row.into_iter().map(Zone::fitted).collect())
            .collect();

        Ok(Self {
            horizontal_zones: horizontal,
            vertical_zones: vertical,
            envelope,
            partition,
            zones,
        })
    }

    /// (horizontal zones, vertical zones)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.horizontal_zones, self.vertical_zones)
    }

    /// Extent of the source control points; points outside it are extrapolated
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn lon_bounds(&self) -> &[f64] {
        self.partition.lon_bands().bounds()
    }

    pub fn lat_bounds(&self) -> &[f64] {
        self.partition.lat_bands().bounds()
    }

    pub fn zone(&self, index: ZoneIndex) -> &Zone {
        &self.zones[index.lat][index.lon]
    }

    /// Iterate over every zone with its index, row by row
    pub fn zones(&self) -> impl Iterator<Item = (ZoneIndex, &Zone)> {
        self.zones.iter().enumerate().flat_map(|(lat, row)| {
            row.iter()
                .enumerate()
                .map(move |(lon, zone)| (ZoneIndex::new(lat, lon), zone))
        })
    }

    pub fn locate(&self, point: Point2D) -> ZoneIndex {
        self.partition.locate(point)
    }

    /// Apply the transform of the zone containing `point`
    pub fn correct(&self, point: Point2D) -> Point2D {
        self.zone(self.locate(point)).transform.apply(point)
    }

    /// Per-zone control-point counts and fit outcomes
    pub fn report(&self) -> CalibrationReport {
        CalibrationReport {
            horizontal_zones: self.horizontal_zones,
            vertical_zones: self.vertical_zones,
            zones: self
                .zones()
                .map(|(index, zone)| ZoneDiagnostic {
                    index,
                    point_count: zone.control_points.len(),
                    status: zone.status,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDiagnostic {
    pub index: ZoneIndex,
    pub point_count: usize,
    pub status: ZoneStatus,
}

/// Diagnostics for identifying under-calibrated zones
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationReport {
    pub horizontal_zones: usize,
    pub vertical_zones: usize,
    /// One entry per zone, row by row
    pub zones: Vec<ZoneDiagnostic>,
}

impl CalibrationReport {
    pub fn total_zones(&self) -> usize {
        self.zones.len()
    }

    /// Control-point counts laid out `[lat band][lon band]`
    pub fn count_matrix(&self) -> Vec<Vec<usize>> {
        self.zones
            .chunks(self.horizontal_zones.max(1))
            .map(|row| row.iter().map(|z| z.point_count).collect())
            .collect()
    }

    /// Zones that fell back to the uncorrected transform
    pub fn uncorrected(&self) -> impl Iterator<Item = &ZoneDiagnostic> {
        self.zones.iter().filter(|z| !z.status.is_fitted())
    }

    pub fn summary(&self) -> String {
        let uncorrected = self.uncorrected().count();
        if uncorrected == 0 {
            format!("All {} zones fitted", self.total_zones())
        } else {
            format!(
                "{} of {} zones fitted, {} uncorrected",
                self.total_zones() - uncorrected,
                self.total_zones(),
                uncorrected
            )
        }
    }
}
