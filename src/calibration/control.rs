use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CorrectionError, CorrectionResult};
use crate::geometry::{Point2D, point};

/// A manually collected (simulation-space, real-world) coordinate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPointPair {
    pub source: Point2D,
    pub target: Point2D,
}

impl ControlPointPair {
    pub fn new(source: Point2D, target: Point2D) -> Self {
        Self { source, target }
    }
}

/// Load a header-less `longitude,latitude` CSV of sample points.
pub fn load_samples(path: &Path) -> CorrectionResult<Vec<Point2D>> {
    let file = File::open(path).map_err(|e| CorrectionError::io(path, e))?;
    read_samples(file, &path.display().to_string())
}

/// Like [`load_samples`] but reads from any `Read` source. `label` names the
/// source in error messages.
pub fn read_samples<R: Read>(reader: R, label: &str) -> CorrectionResult<Vec<Point2D>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() != 2 {
            return Err(CorrectionError::invalid(format!(
                "{label} row {}: expected 2 fields (longitude, latitude), found {}",
                row + 1,
                record.len()
            )));
        }

        let parse = |field: &str| {
            field.parse::<f64>().map_err(|_| {
                CorrectionError::invalid(format!(
                    "{label} row {}: '{field}' is not a number",
                    row + 1
                ))
            })
        };
        let lon = parse(&record[0])?;
        let lat = parse(&record[1])?;
        if !lon.is_finite() || !lat.is_finite() {
            return Err(CorrectionError::invalid(format!(
                "{label} row {}: coordinates must be finite",
                row + 1
            )));
        }
        samples.push(point(lon, lat));
    }

    Ok(samples)
}

/// Zip index-aligned source and target samples into control-point pairs.
pub fn pair_samples(
    source: Vec<Point2D>,
    target: Vec<Point2D>,
) -> CorrectionResult<Vec<ControlPointPair>> {
    if source.len() != target.len() {
        return Err(CorrectionError::invalid(format!(
            "mismatched control points: {} source samples but {} target samples",
            source.len(),
            target.len()
        )));
    }
    if source.is_empty() {
        return Err(CorrectionError::invalid("no control points provided"));
    }

    Ok(source
        .into_iter()
        .zip(target)
        .map(|(s, t)| ControlPointPair::new(s, t))
        .collect())
}

/// Load both sample files and pair them.
pub fn load_control_points(
    source_path: &Path,
    target_path: &Path,
) -> CorrectionResult<Vec<ControlPointPair>> {
    let source = load_samples(source_path)?;
    let target = load_samples(target_path)?;
    pair_samples(source, target)
}
