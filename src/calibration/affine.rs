//! Least-squares affine fitting for a single zone.
//!
//! A transform is a 3×2 coefficient matrix `M` applied to the homogeneous row
//! vector `[lon, lat, 1]`, so `[lon', lat'] = [lon, lat, 1] · M`.

use nalgebra::DMatrix;

use super::ControlPointPair;
use crate::geometry::{Point2D, point};

/// Minimum number of control points for a zone to be fitted.
pub const MIN_FIT_POINTS: usize = 3;

/// Singular values below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// Centred coordinates beyond this magnitude overflow once squared inside the SVD.
const MAX_CENTRED_MAGNITUDE: f64 = 1e150;

/// Iteration cap for the SVD; a design matrix that has not converged by then is rejected.
const MAX_SVD_ITERATIONS: usize = 1_000;

/// How a zone's transform was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStatus {
    /// Least-squares fit over the zone's control points
    Fitted,
    /// Fewer than [`MIN_FIT_POINTS`] control points; fallback transform used
    TooFewPoints,
    /// Control points are collinear or coincident; fallback transform used
    RankDeficient,
    /// Coordinates overflow or the decomposition did not converge; fallback transform used
    NumericallyUnstable,
}

impl ZoneStatus {
    pub fn is_fitted(&self) -> bool {
        matches!(self, ZoneStatus::Fitted)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ZoneStatus::Fitted => "fitted",
            ZoneStatus::TooFewPoints => "too few control points",
            ZoneStatus::RankDeficient => "control points are collinear",
            ZoneStatus::NumericallyUnstable => "control points are numerically unstable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// Rows multiply longitude, latitude and the constant term respectively.
    rows: [[f64; 2]; 3],
}

impl AffineTransform {
    pub fn from_rows(rows: [[f64; 2]; 3]) -> Self {
        Self { rows }
    }

    /// Transform used for zones that cannot be fitted.
    ///
    /// This is the minimum-norm least-squares solution of the single synthetic
    /// pair `[1, 1, 1] -> [1, 1]`, which sets every coefficient to 1/3. It is
    /// deterministic but does not correct anything meaningfully; zones using it
    /// are reported as uncorrected.
    pub fn fallback() -> Self {
        Self::from_rows([[1.0 / 3.0; 2]; 3])
    }

    pub fn rows(&self) -> &[[f64; 2]; 3] {
        &self.rows
    }

    /// Map a source-space point to target space
    pub fn apply(&self, p: Point2D) -> Point2D {
        let [a, b, c] = self.rows;
        point(
            p.x * a[0] + p.y * b[0] + c[0],
            p.x * a[1] + p.y * b[1] + c[1],
        )
    }
}

/// Fit a zone's transform from its control points.
///
/// Never fails: zones with fewer than three points, whose points do not span
/// the plane, or whose coordinates cannot be decomposed in floating point get
/// [`AffineTransform::fallback`] and a non-fitted status.
pub fn fit(pairs: &[ControlPointPair]) -> (AffineTransform, ZoneStatus) {
    if pairs.len() < MIN_FIT_POINTS {
        return (AffineTransform::fallback(), ZoneStatus::TooFewPoints);
    }

    match solve_least_squares(pairs) {
        Ok(transform) => (transform, ZoneStatus::Fitted),
        Err(status) => (AffineTransform::fallback(), status),
    }
}

/// Solve `min ||A·M - B||²` by SVD on source coordinates shifted to their centroid.
fn solve_least_squares(pairs: &[ControlPointPair]) -> Result<AffineTransform, ZoneStatus> {
    let n = pairs.len();
    // Mean of terms divided first: summing near f64::MAX overflows.
    let cx = pairs.iter().map(|p| p.source.x / n as f64).sum::<f64>();
    let cy = pairs.iter().map(|p| p.source.y / n as f64).sum::<f64>();

    let a = DMatrix::from_fn(n, 3, |r, c| match c {
        0 => pairs[r].source.x - cx,
        1 => pairs[r].source.y - cy,
        _ => 1.0,
    });
    let b = DMatrix::from_fn(n, 2, |r, c| {
        if c == 0 {
            pairs[r].target.x
        } else {
            pairs[r].target.y
        }
    });

    // The SVD iterates forever on non-finite entries, so they never reach it.
    if !(cx.is_finite() && cy.is_finite())
        || a.iter().any(|v| v.is_nan() || v.abs() > MAX_CENTRED_MAGNITUDE)
        || b.iter().any(|v| !v.is_finite())
    {
        return Err(ZoneStatus::NumericallyUnstable);
    }

    let svd = a
        .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or(ZoneStatus::NumericallyUnstable)?;
    let max_sv = svd.singular_values.max();
    if !max_sv.is_finite() {
        return Err(ZoneStatus::NumericallyUnstable);
    }
    if max_sv <= 0.0 {
        return Err(ZoneStatus::RankDeficient);
    }
    let eps = max_sv * RANK_TOLERANCE;
    if svd.rank(eps) < 3 {
        return Err(ZoneStatus::RankDeficient);
    }
    let m = svd
        .solve(&b, eps)
        .map_err(|_| ZoneStatus::NumericallyUnstable)?;

    // Fold the centroid shift back into the constant row.
    let rows = [
        [m[(0, 0)], m[(0, 1)]],
        [m[(1, 0)], m[(1, 1)]],
        [
            m[(2, 0)] - m[(0, 0)] * cx - m[(1, 0)] * cy,
            m[(2, 1)] - m[(0, 1)] * cx - m[(1, 1)] * cy,
        ],
    ];
    if rows.iter().flatten().all(|v| v.is_finite()) {
        Ok(AffineTransform::from_rows(rows))
    } else {
        Err(ZoneStatus::NumericallyUnstable)
    }
}
