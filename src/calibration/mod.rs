//! Piecewise-affine coordinate calibration
//!
//! Control-point pairs are bucketed into a rectangular grid of zones by their
//! source coordinate, and each zone gets its own least-squares affine fit.

pub mod affine;
pub mod control;
pub mod grid;
pub mod partition;

pub use affine::{AffineTransform, ZoneStatus, fit};
pub use control::{ControlPointPair, load_control_points, load_samples, pair_samples};
pub use grid::{CalibrationReport, CorrectionGrid, Zone, ZoneDiagnostic};
pub use partition::{AxisBands, Partition, ZoneIndex, compute_bounds};
