//! tmdd-correct - Export traffic simulation networks as TMDD JSON and correct
//! their coordinate distortion with piecewise-affine calibration

pub mod calibration;
pub mod config;
pub mod error;
pub mod geometry;
pub mod tmdd;

pub use error::{CorrectionError, CorrectionResult};
