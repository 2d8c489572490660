//! Monthly performance reviews: weighted scoring, peer-group ranking, and rater calibration.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
