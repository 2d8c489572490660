use serde::{Deserialize, Serialize};

/// How a bias-corrected score is derived from a raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Map the manager's distribution onto the company distribution.
    #[default]
    ZScore,
    /// Map the manager's min..max range onto the company range.
    MinMax,
    /// Z-score, pulled towards min-max for managers who barely differentiate.
    Blended,
}

impl NormalizationMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "z_score" | "zscore" => Some(Self::ZScore),
            "min_max" | "minmax" => Some(Self::MinMax),
            "blended" => Some(Self::Blended),
            _ => None,
        }
    }
}

/// Parameters for rater calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Managers with fewer scored records are reported but left unclassified.
    pub minimum_sample_size: usize,
    /// Multiple of the company standard deviation a manager mean may drift before being labelled.
    pub strictness_multiplier: f64,
    /// Standard deviation below which a manager is treated as not differentiating.
    pub flat_stddev_threshold: f64,
    /// Whether a recompute writes normalized scores at all.
    pub normalize: bool,
    pub method: NormalizationMethod,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            minimum_sample_size: 3,
            strictness_multiplier: 0.5,
            flat_stddev_threshold: 0.01,
            normalize: true,
            method: NormalizationMethod::ZScore,
        }
    }
}
