use serde::{Deserialize, Serialize};

/// Which sub-score values are admissible when a manager scores a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScoreDomain {
    /// Only the five canonical level encodings.
    #[default]
    Canonical,
    /// Any finite value inside the canonical range `[0.5, 1.5]`.
    Bounded,
}

impl SubScoreDomain {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "canonical" => Some(Self::Canonical),
            "bounded" => Some(Self::Bounded),
            _ => None,
        }
    }
}

/// Rubric configuration for composite score computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub sub_score_domain: SubScoreDomain,
}
