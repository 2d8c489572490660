mod config;
mod level;
mod rules;

pub use config::{ScoringConfig, SubScoreDomain};
pub use level::{level_code_to_score, Level};
pub use rules::{round2, weighted_total};

pub(crate) use rules::{MAX_SCORE, MIN_SCORE};

use super::domain::{SubScoreField, SubScores};
use serde::{Deserialize, Serialize};

/// Stateless scorer that applies the rubric configuration to a set of sub-scores.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, sub_scores: &SubScores) -> Result<ScoreOutcome, ValidationError> {
        compute_score(sub_scores, &self.config)
    }
}

/// Validate the sub-scores and derive the composite score and level.
pub fn compute_score(
    sub_scores: &SubScores,
    config: &ScoringConfig,
) -> Result<ScoreOutcome, ValidationError> {
    rules::validate(sub_scores, config)?;

    let total_score = weighted_total(sub_scores);
    Ok(ScoreOutcome {
        total_score,
        level: Level::from_score(total_score),
        components: rules::components(sub_scores),
    })
}

/// Weighted contribution of one dimension, kept for audit views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub field: SubScoreField,
    pub raw: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Composite score, level, and the per-dimension breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub total_score: f64,
    pub level: Level,
    pub components: Vec<ScoreComponent>,
}

/// Rejected sub-score input. Values are never clamped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} score {value} is not an accepted level score")]
    OutOfRange { field: SubScoreField, value: f64 },
}

impl ValidationError {
    pub fn field(&self) -> SubScoreField {
        match self {
            ValidationError::OutOfRange { field, .. } => *field,
        }
    }
}
