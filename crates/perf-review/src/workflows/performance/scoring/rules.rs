use super::super::domain::{SubScoreField, SubScores};
use super::config::{ScoringConfig, SubScoreDomain};
use super::level::Level;
use super::{ScoreComponent, ValidationError};

/// Tolerance used when comparing a submitted sub-score with a canonical encoding.
const CANONICAL_TOLERANCE: f64 = 1e-9;

pub(crate) const MIN_SCORE: f64 = 0.5;
pub(crate) const MAX_SCORE: f64 = 1.5;

/// Dimension weights in tenths; they must add up to ten.
const WEIGHT_TENTHS: [(SubScoreField, u8); 4] = [
    (SubScoreField::TaskCompletion, 4),
    (SubScoreField::Initiative, 3),
    (SubScoreField::ProjectFeedback, 2),
    (SubScoreField::QualityImprovement, 1),
];

pub(crate) fn weight_of(field: SubScoreField) -> f64 {
    WEIGHT_TENTHS
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map(|(_, tenths)| f64::from(*tenths) / 10.0)
        .unwrap_or(0.0)
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn validate(sub_scores: &SubScores, config: &ScoringConfig) -> Result<(), ValidationError> {
    for field in SubScoreField::ordered() {
        let value = sub_scores.get(field);
        let accepted = match config.sub_score_domain {
            SubScoreDomain::Canonical => Level::ordered()
                .iter()
                .any(|level| (level.canonical_score() - value).abs() < CANONICAL_TOLERANCE),
            SubScoreDomain::Bounded => {
                value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value)
            }
        };
        if !accepted {
            return Err(ValidationError::OutOfRange { field, value });
        }
    }
    Ok(())
}

/// Weighted sum of the four dimensions, rounded to two decimals.
///
/// This is the only place the weighting formula lives; callers validate first.
pub fn weighted_total(sub_scores: &SubScores) -> f64 {
    let raw: f64 = WEIGHT_TENTHS
        .iter()
        .map(|(field, tenths)| sub_scores.get(*field) * f64::from(*tenths))
        .sum();
    round2(raw / 10.0)
}

pub(crate) fn components(sub_scores: &SubScores) -> Vec<ScoreComponent> {
    SubScoreField::ordered()
        .into_iter()
        .map(|field| {
            let raw = sub_scores.get(field);
            let weight = weight_of(field);
            ScoreComponent {
                field,
                raw,
                weight,
                contribution: raw * weight,
            }
        })
        .collect()
}
