//! Rater calibration: per-manager scoring statistics against the company distribution, and
//! optional bias-corrected scores.
//!
//! Calibration only ever produces [`ManagerCalibrationStats`] and normalized scores. Raw scores,
//! levels, and ranks are left as they are so the original evaluation stays auditable.

mod config;
mod normalize;
mod stats;

pub use config::{CalibrationConfig, NormalizationMethod};
pub use normalize::{min_max, normalize, z_score};
pub use stats::Distribution;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{ManagerId, PerformanceRecord, Period, RecordKey};
use super::scope::AssessmentScope;

/// How a manager's mean compares with the company mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrictnessLabel {
    Strict,
    Normal,
    Lenient,
}

impl StrictnessLabel {
    /// `Strict` below `company_mean - multiplier * company_stddev`, `Lenient` above
    /// `company_mean + multiplier * company_stddev`, otherwise `Normal`.
    pub fn classify(manager_mean: f64, company: &Distribution, multiplier: f64) -> Self {
        let band = multiplier * company.stddev;
        if manager_mean < company.mean - band {
            Self::Strict
        } else if manager_mean > company.mean + band {
            Self::Lenient
        } else {
            Self::Normal
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Normal => "normal",
            Self::Lenient => "lenient",
        }
    }
}

/// Scoring statistics for one manager in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerCalibrationStats {
    pub manager_id: ManagerId,
    pub period: Period,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    /// `None` when the sample is below the configured minimum.
    pub strictness_label: Option<StrictnessLabel>,
    pub adjustment_needed: bool,
    pub insufficient_data: bool,
}

/// Result of calibrating one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOutcome {
    pub company: Option<Distribution>,
    pub managers: Vec<ManagerCalibrationStats>,
    /// Normalized score per calibrated record; empty when normalization is disabled.
    pub normalized: BTreeMap<RecordKey, f64>,
}

impl CalibrationOutcome {
    pub fn manager(&self, manager_id: &ManagerId) -> Option<&ManagerCalibrationStats> {
        self.managers
            .iter()
            .find(|stats| &stats.manager_id == manager_id)
    }

    pub fn insufficient_managers(&self) -> impl Iterator<Item = &ManagerId> {
        self.managers
            .iter()
            .filter(|stats| stats.insufficient_data)
            .map(|stats| &stats.manager_id)
    }
}

/// Calibrate every manager who scored in-scope records during `period`.
pub fn calibrate(
    period: &Period,
    records: &[PerformanceRecord],
    scope: &AssessmentScope,
    config: &CalibrationConfig,
) -> CalibrationOutcome {
    let mut by_manager: BTreeMap<&ManagerId, Vec<(&PerformanceRecord, f64)>> = BTreeMap::new();
    let mut company_scores = Vec::new();

    for record in records
        .iter()
        .filter(|record| &record.period == period && scope.includes(&record.placement))
    {
        if let Some(score) = record.rankable_score() {
            by_manager
                .entry(&record.assessor_id)
                .or_default()
                .push((record, score));
            company_scores.push(score);
        }
    }

    let Some(company) = Distribution::from_scores(&company_scores) else {
        return CalibrationOutcome::default();
    };

    let mut outcome = CalibrationOutcome {
        company: Some(company),
        ..CalibrationOutcome::default()
    };

    for (manager_id, scored) in by_manager {
        let scores: Vec<f64> = scored.iter().map(|(_, score)| *score).collect();
        let Some(manager) = Distribution::from_scores(&scores) else {
            continue;
        };

        let stats = manager_stats(manager_id, period, &manager, &company, config);
        if stats.insufficient_data {
            debug!(%manager_id, %period, count = manager.count, "insufficient data for calibration");
        }

        if config.normalize {
            for (record, raw) in &scored {
                let value = if stats.insufficient_data {
                    *raw
                } else {
                    normalize(*raw, &manager, &company, config.method)
                };
                outcome.normalized.insert(record.key(), value);
            }
        }

        outcome.managers.push(stats);
    }

    outcome
}

fn manager_stats(
    manager_id: &ManagerId,
    period: &Period,
    manager: &Distribution,
    company: &Distribution,
    config: &CalibrationConfig,
) -> ManagerCalibrationStats {
    let insufficient_data = manager.count < config.minimum_sample_size;

    let (strictness_label, adjustment_needed) = if insufficient_data {
        (None, false)
    } else {
        let label = StrictnessLabel::classify(manager.mean, company, config.strictness_multiplier);
        let flat = manager.stddev < config.flat_stddev_threshold
            && company.stddev >= config.flat_stddev_threshold;
        (Some(label), label != StrictnessLabel::Normal || flat)
    };

    ManagerCalibrationStats {
        manager_id: manager_id.clone(),
        period: period.clone(),
        mean: manager.mean,
        stddev: manager.stddev,
        min: manager.min,
        max: manager.max,
        count: manager.count,
        strictness_label,
        adjustment_needed,
        insufficient_data,
    }
}

/// Period-wide calibration overview for HR reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub period: Period,
    pub company: Option<Distribution>,
    /// Ordered by mean score, strictest first.
    pub managers: Vec<ManagerCalibrationStats>,
    pub needs_adjustment: usize,
    pub total_managers: usize,
}

impl CalibrationReport {
    pub fn new(
        period: Period,
        company: Option<Distribution>,
        mut managers: Vec<ManagerCalibrationStats>,
    ) -> Self {
        managers.sort_by(|a, b| {
            a.mean
                .total_cmp(&b.mean)
                .then_with(|| a.manager_id.cmp(&b.manager_id))
        });
        let needs_adjustment = managers
            .iter()
            .filter(|stats| stats.adjustment_needed)
            .count();
        let total_managers = managers.len();

        Self {
            period,
            company,
            managers,
            needs_adjustment,
            total_managers,
        }
    }
}
