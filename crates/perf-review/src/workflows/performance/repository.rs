use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::calibration::{CalibrationOutcome, Distribution, ManagerCalibrationStats};
use super::domain::{
    Employee, EmployeeId, PerformanceRecord, Period, RankSet, RecordKey, RecordStatus, SubScores,
};
use super::grouping::GroupConfig;
use super::ranking::RankingOutcome;
use super::scope::AssessmentScope;
use super::scoring::Level;

/// Fields a period recompute writes back onto one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedFields {
    pub ranks: RankSet,
    pub normalized_score: Option<f64>,
}

/// Calibration results stored for a period, replaced wholesale on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCalibration {
    pub period: Period,
    pub company: Option<Distribution>,
    pub managers: Vec<ManagerCalibrationStats>,
}

/// Staged output of one recompute. Stores apply it all at once or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCommit {
    pub period: Period,
    pub records: BTreeMap<RecordKey, ComputedFields>,
    pub calibration: PeriodCalibration,
    /// Move every `scored` record of the period to `completed` in the same write.
    pub complete_scored: bool,
}

impl PeriodCommit {
    pub fn stage(
        period: &Period,
        ranking: &RankingOutcome,
        calibration: &CalibrationOutcome,
        complete_scored: bool,
    ) -> Self {
        let records = ranking
            .assignments
            .iter()
            .map(|(key, ranks)| {
                (
                    key.clone(),
                    ComputedFields {
                        ranks: *ranks,
                        normalized_score: calibration.normalized.get(key).copied(),
                    },
                )
            })
            .collect();

        Self {
            period: period.clone(),
            records,
            calibration: PeriodCalibration {
                period: period.clone(),
                company: calibration.company,
                managers: calibration.managers.clone(),
            },
            complete_scored,
        }
    }
}

/// Manager assessment written onto one record. Ranks and the normalized score are not touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub sub_scores: SubScores,
    pub total_score: f64,
    pub level: Level,
    pub manager_comment: Option<String>,
    pub next_month_arrangement: Option<String>,
}

impl Assessment {
    /// Write the assessment and mark the record scored. Only submitted or scored records qualify.
    pub fn apply_to(&self, record: &mut PerformanceRecord) -> Result<(), RepositoryError> {
        match record.status {
            RecordStatus::Submitted | RecordStatus::Scored => {
                record.sub_scores = Some(self.sub_scores);
                record.total_score = Some(self.total_score);
                record.level = Some(self.level);
                record.manager_comment = self.manager_comment.clone();
                record.next_month_arrangement = self.next_month_arrangement.clone();
                record.status = RecordStatus::Scored;
                Ok(())
            }
            status => Err(RepositoryError::NotScorable(status)),
        }
    }
}

/// Storage abstraction for performance records keyed by `(employee, month)`.
pub trait RecordStore: Send + Sync {
    fn insert(&self, record: PerformanceRecord) -> Result<PerformanceRecord, RepositoryError>;
    fn update(&self, record: PerformanceRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, key: &RecordKey) -> Result<Option<PerformanceRecord>, RepositoryError>;
    /// Apply an assessment under the store's own lock, re-checking the status it finds there.
    fn record_assessment(
        &self,
        key: &RecordKey,
        assessment: &Assessment,
    ) -> Result<PerformanceRecord, RepositoryError>;
    fn period_records(&self, period: &Period) -> Result<Vec<PerformanceRecord>, RepositoryError>;
    fn employee_records(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError>;
    /// Apply a staged recompute atomically; on error nothing may have changed.
    fn commit_period(&self, commit: PeriodCommit) -> Result<(), RepositoryError>;
    fn period_calibration(
        &self,
        period: &Period,
    ) -> Result<Option<PeriodCalibration>, RepositoryError>;
}

/// Read-only lookup into the employee directory.
pub trait EmployeeDirectory: Send + Sync {
    fn lookup(&self, id: &EmployeeId) -> Result<Option<Employee>, DirectoryError>;
}

/// HR-editable configuration consumed by recomputes and submissions.
pub trait SettingsSource: Send + Sync {
    fn group_config(&self) -> Result<GroupConfig, RepositoryError>;
    fn assessment_scope(&self) -> Result<AssessmentScope, RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record is {} and cannot be scored", .0.label())]
    NotScorable(RecordStatus),
    #[error("batch write rolled back: {0}")]
    RolledBack(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("employee directory unavailable: {0}")]
    Unavailable(String),
}
