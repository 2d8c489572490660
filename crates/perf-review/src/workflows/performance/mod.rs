//! Monthly performance reviews: weighted scoring, peer-group rankings, and rater calibration.
//!
//! Records move `draft -> submitted -> scored -> completed`. Every score change and every period
//! close recomputes the month's four ranking views and the managers' calibration statistics, and
//! persists both in one atomic commit through [`RecordStore::commit_period`].

pub mod calibration;
pub mod domain;
pub mod grouping;
pub mod import;
mod locks;
pub mod memory;
pub mod ranking;
pub mod report;
pub mod repository;
pub mod router;
pub mod scope;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use calibration::{
    calibrate, CalibrationConfig, CalibrationOutcome, CalibrationReport, Distribution,
    ManagerCalibrationStats, NormalizationMethod, StrictnessLabel,
};
pub use domain::{
    Employee, EmployeeId, EmployeeLevel, GroupType, ManagerId, OrgPlacement, PerformanceRecord,
    Period, PeriodError, RankSet, RecordKey, RecordStatus, SubScoreField, SubScores,
};
pub use grouping::{group_of, GroupConfig};
pub use import::{parse_records, RecordImportError};
pub use locks::RecomputeConflict;
pub use memory::{InMemoryDirectory, InMemoryRecordStore, InMemorySettings};
pub use ranking::{rank_period, Partition, RankingOutcome, ScopeExclusion};
pub use report::{EmployeeTrend, PeriodSummary, RecordView, TrendDirection};
pub use repository::{
    Assessment, ComputedFields, DirectoryError, EmployeeDirectory, PeriodCalibration, PeriodCommit,
    RecordStore, RepositoryError, SettingsSource,
};
pub use router::performance_router;
pub use scope::AssessmentScope;
pub use scoring::{
    compute_score, level_code_to_score, Level, ScoreComponent, ScoreEngine, ScoreOutcome,
    ScoringConfig, SubScoreDomain, ValidationError,
};
pub use service::{
    PerformanceReviewService, RankRefresh, RecomputeSummary, ReviewEngineConfig,
    ReviewServiceError, ScoreInput, ScoreRequest, ScoredRecord, SubmissionRequest,
};
