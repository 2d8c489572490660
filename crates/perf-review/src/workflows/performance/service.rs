use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::calibration::{
    calibrate, CalibrationConfig, CalibrationReport, ManagerCalibrationStats,
};
use super::domain::{
    EmployeeId, ManagerId, PerformanceRecord, Period, RankSet, RecordKey, RecordStatus, SubScores,
};
use super::grouping::group_of;
use super::locks::{PeriodGuard, PeriodLocks, RecomputeConflict};
use super::ranking::{rank_period, ScopeExclusion};
use super::report::{EmployeeTrend, PeriodSummary};
use super::repository::{
    Assessment, DirectoryError, EmployeeDirectory, PeriodCommit, RecordStore, RepositoryError,
    SettingsSource,
};
use super::scope::AssessmentScope;
use super::scoring::{Level, ScoreEngine, ScoreOutcome, ScoringConfig, ValidationError};

/// Engine parameters fixed for the lifetime of the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewEngineConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

/// Employee-side submission for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub employee_id: EmployeeId,
    pub period: Period,
    pub self_summary: String,
    #[serde(default)]
    pub next_month_plan: String,
}

/// Either explicit sub-scores or a level applied to every dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreInput {
    SubScores(SubScores),
    Level(Level),
}

impl ScoreInput {
    pub fn sub_scores(&self) -> SubScores {
        match self {
            ScoreInput::SubScores(scores) => *scores,
            ScoreInput::Level(level) => SubScores::uniform(*level),
        }
    }
}

/// Manager-side scoring of a submitted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub scores: ScoreInput,
    #[serde(default)]
    pub manager_comment: Option<String>,
    #[serde(default)]
    pub next_month_arrangement: Option<String>,
}

/// Scored record together with the breakdown that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub record: PerformanceRecord,
    pub outcome: ScoreOutcome,
    pub rank_refresh: RankRefresh,
}

/// What happened to the period's ranks after a score was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RankRefresh {
    /// Ranks and calibration were recomputed and the returned record carries them.
    Applied,
    /// A recompute was already running and will make another pass that includes this score.
    Queued,
    /// The score is stored with its previous ranks; a later recompute will refresh them.
    Failed { error: String },
}

/// What a period recompute changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub period: Period,
    pub records_ranked: usize,
    pub records_unranked: usize,
    pub exclusions: Vec<ScopeExclusion>,
    pub managers_calibrated: usize,
    pub insufficient_data: Vec<ManagerId>,
    pub closed: bool,
}

/// Service composing the record store, directory, settings, and the pure engines.
pub struct PerformanceReviewService<S, D, C> {
    store: Arc<S>,
    directory: Arc<D>,
    settings: Arc<C>,
    engine: ScoreEngine,
    calibration: CalibrationConfig,
    locks: PeriodLocks,
}

impl<S, D, C> PerformanceReviewService<S, D, C>
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, settings: Arc<C>, config: ReviewEngineConfig) -> Self {
        Self {
            store,
            directory,
            settings,
            engine: ScoreEngine::new(config.scoring),
            calibration: config.calibration,
            locks: PeriodLocks::default(),
        }
    }

    pub fn settings(&self) -> &Arc<C> {
        &self.settings
    }

    /// Compute a composite score without touching any record.
    pub fn preview(&self, scores: &ScoreInput) -> Result<ScoreOutcome, ReviewServiceError> {
        Ok(self.engine.score(&scores.sub_scores())?)
    }

    /// File an employee's self summary for the month.
    pub fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<PerformanceRecord, ReviewServiceError> {
        let record = self.new_record(request, RecordStatus::Submitted)?;
        let stored = self.store.insert(record)?;
        info!(employee_id = %stored.employee_id, period = %stored.period, "self summary submitted");
        Ok(stored)
    }

    /// Create or overwrite a draft. Records past the draft stage are left alone.
    pub fn save_draft(
        &self,
        request: SubmissionRequest,
    ) -> Result<PerformanceRecord, ReviewServiceError> {
        let key = RecordKey::new(request.employee_id.clone(), request.period.clone());
        match self.store.fetch(&key)? {
            None => {
                let record = self.new_record(request, RecordStatus::Draft)?;
                Ok(self.store.insert(record)?)
            }
            Some(mut existing) if existing.status == RecordStatus::Draft => {
                existing.self_summary = request.self_summary;
                existing.next_month_plan = request.next_month_plan;
                self.store.update(existing.clone())?;
                Ok(existing)
            }
            Some(_) => Err(RepositoryError::Conflict.into()),
        }
    }

    /// Score a submitted record, then refresh the period's ranks and calibration.
    ///
    /// The assessment is stored first. A failed refresh does not undo it; the outcome is reported
    /// in [`ScoredRecord::rank_refresh`] and the next recompute of the period picks the score up.
    pub fn score(
        &self,
        key: &RecordKey,
        request: ScoreRequest,
    ) -> Result<ScoredRecord, ReviewServiceError> {
        let record = self.store.fetch(key)?.ok_or(RepositoryError::NotFound)?;
        scorable(key, record.status)?;

        let sub_scores = request.scores.sub_scores();
        let outcome = self.engine.score(&sub_scores)?;
        let assessment = Assessment {
            sub_scores,
            total_score: outcome.total_score,
            level: outcome.level,
            manager_comment: request.manager_comment,
            next_month_arrangement: request.next_month_arrangement,
        };

        let scored = match self.store.record_assessment(key, &assessment) {
            Ok(scored) => scored,
            Err(RepositoryError::NotScorable(status)) => {
                scorable(key, status)?;
                return Err(RepositoryError::NotScorable(status).into());
            }
            Err(error) => return Err(error.into()),
        };

        info!(
            employee_id = %key.employee_id,
            period = %key.period,
            total_score = outcome.total_score,
            level = outcome.level.code(),
            "record scored"
        );

        let rank_refresh = match self.trigger_recompute(&key.period) {
            Ok(refresh) => refresh,
            Err(error) => {
                warn!(
                    employee_id = %key.employee_id,
                    period = %key.period,
                    %error,
                    "score stored but rank refresh failed"
                );
                RankRefresh::Failed {
                    error: error.to_string(),
                }
            }
        };

        let record = match rank_refresh {
            RankRefresh::Applied => self.store.fetch(key).ok().flatten().unwrap_or(scored),
            RankRefresh::Queued | RankRefresh::Failed { .. } => scored,
        };
        Ok(ScoredRecord {
            record,
            outcome,
            rank_refresh,
        })
    }

    pub fn get(&self, key: &RecordKey) -> Result<PerformanceRecord, ReviewServiceError> {
        let record = self.store.fetch(key)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Recompute ranks and calibration for `period` against an explicit scope.
    ///
    /// Fails with [`ReviewServiceError::RecomputeConflict`] while another recompute for the
    /// same period is running.
    pub fn recompute_rankings(
        &self,
        period: &Period,
        scope: &AssessmentScope,
    ) -> Result<RecomputeSummary, ReviewServiceError> {
        let guard = self.locks.try_begin(period).map_err(|conflict| {
            warn!(%period, "recompute rejected, another one is in flight");
            conflict
        })?;
        self.run_recompute(guard, period, scope, false)
    }

    /// Recompute using the scope currently held by the settings source.
    pub fn recompute_with_configured_scope(
        &self,
        period: &Period,
    ) -> Result<RecomputeSummary, ReviewServiceError> {
        let scope = self.settings.assessment_scope()?;
        self.recompute_rankings(period, &scope)
    }

    /// Archive every scored record of the month and recompute in the same write.
    pub fn close_period(&self, period: &Period) -> Result<RecomputeSummary, ReviewServiceError> {
        let scope = self.settings.assessment_scope()?;
        let guard = self.locks.try_begin(period)?;
        let summary = self.run_recompute(guard, period, &scope, true)?;
        info!(%period, ranked = summary.records_ranked, "period closed");
        Ok(summary)
    }

    pub fn get_manager_calibration(
        &self,
        manager_id: &ManagerId,
        period: &Period,
    ) -> Result<ManagerCalibrationStats, ReviewServiceError> {
        self.store
            .period_calibration(period)?
            .and_then(|calibration| {
                calibration
                    .managers
                    .into_iter()
                    .find(|stats| &stats.manager_id == manager_id)
            })
            .ok_or_else(|| ReviewServiceError::NoCalibration {
                manager_id: manager_id.clone(),
                period: period.clone(),
            })
    }

    pub fn calibration_report(
        &self,
        period: &Period,
    ) -> Result<CalibrationReport, ReviewServiceError> {
        let report = match self.store.period_calibration(period)? {
            Some(calibration) => {
                CalibrationReport::new(period.clone(), calibration.company, calibration.managers)
            }
            None => CalibrationReport::new(period.clone(), None, Vec::new()),
        };
        Ok(report)
    }

    pub fn period_summary(&self, period: &Period) -> Result<PeriodSummary, ReviewServiceError> {
        let records = self.store.period_records(period)?;
        Ok(PeriodSummary::from_records(period, &records))
    }

    pub fn employee_trend(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<EmployeeTrend, ReviewServiceError> {
        let records = self.store.employee_records(employee_id)?;
        EmployeeTrend::from_records(employee_id, &records)
            .ok_or_else(|| RepositoryError::NotFound.into())
    }

    fn new_record(
        &self,
        request: SubmissionRequest,
        status: RecordStatus,
    ) -> Result<PerformanceRecord, ReviewServiceError> {
        let employee = self
            .directory
            .lookup(&request.employee_id)?
            .ok_or_else(|| ReviewServiceError::UnknownEmployee(request.employee_id.clone()))?;
        let groups = self.settings.group_config()?;

        Ok(PerformanceRecord {
            employee_id: request.employee_id,
            period: request.period,
            placement: employee.placement(),
            employee_level: employee.level,
            group_type: group_of(&employee, &groups),
            assessor_id: employee.manager_id,
            self_summary: request.self_summary,
            next_month_plan: request.next_month_plan,
            sub_scores: None,
            total_score: None,
            level: None,
            manager_comment: None,
            next_month_arrangement: None,
            ranks: RankSet::default(),
            normalized_score: None,
            status,
        })
    }

    /// Recompute after a score change. If a recompute is already running it is asked to make
    /// one more pass rather than failing the score.
    fn trigger_recompute(&self, period: &Period) -> Result<RankRefresh, ReviewServiceError> {
        let scope = self.settings.assessment_scope()?;
        loop {
            match self.locks.try_begin(period) {
                Ok(guard) => {
                    self.run_recompute(guard, period, &scope, false)?;
                    return Ok(RankRefresh::Applied);
                }
                Err(_) if self.locks.request_rerun(period) => {
                    debug!(%period, "recompute in flight, rerun requested");
                    return Ok(RankRefresh::Queued);
                }
                Err(_) => continue,
            }
        }
    }

    fn run_recompute(
        &self,
        mut guard: PeriodGuard<'_>,
        period: &Period,
        scope: &AssessmentScope,
        close: bool,
    ) -> Result<RecomputeSummary, ReviewServiceError> {
        if scope.is_empty() {
            warn!(%period, "assessment scope is empty, every record will be excluded");
        }

        loop {
            let summary = self.recompute_once(period, scope, close)?;
            if !guard.finish_or_rerun() {
                return Ok(summary);
            }
            debug!(%period, "re-running recompute for a trigger received mid-flight");
        }
    }

    fn recompute_once(
        &self,
        period: &Period,
        scope: &AssessmentScope,
        close: bool,
    ) -> Result<RecomputeSummary, ReviewServiceError> {
        let groups = self.settings.group_config()?;
        let records = self.store.period_records(period)?;

        let ranking = rank_period(period, &records, scope, &groups);
        let calibration = calibrate(period, &records, scope, &self.calibration);
        let commit = PeriodCommit::stage(period, &ranking, &calibration, close);

        let records_ranked = commit
            .records
            .values()
            .filter(|fields| fields.ranks.company_rank.is_some())
            .count();
        let records_unranked = commit.records.len() - records_ranked;

        self.store
            .commit_period(commit)
            .map_err(ReviewServiceError::Persistence)?;

        let summary = RecomputeSummary {
            period: period.clone(),
            records_ranked,
            records_unranked,
            exclusions: ranking.exclusions,
            managers_calibrated: calibration.managers.len(),
            insufficient_data: calibration.insufficient_managers().cloned().collect(),
            closed: close,
        };

        info!(
            %period,
            ranked = summary.records_ranked,
            excluded = summary.exclusions.len(),
            managers = summary.managers_calibrated,
            "rankings recomputed"
        );
        Ok(summary)
    }
}

fn scorable(key: &RecordKey, status: RecordStatus) -> Result<(), ReviewServiceError> {
    match status {
        RecordStatus::Submitted | RecordStatus::Scored => Ok(()),
        RecordStatus::Completed => Err(ReviewServiceError::Archived(key.clone())),
        RecordStatus::Draft => Err(ReviewServiceError::NotScorable {
            key: key.clone(),
            status,
        }),
    }
}

/// Error raised by the performance review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    RecomputeConflict(#[from] RecomputeConflict),
    #[error("recompute could not be persisted: {0}")]
    Persistence(#[source] RepositoryError),
    #[error("employee {0} is not in the directory")]
    UnknownEmployee(EmployeeId),
    #[error("record for {} in {} is archived", .0.employee_id, .0.period)]
    Archived(RecordKey),
    #[error("record for {} in {} is {} and cannot be scored", key.employee_id, key.period, status.label())]
    NotScorable { key: RecordKey, status: RecordStatus },
    #[error("no calibration for manager {manager_id} in {period}")]
    NoCalibration { manager_id: ManagerId, period: Period },
}
