use crate::infra::{parse_level, parse_period};
use clap::Args;
use perf_review::config::{AppConfig, SettingsFile};
use perf_review::error::AppError;
use perf_review::workflows::performance::{
    parse_records, CalibrationReport, EmployeeId, GroupType, InMemoryDirectory,
    InMemoryRecordStore, InMemorySettings, Level, ManagerId, PerformanceRecord,
    PerformanceReviewService, Period, RankSet, RecomputeSummary, RecordStore,
    ReviewEngineConfig, ReviewServiceError, ScoreEngine, ScoreInput, ScoreOutcome, SubScores,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Task completion score (40%)
    #[arg(long, required_unless_present = "level", conflicts_with = "level")]
    pub(crate) task_completion: Option<f64>,
    /// Initiative score (30%)
    #[arg(long, required_unless_present = "level", conflicts_with = "level")]
    pub(crate) initiative: Option<f64>,
    /// Project feedback score (20%)
    #[arg(long, required_unless_present = "level", conflicts_with = "level")]
    pub(crate) project_feedback: Option<f64>,
    /// Quality improvement score (10%)
    #[arg(long, required_unless_present = "level", conflicts_with = "level")]
    pub(crate) quality_improvement: Option<f64>,
    /// Apply one level (L1-L5) to all four dimensions instead
    #[arg(long, value_parser = parse_level)]
    pub(crate) level: Option<Level>,
}

impl ScoreArgs {
    fn input(&self) -> ScoreInput {
        match self.level {
            Some(level) => ScoreInput::Level(level),
            None => ScoreInput::SubScores(SubScores::new(
                self.task_completion.unwrap_or_default(),
                self.initiative.unwrap_or_default(),
                self.project_feedback.unwrap_or_default(),
                self.quality_improvement.unwrap_or_default(),
            )),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct RecomputeArgs {
    /// Records CSV export for the month
    #[arg(long)]
    pub(crate) records: PathBuf,
    /// Month to rank (YYYY-MM)
    #[arg(long, value_parser = parse_period)]
    pub(crate) month: Period,
    /// Settings JSON with group config and assessment scope (defaults to PERF_SETTINGS_PATH)
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankingRow {
    pub(crate) employee_id: EmployeeId,
    pub(crate) department: String,
    pub(crate) sub_department: String,
    pub(crate) group_type: GroupType,
    pub(crate) assessor_id: ManagerId,
    pub(crate) total_score: Option<f64>,
    pub(crate) level: Option<Level>,
    pub(crate) normalized_score: Option<f64>,
    pub(crate) ranks: RankSet,
}

impl From<PerformanceRecord> for RankingRow {
    fn from(record: PerformanceRecord) -> Self {
        Self {
            employee_id: record.employee_id,
            department: record.placement.department,
            sub_department: record.placement.sub_department,
            group_type: record.group_type,
            assessor_id: record.assessor_id,
            total_score: record.total_score,
            level: record.level,
            normalized_score: record.normalized_score,
            ranks: record.ranks,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RecomputeReport {
    pub(crate) summary: RecomputeSummary,
    /// Company order first; records outside the company view follow by employee id.
    pub(crate) rankings: Vec<RankingRow>,
    pub(crate) calibration: CalibrationReport,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let outcome = score_outcome(&args.input(), &config.review.engine)?;
    print_json(&outcome)
}

pub(crate) fn score_outcome(
    input: &ScoreInput,
    config: &ReviewEngineConfig,
) -> Result<ScoreOutcome, AppError> {
    ScoreEngine::new(config.scoring)
        .score(&input.sub_scores())
        .map_err(|err| AppError::Workflow(ReviewServiceError::from(err)))
}

pub(crate) fn run_recompute(args: RecomputeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let settings = match &args.settings {
        Some(path) => SettingsFile::load(path)?,
        None => config.review.load_settings()?,
    };
    let file = File::open(&args.records)?;
    let report = recompute_report(
        BufReader::new(file),
        &args.month,
        settings,
        &config.review.engine,
    )?;
    print_json(&report)
}

/// Load a month from CSV into an in-memory store and run one recompute over it.
pub(crate) fn recompute_report<R: Read>(
    reader: R,
    period: &Period,
    settings: SettingsFile,
    engine: &ReviewEngineConfig,
) -> Result<RecomputeReport, AppError> {
    let scorer = ScoreEngine::new(engine.scoring);
    let records = parse_records(reader, &scorer, &settings.group_config)?;
    let store = Arc::new(InMemoryRecordStore::with_records(records));
    let scope = settings.assessment_scope.clone();
    let service = PerformanceReviewService::new(
        store.clone(),
        Arc::new(InMemoryDirectory::default()),
        Arc::new(InMemorySettings::new(
            settings.group_config,
            settings.assessment_scope,
        )),
        engine.clone(),
    );

    let summary = service.recompute_rankings(period, &scope)?;
    let calibration = service.calibration_report(period)?;

    let mut rankings: Vec<RankingRow> = store
        .period_records(period)
        .map_err(ReviewServiceError::from)?
        .into_iter()
        .map(RankingRow::from)
        .collect();
    rankings.sort_by(|a, b| {
        let a_rank = a.ranks.company_rank.unwrap_or(u32::MAX);
        let b_rank = b.ranks.company_rank.unwrap_or(u32::MAX);
        a_rank
            .cmp(&b_rank)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });

    Ok(RecomputeReport {
        summary,
        rankings,
        calibration,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{json}");
    Ok(())
}
