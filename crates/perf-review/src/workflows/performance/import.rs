//! CSV import of a month's records for offline recomputes.
//!
//! Expected header: `employee_id,month,department,sub_department,employee_level,manager_id`
//! followed by the optional score columns `task_completion,initiative,project_feedback,
//! quality_improvement` or a single `level` column. Rows without scores load as `submitted`.

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::domain::{
    Employee, EmployeeId, EmployeeLevel, ManagerId, PerformanceRecord, Period, PeriodError,
    RankSet, RecordStatus, SubScores,
};
use super::grouping::{group_of, GroupConfig};
use super::scoring::{Level, ScoreEngine, ValidationError};

#[derive(Debug)]
pub enum RecordImportError {
    Csv(csv::Error),
    Period { line: usize, source: PeriodError },
    Level { line: usize, value: String },
    PartialScores { line: usize },
    Score { line: usize, source: ValidationError },
}

impl fmt::Display for RecordImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordImportError::Csv(err) => write!(f, "invalid records CSV: {}", err),
            RecordImportError::Period { line, source } => {
                write!(f, "row {}: {}", line, source)
            }
            RecordImportError::Level { line, value } => {
                write!(f, "row {}: unknown level code '{}'", line, value)
            }
            RecordImportError::PartialScores { line } => write!(
                f,
                "row {}: either all four sub-scores or none must be given",
                line
            ),
            RecordImportError::Score { line, source } => write!(f, "row {}: {}", line, source),
        }
    }
}

impl std::error::Error for RecordImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordImportError::Csv(err) => Some(err),
            RecordImportError::Period { source, .. } => Some(source),
            RecordImportError::Score { source, .. } => Some(source),
            RecordImportError::Level { .. } | RecordImportError::PartialScores { .. } => None,
        }
    }
}

impl From<csv::Error> for RecordImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Parse and score every row. Scored rows come back with status `scored`.
pub fn parse_records<R: Read>(
    reader: R,
    engine: &ScoreEngine,
    groups: &GroupConfig,
) -> Result<Vec<PerformanceRecord>, RecordImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, row) in csv_reader.deserialize::<RecordRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = row?;
        records.push(row.into_record(line, engine, groups)?);
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RecordRow {
    employee_id: String,
    month: String,
    department: String,
    #[serde(default)]
    sub_department: String,
    employee_level: EmployeeLevel,
    manager_id: String,
    #[serde(default)]
    task_completion: Option<f64>,
    #[serde(default)]
    initiative: Option<f64>,
    #[serde(default)]
    project_feedback: Option<f64>,
    #[serde(default)]
    quality_improvement: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    level: Option<String>,
}

impl RecordRow {
    fn into_record(
        self,
        line: usize,
        engine: &ScoreEngine,
        groups: &GroupConfig,
    ) -> Result<PerformanceRecord, RecordImportError> {
        let period =
            Period::parse(&self.month).map_err(|source| RecordImportError::Period { line, source })?;
        let sub_scores = self.sub_scores(line)?;

        let employee = Employee {
            id: EmployeeId(self.employee_id),
            level: self.employee_level,
            department: self.department,
            sub_department: self.sub_department,
            manager_id: ManagerId(self.manager_id),
        };

        let mut record = PerformanceRecord {
            employee_id: employee.id.clone(),
            period,
            placement: employee.placement(),
            employee_level: employee.level,
            group_type: group_of(&employee, groups),
            assessor_id: employee.manager_id.clone(),
            self_summary: String::new(),
            next_month_plan: String::new(),
            sub_scores: None,
            total_score: None,
            level: None,
            manager_comment: None,
            next_month_arrangement: None,
            ranks: RankSet::default(),
            normalized_score: None,
            status: RecordStatus::Submitted,
        };

        if let Some(sub_scores) = sub_scores {
            let outcome = engine
                .score(&sub_scores)
                .map_err(|source| RecordImportError::Score { line, source })?;
            record.sub_scores = Some(sub_scores);
            record.total_score = Some(outcome.total_score);
            record.level = Some(outcome.level);
            record.status = RecordStatus::Scored;
        }

        Ok(record)
    }

    fn sub_scores(&self, line: usize) -> Result<Option<SubScores>, RecordImportError> {
        match (
            self.task_completion,
            self.initiative,
            self.project_feedback,
            self.quality_improvement,
        ) {
            (Some(task), Some(initiative), Some(feedback), Some(quality)) => Ok(Some(
                SubScores::new(task, initiative, feedback, quality),
            )),
            (None, None, None, None) => match &self.level {
                Some(code) => Level::from_code(code)
                    .map(|level| Some(SubScores::uniform(level)))
                    .ok_or_else(|| RecordImportError::Level {
                        line,
                        value: code.clone(),
                    }),
                None => Ok(None),
            },
            _ => Err(RecordImportError::PartialScores { line }),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
