use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::scoring::Level;

/// Identifier wrapper for employees. Ordering is lexical and doubles as the ranking tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for the scoring manager (the assessor).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManagerId(pub String);

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Evaluation month in `YYYY-MM` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    pub fn parse(raw: &str) -> Result<Self, PeriodError> {
        let trimmed = raw.trim();
        let first_day = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .map_err(|_| PeriodError(trimmed.to_string()))?;
        Ok(Self::from_date(first_day))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid YYYY-MM period")]
pub struct PeriodError(pub String);

/// Records are keyed by employee and month.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub employee_id: EmployeeId,
    pub period: Period,
}

impl RecordKey {
    pub fn new(employee_id: EmployeeId, period: Period) -> Self {
        Self {
            employee_id,
            period,
        }
    }
}

/// Seniority ladder used for peer grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeLevel {
    Senior,
    Intermediate,
    Junior,
    Assistant,
}

impl EmployeeLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Senior => "Senior Engineer",
            Self::Intermediate => "Intermediate Engineer",
            Self::Junior => "Junior Engineer",
            Self::Assistant => "Assistant Engineer",
        }
    }
}

/// Directory entry as supplied by the employee directory collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub level: EmployeeLevel,
    pub department: String,
    pub sub_department: String,
    pub manager_id: ManagerId,
}

impl Employee {
    pub fn placement(&self) -> OrgPlacement {
        OrgPlacement {
            department: self.department.trim().to_string(),
            sub_department: self.sub_department.trim().to_string(),
        }
    }
}

/// Root department and sub-department the record was filed under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrgPlacement {
    pub department: String,
    pub sub_department: String,
}

/// Coarse peer-comparison bucket derived from seniority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    High,
    Low,
}

impl GroupType {
    pub const fn ordered() -> [Self; 2] {
        [Self::High, Self::Low]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Draft,
    Submitted,
    Scored,
    Completed,
}

impl RecordStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Draft, Self::Submitted, Self::Scored, Self::Completed]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Scored => "scored",
            Self::Completed => "completed",
        }
    }

    /// Only scored and completed records take part in ranking and calibration.
    pub const fn is_rankable(self) -> bool {
        matches!(self, Self::Scored | Self::Completed)
    }
}

/// The four scored dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScoreField {
    TaskCompletion,
    Initiative,
    ProjectFeedback,
    QualityImprovement,
}

impl SubScoreField {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::TaskCompletion,
            Self::Initiative,
            Self::ProjectFeedback,
            Self::QualityImprovement,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::TaskCompletion => "task_completion",
            Self::Initiative => "initiative",
            Self::ProjectFeedback => "project_feedback",
            Self::QualityImprovement => "quality_improvement",
        }
    }

    pub const fn weight_description(self) -> &'static str {
        match self {
            Self::TaskCompletion => "weight 40%",
            Self::Initiative => "weight 30%",
            Self::ProjectFeedback => "weight 20%",
            Self::QualityImprovement => "weight 10%",
        }
    }
}

impl fmt::Display for SubScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Manager-assigned scores for the four dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub task_completion: f64,
    pub initiative: f64,
    pub project_feedback: f64,
    pub quality_improvement: f64,
}

impl SubScores {
    pub fn new(
        task_completion: f64,
        initiative: f64,
        project_feedback: f64,
        quality_improvement: f64,
    ) -> Self {
        Self {
            task_completion,
            initiative,
            project_feedback,
            quality_improvement,
        }
    }

    /// Every dimension set to the level's canonical score.
    pub fn uniform(level: Level) -> Self {
        let score = level.canonical_score();
        Self::new(score, score, score, score)
    }

    pub fn get(&self, field: SubScoreField) -> f64 {
        match field {
            SubScoreField::TaskCompletion => self.task_completion,
            SubScoreField::Initiative => self.initiative,
            SubScoreField::ProjectFeedback => self.project_feedback,
            SubScoreField::QualityImprovement => self.quality_improvement,
        }
    }
}

/// Rank views derived by a period recompute. `None` means the record is outside the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSet {
    pub group_rank: Option<u32>,
    pub cross_dept_rank: Option<u32>,
    pub department_rank: Option<u32>,
    pub company_rank: Option<u32>,
}

/// One employee's review for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub employee_id: EmployeeId,
    pub period: Period,
    pub placement: OrgPlacement,
    pub employee_level: EmployeeLevel,
    pub group_type: GroupType,
    pub assessor_id: ManagerId,
    pub self_summary: String,
    pub next_month_plan: String,
    pub sub_scores: Option<SubScores>,
    pub total_score: Option<f64>,
    pub level: Option<Level>,
    pub manager_comment: Option<String>,
    pub next_month_arrangement: Option<String>,
    pub ranks: RankSet,
    pub normalized_score: Option<f64>,
    pub status: RecordStatus,
}

impl PerformanceRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.employee_id.clone(), self.period.clone())
    }

    /// Score used by ranking and calibration; present only once the record has been scored.
    pub fn rankable_score(&self) -> Option<f64> {
        if self.status.is_rankable() {
            self.total_score
        } else {
            None
        }
    }
}
