use serde::{Deserialize, Serialize};

use super::domain::{EmployeeId, PerformanceRecord, Period, RecordStatus};
use super::scoring::{round2, Level};

/// Number of recent scores kept on an employee trend.
const RECENT_SCORES: usize = 6;
/// Window compared against the earlier history when deriving a trend.
const TREND_WINDOW: usize = 3;
/// Mean difference needed before a trend counts as up or down.
const TREND_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: RecordStatus,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelCount {
    pub level: Level,
    pub level_label: &'static str,
    pub count: usize,
}

/// Month-level dashboard figures.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub total_records: usize,
    pub scored_records: usize,
    pub status_counts: Vec<StatusCount>,
    pub level_distribution: Vec<LevelCount>,
    pub average_score: Option<f64>,
    pub max_score: Option<f64>,
    pub min_score: Option<f64>,
}

impl PeriodSummary {
    pub fn from_records(period: &Period, records: &[PerformanceRecord]) -> Self {
        let records: Vec<&PerformanceRecord> = records
            .iter()
            .filter(|record| &record.period == period)
            .collect();

        let status_counts = RecordStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status,
                status_label: status.label(),
                count: records
                    .iter()
                    .filter(|record| record.status == status)
                    .count(),
            })
            .collect();

        let scored: Vec<(f64, Option<Level>)> = records
            .iter()
            .filter_map(|record| record.rankable_score().map(|score| (score, record.level)))
            .collect();

        let level_distribution = Level::ordered()
            .into_iter()
            .rev()
            .map(|level| LevelCount {
                level,
                level_label: level.label(),
                count: scored
                    .iter()
                    .filter(|(_, recorded)| *recorded == Some(level))
                    .count(),
            })
            .collect();

        let scores: Vec<f64> = scored.iter().map(|(score, _)| *score).collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(round2(scores.iter().sum::<f64>() / scores.len() as f64))
        };

        Self {
            period: period.clone(),
            total_records: records.len(),
            scored_records: scores.len(),
            status_counts,
            level_distribution,
            average_score,
            max_score: scores.iter().copied().reduce(f64::max),
            min_score: scores.iter().copied().reduce(f64::min),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Score history for one employee across scored months.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeTrend {
    pub employee_id: EmployeeId,
    pub average_score: f64,
    pub trend: TrendDirection,
    pub recent_scores: Vec<f64>,
    pub assessment_count: usize,
}

impl EmployeeTrend {
    /// `None` when the employee has no scored month yet.
    pub fn from_records(employee_id: &EmployeeId, records: &[PerformanceRecord]) -> Option<Self> {
        let mut history: Vec<(&Period, f64)> = records
            .iter()
            .filter(|record| &record.employee_id == employee_id)
            .filter_map(|record| record.rankable_score().map(|score| (&record.period, score)))
            .collect();
        if history.is_empty() {
            return None;
        }
        history.sort_by(|a, b| a.0.cmp(b.0));

        let scores: Vec<f64> = history.into_iter().map(|(_, score)| score).collect();
        let average_score = round2(scores.iter().sum::<f64>() / scores.len() as f64);

        Some(Self {
            employee_id: employee_id.clone(),
            average_score,
            trend: trend_of(&scores),
            recent_scores: scores[scores.len().saturating_sub(RECENT_SCORES)..].to_vec(),
            assessment_count: scores.len(),
        })
    }
}

fn trend_of(scores: &[f64]) -> TrendDirection {
    if scores.len() <= TREND_WINDOW {
        return TrendDirection::Stable;
    }

    let (earlier, recent) = scores.split_at(scores.len() - TREND_WINDOW);
    let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let earlier_mean = earlier.iter().sum::<f64>() / earlier.len() as f64;

    if recent_mean > earlier_mean + TREND_TOLERANCE {
        TrendDirection::Up
    } else if recent_mean < earlier_mean - TREND_TOLERANCE {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Record payload returned by the HTTP surface.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: PerformanceRecord,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_label: Option<&'static str>,
}

impl From<PerformanceRecord> for RecordView {
    fn from(record: PerformanceRecord) -> Self {
        Self {
            status_label: record.status.label(),
            level_label: record.level.map(Level::label),
            record,
        }
    }
}
