use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{EmployeeId, GroupType, OrgPlacement, PerformanceRecord, Period, RankSet, RecordKey};
use super::grouping::GroupConfig;
use super::scope::AssessmentScope;

/// One ranking view over a subset of a period's records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Partition {
    Group {
        sub_department: String,
        group_type: GroupType,
    },
    CrossDept {
        group_type: GroupType,
    },
    Department {
        department: String,
    },
    Company,
}

/// Informational notice: a scored record was left out because its placement is outside the
/// assessment scope. Its own score and level are untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeExclusion {
    pub key: RecordKey,
    pub placement: OrgPlacement,
}

/// Staged rank assignment for a whole period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    /// Every record of the period; records outside all views carry an empty [`RankSet`].
    pub assignments: BTreeMap<RecordKey, RankSet>,
    pub partition_sizes: BTreeMap<Partition, usize>,
    pub exclusions: Vec<ScopeExclusion>,
}

impl RankingOutcome {
    pub fn ranks_for(&self, key: &RecordKey) -> Option<&RankSet> {
        self.assignments.get(key)
    }
}

struct Candidate {
    key: RecordKey,
    employee_id: EmployeeId,
    score: f64,
}

/// Rank every scored, in-scope record of `period` in each of the four views.
///
/// Scores sort descending; equal scores get sequential ranks ordered by ascending employee id,
/// so the result does not depend on input order.
pub fn rank_period(
    period: &Period,
    records: &[PerformanceRecord],
    scope: &AssessmentScope,
    groups: &GroupConfig,
) -> RankingOutcome {
    let mut outcome = RankingOutcome::default();
    let mut partitions: BTreeMap<Partition, Vec<Candidate>> = BTreeMap::new();

    for record in records.iter().filter(|record| &record.period == period) {
        let key = record.key();
        outcome.assignments.insert(key.clone(), RankSet::default());

        let Some(score) = record.rankable_score() else {
            continue;
        };

        if !scope.includes(&record.placement) {
            debug!(employee_id = %record.employee_id, %period, "record outside assessment scope");
            outcome.exclusions.push(ScopeExclusion {
                key,
                placement: record.placement.clone(),
            });
            continue;
        }

        for partition in partitions_for(record, groups) {
            partitions.entry(partition).or_default().push(Candidate {
                key: key.clone(),
                employee_id: record.employee_id.clone(),
                score,
            });
        }
    }

    for (partition, mut candidates) in partitions {
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.employee_id.cmp(&b.employee_id))
        });

        for (index, candidate) in candidates.iter().enumerate() {
            let rank = Some(index as u32 + 1);
            if let Some(ranks) = outcome.assignments.get_mut(&candidate.key) {
                match &partition {
                    Partition::Group { .. } => ranks.group_rank = rank,
                    Partition::CrossDept { .. } => ranks.cross_dept_rank = rank,
                    Partition::Department { .. } => ranks.department_rank = rank,
                    Partition::Company => ranks.company_rank = rank,
                }
            }
        }

        outcome.partition_sizes.insert(partition, candidates.len());
    }

    outcome
}

fn partitions_for(record: &PerformanceRecord, groups: &GroupConfig) -> Vec<Partition> {
    let mut partitions = vec![
        Partition::Group {
            sub_department: record.placement.sub_department.clone(),
            group_type: record.group_type,
        },
        Partition::Department {
            department: record.placement.department.clone(),
        },
        Partition::Company,
    ];

    if groups.is_cross_dept_eligible(&record.placement.sub_department) {
        partitions.push(Partition::CrossDept {
            group_type: record.group_type,
        });
    }

    partitions
}
