use serde::{Deserialize, Serialize};

use super::domain::{Employee, EmployeeLevel, GroupType};

/// Seniority-to-peer-group mapping plus the sub-departments ranked against each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub high_levels: Vec<EmployeeLevel>,
    pub low_levels: Vec<EmployeeLevel>,
    pub cross_dept_groups: Vec<String>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            high_levels: vec![EmployeeLevel::Senior, EmployeeLevel::Intermediate],
            low_levels: vec![EmployeeLevel::Junior, EmployeeLevel::Assistant],
            cross_dept_groups: vec![
                "Mechanical".to_string(),
                "Testing".to_string(),
                "PLC".to_string(),
            ],
        }
    }
}

impl GroupConfig {
    /// Levels listed under `high_levels` form the high group; every other level is low.
    pub fn group_for(&self, level: EmployeeLevel) -> GroupType {
        if self.high_levels.contains(&level) {
            GroupType::High
        } else {
            GroupType::Low
        }
    }

    pub fn is_cross_dept_eligible(&self, sub_department: &str) -> bool {
        let sub_department = sub_department.trim();
        self.cross_dept_groups
            .iter()
            .any(|candidate| candidate.trim() == sub_department)
    }

    /// Levels claimed by both lists; the high list wins for these.
    pub fn overlapping_levels(&self) -> Vec<EmployeeLevel> {
        self.high_levels
            .iter()
            .copied()
            .filter(|level| self.low_levels.contains(level))
            .collect()
    }
}

/// Peer group for an employee. Computed once at submission and stored on the record.
pub fn group_of(employee: &Employee, config: &GroupConfig) -> GroupType {
    config.group_for(employee.level)
}
