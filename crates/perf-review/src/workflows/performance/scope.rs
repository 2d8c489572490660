use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::OrgPlacement;

/// HR-managed set of departments whose records count towards rankings and calibration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentScope {
    /// Every department in scope regardless of the lists below.
    #[serde(default)]
    pub include_all: bool,
    /// Root departments participating as a whole.
    #[serde(default)]
    pub root_departments: BTreeSet<String>,
    /// Participating sub-departments, listed under their root department.
    #[serde(default)]
    pub sub_departments_by_root: BTreeMap<String, BTreeSet<String>>,
}

impl AssessmentScope {
    pub fn unrestricted() -> Self {
        Self {
            include_all: true,
            ..Self::default()
        }
    }

    pub fn with_root_department(mut self, department: impl Into<String>) -> Self {
        self.root_departments.insert(department.into());
        self
    }

    pub fn with_sub_department(
        mut self,
        department: impl Into<String>,
        sub_department: impl Into<String>,
    ) -> Self {
        self.sub_departments_by_root
            .entry(department.into())
            .or_default()
            .insert(sub_department.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.include_all
            && self.root_departments.is_empty()
            && self.sub_departments_by_root.values().all(BTreeSet::is_empty)
    }

    pub fn includes(&self, placement: &OrgPlacement) -> bool {
        if self.include_all {
            return true;
        }

        let department = placement.department.trim();
        let sub_department = placement.sub_department.trim();
        if self.root_departments.contains(department) {
            return true;
        }

        self.sub_departments_by_root
            .get(department)
            .map(|subs| subs.contains(sub_department))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(department: &str, sub_department: &str) -> OrgPlacement {
        OrgPlacement {
            department: department.to_string(),
            sub_department: sub_department.to_string(),
        }
    }

    #[test]
    fn empty_scope_includes_nothing() {
        let scope = AssessmentScope::default();
        assert!(scope.is_empty());
        assert!(!scope.includes(&placement("Engineering", "PLC")));
    }

    #[test]
    fn root_department_covers_every_sub_department() {
        let scope = AssessmentScope::default().with_root_department("Engineering");
        assert!(scope.includes(&placement("Engineering", "PLC")));
        assert!(scope.includes(&placement(" Engineering ", "Anything")));
        assert!(!scope.includes(&placement("Sales", "PLC")));
    }

    #[test]
    fn sub_department_entries_are_matched_under_their_root() {
        let scope = AssessmentScope::default().with_sub_department("Engineering", "Testing");
        assert!(scope.includes(&placement("Engineering", "Testing")));
        assert!(!scope.includes(&placement("Engineering", "PLC")));
        assert!(!scope.includes(&placement("Manufacturing", "Testing")));
    }
}
