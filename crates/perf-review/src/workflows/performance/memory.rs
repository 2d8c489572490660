use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use super::domain::{Employee, EmployeeId, PerformanceRecord, Period, RecordKey, RecordStatus};
use super::grouping::GroupConfig;
use super::repository::{
    Assessment, DirectoryError, EmployeeDirectory, PeriodCalibration, PeriodCommit, RecordStore,
    RepositoryError, SettingsSource,
};
use super::scope::AssessmentScope;

#[derive(Debug, Default)]
struct StoreState {
    records: BTreeMap<RecordKey, PerformanceRecord>,
    calibration: HashMap<Period, PeriodCalibration>,
}

/// Process-local record store. Period commits are staged on a copy and swapped in under the
/// write lock, so readers see either the old or the new period, never a mix.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    state: RwLock<StoreState>,
}

impl InMemoryRecordStore {
    pub fn with_records(records: impl IntoIterator<Item = PerformanceRecord>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.write().unwrap_or_else(PoisonError::into_inner);
            for record in records {
                state.records.insert(record.key(), record);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply a commit onto a staging copy of the record map.
pub(crate) fn stage_commit(
    records: &BTreeMap<RecordKey, PerformanceRecord>,
    commit: &PeriodCommit,
) -> Result<BTreeMap<RecordKey, PerformanceRecord>, RepositoryError> {
    let mut staged = records.clone();

    for (key, fields) in &commit.records {
        if key.period != commit.period {
            return Err(RepositoryError::RolledBack(format!(
                "record {} belongs to {}, not {}",
                key.employee_id, key.period, commit.period
            )));
        }
        let record = staged.get_mut(key).ok_or_else(|| {
            RepositoryError::RolledBack(format!(
                "record {} for {} disappeared during recompute",
                key.employee_id, key.period
            ))
        })?;
        record.ranks = fields.ranks;
        record.normalized_score = fields.normalized_score;
    }

    if commit.complete_scored {
        for record in staged
            .values_mut()
            .filter(|record| record.period == commit.period)
        {
            if record.status == RecordStatus::Scored {
                record.status = RecordStatus::Completed;
            }
        }
    }

    Ok(staged)
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, record: PerformanceRecord) -> Result<PerformanceRecord, RepositoryError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let key = record.key();
        if state.records.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        state.records.insert(key, record.clone());
        Ok(record)
    }

    fn update(&self, record: PerformanceRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let key = record.key();
        match state.records.get_mut(&key) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, key: &RecordKey) -> Result<Option<PerformanceRecord>, RepositoryError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.records.get(key).cloned())
    }

    fn record_assessment(
        &self,
        key: &RecordKey,
        assessment: &Assessment,
    ) -> Result<PerformanceRecord, RepositoryError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let record = state.records.get_mut(key).ok_or(RepositoryError::NotFound)?;
        assessment.apply_to(record)?;
        Ok(record.clone())
    }

    fn period_records(&self, period: &Period) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .records
            .values()
            .filter(|record| &record.period == period)
            .cloned()
            .collect())
    }

    fn employee_records(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .records
            .values()
            .filter(|record| &record.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn commit_period(&self, commit: PeriodCommit) -> Result<(), RepositoryError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let staged = stage_commit(&state.records, &commit)?;
        state.records = staged;
        state
            .calibration
            .insert(commit.period.clone(), commit.calibration);
        Ok(())
    }

    fn period_calibration(
        &self,
        period: &Period,
    ) -> Result<Option<PeriodCalibration>, RepositoryError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.calibration.get(period).cloned())
    }
}

/// Directory backed by a fixed employee list.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    employees: RwLock<HashMap<EmployeeId, Employee>>,
}

impl InMemoryDirectory {
    pub fn new(employees: impl IntoIterator<Item = Employee>) -> Self {
        let employees = employees
            .into_iter()
            .map(|employee| (employee.id.clone(), employee))
            .collect();
        Self {
            employees: RwLock::new(employees),
        }
    }

    pub fn upsert(&self, employee: Employee) {
        self.employees
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(employee.id.clone(), employee);
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn lookup(&self, id: &EmployeeId) -> Result<Option<Employee>, DirectoryError> {
        Ok(self
            .employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }
}

/// Settings held in memory and editable at runtime.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    group_config: RwLock<GroupConfig>,
    scope: RwLock<AssessmentScope>,
}

impl InMemorySettings {
    pub fn new(group_config: GroupConfig, scope: AssessmentScope) -> Self {
        Self {
            group_config: RwLock::new(group_config),
            scope: RwLock::new(scope),
        }
    }

    pub fn set_group_config(&self, config: GroupConfig) -> GroupConfig {
        *self
            .group_config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = config.clone();
        config
    }

    pub fn set_assessment_scope(&self, scope: AssessmentScope) -> AssessmentScope {
        *self.scope.write().unwrap_or_else(PoisonError::into_inner) = scope.clone();
        scope
    }
}

impl SettingsSource for InMemorySettings {
    fn group_config(&self) -> Result<GroupConfig, RepositoryError> {
        Ok(self
            .group_config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn assessment_scope(&self) -> Result<AssessmentScope, RepositoryError> {
        Ok(self
            .scope
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
