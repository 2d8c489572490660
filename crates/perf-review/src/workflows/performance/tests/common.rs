use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::performance::domain::{
    Employee, EmployeeId, EmployeeLevel, GroupType, ManagerId, OrgPlacement, PerformanceRecord,
    Period, RankSet, RecordKey, RecordStatus,
};
use crate::workflows::performance::memory::{
    InMemoryDirectory, InMemoryRecordStore, InMemorySettings,
};
use crate::workflows::performance::repository::{
    Assessment, PeriodCalibration, PeriodCommit, RecordStore, RepositoryError,
};
use crate::workflows::performance::scoring::{ScoringConfig, SubScoreDomain};
use crate::workflows::performance::{
    AssessmentScope, GroupConfig, PerformanceReviewService, ReviewEngineConfig, SubmissionRequest,
};

pub(super) type MemoryService =
    PerformanceReviewService<InMemoryRecordStore, InMemoryDirectory, InMemorySettings>;

pub(super) fn period() -> Period {
    Period::parse("2025-09").expect("valid period")
}

pub(super) fn key(employee_id: &str) -> RecordKey {
    RecordKey::new(EmployeeId(employee_id.to_string()), period())
}

pub(super) fn employee(
    id: &str,
    level: EmployeeLevel,
    department: &str,
    sub_department: &str,
    manager: &str,
) -> Employee {
    Employee {
        id: EmployeeId(id.to_string()),
        level,
        department: department.to_string(),
        sub_department: sub_department.to_string(),
        manager_id: ManagerId(manager.to_string()),
    }
}

/// Engineering (PLC, Software, Testing) reports to m1/m2; Sales reports to m3.
pub(super) fn roster() -> Vec<Employee> {
    vec![
        employee("e01", EmployeeLevel::Senior, "Engineering", "PLC", "m1"),
        employee("e02", EmployeeLevel::Intermediate, "Engineering", "PLC", "m1"),
        employee("e03", EmployeeLevel::Junior, "Engineering", "PLC", "m1"),
        employee("e04", EmployeeLevel::Senior, "Engineering", "Software", "m2"),
        employee("e05", EmployeeLevel::Assistant, "Engineering", "Testing", "m2"),
        employee("e06", EmployeeLevel::Senior, "Sales", "Field", "m3"),
    ]
}

pub(super) fn bounded_config() -> ReviewEngineConfig {
    ReviewEngineConfig {
        scoring: ScoringConfig {
            sub_score_domain: SubScoreDomain::Bounded,
        },
        ..ReviewEngineConfig::default()
    }
}

pub(super) fn engineering_scope() -> AssessmentScope {
    AssessmentScope::default().with_root_department("Engineering")
}

pub(super) fn submission(employee_id: &str) -> SubmissionRequest {
    SubmissionRequest {
        employee_id: EmployeeId(employee_id.to_string()),
        period: period(),
        self_summary: "Closed out the commissioning punch list.".to_string(),
        next_month_plan: "Start the FAT for line 4.".to_string(),
    }
}

pub(super) fn build_service_with_store<S>(store: Arc<S>) -> PerformanceReviewService<S, InMemoryDirectory, InMemorySettings>
where
    S: RecordStore + 'static,
{
    PerformanceReviewService::new(
        store,
        Arc::new(InMemoryDirectory::new(roster())),
        Arc::new(InMemorySettings::new(
            GroupConfig::default(),
            engineering_scope(),
        )),
        bounded_config(),
    )
}

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryRecordStore>) {
    let store = Arc::new(InMemoryRecordStore::default());
    let service = build_service_with_store(store.clone());
    (service, store)
}

/// A record that has already been scored, bypassing the service.
pub(super) fn scored_record(
    employee_id: &str,
    department: &str,
    sub_department: &str,
    group_type: GroupType,
    manager: &str,
    total_score: f64,
) -> PerformanceRecord {
    PerformanceRecord {
        employee_id: EmployeeId(employee_id.to_string()),
        period: period(),
        placement: OrgPlacement {
            department: department.to_string(),
            sub_department: sub_department.to_string(),
        },
        employee_level: match group_type {
            GroupType::High => EmployeeLevel::Senior,
            GroupType::Low => EmployeeLevel::Junior,
        },
        group_type,
        assessor_id: ManagerId(manager.to_string()),
        self_summary: String::new(),
        next_month_plan: String::new(),
        sub_scores: None,
        total_score: Some(total_score),
        level: None,
        manager_comment: None,
        next_month_arrangement: None,
        ranks: RankSet::default(),
        normalized_score: None,
        status: RecordStatus::Scored,
    }
}

pub(super) fn manager_records(manager: &str, prefix: &str, scores: &[f64]) -> Vec<PerformanceRecord> {
    scores
        .iter()
        .enumerate()
        .map(|(index, score)| {
            scored_record(
                &format!("{prefix}{index:02}"),
                "Engineering",
                "PLC",
                GroupType::High,
                manager,
                *score,
            )
        })
        .collect()
}

/// Store whose period commits always fail, leaving the wrapped store untouched.
#[derive(Default)]
pub(super) struct RollbackStore {
    pub(super) inner: InMemoryRecordStore,
}

impl RecordStore for RollbackStore {
    fn insert(&self, record: PerformanceRecord) -> Result<PerformanceRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: PerformanceRecord) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, key: &RecordKey) -> Result<Option<PerformanceRecord>, RepositoryError> {
        self.inner.fetch(key)
    }

    fn record_assessment(
        &self,
        key: &RecordKey,
        assessment: &Assessment,
    ) -> Result<PerformanceRecord, RepositoryError> {
        self.inner.record_assessment(key, assessment)
    }

    fn period_records(&self, period: &Period) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        self.inner.period_records(period)
    }

    fn employee_records(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        self.inner.employee_records(employee_id)
    }

    fn commit_period(&self, _commit: PeriodCommit) -> Result<(), RepositoryError> {
        Err(RepositoryError::RolledBack("injected write failure".to_string()))
    }

    fn period_calibration(
        &self,
        period: &Period,
    ) -> Result<Option<PeriodCalibration>, RepositoryError> {
        self.inner.period_calibration(period)
    }
}

pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn insert(&self, _record: PerformanceRecord) -> Result<PerformanceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: PerformanceRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _key: &RecordKey) -> Result<Option<PerformanceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_assessment(
        &self,
        _key: &RecordKey,
        _assessment: &Assessment,
    ) -> Result<PerformanceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn period_records(&self, _period: &Period) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn employee_records(
        &self,
        _employee_id: &EmployeeId,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_period(&self, _commit: PeriodCommit) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn period_calibration(
        &self,
        _period: &Period,
    ) -> Result<Option<PeriodCalibration>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Store that parks the first period read until the test releases it, and counts commits.
pub(super) struct GatedStore {
    pub(super) inner: InMemoryRecordStore,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    pub(super) commits: AtomicUsize,
}

impl GatedStore {
    /// `entered` fires when the first read starts; the read proceeds once `release` receives.
    pub(super) fn new(
        inner: InMemoryRecordStore,
        entered: Sender<()>,
        release: Receiver<()>,
    ) -> Self {
        Self {
            inner,
            gate: Mutex::new(Some((entered, release))),
            commits: AtomicUsize::new(0),
        }
    }

    pub(super) fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl RecordStore for GatedStore {
    fn insert(&self, record: PerformanceRecord) -> Result<PerformanceRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: PerformanceRecord) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, key: &RecordKey) -> Result<Option<PerformanceRecord>, RepositoryError> {
        self.inner.fetch(key)
    }

    fn record_assessment(
        &self,
        key: &RecordKey,
        assessment: &Assessment,
    ) -> Result<PerformanceRecord, RepositoryError> {
        self.inner.record_assessment(key, assessment)
    }

    fn period_records(&self, period: &Period) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        let gate = self.gate.lock().expect("gate mutex poisoned").take();
        if let Some((entered, release)) = gate {
            entered.send(()).expect("test listens for entry");
            release.recv().expect("test releases the read");
        }
        self.inner.period_records(period)
    }

    fn employee_records(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        self.inner.employee_records(employee_id)
    }

    fn commit_period(&self, commit: PeriodCommit) -> Result<(), RepositoryError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit_period(commit)
    }

    fn period_calibration(
        &self,
        period: &Period,
    ) -> Result<Option<PeriodCalibration>, RepositoryError> {
        self.inner.period_calibration(period)
    }
}

/// Store where the period is closed right after the first record read, before any write lands.
#[derive(Default)]
pub(super) struct ClosingStore {
    pub(super) inner: InMemoryRecordStore,
    closed: AtomicBool,
}

impl ClosingStore {
    pub(super) fn new(inner: InMemoryRecordStore) -> Self {
        Self {
            inner,
            closed: AtomicBool::new(false),
        }
    }
}

impl RecordStore for ClosingStore {
    fn insert(&self, record: PerformanceRecord) -> Result<PerformanceRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: PerformanceRecord) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, key: &RecordKey) -> Result<Option<PerformanceRecord>, RepositoryError> {
        let before = self.inner.fetch(key)?;
        if !self.closed.swap(true, Ordering::SeqCst) {
            if let Some(mut archived) = before.clone() {
                archived.status = RecordStatus::Completed;
                self.inner.update(archived)?;
            }
        }
        Ok(before)
    }

    fn record_assessment(
        &self,
        key: &RecordKey,
        assessment: &Assessment,
    ) -> Result<PerformanceRecord, RepositoryError> {
        self.inner.record_assessment(key, assessment)
    }

    fn period_records(&self, period: &Period) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        self.inner.period_records(period)
    }

    fn employee_records(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        self.inner.employee_records(employee_id)
    }

    fn commit_period(&self, commit: PeriodCommit) -> Result<(), RepositoryError> {
        self.inner.commit_period(commit)
    }

    fn period_calibration(
        &self,
        period: &Period,
    ) -> Result<Option<PeriodCalibration>, RepositoryError> {
        self.inner.period_calibration(period)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
