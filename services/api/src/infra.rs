use metrics_exporter_prometheus::PrometheusHandle;
use perf_review::config::{ReviewConfig, SettingsFile};
use perf_review::error::AppError;
use perf_review::workflows::performance::{
    Employee, EmployeeId, EmployeeLevel, InMemoryDirectory, InMemoryRecordStore,
    InMemorySettings, Level, ManagerId, PerformanceReviewService, Period,
};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type ReviewService =
    PerformanceReviewService<InMemoryRecordStore, InMemoryDirectory, InMemorySettings>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) settings: Arc<InMemorySettings>,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    employee_id: String,
    employee_level: EmployeeLevel,
    department: String,
    #[serde(default)]
    sub_department: String,
    manager_id: String,
}

impl From<RosterRow> for Employee {
    fn from(row: RosterRow) -> Self {
        Employee {
            id: EmployeeId(row.employee_id),
            level: row.employee_level,
            department: row.department,
            sub_department: row.sub_department,
            manager_id: ManagerId(row.manager_id),
        }
    }
}

/// Read an employee roster CSV: `employee_id,employee_level,department,sub_department,manager_id`.
pub(crate) fn read_roster<R: Read>(reader: R) -> Result<Vec<Employee>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize::<RosterRow>()
        .map(|row| row.map(Employee::from))
        .collect()
}

pub(crate) fn load_roster(path: &Path) -> Result<Vec<Employee>, AppError> {
    let file = File::open(path)?;
    read_roster(file).map_err(|err| AppError::Io(err.into()))
}

pub(crate) fn build_review_service(
    review: &ReviewConfig,
    settings: SettingsFile,
    roster: Vec<Employee>,
) -> (Arc<ReviewService>, Arc<InMemorySettings>) {
    info!(
        employees = roster.len(),
        high_levels = settings.group_config.high_levels.len(),
        unrestricted_scope = settings.assessment_scope.include_all,
        "building in-memory review service"
    );

    let settings = Arc::new(InMemorySettings::new(
        settings.group_config,
        settings.assessment_scope,
    ));
    let service = PerformanceReviewService::new(
        Arc::new(InMemoryRecordStore::default()),
        Arc::new(InMemoryDirectory::new(roster)),
        settings.clone(),
        review.engine.clone(),
    );
    (Arc::new(service), settings)
}

pub(crate) fn parse_period(raw: &str) -> Result<Period, String> {
    Period::parse(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_level(raw: &str) -> Result<Level, String> {
    Level::from_code(raw).ok_or_else(|| format!("'{raw}' is not one of L1, L2, L3, L4, L5"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_rows_become_directory_entries() {
        let csv = "\
employee_id,employee_level,department,sub_department,manager_id
e01, senior ,Engineering,PLC,m1
e02,assistant,Engineering,,m1
";
        let roster = read_roster(csv.as_bytes()).expect("roster parses");

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].level, EmployeeLevel::Senior);
        assert_eq!(roster[0].manager_id, ManagerId("m1".to_string()));
        assert_eq!(roster[1].sub_department, "");
    }

    #[test]
    fn unknown_seniority_is_rejected() {
        let csv = "\
employee_id,employee_level,department,sub_department,manager_id
e01,principal,Engineering,PLC,m1
";
        assert!(read_roster(csv.as_bytes()).is_err());
    }

    #[test]
    fn level_and_period_arguments_are_validated() {
        assert_eq!(parse_level("l4"), Ok(Level::L4));
        assert!(parse_level("L6").is_err());
        assert_eq!(
            parse_period("2025-09").map(|period| period.as_str().to_string()),
            Ok("2025-09".to_string())
        );
        assert!(parse_period("09/2025").is_err());
    }
}
