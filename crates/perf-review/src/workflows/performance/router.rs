use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{EmployeeId, ManagerId, Period, RecordKey};
use super::report::RecordView;
use super::repository::{
    DirectoryError, EmployeeDirectory, RecordStore, RepositoryError, SettingsSource,
};
use super::scope::AssessmentScope;
use super::service::{
    PerformanceReviewService, ReviewServiceError, ScoreInput, ScoreRequest, SubmissionRequest,
};

type SharedService<S, D, C> = Arc<PerformanceReviewService<S, D, C>>;

/// Router exposing the monthly review workflow.
pub fn performance_router<S, D, C>(service: SharedService<S, D, C>) -> Router
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/performance/score-preview",
            post(preview_handler::<S, D, C>),
        )
        .route("/api/v1/performance/records", post(submit_handler::<S, D, C>))
        .route(
            "/api/v1/performance/records/draft",
            put(draft_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/records/:period/:employee_id",
            get(record_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/records/:period/:employee_id/score",
            put(score_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/periods/:period/recompute",
            post(recompute_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/periods/:period/close",
            post(close_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/periods/:period/summary",
            get(summary_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/periods/:period/calibration",
            get(calibration_report_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/periods/:period/managers/:manager_id/calibration",
            get(manager_calibration_handler::<S, D, C>),
        )
        .route(
            "/api/v1/performance/employees/:employee_id/trend",
            get(trend_handler::<S, D, C>),
        )
        .with_state(service)
}

pub(crate) async fn preview_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    axum::Json(input): axum::Json<ScoreInput>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    match service.preview(&input) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    match service.submit(request) {
        Ok(record) => (StatusCode::CREATED, axum::Json(RecordView::from(record))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn draft_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    match service.save_draft(request) {
        Ok(record) => (StatusCode::OK, axum::Json(RecordView::from(record))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path((period, employee_id)): Path<(String, String)>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    let key = match record_key(&period, employee_id) {
        Ok(key) => key,
        Err(response) => return response,
    };
    match service.get(&key) {
        Ok(record) => (StatusCode::OK, axum::Json(RecordView::from(record))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path((period, employee_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    let key = match record_key(&period, employee_id) {
        Ok(key) => key,
        Err(response) => return response,
    };
    match run_blocking(move || service.score(&key, request)).await {
        Ok(scored) => {
            let payload = json!({
                "record": RecordView::from(scored.record),
                "components": scored.outcome.components,
                "rank_refresh": scored.rank_refresh,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

/// An empty body recomputes against the configured scope; a JSON body supplies an explicit one.
pub(crate) async fn recompute_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path(period): Path<String>,
    body: Bytes,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(response) => return response,
    };

    let scope = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<AssessmentScope>(&body) {
            Ok(scope) => Some(scope),
            Err(error) => {
                let payload = json!({
                    "error": format!("invalid assessment scope: {error}"),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        }
    };

    let result = run_blocking(move || match scope {
        Some(scope) => service.recompute_rankings(&period, &scope),
        None => service.recompute_with_configured_scope(&period),
    })
    .await;
    match result {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn close_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path(period): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(response) => return response,
    };
    match run_blocking(move || service.close_period(&period)).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn summary_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path(period): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(response) => return response,
    };
    match service.period_summary(&period) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn calibration_report_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path(period): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(response) => return response,
    };
    match service.calibration_report(&period) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn manager_calibration_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path((period, manager_id)): Path<(String, String)>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(response) => return response,
    };
    match service.get_manager_calibration(&ManagerId(manager_id), &period) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn trend_handler<S, D, C>(
    State(service): State<SharedService<S, D, C>>,
    Path(employee_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    D: EmployeeDirectory + 'static,
    C: SettingsSource + 'static,
{
    match service.employee_trend(&EmployeeId(employee_id)) {
        Ok(trend) => (StatusCode::OK, axum::Json(trend)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Run a service call that may recompute a period on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, ReviewServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(error_response),
        Err(error) => {
            error!(%error, "review task did not complete");
            let payload = json!({
                "error": "review task did not complete",
            });
            Err((StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response())
        }
    }
}

fn parse_period(raw: &str) -> Result<Period, Response> {
    Period::parse(raw).map_err(|error| {
        let payload = json!({
            "error": error.to_string(),
        });
        (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
    })
}

fn record_key(period: &str, employee_id: String) -> Result<RecordKey, Response> {
    let period = parse_period(period)?;
    Ok(RecordKey::new(EmployeeId(employee_id), period))
}

pub(crate) fn error_response(error: ReviewServiceError) -> Response {
    let status = match &error {
        ReviewServiceError::Validation(_) | ReviewServiceError::UnknownEmployee(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ReviewServiceError::Repository(RepositoryError::NotFound)
        | ReviewServiceError::NoCalibration { .. } => StatusCode::NOT_FOUND,
        ReviewServiceError::Repository(RepositoryError::Conflict)
        | ReviewServiceError::Repository(RepositoryError::NotScorable(_))
        | ReviewServiceError::RecomputeConflict(_)
        | ReviewServiceError::Archived(_)
        | ReviewServiceError::NotScorable { .. } => StatusCode::CONFLICT,
        ReviewServiceError::Persistence(_)
        | ReviewServiceError::Repository(_)
        | ReviewServiceError::Directory(DirectoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let payload = match &error {
        ReviewServiceError::Validation(validation) => json!({
            "error": error.to_string(),
            "field": validation.field().name(),
        }),
        _ => json!({
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}
