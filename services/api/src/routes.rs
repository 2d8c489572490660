use crate::infra::{AppState, ReviewService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use perf_review::workflows::performance::{
    performance_router, AssessmentScope, GroupConfig, SettingsSource,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) fn with_review_routes(service: Arc<ReviewService>) -> axum::Router {
    performance_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/settings/group-config",
            get(group_config_endpoint).put(update_group_config_endpoint),
        )
        .route(
            "/api/v1/settings/assessment-scope",
            get(assessment_scope_endpoint).put(update_assessment_scope_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn group_config_endpoint(
    Extension(state): Extension<AppState>,
) -> axum::response::Response {
    match state.settings.group_config() {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

/// Replace the peer-group settings. Records already submitted keep their stored group.
pub(crate) async fn update_group_config_endpoint(
    Extension(state): Extension<AppState>,
    Json(config): Json<GroupConfig>,
) -> Json<GroupConfig> {
    let overlapping = config.overlapping_levels();
    if !overlapping.is_empty() {
        warn!(?overlapping, "levels listed as both high and low, treating them as high");
    }
    let stored = state.settings.set_group_config(config);
    info!(
        cross_dept_groups = stored.cross_dept_groups.len(),
        "group config updated"
    );
    Json(stored)
}

pub(crate) async fn assessment_scope_endpoint(
    Extension(state): Extension<AppState>,
) -> axum::response::Response {
    match state.settings.assessment_scope() {
        Ok(scope) => (StatusCode::OK, Json(scope)).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

/// Replace the assessment scope. Takes effect on the next recompute of each period.
pub(crate) async fn update_assessment_scope_endpoint(
    Extension(state): Extension<AppState>,
    Json(scope): Json<AssessmentScope>,
) -> Json<AssessmentScope> {
    if scope.is_empty() {
        warn!("assessment scope is empty, recomputes will rank nobody");
    }
    let stored = state.settings.set_assessment_scope(scope);
    info!(
        include_all = stored.include_all,
        root_departments = stored.root_departments.len(),
        "assessment scope updated"
    );
    Json(stored)
}
