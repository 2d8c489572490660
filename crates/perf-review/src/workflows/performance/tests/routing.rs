use super::common::*;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::performance::domain::GroupType;
use crate::workflows::performance::memory::{
    InMemoryDirectory, InMemoryRecordStore, InMemorySettings,
};
use crate::workflows::performance::router::{
    preview_handler, recompute_handler, record_handler, submit_handler,
};
use crate::workflows::performance::{performance_router, Level, ScoreInput, SubScores};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn preview_reports_field_on_validation_error() {
    let service = Arc::new(build_service().0);

    let response = preview_handler(
        State(service),
        axum::Json(ScoreInput::SubScores(SubScores::new(1.0, 1.0, 2.0, 1.0))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["field"], "project_feedback");
}

#[tokio::test]
async fn preview_returns_score_and_level() {
    let service = Arc::new(build_service().0);

    let response = preview_handler(State(service), axum::Json(ScoreInput::Level(Level::L4))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total_score"], json!(1.2));
    assert_eq!(body["level"], "L4");
}

#[tokio::test]
async fn submit_handler_returns_conflict_on_duplicate() {
    let service = Arc::new(build_service().0);

    let first = submit_handler(State(service.clone()), axum::Json(submission("e01"))).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let body = read_json_body(first).await;
    assert_eq!(body["status"], "submitted");
    assert_eq!(body["status_label"], "submitted");

    let second = submit_handler(State(service), axum::Json(submission("e01"))).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_handler_returns_service_unavailable_when_store_is_down() {
    let service = Arc::new(build_service_with_store(Arc::new(UnavailableStore)));

    let response = submit_handler::<UnavailableStore, InMemoryDirectory, InMemorySettings>(
        State(service),
        axum::Json(submission("e01")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn record_handler_validates_period_and_reports_missing_records() {
    let service = Arc::new(build_service().0);

    let bad_period = record_handler(
        State(service.clone()),
        Path(("September".to_string(), "e01".to_string())),
    )
    .await;
    assert_eq!(bad_period.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let missing = record_handler(
        State(service),
        Path(("2025-09".to_string(), "e01".to_string())),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recompute_handler_accepts_explicit_scope_body() {
    let (service, _store) = build_service();
    service.submit(submission("e06")).expect("submitted");
    let service = Arc::new(service);

    let score = performance_router(service.clone())
        .oneshot(json_request(
            "PUT",
            "/api/v1/performance/records/2025-09/e06/score",
            json!({ "scores": { "level": "L4" } }),
        ))
        .await
        .expect("route executes");
    assert_eq!(score.status(), StatusCode::OK);
    let body = read_json_body(score).await;
    assert_eq!(body["record"]["level"], "L4");
    assert_eq!(body["record"]["ranks"]["company_rank"], Value::Null);
    assert_eq!(body["rank_refresh"]["status"], "applied");

    let wide = recompute_handler(
        State(service.clone()),
        Path("2025-09".to_string()),
        Bytes::from(json!({ "include_all": true }).to_string()),
    )
    .await;
    assert_eq!(wide.status(), StatusCode::OK);
    let body = read_json_body(wide).await;
    assert_eq!(body["records_ranked"], 1);

    let configured = recompute_handler(
        State(service.clone()),
        Path("2025-09".to_string()),
        Bytes::new(),
    )
    .await;
    let body = read_json_body(configured).await;
    assert_eq!(body["records_ranked"], 0);
    assert_eq!(body["exclusions"].as_array().map(Vec::len), Some(1));

    let malformed = recompute_handler(
        State(service),
        Path("2025-09".to_string()),
        Bytes::from_static(b"{ not json"),
    )
    .await;
    assert_eq!(malformed.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn score_reports_failed_rank_refresh_and_close_surfaces_it() {
    let inner = InMemoryRecordStore::with_records(vec![scored_record(
        "e01",
        "Engineering",
        "PLC",
        GroupType::High,
        "m1",
        1.2,
    )]);
    let service = Arc::new(build_service_with_store(Arc::new(RollbackStore { inner })));
    let router = performance_router(service);

    let score = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/performance/records/2025-09/e01/score",
            json!({ "scores": { "level": "L5" } }),
        ))
        .await
        .expect("route executes");
    assert_eq!(score.status(), StatusCode::OK);
    let body = read_json_body(score).await;
    assert_eq!(body["record"]["status"], "scored");
    assert_eq!(body["record"]["total_score"], json!(1.5));
    assert_eq!(body["rank_refresh"]["status"], "failed");
    assert!(body["rank_refresh"]["error"]
        .as_str()
        .is_some_and(|error| error.contains("injected write failure")));

    let close = router
        .oneshot(
            Request::post("/api/v1/performance/periods/2025-09/close")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(close.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn router_runs_full_month_through_http() {
    let service = Arc::new(build_service().0);
    let router = performance_router(service);

    for employee in ["e01", "e02", "e03"] {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/performance/records",
                serde_json::to_value(submission(employee)).expect("serializable"),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    for (employee, level) in [("e01", "L3"), ("e02", "L5"), ("e03", "L4")] {
        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/performance/records/2025-09/{employee}/score"),
                json!({ "scores": { "level": level } }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let record = router
        .clone()
        .oneshot(
            Request::get("/api/v1/performance/records/2025-09/e02")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let body = read_json_body(record).await;
    assert_eq!(body["ranks"]["company_rank"], 1);
    assert_eq!(body["level_label"], "Excellent");

    let calibration = router
        .clone()
        .oneshot(
            Request::get("/api/v1/performance/periods/2025-09/managers/m1/calibration")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(calibration.status(), StatusCode::OK);
    let body = read_json_body(calibration).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["insufficient_data"], false);

    let unknown_manager = router
        .clone()
        .oneshot(
            Request::get("/api/v1/performance/periods/2025-09/managers/m7/calibration")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(unknown_manager.status(), StatusCode::NOT_FOUND);

    let close = router
        .clone()
        .oneshot(
            Request::post("/api/v1/performance/periods/2025-09/close")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(close.status(), StatusCode::OK);

    let rescore = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/performance/records/2025-09/e01/score",
            json!({ "scores": { "level": "L5" } }),
        ))
        .await
        .expect("route executes");
    assert_eq!(rescore.status(), StatusCode::CONFLICT);

    let summary = router
        .oneshot(
            Request::get("/api/v1/performance/periods/2025-09/summary")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let body = read_json_body(summary).await;
    assert_eq!(body["total_records"], 3);
    assert_eq!(body["average_score"], json!(1.23));
}
