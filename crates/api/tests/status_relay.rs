//! Integration tests for `GET /api/v1/jobs/{id}/status`.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, test_config, FakeOrchestrator};
use imagejob_core::error::GENERIC_FAILURE_MESSAGE;
use imagejob_core::status::{JobStatus, StatusReport};

#[tokio::test]
async fn queued_report_is_passed_through() {
    let orchestrator = FakeOrchestrator::new().with_report("job-1", StatusReport::queued(3, 5));
    let app = common::build_test_app(orchestrator);

    let response = get(app, "/api/v1/jobs/job-1/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "QUEUED");
    assert_eq!(json["queue_position"], 3);
    assert_eq!(json["queue_total"], 5);
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn success_report_is_passed_through() {
    let orchestrator =
        FakeOrchestrator::new().with_report("job-2", StatusReport::new(JobStatus::Success));
    let app = common::build_test_app(orchestrator);

    let json = body_json(get(app, "/api/v1/jobs/job-2/status").await).await;
    assert_eq!(json["status"], "SUCCESS");
}

#[tokio::test]
async fn upstream_error_becomes_generic_failure() {
    let app = common::build_test_app(FakeOrchestrator::new());

    let response = get(app, "/api/v1/jobs/unknown/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "FAILURE");
    assert_eq!(json["error"], GENERIC_FAILURE_MESSAGE);
    assert!(!json.to_string().contains("redis"));
}

#[tokio::test]
async fn reported_failure_text_is_replaced() {
    let orchestrator = FakeOrchestrator::new().with_report(
        "job-3",
        StatusReport::failure("CUDA out of memory on gpu-worker-7"),
    );
    let app = common::build_test_app(orchestrator);

    let json = body_json(get(app, "/api/v1/jobs/job-3/status").await).await;
    assert_eq!(json["status"], "FAILURE");
    assert_eq!(json["error"], GENERIC_FAILURE_MESSAGE);
}

#[tokio::test(start_paused = true)]
async fn slow_upstream_becomes_generic_failure_not_timeout() {
    let orchestrator = FakeOrchestrator::new().with_hang("job-slow");
    let config = imagejob_api::config::RelayConfig {
        request_timeout_secs: 1,
        ..test_config()
    };
    let app = common::build_test_app_with(orchestrator, config);

    let response = get(app, "/api/v1/jobs/job-slow/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "FAILURE");
    assert_eq!(json["error"], GENERIC_FAILURE_MESSAGE);
}
