use axum::http::{Method, StatusCode};
use chrono::Duration;
use exam_registration::{create_noop_metrics, create_prom_metrics};
use serial_test::serial;

mod common;

use common::TestApp;

// NOTE: Prometheus metrics live in a global recorder shared by every test
// in this binary. Tests are serial so counters are read after they settle.

#[tokio::test]
#[serial]
async fn metrics_endpoint_with_prometheus() {
    // ---
    let app = TestApp::with_metrics(create_prom_metrics().unwrap());
    let admin = app.account("metric-admin", "ADMIN").await;
    let student = app.account("metric-student", "STUDENT").await;

    let exam = app.exam(&admin, Duration::days(3), None, "OBS").await;
    let (status, row) = app
        .send(
            Method::POST,
            &format!("/api/registrations/{exam}"),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/registrations/{}", row["id"]),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let _ = app.get("/health", None).await;

    let (status, body) = app.get("/metrics", None).await;
    assert_eq!(status, StatusCode::OK, "Metrics endpoint should return success");

    let text = body.as_str().expect("metrics are plain text");
    assert!(text.contains("exams_created_total"));
    assert!(text.contains("registrations_created_total"));
    assert!(text.contains("registrations_cancelled_total"));
    assert!(text.contains("http_request_duration_seconds"));
    assert!(
        text.contains("path=\"/api/registrations/{id}\""),
        "route template should be the path label"
    );
}

#[tokio::test]
#[serial]
async fn metrics_endpoint_with_noop() {
    // ---
    let app = TestApp::with_metrics(create_noop_metrics().unwrap());
    let _ = app.get("/health", None).await;

    let (status, body) = app.get("/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null(), "noop metrics render nothing");
}
