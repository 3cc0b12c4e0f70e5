// Test helpers are intentionally partially used
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use exam_registration::domain::{FixedClock, MetricsPtr};
use exam_registration::{
    build_router, create_memory_repository, create_noop_metrics, create_password_hasher,
    create_token_issuer, AppState, AuthConfig, HttpConfig,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_ORIGIN: &str = "http://localhost:5173";

// ============================================================================
// Test Setup
// ============================================================================

/// Instant the test clock starts at. Far enough ahead that real "now" never
/// interferes with deadline rules.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2031, 2, 3, 10, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    // ---
    pub fn new() -> Self {
        Self::with_metrics(create_noop_metrics().unwrap())
    }

    pub fn with_metrics(metrics: MetricsPtr) -> Self {
        // ---
        let clock = Arc::new(FixedClock::new(start_time()));
        let auth = AuthConfig {
            jwt_secret: "integration-test-secret".to_string(),
            jwt_expiration_hours: 1,
        };
        let http = HttpConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            cors_origin: TEST_ORIGIN.to_string(),
        };

        let state = AppState::new(
            create_memory_repository(),
            create_password_hasher(),
            create_token_issuer(&auth),
            clock.clone(),
            metrics,
        );
        let router = build_router(state, &http).expect("router should build");

        Self { router, clock }
    }

    /// Sends one request and returns status plus the body parsed as JSON
    /// (`Value::Null` for an empty body, a JSON string for plain text).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        // ---
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    /// Signs up a user and logs in, returning the bearer token.
    pub async fn account(&self, username: &str, role: &str) -> String {
        // ---
        let (status, _) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "password": "s3cret!",
                    "email": format!("{username}@campus.edu"),
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "sign-up of {username} failed");

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": "s3cret!" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login of {username} failed");

        body["token"].as_str().unwrap().to_string()
    }

    /// Creates an exam `exam_in` after the test clock and returns its id.
    pub async fn exam(
        &self,
        admin_token: &str,
        exam_in: Duration,
        deadline_in: Option<Duration>,
        course: &str,
    ) -> i64 {
        // ---
        let mut payload = exam_payload("Compilers", start_time() + exam_in, course);
        if let Some(deadline) = deadline_in {
            payload["registrationDeadline"] = json!((start_time() + deadline).to_rfc3339());
        }

        let (status, body) = self
            .send(Method::POST, "/api/exams", Some(admin_token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::CREATED, "exam creation failed: {body}");

        body["id"].as_i64().unwrap()
    }
}

pub fn exam_payload(title: &str, exam_date: DateTime<Utc>, course: &str) -> Value {
    // ---
    json!({
        "title": title,
        "description": "Written exam",
        "examDate": exam_date.to_rfc3339(),
        "durationInMinutes": 120,
        "maxMarks": 100,
        "passingMarks": 50,
        "courseName": course,
        "maxCapacity": 60,
        "name": format!("{title}-final"),
    })
}
