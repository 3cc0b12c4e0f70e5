use metrics::{counter, histogram};
use std::time::Instant;

/// Increment a counter for created exams.
pub fn increment_exam_created() {
    counter!("exams_created_total").increment(1);
}

/// Increment a counter for registrations made or re-activated.
pub fn increment_registration_created() {
    counter!("registrations_created_total").increment(1);
}

/// Increment a counter for cancelled registrations.
pub fn increment_registration_cancelled() {
    counter!("registrations_cancelled_total").increment(1);
}

/// Track HTTP request latency using a histogram labelled by route and outcome.
pub fn track_http_request(start: Instant, path: &str, method: &str, status: u16) {
    let elapsed = start.elapsed();
    histogram!(
        "http_request_duration_seconds",
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
