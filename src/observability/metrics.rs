//! Metrics collection.
//!
//! # Metrics
//! - `todo_http_requests_total` (counter): exchanges by method, status
//! - `todo_http_request_duration_seconds` (histogram): latency distribution
//! - `todo_events_total` (counter): change notifications by action
//!
//! Nothing is exported from here; without an installed recorder the
//! macros are no-ops.

use std::time::Instant;

use crate::model::ListAction;

/// Record one HTTP exchange. `status` is 0 when the transport failed.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = if status == 0 {
        "error".to_string()
    } else {
        status.to_string()
    };

    metrics::counter!(
        "todo_http_requests_total",
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "todo_http_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a published change notification.
pub fn record_event(action: ListAction) {
    metrics::counter!("todo_events_total", "action" => action.as_str()).increment(1);
}
