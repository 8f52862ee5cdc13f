//! Metrics utilities
//!
//! Counters and histograms for requests, PDF resolution, and summary
//! writes. Nothing is exported unless a recorder is installed.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all DOF archive metrics
pub const METRICS_PREFIX: &str = "dof";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_pdf_resolutions_total", METRICS_PREFIX),
        Unit::Count,
        "PDF resolutions by source and outcome"
    );

    describe_histogram!(
        format!("{}_pdf_resolution_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time spent fetching or reading PDF bytes"
    );

    describe_counter!(
        format!("{}_summary_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Summary create/update/delete operations"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one PDF resolution attempt
pub fn record_pdf_resolution(source: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_pdf_resolutions_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_pdf_resolution_duration_seconds", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .record(duration_secs);
}

/// Record a summary write (create, update, delete)
pub fn record_summary_write(operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_summary_writes_total", METRICS_PREFIX),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
