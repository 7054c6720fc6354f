use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Experiment Metrics
    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sessions_total",
        "Total number of experiment sessions",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of sessions held in memory"
    )
    .unwrap();

    pub static ref GUESSES_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "guesses_submitted_total",
        "Total number of accepted guesses",
        &["result"]
    )
    .unwrap();

    pub static ref HINTS_REQUESTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hints_requested_total",
        "Total number of hints requested",
        &["hint_level"]
    )
    .unwrap();

    pub static ref EXTERNAL_SERVICE_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "external_service_failures_total",
        "Failed calls to the hint or speech service",
        &["service"]
    )
    .unwrap();

    pub static ref RECORDS_FLUSHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "records_flushed_total",
        "Puzzle records written to result files",
        &["block"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .inc();
        GUESSES_SUBMITTED_TOTAL.with_label_values(&["solved"]).inc();
        RECORDS_FLUSHED_TOTAL.with_label_values(&["A"]).inc_by(2);
        SESSIONS_ACTIVE.set(0);
    }

    #[test]
    fn test_render_metrics() {
        HINTS_REQUESTED_TOTAL.with_label_values(&["1"]).inc();
        let rendered = render_metrics().unwrap();
        assert!(rendered.contains("hints_requested_total"));
    }
}
