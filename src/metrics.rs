// Prometheus metrics for rustmaps API usage
//
// Collected on a crate-owned registry:
// - Requests by operation and outcome (counter)
// - Requests skipped by the local rate limiter (counter)
// - Request latency (histogram)
// - Calls counted in each quota window (gauge)

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::rate_limit::QuotaUsage;

lazy_static! {
    pub static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rustmaps_requests_total", "Requests sent to rustmaps.com"),
        &["operation", "outcome"]
    ).expect("Failed to create requests total metric");

    pub static ref RATE_LIMITED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rustmaps_rate_limited_total", "Requests skipped because the local quota was exhausted"),
        &["operation"]
    ).expect("Failed to create rate limited metric");

    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("rustmaps_request_duration_seconds", "Round-trip time of rustmaps requests"),
        &["operation"]
    ).expect("Failed to create request duration metric");

    /// Process-wide: with several clients, the last one to check its quota wins
    pub static ref QUOTA_WINDOW_USAGE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("rustmaps_quota_window_usage", "Calls counted in each quota window at the last check by any client"),
        &["window_secs"]
    ).expect("Failed to create quota usage metric");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        registry.register(Box::new(REQUESTS_TOTAL.clone())).expect("Failed to register requests total");
        registry.register(Box::new(RATE_LIMITED_TOTAL.clone())).expect("Failed to register rate limited");
        registry.register(Box::new(REQUEST_DURATION_SECONDS.clone())).expect("Failed to register request duration");
        registry.register(Box::new(QUOTA_WINDOW_USAGE.clone())).expect("Failed to register quota usage");
        registry
    };
}

pub(crate) fn record_outcome(operation: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

pub(crate) fn record_rate_limited(operation: &str) {
    RATE_LIMITED_TOTAL.with_label_values(&[operation]).inc();
}

pub(crate) fn observe_duration(operation: &str, seconds: f64) {
    REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(seconds);
}

/// Overwrites the gauge; it reflects whichever client checked last, not a sum
pub(crate) fn record_quota_usage(usage: &QuotaUsage) {
    for window in &usage.windows {
        let label = window.window_secs.to_string();
        QUOTA_WINDOW_USAGE
            .with_label_values(&[label.as_str()])
            .set(i64::from(window.used));
    }
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}
