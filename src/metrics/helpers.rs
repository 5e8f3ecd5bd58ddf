//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use crate::email::ErrorKind;

use super::{DISPATCH_LATENCY, EMAILS_FAILED_TOTAL, EMAILS_SENT_TOTAL, TEMPLATES_CACHED};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatch metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Record an email accepted by the transport
    pub fn record_sent(template: &str) {
        EMAILS_SENT_TOTAL.with_label_values(&[template]).inc();
    }

    /// Record a failed dispatch
    pub fn record_failed(kind: ErrorKind) {
        EMAILS_FAILED_TOTAL.with_label_values(&[kind.as_str()]).inc();
    }

    /// Record how long a dispatch took
    pub fn observe_latency(elapsed: Duration) {
        DISPATCH_LATENCY.observe(elapsed.as_secs_f64());
    }
}

/// Helper struct for recording template metrics
pub struct TemplateMetrics;

impl TemplateMetrics {
    /// Record the current template cache size
    pub fn set_cached(count: usize) {
        TEMPLATES_CACHED.set(count as i64);
    }
}
