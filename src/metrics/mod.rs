//! Prometheus metrics for the email dispatch service.
//!
//! This module provides metrics for monitoring email dispatch:
//! - Emails sent, by template
//! - Dispatch failures, by error kind
//! - Dispatch latency (validation through transport acceptance)
//! - Compiled template cache size

mod helpers;

pub use helpers::{encode_metrics, DispatchMetrics, TemplateMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "email";

lazy_static! {
    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Emails accepted by the transport
    pub static ref EMAILS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_sent_total", METRIC_PREFIX),
        "Total emails accepted by the mail transport",
        &["template"]
    ).unwrap();

    /// Dispatches that ended in a failure
    pub static ref EMAILS_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_failed_total", METRIC_PREFIX),
        "Total email dispatch failures",
        &["kind"]
    ).unwrap();

    /// Time from request validation to transport outcome
    pub static ref DISPATCH_LATENCY: Histogram = register_histogram!(
        format!("{}_dispatch_latency_seconds", METRIC_PREFIX),
        "Email dispatch latency in seconds",
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // ============================================================================
    // Template Metrics
    // ============================================================================

    /// Number of compiled templates held in the cache
    pub static ref TEMPLATES_CACHED: IntGauge = register_int_gauge!(
        format!("{}_templates_cached", METRIC_PREFIX),
        "Number of compiled templates in the cache"
    ).unwrap();
}
