use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::email::{send_email, send_welcome_email};
use super::health::{health, route_not_found};
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Email endpoints
        .route("/send-welcome-email", post(send_welcome_email))
        .route("/send-email", post(send_email))
        // Unknown paths and unsupported methods share the 404 body
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
}
