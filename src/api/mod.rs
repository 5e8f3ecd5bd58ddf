//! API layer - HTTP endpoint handlers.

mod email;
mod health;
mod metrics;
mod payload;
mod routes;

pub use email::{send_email, send_welcome_email, SendEmailResponse};
pub use health::{health, route_not_found, HealthResponse};
pub use metrics::prometheus_metrics;
pub use payload::JsonPayload;
pub use routes::api_routes;
