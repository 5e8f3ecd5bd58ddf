// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain layer (business logic)
pub mod email;
pub mod template;

// Application layer
pub mod api;
pub mod server;
