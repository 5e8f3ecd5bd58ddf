use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use email_dispatch_service::config::Settings;
use email_dispatch_service::server::{create_app, AppState};
use email_dispatch_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_telemetry(&settings.logging)?;
    tracing::info!("Configuration loaded");

    // Create application state
    let state = AppState::new(&settings)?;
    tracing::info!("Application state initialized");

    // Compile frequently used templates up front
    state
        .dispatcher
        .templates()
        .preload(&settings.templates.preload)
        .await;

    // Missing or wrong credentials only surface on the first send
    let transport = state.dispatcher.transport().clone();
    tokio::spawn(async move {
        match transport.verify().await {
            Ok(()) => tracing::info!(transport = transport.name(), "Mail transport is ready"),
            Err(e) => tracing::warn!(
                transport = transport.name(),
                error = %e,
                "Mail transport verification failed"
            ),
        }
    });

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
