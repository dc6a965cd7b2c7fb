//! Main entry point for the Jenna API

use jenna_api::{
    api, backend::VertexBackend, config::Settings, pipeline::ContentService, AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "pretty" {
        registry.with(fmt::layer()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }

    info!("Starting Jenna API");
    info!(
        "Loaded configuration: server={}:{}",
        settings.server.host, settings.server.port
    );

    // Model clients are built once and shared read-only by every request
    let gateway = Arc::new(VertexBackend::from_config(&settings.vertex)?);
    info!(
        project = %settings.vertex.project_id,
        location = %settings.vertex.location,
        "Initialized Vertex AI backend"
    );

    let service = ContentService::new(gateway, &settings);
    service.scratch().ensure_dir().await?;
    info!(path = ?service.scratch().root(), "Scratch directory ready");

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState {
        settings: Arc::new(settings),
        service: Arc::new(service),
    });

    // Build the router
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
