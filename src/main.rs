// textbook-backend - Q&A, translation and profile API for the Physical AI textbook
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use textbook_backend::cli::Args;
use textbook_backend::config::AppConfig;
use textbook_backend::server::{create_router, AppState};
use textbook_backend::utils::logging;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting textbook-backend v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Validate
    config.validate()?;
    if args.check_config {
        info!("Configuration OK: {:?}", config);
        return Ok(());
    }

    // Phase 4: Build collaborator clients
    info!(
        "Using model {} via {}",
        config.openrouter.model, config.openrouter.base_url
    );
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::from_config(config)?;

    // Phase 5: Build and start HTTP server
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
