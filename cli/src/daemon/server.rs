// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Daemon HTTP server implementation

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use osservatore_core::domain::node_config::NodeConfig;
use osservatore_core::presentation::api;

use crate::embedded::EmbeddedExecutor;

/// Serve the HTTP API until Ctrl+C or SIGTERM. `host` and `port` override
/// the configured network settings.
pub async fn start_server(config: NodeConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    info!(
        node = %config.metadata.name,
        registry = %config.spec.registry.path.display(),
        "Osservatore daemon starting (PID: {})",
        std::process::id()
    );

    let executor = EmbeddedExecutor::new(&config)?;
    let app = api::app(executor.lifecycle().clone());

    let host = host.unwrap_or_else(|| config.spec.network.bind_address.clone());
    let port = port.unwrap_or(config.spec.network.port);
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Daemon listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Daemon shutting down");

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
            .expect("failed to install SIGTERM handler")
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
