//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//! - Tie OS signals to graceful shutdown
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal
//! - Configuration is loaded and validated by the caller
//! - Listener starts last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::graphql::executor::GraphExecutor;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the service until a shutdown signal arrives.
pub async fn run(config: ServiceConfig, executor: Arc<dyn GraphExecutor>) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, executor);
    let mut serving = tokio::spawn(server.run(listener, shutdown.listener()));

    let joined = tokio::select! {
        _ = shutdown_signal() => {
            shutdown.trigger();
            (&mut serving).await
        }
        joined = &mut serving => joined,
    };
    if !shutdown.is_triggered() {
        tracing::warn!("Server stopped before shutdown was requested");
    }

    match joined {
        Ok(result) => result?,
        Err(e) => tracing::error!(error = %e, "Server task failed"),
    }
    Ok(())
}
