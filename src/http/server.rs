//! HTTP server setup and the request boundary.
//!
//! # Responsibilities
//! - Create the Axum router serving the GraphQL endpoint
//! - Wire up middleware (tracing, body limit, request ID)
//! - Select a transport per request and run it under the request timeout
//! - Turn transport errors, timeouts and panics into JSON envelopes
//! - Record request metrics
//!
//! # Design Decisions
//! - The registry and executor are shared read-only across requests
//! - A panic inside a transport or executor is caught here and answered
//!   with 422; the process keeps serving
//! - The timeout wraps the transport future inside the boundary so a timed
//!   out request still gets a JSON envelope, and dropping the future releases
//!   any spooled uploads
//! - The router-wide body limit is the larger of the JSON and upload
//!   ceilings; each transport enforces its own bound below it

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::graphql::executor::GraphExecutor;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::observability::metrics;
use crate::observability::tracing::TraceContext;
use crate::transport::{TransportError, TransportRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TransportRegistry>,
    pub executor: Arc<dyn GraphExecutor>,
    pub request_timeout: Duration,
}

/// HTTP server for the GraphQL endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and executor.
    pub fn new(config: ServiceConfig, executor: Arc<dyn GraphExecutor>) -> Self {
        let registry = Arc::new(TransportRegistry::from_config(&config));
        tracing::info!(transports = ?registry.names(), endpoint = %config.listener.endpoint, "Transports registered");

        let state = AppState {
            registry,
            executor,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let ceiling = usize::try_from(config.upload.max_upload_size())
            .unwrap_or(usize::MAX)
            .max(config.security.max_body_size);

        Router::new()
            .route(&config.listener.endpoint, any(graphql_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(ceiling))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Router for in-process use, e.g. `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Request boundary: pick a transport, run it, and always answer with JSON.
async fn graphql_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let trace = TraceContext::start(request.request_id().unwrap_or("unknown"));

    tracing::debug!(
        request_id = %trace.request_id(),
        method = %request.method(),
        uri = %request.uri(),
        "GraphQL request received"
    );

    let Some(transport) = state.registry.select(&request) else {
        tracing::debug!(request_id = %trace.request_id(), method = %request.method(), "No transport accepted request");
        let response = TransportError::Unsupported.into_response();
        metrics::record_request("none", response.status().as_u16(), trace.started_at());
        return response;
    };
    let name = transport.name();

    let outcome = tokio::time::timeout(
        state.request_timeout,
        AssertUnwindSafe(transport.execute(request, &trace, state.executor.as_ref())).catch_unwind(),
    )
    .await;

    let response = match outcome {
        Ok(Ok(Ok(response))) => response,
        Ok(Ok(Err(e))) => {
            let response = e.into_response();
            tracing::debug!(
                request_id = %trace.request_id(),
                transport = name,
                status = response.status().as_u16(),
                "Request failed in transport"
            );
            response
        }
        Ok(Err(payload)) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(request_id = %trace.request_id(), transport = name, panic = %message, "Recovered from panic");
            metrics::record_panic();
            TransportError::Unexpected(message).into_response()
        }
        Err(_) => {
            tracing::warn!(
                request_id = %trace.request_id(),
                transport = name,
                timeout_secs = state.request_timeout.as_secs_f64(),
                "Request timed out"
            );
            TransportError::Timeout.into_response()
        }
    };

    tracing::debug!(
        request_id = %trace.request_id(),
        transport = name,
        status = response.status().as_u16(),
        elapsed_ms = trace.elapsed().as_millis() as u64,
        "Request complete"
    );
    metrics::record_request(name, response.status().as_u16(), trace.started_at());
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
