//! Transport selection subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, Upgrade, Content-Type)
//!     → TransportRegistry::select (first transport whose predicate matches)
//!     → Transport::execute
//!         → ParameterBundle (query args / JSON body / multipart form)
//!         → GraphExecutor
//!     → JSON envelope, status from status.rs
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - First match wins; order is explicit configuration
//! - Predicates are pure and always refuse `Upgrade` requests, which belong
//!   to the streaming sub-protocol

pub mod error;
pub mod get;
pub mod multipart;
pub mod options;
pub mod post;
pub mod status;

use std::fmt;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;

use crate::config::{ServiceConfig, TransportKind};
use crate::graphql::error::error_list_kind;
use crate::graphql::executor::{GraphExecutor, OperationKind};
use crate::graphql::params::ParameterBundle;
use crate::graphql::response::GraphResponse;
use crate::observability::tracing::TraceContext;

pub use error::{ErrorKind, TransportError};
pub use get::Get;
pub use multipart::MultipartForm;
pub use options::Options;
pub use post::Post;
pub use status::status_for;

/// A wire protocol the server can speak.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns true if this transport handles the request. Must not have side effects.
    fn supports(&self, request: &Request<Body>) -> bool;

    /// Handle the request. Errors are turned into responses by the caller.
    async fn execute(
        &self,
        request: Request<Body>,
        trace: &TraceContext,
        executor: &dyn GraphExecutor,
    ) -> Result<Response, TransportError>;
}

/// Ordered list of transports.
#[derive(Debug, Default)]
pub struct TransportRegistry {
    transports: Vec<Box<dyn Transport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry in the configured order.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let mut registry = Self::new();
        for kind in &config.transports.order {
            let transport: Box<dyn Transport> = match kind {
                TransportKind::Options => Box::new(Options),
                TransportKind::Get => Box::new(Get),
                TransportKind::Post => Box::new(Post::new(config.security.max_body_size)),
                TransportKind::Multipart => Box::new(MultipartForm::new(&config.upload)),
            };
            registry.add(transport);
        }
        registry
    }

    /// Append a transport; it is consulted after every existing one.
    pub fn add(&mut self, transport: Box<dyn Transport>) {
        tracing::debug!(transport = transport.name(), position = self.transports.len(), "Transport registered");
        self.transports.push(transport);
    }

    #[must_use]
    pub fn with(mut self, transport: impl Transport + 'static) -> Self {
        self.add(Box::new(transport));
        self
    }

    /// First transport whose predicate accepts the request.
    pub fn select(&self, request: &Request<Body>) -> Option<&dyn Transport> {
        self.transports
            .iter()
            .find(|t| t.supports(request))
            .map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }
}

/// True if the request asks for a protocol upgrade.
pub fn has_upgrade<B>(request: &Request<B>) -> bool {
    request.headers().contains_key(header::UPGRADE)
}

/// Parsed `Content-Type`, if present and well formed.
pub fn media_type<B>(request: &Request<B>) -> Option<mime::Mime> {
    request
        .headers()
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Which operation kinds a transport may dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationFilter {
    Any,
    QueriesOnly,
}

/// Run one parameter bundle through the executor.
///
/// Context creation failures go through `dispatch_error` with a status
/// picked from the error kind; successful dispatches are answered with 200.
pub(crate) async fn execute_params(
    executor: &dyn GraphExecutor,
    trace: &TraceContext,
    params: ParameterBundle,
    filter: OperationFilter,
) -> Result<(StatusCode, GraphResponse), TransportError> {
    let operation = match executor.create_operation_context(trace, params) {
        Ok(operation) => operation,
        Err(errors) => {
            let status = status_for(ErrorKind::Engine(error_list_kind(&errors)));
            tracing::debug!(
                request_id = %trace.request_id(),
                errors = errors.len(),
                status = status.as_u16(),
                "Operation rejected by executor"
            );
            return Ok((status, executor.dispatch_error(trace, errors)));
        }
    };

    if filter == OperationFilter::QueriesOnly && operation.kind != OperationKind::Query {
        return Err(TransportError::OperationNotAllowed);
    }

    tracing::debug!(
        request_id = %trace.request_id(),
        kind = operation.kind.as_str(),
        uploads = operation.params.uploads.len(),
        read_us = operation.params.read_window.map(|w| w.duration().as_micros() as u64),
        "Dispatching operation"
    );
    Ok((StatusCode::OK, executor.dispatch_operation(trace, operation).await))
}
