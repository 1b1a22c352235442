//! The execution engine as seen from the transport layer.
//!
//! # Data Flow
//! ```text
//! ParameterBundle
//!     → create_operation_context (parse, validate, pick operation)
//!         ├─ Err(errors) → dispatch_error → GraphResponse
//!         └─ Ok(ctx)     → dispatch_operation → GraphResponse
//! ```
//!
//! # Design Decisions
//! - Engine errors stay inside the engine: the transport never builds
//!   engine error responses itself, it only picks the status code
//! - Engine-private state rides along in `OperationContext::extensions`

use async_trait::async_trait;
use axum::http::Extensions;

use crate::graphql::error::ErrorList;
use crate::graphql::params::ParameterBundle;
use crate::graphql::response::GraphResponse;
use crate::observability::tracing::TraceContext;

/// Kind of the operation selected from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

/// A parsed and validated operation, ready to dispatch.
#[derive(Debug)]
pub struct OperationContext {
    /// Parameters the operation was built from, uploads included.
    pub params: ParameterBundle,
    /// Name of the selected operation, if it has one.
    pub operation_name: Option<String>,
    pub kind: OperationKind,
    /// Engine-specific state (e.g. a compiled plan).
    pub extensions: Extensions,
}

impl OperationContext {
    pub fn new(params: ParameterBundle, kind: OperationKind) -> Self {
        Self {
            params,
            operation_name: None,
            kind,
            extensions: Extensions::new(),
        }
    }
}

/// Executes GraphQL operations on behalf of the transports.
///
/// Shared by every request; implementations must be safe for concurrent use.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// Parse, validate and select the operation described by `params`.
    fn create_operation_context(
        &self,
        trace: &TraceContext,
        params: ParameterBundle,
    ) -> Result<OperationContext, ErrorList>;

    /// Execute a prepared operation.
    async fn dispatch_operation(
        &self,
        trace: &TraceContext,
        operation: OperationContext,
    ) -> GraphResponse;

    /// Convert errors from `create_operation_context` into a response.
    fn dispatch_error(&self, trace: &TraceContext, errors: ErrorList) -> GraphResponse;
}
