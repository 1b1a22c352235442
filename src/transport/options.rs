//! OPTIONS and HEAD on the GraphQL endpoint.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::graphql::executor::GraphExecutor;
use crate::observability::tracing::TraceContext;
use crate::transport::{has_upgrade, Transport, TransportError};

/// Methods advertised in the `Allow` header.
pub const ALLOWED_METHODS: &str = "OPTIONS, GET, POST";

/// Answers OPTIONS with the allowed methods and refuses HEAD.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options;

#[async_trait]
impl Transport for Options {
    fn name(&self) -> &'static str {
        "options"
    }

    fn supports(&self, request: &Request<Body>) -> bool {
        !has_upgrade(request) && matches!(*request.method(), Method::OPTIONS | Method::HEAD)
    }

    async fn execute(
        &self,
        request: Request<Body>,
        _trace: &TraceContext,
        _executor: &dyn GraphExecutor,
    ) -> Result<Response, TransportError> {
        if request.method() == Method::OPTIONS {
            let mut response = StatusCode::OK.into_response();
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            Ok(response)
        } else {
            Ok(StatusCode::METHOD_NOT_ALLOWED.into_response())
        }
    }
}
