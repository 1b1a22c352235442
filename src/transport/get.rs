//! GraphQL over HTTP GET.
//!
//! Parameters come from the query string; only query operations may run.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Query;
use axum::http::{Method, Request};
use axum::response::Response;

use crate::graphql::executor::GraphExecutor;
use crate::graphql::params::{DecodeError, ParameterBundle};
use crate::http::response::json_response;
use crate::observability::tracing::TraceContext;
use crate::transport::{execute_params, has_upgrade, OperationFilter, Transport, TransportError};

#[derive(Debug, Clone, Copy, Default)]
pub struct Get;

#[async_trait]
impl Transport for Get {
    fn name(&self) -> &'static str {
        "get"
    }

    fn supports(&self, request: &Request<Body>) -> bool {
        !has_upgrade(request) && request.method() == Method::GET
    }

    async fn execute(
        &self,
        request: Request<Body>,
        trace: &TraceContext,
        executor: &dyn GraphExecutor,
    ) -> Result<Response, TransportError> {
        let Query(args) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
            .map_err(|e| DecodeError::QueryString(e.body_text()))?;
        let params = ParameterBundle::from_query(&args)?;

        let (status, response) =
            execute_params(executor, trace, params, OperationFilter::QueriesOnly).await?;
        Ok(json_response(status, &response))
    }
}
