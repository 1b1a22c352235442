//! GraphQL over HTTP POST with a JSON body.

use std::error::Error as StdError;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use http_body_util::LengthLimitError;

use crate::graphql::executor::GraphExecutor;
use crate::graphql::params::{DecodeError, ParameterBundle};
use crate::http::response::json_response;
use crate::observability::tracing::TraceContext;
use crate::transport::{
    execute_params, has_upgrade, media_type, OperationFilter, Transport, TransportError,
};

const BODY_TOO_LARGE: &str = "request body too large";

#[derive(Debug, Clone, Copy)]
pub struct Post {
    max_body_size: usize,
}

impl Post {
    pub fn new(max_body_size: usize) -> Self {
        Self { max_body_size }
    }
}

fn exceeded_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

#[async_trait]
impl Transport for Post {
    fn name(&self) -> &'static str {
        "post"
    }

    fn supports(&self, request: &Request<Body>) -> bool {
        !has_upgrade(request)
            && request.method() == Method::POST
            && media_type(request).is_some_and(|m| m.essence_str() == mime::APPLICATION_JSON.essence_str())
    }

    async fn execute(
        &self,
        request: Request<Body>,
        trace: &TraceContext,
        executor: &dyn GraphExecutor,
    ) -> Result<Response, TransportError> {
        let body = axum::body::to_bytes(request.into_body(), self.max_body_size)
            .await
            .map_err(|e| {
                if exceeded_limit(&e) {
                    TransportError::RequestTooLarge(BODY_TOO_LARGE)
                } else {
                    DecodeError::Read(e.to_string()).into()
                }
            })?;
        let params = ParameterBundle::from_body(&body)?;

        let (status, response) = execute_params(executor, trace, params, OperationFilter::Any).await?;
        Ok(json_response(status, &response))
    }
}
