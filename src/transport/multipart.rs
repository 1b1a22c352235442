//! GraphQL multipart request transport.
//!
//! Implements the `operations` + `map` + file parts convention for binding
//! uploaded files into operation variables.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;

use crate::config::UploadConfig;
use crate::graphql::executor::GraphExecutor;
use crate::graphql::params::Operations;
use crate::http::response::json_response;
use crate::observability::tracing::TraceContext;
use crate::transport::{
    execute_params, has_upgrade, media_type, OperationFilter, Transport, TransportError,
};
use crate::upload::decoder::{DecodedUploads, MultipartUploadDecoder};

#[derive(Debug, Clone)]
pub struct MultipartForm {
    decoder: MultipartUploadDecoder,
}

impl MultipartForm {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            decoder: MultipartUploadDecoder::new(config),
        }
    }
}

#[async_trait]
impl Transport for MultipartForm {
    fn name(&self) -> &'static str {
        "multipart"
    }

    fn supports(&self, request: &Request<Body>) -> bool {
        !has_upgrade(request)
            && request.method() == Method::POST
            && media_type(request)
                .is_some_and(|m| m.essence_str() == mime::MULTIPART_FORM_DATA.essence_str())
    }

    async fn execute(
        &self,
        request: Request<Body>,
        trace: &TraceContext,
        executor: &dyn GraphExecutor,
    ) -> Result<Response, TransportError> {
        // Spooled files stay on disk until this function returns, on every path.
        let DecodedUploads { operations, spool } = self.decoder.decode(request, trace).await?;

        let response = match operations {
            Operations::Single(params) => {
                let (status, response) =
                    execute_params(executor, trace, params, OperationFilter::Any).await?;
                json_response(status, &response)
            }
            Operations::Batch(batch) => {
                let mut responses = Vec::with_capacity(batch.len());
                for params in batch {
                    let (_, response) =
                        execute_params(executor, trace, params, OperationFilter::Any).await?;
                    responses.push(response);
                }
                json_response(StatusCode::OK, &responses)
            }
        };

        tracing::debug!(
            request_id = %trace.request_id(),
            spooled_files = spool.len(),
            "Multipart request complete"
        );
        drop(spool);
        Ok(response)
    }
}
