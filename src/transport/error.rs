//! Locally detected transport failures.
//!
//! Every variant short-circuits the request with a single-error envelope.
//! Engine errors are not represented here: they are answered by the
//! executor's own `dispatch_error`.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::graphql::error::EngineErrorKind;
use crate::graphql::params::{AttachError, DecodeError};
use crate::graphql::response::GraphResponse;
use crate::http::response::json_response;
use crate::transport::status::status_for;

/// Error taxonomy shared by transports and the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No transport accepted the request.
    TransportUnsupported,
    /// Declared or observed body size over the configured ceiling.
    RequestTooLarge,
    /// JSON body or query parameters failed to decode.
    BodyMalformed,
    /// `operations`/`map` unusable, or an empty destination list.
    MultipartShapeInvalid,
    /// File part missing, unreadable, or could not be spooled.
    UploadUnavailable,
    /// Destination path does not resolve inside `variables`.
    AttachmentFailed,
    /// GET used for something other than a query.
    OperationNotAllowed,
    /// Reported by the executor.
    Engine(EngineErrorKind),
    /// Handling exceeded the request timeout.
    Timeout,
    /// Recovered panic.
    Unexpected,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport not supported")]
    Unsupported,
    #[error("{0}")]
    RequestTooLarge(&'static str),
    #[error(transparent)]
    BodyMalformed(#[from] DecodeError),
    #[error("{0}")]
    MultipartShape(String),
    #[error("{0}")]
    UploadUnavailable(String),
    #[error(transparent)]
    AttachmentFailed(#[from] AttachError),
    #[error("GET requests only allow query operations")]
    OperationNotAllowed,
    #[error("request timed out")]
    Timeout,
    /// The payload is logged, never sent to the client.
    #[error("internal system error")]
    Unexpected(String),
}

impl TransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::Unsupported => ErrorKind::TransportUnsupported,
            TransportError::RequestTooLarge(_) => ErrorKind::RequestTooLarge,
            TransportError::BodyMalformed(_) => ErrorKind::BodyMalformed,
            TransportError::MultipartShape(_) => ErrorKind::MultipartShapeInvalid,
            TransportError::UploadUnavailable(_) => ErrorKind::UploadUnavailable,
            TransportError::AttachmentFailed(_) => ErrorKind::AttachmentFailed,
            TransportError::OperationNotAllowed => ErrorKind::OperationNotAllowed,
            TransportError::Timeout => ErrorKind::Timeout,
            TransportError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind());
        json_response(status, &GraphResponse::error_message(self.to_string()))
    }
}
