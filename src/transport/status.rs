//! Error kind → HTTP status.

use axum::http::StatusCode;

use crate::graphql::error::EngineErrorKind;
use crate::transport::error::ErrorKind;

/// Pick the HTTP status for an error kind.
///
/// Engine user errors keep the GraphQL convention of a 200 envelope.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::TransportUnsupported | ErrorKind::BodyMalformed => StatusCode::BAD_REQUEST,
        ErrorKind::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::OperationNotAllowed => StatusCode::NOT_ACCEPTABLE,
        ErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
        ErrorKind::MultipartShapeInvalid
        | ErrorKind::UploadUnavailable
        | ErrorKind::AttachmentFailed
        | ErrorKind::Engine(EngineErrorKind::Protocol)
        | ErrorKind::Unexpected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Engine(EngineErrorKind::User) => StatusCode::OK,
    }
}
