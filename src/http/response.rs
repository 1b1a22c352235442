//! JSON response construction.
//!
//! # Responsibilities
//! - Serialize response envelopes
//! - Always label bodies `application/json`, whatever the status
//!
//! # Design Decisions
//! - Serialization failures are logged and answered with a fixed 500 body
//!   instead of propagating; the boundary never returns a half-written body

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

const SERIALIZE_FAILED_BODY: &str = r#"{"errors":[{"message":"internal system error"}],"data":null}"#;

/// Serialize `body` as the JSON payload of a response with `status`.
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_json_type(status, Body::from(bytes)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            with_json_type(StatusCode::INTERNAL_SERVER_ERROR, Body::from(SERIALIZE_FAILED_BODY))
        }
    }
}

fn with_json_type(status: StatusCode, body: Body) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}
