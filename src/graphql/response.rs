//! The `{ "errors": [...], "data": ... }` response envelope.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::graphql::error::{ErrorList, GraphError};

/// A GraphQL response as written to the client.
///
/// Field order is part of the wire format: `errors` (omitted when empty),
/// then `data` (always present, `null` when absent), then `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphResponse {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: ErrorList,
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphResponse {
    /// A successful response carrying `data`.
    pub fn data(data: Value) -> Self {
        Self {
            errors: Vec::new(),
            data: Some(data),
            extensions: None,
        }
    }

    /// An error response with `data: null`.
    pub fn errors(errors: ErrorList) -> Self {
        Self {
            errors,
            data: None,
            extensions: None,
        }
    }

    /// A single-message error response.
    pub fn error_message(message: impl Into<String>) -> Self {
        Self::errors(vec![GraphError::new(message)])
    }
}
