//! GraphQL error entries as they appear in the response envelope.

use serde::Serialize;
use serde_json::{Map, Value};

/// Error code for documents that fail to parse.
pub const PARSE_FAILED: &str = "GRAPHQL_PARSE_FAILED";
/// Error code for documents that parse but fail validation.
pub const VALIDATION_FAILED: &str = "GRAPHQL_VALIDATION_FAILED";

/// How an engine error is treated by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineErrorKind {
    /// The request itself was unusable (parse/validation). Answered with 422.
    Protocol,
    /// An error raised while executing a valid request. Answered with 200.
    #[default]
    User,
}

/// Source location of an error inside the query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// A single entry of the `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
    #[serde(skip)]
    pub kind: EngineErrorKind,
}

impl GraphError {
    /// A plain message with no path, location or code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            locations: Vec::new(),
            extensions: None,
            kind: EngineErrorKind::User,
        }
    }

    /// A protocol-kind error carrying an `extensions.code`.
    pub fn protocol(message: impl Into<String>, code: &str) -> Self {
        Self::new(message).with_code(code).with_kind(EngineErrorKind::Protocol)
    }

    #[must_use]
    pub fn with_code(mut self, code: &str) -> Self {
        self.extensions
            .get_or_insert_with(Map::new)
            .insert("code".to_string(), Value::String(code.to_string()));
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EngineErrorKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.locations.push(Location { line, column });
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<Value>) -> Self {
        self.path = Some(path);
        self
    }

    /// The `extensions.code` value, if any.
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

/// Errors reported together by the executor.
pub type ErrorList = Vec<GraphError>;

/// Kind of a whole error list: protocol if any entry is protocol.
pub fn error_list_kind(errors: &[GraphError]) -> EngineErrorKind {
    if errors.iter().any(|e| e.kind == EngineErrorKind::Protocol) {
        EngineErrorKind::Protocol
    } else {
        EngineErrorKind::User
    }
}
