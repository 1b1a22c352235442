//! Request size limits.
//!
//! # Responsibilities
//! - Read the declared request size from `Content-Length`
//! - Reject oversized requests before any body parsing
//!
//! # Design Decisions
//! - Limits checked before full parsing (early rejection)
//! - A missing or unparsable header is not an error; readers enforce
//!   the limit while streaming instead

use axum::http::{header, HeaderMap};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("declared content length {declared} exceeds limit {limit}")]
pub struct LimitExceeded {
    pub declared: u64,
    pub limit: u64,
}

/// Declared `Content-Length`, if present and numeric.
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Reject a request whose declared size is over `limit`.
///
/// Returns the declared length on success.
pub fn check_content_length(headers: &HeaderMap, limit: u64) -> Result<Option<u64>, LimitExceeded> {
    match declared_content_length(headers) {
        Some(declared) if declared > limit => Err(LimitExceeded { declared, limit }),
        declared => Ok(declared),
    }
}
