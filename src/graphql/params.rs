//! Raw request parameters and their decoders.
//!
//! # Responsibilities
//! - Decode `query`/`operationName`/`variables`/`extensions` from URL query
//!   parameters or from a JSON body
//! - Decode the multipart `operations` field (single object or batch)
//! - Resolve upload destination paths against `variables`
//!
//! # Design Decisions
//! - Numbers keep their literal text (serde_json `arbitrary_precision`), so
//!   large integers in variables survive decoding untouched
//! - The read window brackets only the decode work
//! - Destination paths must resolve to an existing container; nothing is
//!   created along the way

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::graphql::upload::UploadBinding;
use crate::observability::tracing::TraceTiming;

/// Failure to decode request parameters.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A single query parameter held invalid JSON.
    #[error("{field} could not be decoded")]
    Field {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The request body was not a parameter object.
    #[error("json body could not be decoded: {0}")]
    Body(#[source] serde_json::Error),
    #[error("query string could not be decoded: {0}")]
    QueryString(String),
    #[error("request body could not be read: {0}")]
    Read(String),
}

/// Failure to bind an upload to its destination path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("invalid operations paths for key {key}")]
    InvalidPrefix { key: String, path: String },
    #[error("path {path} for key {key} does not resolve inside variables")]
    Unresolved { key: String, path: String },
    #[error("path {path} for key {key} addresses a missing operation")]
    MissingOperation { key: String, path: String },
}

/// Decoded GraphQL request parameters plus attached uploads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterBundle {
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operation_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: Map<String, Value>,
    #[serde(skip)]
    pub uploads: Vec<UploadBinding>,
    #[serde(skip)]
    pub read_window: Option<TraceTiming>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ParameterBundle {
    /// Decode parameters from URL query arguments.
    ///
    /// `query` and `operationName` are taken verbatim; `variables` and
    /// `extensions` are parsed as JSON when present and non-empty.
    pub fn from_query(args: &HashMap<String, String>) -> Result<Self, DecodeError> {
        let start = Instant::now();
        let mut params = Self {
            query: args.get("query").cloned().unwrap_or_default(),
            operation_name: args.get("operationName").cloned().unwrap_or_default(),
            ..Self::default()
        };

        params.variables = decode_arg(args, "variables")?;
        params.extensions = decode_arg(args, "extensions")?;

        params.read_window = Some(TraceTiming {
            start,
            end: Instant::now(),
        });
        Ok(params)
    }

    /// Decode parameters from a JSON request body.
    pub fn from_body(body: &[u8]) -> Result<Self, DecodeError> {
        let start = Instant::now();
        let mut params: Self = serde_json::from_slice(body).map_err(DecodeError::Body)?;
        params.read_window = Some(TraceTiming {
            start,
            end: Instant::now(),
        });
        Ok(params)
    }

    /// Bind an upload to its destination path inside `variables`.
    ///
    /// The path must start with `variables.`; every intermediate segment must
    /// exist. Numeric segments index arrays and must be in range. The final
    /// object key may be absent, in which case it is inserted as `null`.
    pub fn add_upload(&mut self, upload: UploadBinding) -> Result<(), AttachError> {
        let Some(rest) = upload.destination_path.strip_prefix("variables.") else {
            return Err(AttachError::InvalidPrefix {
                key: upload.source_key,
                path: upload.destination_path,
            });
        };

        let mut root = Value::Object(std::mem::take(&mut self.variables));
        let resolved = mark_slot(&mut root, rest);
        if let Value::Object(map) = root {
            self.variables = map;
        }

        if resolved.is_none() {
            return Err(AttachError::Unresolved {
                key: upload.source_key,
                path: upload.destination_path,
            });
        }
        self.uploads.push(upload);
        Ok(())
    }

    /// Uploads bound to exactly this destination path.
    pub fn upload_at(&self, path: &str) -> Option<&UploadBinding> {
        self.uploads.iter().find(|u| u.destination_path == path)
    }
}

fn decode_arg(
    args: &HashMap<String, String>,
    field: &'static str,
) -> Result<Map<String, Value>, DecodeError> {
    match args.get(field).map(String::as_str) {
        None | Some("") => Ok(Map::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|source| DecodeError::Field { field, source }),
    }
}

/// Walk `path` below `root` and make sure the final slot exists.
fn mark_slot(root: &mut Value, path: &str) -> Option<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    let (last, parents) = segments.split_last()?;

    let mut cursor = root;
    for segment in parents {
        cursor = match cursor {
            Value::Object(map) => map.get_mut(*segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
            _ => None,
        }?;
    }

    match cursor {
        Value::Object(map) => {
            map.entry(last.to_string()).or_insert(Value::Null);
            Some(())
        }
        Value::Array(items) => {
            let index = last.parse::<usize>().ok()?;
            (index < items.len()).then_some(())
        }
        _ => None,
    }
}

/// Contents of the multipart `operations` field.
#[derive(Debug)]
pub enum Operations {
    Single(ParameterBundle),
    Batch(Vec<ParameterBundle>),
}

impl Operations {
    /// Decode a single operation object, or an array when `allow_batch` is set.
    pub fn decode(raw: &[u8], allow_batch: bool) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw).map_err(DecodeError::Body)?;
        match value {
            Value::Array(items) if allow_batch => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Operations::Batch)
                .map_err(DecodeError::Body),
            Value::Object(_) => serde_json::from_value(value)
                .map(Operations::Single)
                .map_err(DecodeError::Body),
            other => Err(DecodeError::Body(serde::de::Error::custom(format!(
                "expected an operation object, found {}",
                if other.is_array() { "a batch" } else { "a scalar" }
            )))),
        }
    }

    /// Bind an upload; batch paths are prefixed with the operation index.
    pub fn add_upload(&mut self, mut upload: UploadBinding) -> Result<(), AttachError> {
        match self {
            Operations::Single(params) => params.add_upload(upload),
            Operations::Batch(batch) => {
                let target = upload
                    .destination_path
                    .split_once('.')
                    .and_then(|(index, rest)| Some((index.parse::<usize>().ok()?, rest.to_string())));
                match target {
                    Some((index, rest)) if index < batch.len() => {
                        upload.destination_path = rest;
                        batch[index].add_upload(upload)
                    }
                    _ => Err(AttachError::MissingOperation {
                        key: upload.source_key,
                        path: upload.destination_path,
                    }),
                }
            }
        }
    }

    /// Stamp the same read window on every operation.
    pub fn set_read_window(&mut self, timing: TraceTiming) {
        match self {
            Operations::Single(params) => params.read_window = Some(timing),
            Operations::Batch(batch) => {
                for params in batch {
                    params.read_window = Some(timing);
                }
            }
        }
    }
}
