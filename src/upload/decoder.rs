//! Multipart upload decoding.
//!
//! # Algorithm
//! ```text
//! 1. declared Content-Length > ceiling        → RequestTooLarge (form untouched)
//! 2. read form parts (memory budget, spool beyond it)
//! 3. `operations` → Operations                 → "operations form field could not be decoded"
//! 4. `map` → key → [destination path]          → "map form field could not be decoded"
//! 5. per key:
//!      empty path list                         → fatal, before any file lookup
//!      file part missing / unopenable          → fatal
//!      one path                                → attach the stream as is
//!      several paths, request < threshold      → one buffer, one cursor per path
//!      several paths, request >= threshold     → one spool file, one handle per path
//! 6. stamp the read window
//! ```
//!
//! # Design Decisions
//! - Storage strategy is chosen once per key from the whole request size
//! - Keys are processed in sorted order so the reported error is stable
//! - Spool files belong to the returned `SpoolGuard`; on any error the guard
//!   is dropped here and the files go with it

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::Request;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::UploadConfig;
use crate::graphql::params::Operations;
use crate::graphql::upload::{UploadBinding, UploadStream};
use crate::observability::metrics;
use crate::observability::tracing::{TraceContext, TraceTiming};
use crate::security::limits::check_content_length;
use crate::transport::TransportError;
use crate::upload::form::{FormData, FormError, FormFile, FormLimits};
use crate::upload::spool::SpoolGuard;

const REQUEST_TOO_LARGE: &str = "failed to parse multipart form, request body too large";

/// Storage strategy for a key with several destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Direct,
    Memory,
    Spool,
}

impl Strategy {
    fn as_str(self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Memory => "memory",
            Strategy::Spool => "spool",
        }
    }
}

/// Result of a successful decode.
///
/// `spool` must outlive every use of the upload streams in `operations`.
#[derive(Debug)]
pub struct DecodedUploads {
    pub operations: Operations,
    pub spool: SpoolGuard,
}

#[derive(Debug, Clone)]
pub struct MultipartUploadDecoder {
    max_upload_size: u64,
    max_memory: u64,
    temp_dir: PathBuf,
    allow_batch: bool,
}

impl MultipartUploadDecoder {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            max_upload_size: config.max_upload_size(),
            max_memory: config.max_memory(),
            temp_dir: config.temp_dir(),
            allow_batch: config.allow_batch,
        }
    }

    /// Decode a multipart request into operations with uploads attached.
    pub async fn decode(
        &self,
        request: Request<Body>,
        trace: &TraceContext,
    ) -> Result<DecodedUploads, TransportError> {
        let start = Instant::now();

        let declared = check_content_length(request.headers(), self.max_upload_size).map_err(|e| {
            tracing::warn!(request_id = %trace.request_id(), error = %e, "Multipart request rejected before parsing");
            TransportError::RequestTooLarge(REQUEST_TOO_LARGE)
        })?;

        let mut spool = SpoolGuard::new(&self.temp_dir);

        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| {
                tracing::debug!(request_id = %trace.request_id(), error = %e, "Multipart extraction rejected");
                TransportError::MultipartShape("failed to parse multipart form".into())
            })?;
        let form = FormData::read(
            multipart,
            FormLimits {
                max_memory: self.max_memory,
                max_total: self.max_upload_size,
            },
            &mut spool,
        )
        .await
        .map_err(|e| match e {
            FormError::TooLarge => TransportError::RequestTooLarge(REQUEST_TOO_LARGE),
            FormError::Malformed(_) => TransportError::MultipartShape(e.to_string()),
            FormError::Spool { .. } => TransportError::UploadUnavailable(e.to_string()),
        })?;

        let mut operations = form
            .value("operations")
            .and_then(|raw| Operations::decode(raw, self.allow_batch).ok())
            .ok_or_else(|| {
                TransportError::MultipartShape("operations form field could not be decoded".into())
            })?;

        // A null entry counts as an empty paths list.
        let map: BTreeMap<String, Option<Vec<String>>> = form
            .value("map")
            .and_then(|raw| serde_json::from_slice(raw).ok())
            .ok_or_else(|| TransportError::MultipartShape("map form field could not be decoded".into()))?;

        let total = declared.unwrap_or_else(|| form.total_bytes());

        for (key, paths) in map {
            let paths = paths.unwrap_or_default();
            if paths.is_empty() {
                return Err(TransportError::MultipartShape(format!(
                    "invalid empty operations paths list for key {key}"
                )));
            }

            let file = form
                .file(&key)
                .ok_or_else(|| TransportError::UploadUnavailable(format!("failed to get key {key} from form")))?;
            let stream = file.open().await.map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Failed to open form file");
                TransportError::UploadUnavailable(format!("failed to open file {}", file.filename))
            })?;

            let strategy = self.bind_key(&key, paths, file, stream, total, &mut operations, &mut spool).await?;
            tracing::debug!(
                request_id = %trace.request_id(),
                key = %key,
                filename = %file.filename,
                size = file.size,
                strategy = strategy.as_str(),
                "Upload attached"
            );
        }

        operations.set_read_window(TraceTiming {
            start,
            end: Instant::now(),
        });

        Ok(DecodedUploads { operations, spool })
    }

    /// Attach one form file to every destination path of its key.
    #[allow(clippy::too_many_arguments)]
    async fn bind_key(
        &self,
        key: &str,
        paths: Vec<String>,
        file: &FormFile,
        mut stream: Box<dyn UploadStream>,
        total: u64,
        operations: &mut Operations,
        spool: &mut SpoolGuard,
    ) -> Result<Strategy, TransportError> {
        let binding = |path: String, file_stream: Box<dyn UploadStream>| UploadBinding {
            source_key: key.to_string(),
            destination_path: path,
            file: file_stream,
            size: file.size,
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
        };

        if let [path] = paths.as_slice() {
            operations.add_upload(binding(path.clone(), stream))?;
            metrics::record_upload(Strategy::Direct.as_str());
            return Ok(Strategy::Direct);
        }

        if total < self.max_memory {
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Failed to buffer upload");
                TransportError::UploadUnavailable(format!("failed to read file for key {key}"))
            })?;
            let bytes = Bytes::from(buf);
            for path in paths {
                operations.add_upload(binding(path, Box::new(Cursor::new(bytes.clone()))))?;
                metrics::record_upload(Strategy::Memory.as_str());
            }
            return Ok(Strategy::Memory);
        }

        let (mut tmp, tmp_path) = spool.create().map_err(|e| {
            tracing::warn!(key = %key, dir = %spool.dir().display(), error = %e, "Failed to create spool file");
            TransportError::UploadUnavailable(format!("failed to create temp file for key {key}"))
        })?;
        tokio::io::copy(&mut stream, &mut tmp).await.map_err(|e| {
            tracing::warn!(key = %key, error = %e, "Failed to spool upload");
            TransportError::UploadUnavailable(format!("failed to copy to temp file for key {key}"))
        })?;
        tmp.flush()
            .await
            .map_err(|_| TransportError::UploadUnavailable(format!("failed to close temp file for key {key}")))?;
        drop(tmp);

        for path in paths {
            let handle = tokio::fs::File::open(&tmp_path)
                .await
                .map_err(|_| TransportError::UploadUnavailable(format!("failed to open temp file for key {key}")))?;
            operations.add_upload(binding(path, Box::new(handle)))?;
            metrics::record_upload(Strategy::Spool.as_str());
        }
        Ok(Strategy::Spool)
    }
}
