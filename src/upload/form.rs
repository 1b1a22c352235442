//! Multipart form collection.
//!
//! # Responsibilities
//! - Read every part of a `multipart/form-data` body
//! - Keep text fields in memory, file parts in memory or on disk
//! - Enforce the total size ceiling while streaming
//!
//! # Design Decisions
//! - One memory budget for the whole form: once spent, further file
//!   bytes are spooled through the request's `SpoolGuard`. Text fields are
//!   never spooled; they are bounded by the total ceiling only
//! - The first part wins when a name repeats

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::path::PathBuf;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::graphql::upload::UploadStream;
use crate::upload::spool::SpoolGuard;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("failed to parse multipart form, request body too large")]
    TooLarge,
    #[error("failed to parse multipart form")]
    Malformed(#[source] MultipartError),
    #[error("failed to spool form file {name}")]
    Spool {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl From<MultipartError> for FormError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            FormError::TooLarge
        } else {
            FormError::Malformed(err)
        }
    }
}

/// Size limits applied while reading a form.
#[derive(Debug, Clone, Copy)]
pub struct FormLimits {
    /// Bytes of part content kept in memory before spooling.
    pub max_memory: u64,
    /// Bytes of part content accepted in total.
    pub max_total: u64,
}

#[derive(Debug)]
enum FormContent {
    Memory(Bytes),
    Disk(PathBuf),
}

/// A file part of the form.
#[derive(Debug)]
pub struct FormFile {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    content: FormContent,
}

impl FormFile {
    /// Open an independent read stream over the file's content.
    pub async fn open(&self) -> io::Result<Box<dyn UploadStream>> {
        match &self.content {
            FormContent::Memory(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            FormContent::Disk(path) => Ok(Box::new(tokio::fs::File::open(path).await?)),
        }
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self.content, FormContent::Disk(_))
    }
}

/// Parts of a fully read multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    values: HashMap<String, Bytes>,
    files: HashMap<String, FormFile>,
    total_bytes: u64,
}

/// Running byte counters for one form.
struct Budget {
    limits: FormLimits,
    memory_used: u64,
    total: u64,
}

impl Budget {
    fn consume(&mut self, len: usize) -> Result<(), FormError> {
        self.total += len as u64;
        if self.total > self.limits.max_total {
            return Err(FormError::TooLarge);
        }
        Ok(())
    }

    fn fits_in_memory(&self, len: usize) -> bool {
        self.memory_used + len as u64 <= self.limits.max_memory
    }
}

impl FormData {
    /// Read every part of `multipart`.
    ///
    /// Spooled file parts are registered with `spool` and live as long as it.
    pub async fn read(
        mut multipart: Multipart,
        limits: FormLimits,
        spool: &mut SpoolGuard,
    ) -> Result<Self, FormError> {
        let mut form = FormData::default();
        let mut budget = Budget {
            limits,
            memory_used: 0,
            total: 0,
        };

        while let Some(mut field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match field.file_name().map(str::to_owned) {
                None => {
                    let value = read_value(&mut field, &mut budget).await?;
                    form.values.entry(name).or_insert(value);
                }
                Some(filename) => {
                    let content_type = field.content_type().unwrap_or_default().to_owned();
                    let (content, size) = read_file(&mut field, &name, &mut budget, spool).await?;
                    if form.files.contains_key(&name) {
                        tracing::debug!(field = %name, "Ignoring repeated file part");
                        continue;
                    }
                    form.files.insert(
                        name,
                        FormFile {
                            filename,
                            content_type,
                            size,
                            content,
                        },
                    );
                }
            }
        }

        form.total_bytes = budget.total;
        Ok(form)
    }

    /// Raw bytes of a text field.
    pub fn value(&self, name: &str) -> Option<&[u8]> {
        self.values.get(name).map(Bytes::as_ref)
    }

    pub fn file(&self, name: &str) -> Option<&FormFile> {
        self.files.get(name)
    }

    /// Content bytes read across all parts.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

async fn read_value(field: &mut Field<'_>, budget: &mut Budget) -> Result<Bytes, FormError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        budget.consume(chunk.len())?;
        buf.extend_from_slice(&chunk);
    }
    // Text values always stay in memory but still spend the budget.
    budget.memory_used += buf.len() as u64;
    Ok(buf.freeze())
}

async fn read_file(
    field: &mut Field<'_>,
    name: &str,
    budget: &mut Budget,
    spool: &mut SpoolGuard,
) -> Result<(FormContent, u64), FormError> {
    let spool_err = |source: io::Error| FormError::Spool {
        name: name.to_string(),
        source,
    };

    let mut buf = BytesMut::new();
    let mut disk: Option<(tokio::fs::File, PathBuf)> = None;
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await? {
        budget.consume(chunk.len())?;
        size += chunk.len() as u64;

        if let Some((file, _)) = disk.as_mut() {
            file.write_all(&chunk).await.map_err(spool_err)?;
            continue;
        }
        if budget.fits_in_memory(buf.len() + chunk.len()) {
            buf.extend_from_slice(&chunk);
            continue;
        }

        let (mut file, path) = spool.create().map_err(spool_err)?;
        file.write_all(&buf).await.map_err(spool_err)?;
        file.write_all(&chunk).await.map_err(spool_err)?;
        buf.clear();
        disk = Some((file, path));
    }

    match disk {
        Some((mut file, path)) => {
            file.flush().await.map_err(spool_err)?;
            tracing::debug!(field = %name, size, path = %path.display(), "Form file spooled to disk");
            Ok((FormContent::Disk(path), size))
        }
        None => {
            budget.memory_used += buf.len() as u64;
            Ok((FormContent::Memory(buf.freeze()), size))
        }
    }
}
