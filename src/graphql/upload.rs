//! Uploaded files bound to positions inside `variables`.

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// A readable, seekable upload body.
///
/// Implemented for in-memory cursors and on-disk files alike.
pub trait UploadStream: AsyncRead + AsyncSeek + Send + Sync + Unpin {}

impl<T> UploadStream for T where T: AsyncRead + AsyncSeek + Send + Sync + Unpin {}

/// One uploaded file attached to one destination path.
pub struct UploadBinding {
    /// Form field the file arrived in.
    pub source_key: String,
    /// Dot/index path inside the operations document (`variables.files.0`).
    pub destination_path: String,
    pub file: Box<dyn UploadStream>,
    pub size: u64,
    pub filename: String,
    pub content_type: String,
}

impl UploadBinding {
    /// Read the whole upload from its start.
    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        self.file.rewind().await?;
        let mut buf = Vec::new();
        self.file.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl fmt::Debug for UploadBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadBinding")
            .field("source_key", &self.source_key)
            .field("destination_path", &self.destination_path)
            .field("size", &self.size)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
