//! Scoped ownership of spooled upload files.
//!
//! Every temporary file created for a request is registered with one
//! `SpoolGuard`. Dropping the guard removes them all, whichever way the
//! request ends: success, early error return, or unwinding panic. Read
//! handles that are still open keep working on platforms that allow
//! unlinking open files.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

const SPOOL_PREFIX: &str = "gql-upload-";

#[derive(Debug)]
pub struct SpoolGuard {
    dir: PathBuf,
    files: Vec<TempPath>,
}

impl SpoolGuard {
    /// A guard creating its files under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
        }
    }

    /// Create an empty spool file open for writing.
    pub fn create(&mut self) -> io::Result<(tokio::fs::File, PathBuf)> {
        let (file, path) = tempfile::Builder::new()
            .prefix(SPOOL_PREFIX)
            .tempfile_in(&self.dir)?
            .into_parts();
        let location = path.to_path_buf();
        self.files.push(path);
        Ok((tokio::fs::File::from_std(file), location))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of files currently owned.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Drop for SpoolGuard {
    fn drop(&mut self) {
        for path in self.files.drain(..) {
            let location = path.to_path_buf();
            if let Err(e) = path.close() {
                tracing::warn!(path = %location.display(), error = %e, "Failed to remove spooled upload");
            }
        }
    }
}
