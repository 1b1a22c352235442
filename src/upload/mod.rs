//! Multipart upload handling: form reading, disk spooling, and attaching
//! files to operation variables.

pub mod decoder;
pub mod form;
pub mod spool;

pub use decoder::{DecodedUploads, MultipartUploadDecoder};
pub use spool::SpoolGuard;
