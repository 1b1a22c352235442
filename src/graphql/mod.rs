//! GraphQL request model shared by transports and executors.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → params.rs (ParameterBundle from query args / JSON body / operations field)
//!     → upload.rs (UploadBinding attached at destination paths)
//!     → executor.rs (GraphExecutor builds and dispatches an OperationContext)
//!     → response.rs (GraphResponse envelope, errors from error.rs)
//! ```

pub mod error;
pub mod executor;
pub mod params;
pub mod response;
pub mod static_schema;
pub mod upload;

pub use error::{EngineErrorKind, ErrorList, GraphError};
pub use executor::{GraphExecutor, OperationContext, OperationKind};
pub use params::{AttachError, DecodeError, Operations, ParameterBundle};
pub use response::GraphResponse;
pub use static_schema::StaticExecutor;
pub use upload::{UploadBinding, UploadStream};
