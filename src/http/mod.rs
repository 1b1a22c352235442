//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request boundary)
//!     → request.rs (request ID)
//!     → [transport registry picks a transport]
//!     → response.rs (JSON envelope)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::json_response;
pub use server::{AppState, HttpServer};
