//! GraphQL HTTP transport layer.
//!
//! Accepts GraphQL operations over HTTP, decodes them into a uniform
//! parameter bundle and hands them to a pluggable executor.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request boundary, panic recovery)
//!                          │
//!                          ▼
//!                     transport::TransportRegistry (first match wins)
//!                          │
//!          ┌───────────┬───┴────────┬──────────────┐
//!          ▼           ▼            ▼              ▼
//!       options       get          post        multipart ──▶ upload (form, spool, decoder)
//!                      │            │              │
//!                      └────────────┴──────┬───────┘
//!                                          ▼
//!                               graphql::ParameterBundle
//!                                          │
//!                                          ▼
//!                               graphql::GraphExecutor
//!                                          │
//!     Client Response                      ▼
//!     ◀────────────── http::response (JSON envelope, status from transport::status)
//!
//!     Cross-cutting: config, observability, security (limits), lifecycle
//! ```

// Core subsystems
pub mod config;
pub mod graphql;
pub mod http;
pub mod transport;
pub mod upload;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ServiceConfig;
pub use graphql::{GraphExecutor, StaticExecutor};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use transport::{Transport, TransportRegistry};
