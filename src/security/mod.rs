//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (check declared request size)
//!     → Pass to the selected transport
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any limit violation
//! - No trust in client input

pub mod limits;
