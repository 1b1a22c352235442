//! Operation trace windows.
//!
//! # Responsibilities
//! - Open a trace window when a request enters the service
//! - Record the read window that brackets parameter decoding
//! - Carry the request ID into executor calls
//!
//! # Design Decisions
//! - Monotonic clock (`Instant`) so windows never run backwards
//! - Windows are plain values; nothing here allocates spans

use std::time::{Duration, Instant};

/// Start/end pair bracketing a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceTiming {
    pub start: Instant,
    pub end: Instant,
}

impl TraceTiming {
    /// Time spent inside the window.
    pub fn duration(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }
}

/// Per-request trace context handed to the executor.
#[derive(Debug, Clone)]
pub struct TraceContext {
    request_id: String,
    started_at: Instant,
}

impl TraceContext {
    /// Open the trace window for a request.
    pub fn start(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            started_at: Instant::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time elapsed since the window opened.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
