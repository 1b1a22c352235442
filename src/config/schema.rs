//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default upload ceiling and in-memory threshold (32 MiB).
pub const DEFAULT_UPLOAD_LIMIT: u64 = 32 << 20;

/// Root configuration for the GraphQL transport service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, endpoint path).
    pub listener: ListenerConfig,

    /// Multipart upload limits and spool location.
    pub upload: UploadConfig,

    /// Transport registry ordering.
    pub transports: TransportConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request body limits for non-multipart requests.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Value table served by the built-in static executor.
    pub schema: SchemaConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the GraphQL transports are mounted on.
    pub endpoint: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            endpoint: "/graphql".to_string(),
        }
    }
}

/// Multipart upload configuration.
///
/// A zero limit means "use the default" ([`DEFAULT_UPLOAD_LIMIT`]).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum total request bytes accepted before the multipart form is parsed.
    pub max_upload_size: u64,

    /// Requests smaller than this are buffered in memory; larger ones spool to disk.
    pub max_memory: u64,

    /// Directory for spooled uploads. Falls back to the OS temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Accept a JSON array of operations in the `operations` field.
    pub allow_batch: bool,
}

impl UploadConfig {
    /// Effective upload ceiling.
    pub fn max_upload_size(&self) -> u64 {
        if self.max_upload_size == 0 {
            DEFAULT_UPLOAD_LIMIT
        } else {
            self.max_upload_size
        }
    }

    /// Effective in-memory threshold.
    pub fn max_memory(&self) -> u64 {
        if self.max_memory == 0 {
            DEFAULT_UPLOAD_LIMIT
        } else {
            self.max_memory
        }
    }

    /// Directory spooled files are created in.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_UPLOAD_LIMIT,
            max_memory: DEFAULT_UPLOAD_LIMIT,
            temp_dir: None,
            allow_batch: false,
        }
    }
}

/// Names of the built-in HTTP transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Options,
    Get,
    Post,
    Multipart,
}

/// Transport registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Transports in evaluation order (first match wins).
    pub order: Vec<TransportKind>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            order: vec![
                TransportKind::Options,
                TransportKind::Get,
                TransportKind::Post,
                TransportKind::Multipart,
            ],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum JSON body size in bytes for POST requests.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Values resolved by the static executor, keyed by top-level field name.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SchemaConfig {
    pub fields: Map<String, Value>,
}
