//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures_util::future::join_all;
use serde_json::{json, Value};
use tower::ServiceExt;

use gql_transport::config::ServiceConfig;
use gql_transport::graphql::{
    ErrorList, GraphExecutor, GraphResponse, OperationContext, ParameterBundle, StaticExecutor,
};
use gql_transport::http::HttpServer;
use gql_transport::observability::tracing::TraceContext;

pub const BOUNDARY: &str = "----gqltestboundary";

/// Executor used by the tests: the static table plus a record of every call.
///
/// Uploads are read concurrently at dispatch time and echoed back in the
/// response under `uploads`, keyed by destination path.
#[derive(Default)]
pub struct RecordingExecutor {
    inner: StaticExecutor,
    contexts: AtomicUsize,
    dispatches: AtomicUsize,
    watch_dir: Option<PathBuf>,
    files_seen: Mutex<Vec<usize>>,
    read_windows: Mutex<Vec<Option<bool>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            inner: StaticExecutor::from_pairs([("name", json!("test")), ("count", json!(3))]),
            ..Self::default()
        }
    }

    /// Also record how many files `dir` holds while each operation runs.
    pub fn watching(dir: &Path) -> Self {
        Self {
            watch_dir: Some(dir.to_path_buf()),
            ..Self::new()
        }
    }

    pub fn contexts(&self) -> usize {
        self.contexts.load(Ordering::SeqCst)
    }

    pub fn dispatches(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }

    pub fn files_seen(&self) -> Vec<usize> {
        self.files_seen.lock().unwrap().clone()
    }

    /// Per operation: `None` without a read window, else whether it is ordered.
    pub fn read_windows(&self) -> Vec<Option<bool>> {
        self.read_windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphExecutor for RecordingExecutor {
    fn create_operation_context(
        &self,
        trace: &TraceContext,
        params: ParameterBundle,
    ) -> Result<OperationContext, ErrorList> {
        self.contexts.fetch_add(1, Ordering::SeqCst);
        self.read_windows
            .lock()
            .unwrap()
            .push(params.read_window.map(|w| w.start <= w.end));
        self.inner.create_operation_context(trace, params)
    }

    async fn dispatch_operation(
        &self,
        trace: &TraceContext,
        mut operation: OperationContext,
    ) -> GraphResponse {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        if let Some(dir) = &self.watch_dir {
            self.files_seen.lock().unwrap().push(count_files(dir));
        }

        let reads = operation.params.uploads.iter_mut().map(|upload| async move {
            let content = upload.read_to_end().await.unwrap();
            (
                upload.destination_path.clone(),
                json!({
                    "filename": upload.filename,
                    "content_type": upload.content_type,
                    "size": upload.size,
                    "content": String::from_utf8_lossy(&content),
                }),
            )
        });
        let uploads: serde_json::Map<String, Value> = join_all(reads).await.into_iter().collect();

        let mut response = self.inner.dispatch_operation(trace, operation).await;
        if !uploads.is_empty() {
            if let Some(Value::Object(data)) = response.data.as_mut() {
                data.insert("uploads".to_string(), Value::Object(uploads));
            }
        }
        response
    }

    fn dispatch_error(&self, trace: &TraceContext, errors: ErrorList) -> GraphResponse {
        self.inner.dispatch_error(trace, errors)
    }
}

/// Executor whose dispatch always panics.
pub struct PanickingExecutor(StaticExecutor);

impl PanickingExecutor {
    pub fn new() -> Self {
        Self(StaticExecutor::from_pairs([("name", json!("test"))]))
    }
}

#[async_trait]
impl GraphExecutor for PanickingExecutor {
    fn create_operation_context(
        &self,
        trace: &TraceContext,
        params: ParameterBundle,
    ) -> Result<OperationContext, ErrorList> {
        self.0.create_operation_context(trace, params)
    }

    async fn dispatch_operation(&self, _trace: &TraceContext, _op: OperationContext) -> GraphResponse {
        panic!("resolver exploded");
    }

    fn dispatch_error(&self, trace: &TraceContext, errors: ErrorList) -> GraphResponse {
        self.0.dispatch_error(trace, errors)
    }
}

/// Executor whose dispatch sleeps past any test timeout.
pub struct StallingExecutor(StaticExecutor);

impl StallingExecutor {
    pub fn new() -> Self {
        Self(StaticExecutor::from_pairs([("name", json!("test"))]))
    }
}

#[async_trait]
impl GraphExecutor for StallingExecutor {
    fn create_operation_context(
        &self,
        trace: &TraceContext,
        params: ParameterBundle,
    ) -> Result<OperationContext, ErrorList> {
        self.0.create_operation_context(trace, params)
    }

    async fn dispatch_operation(&self, trace: &TraceContext, op: OperationContext) -> GraphResponse {
        tokio::time::sleep(Duration::from_secs(30)).await;
        self.0.dispatch_operation(trace, op).await
    }

    fn dispatch_error(&self, trace: &TraceContext, errors: ErrorList) -> GraphResponse {
        self.0.dispatch_error(trace, errors)
    }
}

pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

pub fn router(config: ServiceConfig, executor: Arc<dyn GraphExecutor>) -> Router {
    HttpServer::new(config, executor).router()
}

/// Send one request through the router and decode the JSON body.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).map(|v| v.to_str().unwrap()),
        Some("application/json"),
        "every response is JSON"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

/// Send one request and return the raw body text.
pub async fn send_raw(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Builder for `multipart/form-data` bodies.
#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(content);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.buf
    }

    /// POST request carrying this body, with a declared `Content-Length`.
    pub fn request(self, uri: &str) -> Request<Body> {
        let body = self.finish();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    /// POST request without `Content-Length`.
    pub fn request_undeclared(self, uri: &str) -> Request<Body> {
        let body = self.finish();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }
}
