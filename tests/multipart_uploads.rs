//! Multipart upload transport: attachment, storage strategies and cleanup.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tempfile::TempDir;

use gql_transport::config::ServiceConfig;

mod common;
use common::{
    count_files, router, send, MultipartBody, PanickingExecutor, RecordingExecutor, StallingExecutor,
};

const SINGLE_OPS: &str = r#"{"query":"mutation($file: Upload!) { name }","variables":{"file":null}}"#;
const MULTI_OPS: &str =
    r#"{"query":"mutation($a: Upload!, $b: Upload!) { name }","variables":{"a":null,"b":null}}"#;

fn config(dir: &TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.upload.temp_dir = Some(dir.path().to_path_buf());
    config
}

#[tokio::test]
async fn test_single_upload() {
    let dir = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::new());
    let app = router(config(&dir), executor.clone());

    let request = MultipartBody::new()
        .text("operations", SINGLE_OPS)
        .text("map", r#"{"0":["variables.file"]}"#)
        .file("0", "a.txt", b"hello")
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": {
            "name": "test",
            "uploads": {"variables.file": {
                "filename": "a.txt",
                "content_type": "text/plain",
                "size": 5,
                "content": "hello"
            }}
        }})
    );
    assert_eq!(executor.dispatches(), 1);
    assert_eq!(executor.read_windows(), vec![Some(true)]);
}

#[tokio::test]
async fn test_nested_and_list_destinations() {
    let dir = TempDir::new().unwrap();
    let app = router(config(&dir), Arc::new(RecordingExecutor::new()));

    let ops = r#"{"query":"mutation($input: In, $files: [Upload]) { name }","variables":{"input":{"doc":null},"files":[null,null]}}"#;
    let request = MultipartBody::new()
        .text("operations", ops)
        .text(
            "map",
            r#"{"0":["variables.input.doc"],"1":["variables.files.0"],"2":["variables.files.1"]}"#,
        )
        .file("0", "doc.txt", b"doc")
        .file("1", "x.txt", b"x")
        .file("2", "y.txt", b"y")
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let uploads = &body["data"]["uploads"];
    assert_eq!(uploads["variables.input.doc"]["content"], "doc");
    assert_eq!(uploads["variables.files.0"]["content"], "x");
    assert_eq!(uploads["variables.files.1"]["content"], "y");
}

#[tokio::test]
async fn test_one_file_many_paths_in_memory() {
    let dir = TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::watching(dir.path()));
    let app = router(config(&dir), executor.clone());

    let request = MultipartBody::new()
        .text("operations", MULTI_OPS)
        .text("map", r#"{"0":["variables.a","variables.b"]}"#)
        .file("0", "shared.txt", b"shared content")
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let uploads = &body["data"]["uploads"];
    assert_eq!(uploads["variables.a"]["content"], "shared content");
    assert_eq!(uploads["variables.b"]["content"], "shared content");
    assert_eq!(uploads["variables.a"]["content_type"], "text/plain");
    assert_eq!(uploads["variables.b"]["content_type"], "text/plain");
    // Nothing touched the disk.
    assert_eq!(executor.files_seen(), vec![0]);
}

#[tokio::test]
async fn test_one_file_many_paths_spooled() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.upload.max_memory = 16;
    let executor = Arc::new(RecordingExecutor::watching(dir.path()));
    let app = router(config, executor.clone());

    let content = "0123456789".repeat(10);
    let request = MultipartBody::new()
        .text("operations", MULTI_OPS)
        .text("map", r#"{"0":["variables.a","variables.b"]}"#)
        .file("0", "big.txt", content.as_bytes())
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let uploads = &body["data"]["uploads"];
    assert_eq!(uploads["variables.a"]["content"], content.as_str());
    assert_eq!(uploads["variables.b"]["content"], content.as_str());
    assert_eq!(uploads["variables.a"]["content_type"], "text/plain");
    assert_eq!(uploads["variables.b"]["content_type"], "text/plain");

    // Spooled files existed while the operation ran and are gone afterwards.
    let seen = executor.files_seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0] >= 1);
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_spooled_files_removed_on_failure() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.upload.max_memory = 16;
    let executor = Arc::new(RecordingExecutor::new());
    let app = router(config, executor.clone());

    let content = "x".repeat(200);
    let request = MultipartBody::new()
        .text("operations", MULTI_OPS)
        .text("map", r#"{"0":["variables.a","variables.b"],"1":["variables.c"]}"#)
        .file("0", "big.txt", content.as_bytes())
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["message"], "failed to get key 1 from form");
    assert_eq!(count_files(dir.path()), 0);
    assert_eq!(executor.dispatches(), 0);
}

#[tokio::test]
async fn test_spooled_files_removed_after_panic() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.upload.max_memory = 16;
    let app = router(config, Arc::new(PanickingExecutor::new()));

    let content = "x".repeat(200);
    let request = MultipartBody::new()
        .text("operations", MULTI_OPS)
        .text("map", r#"{"0":["variables.a","variables.b"]}"#)
        .file("0", "big.txt", content.as_bytes())
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["message"], "internal system error");
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_spooled_files_removed_after_timeout() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.upload.max_memory = 16;
    config.timeouts.request_secs = 1;
    let app = router(config, Arc::new(StallingExecutor::new()));

    let content = "x".repeat(200);
    let request = MultipartBody::new()
        .text("operations", MULTI_OPS)
        .text("map", r#"{"0":["variables.a","variables.b"]}"#)
        .file("0", "big.txt", content.as_bytes())
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["errors"][0]["message"], "request timed out");
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_empty_path_list() {
    let dir = TempDir::new().unwrap();
    let expected =
        json!({"errors": [{"message": "invalid empty operations paths list for key 0"}], "data": null});

    // With and without a matching file part, and with a null entry: the
    // empty list is reported before the file is looked up.
    let cases = [
        (r#"{"0":[]}"#, true),
        (r#"{"0":[]}"#, false),
        (r#"{"0":null}"#, true),
        (r#"{"0":null}"#, false),
    ];
    for (map, with_file) in cases {
        let app = router(config(&dir), Arc::new(RecordingExecutor::new()));
        let mut body = MultipartBody::new().text("operations", SINGLE_OPS).text("map", map);
        if with_file {
            body = body.file("0", "a.txt", b"hello");
        }
        let (status, body) = send(app, body.request("/graphql")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "map {map}, file part {with_file}");
        assert_eq!(body, expected, "map {map}, file part {with_file}");
    }
}

#[tokio::test]
async fn test_missing_file_part() {
    let dir = TempDir::new().unwrap();
    let app = router(config(&dir), Arc::new(RecordingExecutor::new()));

    let request = MultipartBody::new()
        .text("operations", SINGLE_OPS)
        .text("map", r#"{"0":["variables.file"]}"#)
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["message"], "failed to get key 0 from form");
}

#[tokio::test]
async fn test_oversized_request_rejected_before_parsing() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.upload.max_upload_size = 64;
    config.upload.max_memory = 64;
    let executor = Arc::new(RecordingExecutor::new());
    let app = router(config, executor.clone());

    let request = MultipartBody::new()
        .text("operations", SINGLE_OPS)
        .text("map", r#"{"0":["variables.file"]}"#)
        .file("0", "a.txt", &[b'x'; 512])
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body["errors"][0]["message"],
        "failed to parse multipart form, request body too large"
    );
    assert_eq!(executor.contexts(), 0);
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_oversized_request_without_declared_length() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.upload.max_upload_size = 256;
    config.upload.max_memory = 16;
    let executor = Arc::new(RecordingExecutor::new());
    let app = router(config, executor.clone());

    let request = MultipartBody::new()
        .text("operations", SINGLE_OPS)
        .text("map", r#"{"0":["variables.file"]}"#)
        .file("0", "a.txt", &[b'x'; 4096])
        .request_undeclared("/graphql");
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(executor.contexts(), 0);
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_malformed_operations_and_map() {
    let dir = TempDir::new().unwrap();

    let cases = [
        ("{", r#"{"0":["variables.file"]}"#, "operations form field could not be decoded"),
        (SINGLE_OPS, "[1,2]", "map form field could not be decoded"),
        (SINGLE_OPS, r#"{"0":"variables.file"}"#, "map form field could not be decoded"),
    ];
    for (operations, map, message) in cases {
        let app = router(config(&dir), Arc::new(RecordingExecutor::new()));
        let request = MultipartBody::new()
            .text("operations", operations)
            .text("map", map)
            .file("0", "a.txt", b"hello")
            .request("/graphql");
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{message}");
        assert_eq!(body["errors"][0]["message"], message);
    }
}

#[tokio::test]
async fn test_missing_operations_field() {
    let dir = TempDir::new().unwrap();
    let app = router(config(&dir), Arc::new(RecordingExecutor::new()));

    let request = MultipartBody::new()
        .text("map", r#"{"0":["variables.file"]}"#)
        .file("0", "a.txt", b"hello")
        .request("/graphql");
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["message"], "operations form field could not be decoded");
}

#[tokio::test]
async fn test_unresolvable_destination_paths() {
    let dir = TempDir::new().unwrap();

    for path in ["file", "query.file", "variables.missing.file", "variables.list.5"] {
        let app = router(config(&dir), Arc::new(RecordingExecutor::new()));
        let ops = r#"{"query":"mutation { name }","variables":{"list":[null]}}"#;
        let request = MultipartBody::new()
            .text("operations", ops)
            .text("map", &format!(r#"{{"0":["{path}"]}}"#))
            .file("0", "a.txt", b"hello")
            .request("/graphql");
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{path}");
        assert!(body["errors"][0]["message"].as_str().unwrap().contains("key 0"), "{path}");
    }
}

#[tokio::test]
async fn test_missing_upload_fails_validation() {
    let dir = TempDir::new().unwrap();
    let app = router(config(&dir), Arc::new(RecordingExecutor::new()));

    // `variables.file` is declared non-null but nothing is mapped to it.
    let request = MultipartBody::new()
        .text("operations", SINGLE_OPS)
        .text("map", "{}")
        .request("/graphql");
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["message"], "must be defined");
    assert_eq!(body["errors"][0]["path"], json!(["variable", "file"]));
}

#[tokio::test]
async fn test_batch_operations() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.upload.allow_batch = true;
    let executor = Arc::new(RecordingExecutor::new());
    let app = router(config, executor.clone());

    let ops = format!("[{SINGLE_OPS},{SINGLE_OPS}]");
    let request = MultipartBody::new()
        .text("operations", &ops)
        .text("map", r#"{"0":["0.variables.file"],"1":["1.variables.file"]}"#)
        .file("0", "first.txt", b"first")
        .file("1", "second.txt", b"second")
        .request("/graphql");
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["data"]["uploads"]["variables.file"]["content"], "first");
    assert_eq!(body[1]["data"]["uploads"]["variables.file"]["content"], "second");
    assert_eq!(executor.dispatches(), 2);
    assert_eq!(executor.read_windows(), vec![Some(true), Some(true)]);
}

#[tokio::test]
async fn test_batch_rejected_when_disabled() {
    let dir = TempDir::new().unwrap();
    let app = router(config(&dir), Arc::new(RecordingExecutor::new()));

    let ops = format!("[{SINGLE_OPS}]");
    let request = MultipartBody::new()
        .text("operations", &ops)
        .text("map", r#"{"0":["0.variables.file"]}"#)
        .file("0", "a.txt", b"hello")
        .request("/graphql");
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["message"], "operations form field could not be decoded");
}
