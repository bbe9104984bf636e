//! Blocking HTTP server built on `tiny_http`
//!
//! A fixed pool of worker threads pulls requests off one listener and runs
//! each handler to completion on its own thread.

use anyhow::{Context, Result};
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{error, info, warn};

use reqlens_core::ServerConfig;

use crate::error::ApiError;
use crate::routes::{self, ApiRequest, ApiResponse, AppState};

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Bind the listener and serve until the process exits
pub fn run(state: Arc<AppState>, config: &ServerConfig) -> Result<()> {
    let address = config.bind_address();
    let server = Server::http(&address)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Failed to bind HTTP server on {}", address))?;
    let server = Arc::new(server);

    info!(workers = config.workers, "Listening on http://{}", address);

    let mut handles = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let server = Arc::clone(&server);
        let state = Arc::clone(&state);
        let max_body_bytes = config.max_body_bytes;

        let handle = thread::Builder::new()
            .name(format!("reqlens-worker-{}", worker))
            .spawn(move || worker_loop(&server, &state, max_body_bytes))
            .with_context(|| format!("Failed to spawn worker thread {}", worker))?;
        handles.push(handle);
    }

    for handle in handles {
        if handle.join().is_err() {
            error!("Worker thread panicked");
        }
    }

    Ok(())
}

fn worker_loop(server: &Server, state: &AppState, max_body_bytes: u64) {
    loop {
        match server.recv() {
            Ok(request) => handle_request(state, request, max_body_bytes),
            Err(e) => {
                error!("Failed to receive request: {}", e);
                break;
            }
        }
    }
}

fn handle_request(state: &AppState, mut request: Request, max_body_bytes: u64) {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request_path(request.url());

    let response = respond_to(state, &mut request, max_body_bytes);

    let status = response.status;
    if let Err(e) = request.respond(to_http_response(response)) {
        warn!("Failed to write response for {} {}: {}", method, path, e);
    }

    info!(
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{} {}",
        method,
        path
    );
}

/// Read one request and route it; a panicking handler becomes a 500
fn respond_to(state: &AppState, request: &mut Request, max_body_bytes: u64) -> ApiResponse {
    let body = match read_body(request, max_body_bytes) {
        Ok(body) => body,
        Err(err) => return ApiResponse::from(err),
    };
    let api_request = ApiRequest {
        method: request.method().clone(),
        path: request_path(request.url()),
        content_type: request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Content-Type"))
            .map(|h| h.value.as_str().to_string()),
        body,
    };

    panic::catch_unwind(AssertUnwindSafe(|| routes::dispatch(state, &api_request)))
        .unwrap_or_else(|_| {
            error!(
                "Handler panicked on {} {}",
                api_request.method, api_request.path
            );
            ApiResponse::from(ApiError::internal("Internal server error"))
        })
}

fn request_path(url: &str) -> String {
    url.split('?').next().unwrap_or("/").to_string()
}

fn read_body(request: &mut Request, max_body_bytes: u64) -> Result<Vec<u8>, ApiError> {
    if let Some(length) = request.body_length() {
        if length as u64 > max_body_bytes {
            return Err(ApiError::PayloadTooLarge);
        }
    }

    let mut body = Vec::new();
    request
        .as_reader()
        .take(max_body_bytes + 1)
        .read_to_end(&mut body)
        .map_err(|e| {
            warn!("Failed to read request body: {}", e);
            ApiError::bad_request("Could not read request body")
        })?;

    if body.len() as u64 > max_body_bytes {
        return Err(ApiError::PayloadTooLarge);
    }

    Ok(body)
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn to_http_response(response: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let has_body = response.body.is_some();
    let mut http = Response::from_data(response.body.unwrap_or_default())
        .with_status_code(StatusCode(response.status));

    if has_body {
        if let Some(h) = header("Content-Type", "application/json") {
            http.add_header(h);
        }
    }
    for (name, value) in CORS_HEADERS {
        if let Some(h) = header(name, value) {
            http.add_header(h);
        }
    }

    http
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqlens_core::{
        Analyzer, AnalyzerSettings, Classification, ClassifierError, SentenceSegmenter,
        ZeroShotClassifier,
    };
    use serde_json::Value;
    use tempfile::{tempdir, TempDir};
    use tiny_http::{Method, TestRequest};

    /// Classifier that blows up, standing in for a bug deep inside a handler
    struct PanickingClassifier;

    impl ZeroShotClassifier for PanickingClassifier {
        fn classify(
            &self,
            _text: &str,
            _labels: &[&str],
            _hypothesis_template: &str,
        ) -> Result<Classification, ClassifierError> {
            panic!("model state corrupted");
        }

        fn describe(&self) -> String {
            "Panicking".to_string()
        }
    }

    fn test_state() -> (AppState, TempDir) {
        let dir = tempdir().unwrap();
        let analyzer = Analyzer::new(
            Arc::new(PanickingClassifier),
            SentenceSegmenter::new(),
            AnalyzerSettings::default(),
        );
        (AppState::new(analyzer, dir.path().to_path_buf()), dir)
    }

    fn post(path: &str, body: &'static str) -> Request {
        TestRequest::new()
            .with_method(Method::Post)
            .with_path(path)
            .with_header(header("Content-Type", "application/json").unwrap())
            .with_body(body)
            .into()
    }

    fn header_value(response: &Response<Cursor<Vec<u8>>>, name: &'static str) -> Option<String> {
        response
            .headers()
            .iter()
            .find(|h| h.field.equiv(name))
            .map(|h| h.value.as_str().to_string())
    }

    #[test]
    fn test_read_body_rejects_oversize_body() {
        let mut request = post("/classify", "0123456789abcdefX");
        let result = read_body(&mut request, 16);
        assert!(matches!(result, Err(ApiError::PayloadTooLarge)));
    }

    #[test]
    fn test_read_body_accepts_body_at_limit() {
        let mut request = post("/classify", "0123456789abcdef");
        let body = read_body(&mut request, 16).unwrap();
        assert_eq!(body, b"0123456789abcdef");
    }

    #[test]
    fn test_respond_to_oversize_body_is_413() {
        let (state, _dir) = test_state();
        let mut request = post("/classify", r#"{"text": "Users can log in with email"}"#);

        let response = respond_to(&state, &mut request, 8);
        assert_eq!(response.status, 413);
        let body: Value = serde_json::from_slice(response.body.as_deref().unwrap()).unwrap();
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_respond_to_strips_query_string() {
        let (state, _dir) = test_state();
        let mut request: Request = TestRequest::new()
            .with_method(Method::Get)
            .with_path("/stats?refresh=1")
            .into();

        let response = respond_to(&state, &mut request, 1024);
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_handler_panic_becomes_500_and_worker_survives() {
        let (state, _dir) = test_state();
        let mut request = post("/classify", r#"{"text": "Users can log in with email"}"#);

        let response = respond_to(&state, &mut request, 1024);
        assert_eq!(response.status, 500);
        let body: Value = serde_json::from_slice(response.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["error"], "Internal server error");

        let mut request: Request = TestRequest::new()
            .with_method(Method::Get)
            .with_path("/health")
            .into();
        assert_eq!(respond_to(&state, &mut request, 1024).status, 200);
    }

    #[test]
    fn test_json_response_headers() {
        let http = to_http_response(ApiResponse::ok(&serde_json::json!({"total": 0})));

        assert_eq!(http.status_code().0, 200);
        assert_eq!(
            header_value(&http, "Content-Type").as_deref(),
            Some("application/json")
        );
        assert_eq!(
            header_value(&http, "Access-Control-Allow-Origin").as_deref(),
            Some("*")
        );
        assert_eq!(
            header_value(&http, "Access-Control-Allow-Methods").as_deref(),
            Some("GET, POST, OPTIONS")
        );
    }

    #[test]
    fn test_no_content_response_headers() {
        let http = to_http_response(ApiResponse::no_content());

        assert_eq!(http.status_code().0, 204);
        assert!(header_value(&http, "Content-Type").is_none());
        assert_eq!(
            header_value(&http, "Access-Control-Allow-Origin").as_deref(),
            Some("*")
        );
        assert_eq!(
            header_value(&http, "Access-Control-Allow-Headers").as_deref(),
            Some("Content-Type")
        );
    }
}
