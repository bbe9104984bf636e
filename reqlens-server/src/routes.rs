//! HTTP routing and request handlers
//!
//! Handlers work on plain [`ApiRequest`] values so they can be exercised
//! without a socket; `server.rs` adapts `tiny_http` requests to them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tiny_http::Method;
use tracing::{error, info, warn};

use reqlens_core::{
    extract_text, sanitize_filename, AnalyzeError, Analyzer, ClassifiedRequirement,
    RequirementStats, RequirementStatus, RequirementStore,
};

use crate::error::ApiError;
use crate::upload;

/// Paths the service answers on, used to tell 404 from 405
const ROUTES: [&str; 7] = [
    "/upload",
    "/analyze",
    "/stats",
    "/update_status",
    "/classify",
    "/requirements",
    "/health",
];

/// Shared state handed to every handler
#[derive(Debug)]
pub struct AppState {
    pub analyzer: Analyzer,
    pub store: RequirementStore,
    pub upload_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(analyzer: Analyzer, upload_dir: PathBuf) -> Self {
        Self {
            analyzer,
            store: RequirementStore::new(),
            upload_dir,
            started_at: Utc::now(),
        }
    }
}

/// A fully-read HTTP request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path without the query string
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// A response ready to be written back
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Serialized JSON, or `None` for an empty body
    pub body: Option<Vec<u8>>,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                body: Some(body),
            },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self::from(ApiError::internal("Internal server error"))
            }
        }
    }

    pub fn ok<T: Serialize>(value: &T) -> Self {
        Self::json(200, value)
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        match serde_json::to_vec(&err.body()) {
            Ok(body) => Self {
                status,
                body: Some(body),
            },
            Err(_) => Self { status, body: None },
        }
    }
}

type HandlerResult = Result<ApiResponse, ApiError>;

/// Route a request to its handler and turn any error into a JSON response
pub fn dispatch(state: &AppState, request: &ApiRequest) -> ApiResponse {
    if matches!(request.method, Method::Options) {
        return ApiResponse::no_content();
    }

    let result = match (&request.method, request.path.as_str()) {
        (Method::Post, "/upload") => upload_file(state, request),
        (Method::Post, "/analyze") => analyze_file(state, request),
        (Method::Get, "/stats") => get_stats(state),
        (Method::Post, "/update_status") => update_status(state, request),
        (Method::Post, "/classify") => classify_requirement(state, request),
        (Method::Get, "/requirements") => list_requirements(state),
        (Method::Get, "/health") => health(state),
        (_, path) if ROUTES.contains(&path) => Err(ApiError::MethodNotAllowed),
        _ => Err(ApiError::not_found("Not found")),
    };

    result.unwrap_or_else(ApiResponse::from)
}

/// Parse a JSON body, treating anything unparseable as an empty request
fn json_body<T: DeserializeOwned + Default>(request: &ApiRequest) -> T {
    if request.body.is_empty() {
        return T::default();
    }

    serde_json::from_slice(&request.body).unwrap_or_else(|e| {
        warn!("Ignoring unparseable JSON body on {}: {}", request.path, e);
        T::default()
    })
}

/// Trimmed, non-empty string field
fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: &'static str,
    filename: String,
}

fn upload_file(state: &AppState, request: &ApiRequest) -> HandlerResult {
    let file = upload::read_file_field(request.content_type.as_deref(), &request.body)
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    if file.filename.trim().is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }

    let filename = sanitize_filename(&file.filename);
    if filename.is_empty() {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let path = state.upload_dir.join(&filename);
    fs::write(&path, &file.data).map_err(|e| {
        error!("Error saving upload to {:?}: {}", path, e);
        ApiError::internal("Internal server error")
    })?;
    info!(bytes = file.data.len(), "File uploaded: {}", filename);

    Ok(ApiResponse::ok(&UploadResponse {
        message: "File uploaded successfully",
        filename,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeRequest {
    filename: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    requirements: Vec<ClassifiedRequirement>,
    #[serde(flatten)]
    stats: RequirementStats,
}

fn analyze_file(state: &AppState, request: &ApiRequest) -> HandlerResult {
    let body: AnalyzeRequest = json_body(request);
    let filename =
        required(body.filename).ok_or_else(|| ApiError::bad_request("Filename not provided"))?;

    // Stored names are always sanitized, so anything else cannot exist
    let stored = sanitize_filename(&filename);
    let path = state.upload_dir.join(&stored);
    if stored.is_empty() || !path.is_file() {
        return Err(ApiError::not_found("File not found"));
    }

    let text = match extract_text(&path) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            error!("No text extracted from {:?}", path);
            return Err(ApiError::internal("No valid text found in the file"));
        }
        Err(e) => {
            error!("Error extracting text from file: {}", e);
            return Err(ApiError::internal("No valid text found in the file"));
        }
    };

    info!("Analyzing {} ({} characters)", stored, text.len());
    let requirements = state.analyzer.analyze_text(&text);
    let stats = state.store.replace_all(requirements.clone());

    Ok(ApiResponse::ok(&AnalyzeResponse {
        requirements,
        stats,
    }))
}

fn get_stats(state: &AppState) -> HandlerResult {
    Ok(ApiResponse::ok(&state.store.stats()))
}

#[derive(Debug, Default, Deserialize)]
struct UpdateStatusRequest {
    id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateStatusResponse {
    message: &'static str,
    #[serde(flatten)]
    stats: RequirementStats,
}

fn update_status(state: &AppState, request: &ApiRequest) -> HandlerResult {
    let body: UpdateStatusRequest = json_body(request);
    info!("Received status update: {:?}", body);

    let (id, status) = match (required(body.id), required(body.status)) {
        (Some(id), Some(status)) => (id, status),
        _ => {
            error!("Missing requirement ID or status in request");
            return Err(ApiError::bad_request("Missing requirement ID or status"));
        }
    };

    let stats = state
        .store
        .update_status(&id, RequirementStatus::parse(&status))
        .ok_or_else(|| ApiError::not_found("Requirement not found"))?;

    Ok(ApiResponse::ok(&UpdateStatusResponse {
        message: "Status updated successfully",
        stats,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ClassifyRequest {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    category: String,
}

fn classify_requirement(state: &AppState, request: &ApiRequest) -> HandlerResult {
    let body: ClassifyRequest = json_body(request);
    let text = required(body.text).ok_or_else(|| {
        error!("Requirement text not provided in request");
        ApiError::bad_request("Requirement text not provided")
    })?;

    let requirement = match state.analyzer.classify_text(&text) {
        Ok(requirement) => requirement,
        Err(AnalyzeError::EmptyText) => {
            return Err(ApiError::bad_request("Requirement text not provided"));
        }
        Err(e) => {
            error!("Error during classification: {}", e);
            return Err(ApiError::internal("Classification failed"));
        }
    };

    let category = requirement.categories.clone();
    state.store.push(requirement);

    Ok(ApiResponse::ok(&ClassifyResponse { category }))
}

#[derive(Debug, Serialize)]
struct RequirementsResponse {
    requirements: Vec<ClassifiedRequirement>,
}

fn list_requirements(state: &AppState) -> HandlerResult {
    Ok(ApiResponse::ok(&RequirementsResponse {
        requirements: state.store.list(),
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    classifier: String,
    requirements: usize,
    started_at: DateTime<Utc>,
}

fn health(state: &AppState) -> HandlerResult {
    Ok(ApiResponse::ok(&HealthResponse {
        status: "ok",
        classifier: state.analyzer.classifier_description(),
        requirements: state.store.len(),
        started_at: state.started_at,
    }))
}
