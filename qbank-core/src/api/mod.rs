//! HTTP client for the content-generation backend.
//!
//! One async method per endpoint, JSON POST unless noted. Errors follow the
//! session's recovery model: every failure is surfaced to the caller and
//! retrying the user action is always safe. There is no retry or backoff
//! here, and no cancellation beyond the client timeout.
#![cfg(feature = "api-client")]

use crate::model::{CourseStructure, ExamFormat, Lesson, Question};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Errors from backend communication
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The configured base URL does not parse
    InvalidBaseUrl(String),
    /// Transport-level failure (connect, timeout, ...)
    Http(String),
    /// The backend answered with a non-success status
    Status { status: u16, body: String },
    /// The response body was not the expected JSON shape
    Decode(String),
    /// A local file for a multipart upload could not be read
    Io(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidBaseUrl(msg) => write!(f, "Invalid API base URL: {msg}"),
            ApiError::Http(msg) => write!(f, "Request failed: {msg}"),
            ApiError::Status { status, body } => {
                write!(f, "Backend returned HTTP {status}: {body}")
            }
            ApiError::Decode(msg) => write!(f, "Could not decode backend response: {msg}"),
            ApiError::Io(msg) => write!(f, "Could not read attachment: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

/// Request body for `/api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub course: String,
    pub subject: String,
    pub topics: Vec<String>,
    pub num_questions: u32,
    pub include_images: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_format: Option<ExamFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub image_stats: Option<serde_json::Value>,
}

/// Request body for `/api/generate-lessons`.
#[derive(Debug, Clone, Serialize)]
pub struct LessonRequest {
    pub course: String,
    pub uploaded_json: CourseStructure,
    pub generate_all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_subject_idx: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_topic_indices: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_chapters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonResponse {
    pub course: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddImageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
}

/// Parameters for the multipart `/api/refine-structure` call.
#[derive(Debug, Clone)]
pub struct RefineRequest {
    pub course: String,
    pub message: String,
    pub current_structure: CourseStructure,
    pub reference_doc: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefineResponse {
    /// The assistant's conversational reply
    pub response: String,
    #[serde(default)]
    pub updated_structure: Option<CourseStructure>,
}

/// Request body for `/api/validate-content`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateRequest {
    pub content_type: String,
    pub items: Vec<serde_json::Value>,
    pub domain: String,
    pub course: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub results: Vec<ItemValidation>,
    #[serde(default)]
    pub summary: Option<ValidationSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemValidation {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationSummary {
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub passed: Option<usize>,
    #[serde(default)]
    pub failed: Option<usize>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Typed client over the backend endpoints.
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<ApiClient, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Ok(ApiClient { base, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("POST {url}");
        let response = self.http.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: snippet(&text),
            });
        }
        serde_json::from_str(extract_json_payload(&text))
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /api/generate-subjects`
    pub async fn generate_subjects(&self, course: &str) -> Result<CourseStructure, ApiError> {
        self.post_json(
            "/api/generate-subjects",
            &serde_json::json!({ "course": course }),
        )
        .await
    }

    /// `POST /api/generate`
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        self.post_json("/api/generate", request).await
    }

    /// `POST /api/generate-lessons`
    pub async fn generate_lessons(
        &self,
        request: &LessonRequest,
    ) -> Result<LessonResponse, ApiError> {
        self.post_json("/api/generate-lessons", request).await
    }

    /// `POST /api/add-image`
    pub async fn add_images(
        &self,
        questions: &[Question],
        course: &str,
    ) -> Result<AddImageResponse, ApiError> {
        self.post_json(
            "/api/add-image",
            &serde_json::json!({ "questions": questions, "course": course }),
        )
        .await
    }

    /// `POST /api/refine-structure` (multipart)
    pub async fn refine_structure(
        &self,
        request: &RefineRequest,
    ) -> Result<RefineResponse, ApiError> {
        let url = self.endpoint("/api/refine-structure")?;
        let structure_json = serde_json::to_string(&request.current_structure)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let mut form = reqwest::multipart::Form::new()
            .text("course", request.course.clone())
            .text("message", request.message.clone())
            .text("current_structure", structure_json);
        if let Some(path) = &request.reference_doc {
            let bytes = std::fs::read(path).map_err(|e| ApiError::Io(e.to_string()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "reference".to_string());
            form = form.part(
                "reference_doc",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );
        }
        debug!("POST {url} (multipart)");
        let response = self.http.post(url).multipart(form).send().await?;
        Self::decode(response).await
    }

    /// `POST /api/validate-content`
    pub async fn validate_content(
        &self,
        request: &ValidateRequest,
    ) -> Result<ValidationReport, ApiError> {
        self.post_json("/api/validate-content", request).await
    }
}

/// Strip a Markdown code fence around an AI-shaped JSON payload.
///
/// Generation backends occasionally relay the model's output verbatim, which
/// wraps the JSON in ``` or ```json fences.
pub fn extract_json_payload(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

fn snippet(text: &str) -> String {
    const MAX: usize = 300;
    let trimmed = text.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut cut = MAX;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &trimmed[..cut])
    }
}
