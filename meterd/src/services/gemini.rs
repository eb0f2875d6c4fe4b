//! Gemini vision API client
//!
//! Stages the meter photo with the Gemini File API (resumable upload), then
//! asks the model for the digits visible on the display. The fixed no-reading
//! sentence is a normal return value, not an error; callers branch on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Instruction sent with every extraction request
const EXTRACTION_PROMPT: &str = "Analise a imagem do medidor e responda somente com os d\u{ed}gitos exibidos no visor, sem espa\u{e7}os ou pontua\u{e7}\u{e3}o. Se n\u{e3}o for poss\u{ed}vel identificar o valor, responda exatamente: N\u{e3}o foi poss\u{ed}vel encontrar o valor da medi\u{e7}\u{e3}o";

/// Fixed model answer meaning the display could not be read
pub const NO_READING_SENTINEL: &str =
    "N\u{e3}o foi poss\u{ed}vel encontrar o valor da medi\u{e7}\u{e3}o";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extraction client errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Upload session returned no continuation URL")]
    MissingUploadUrl,

    #[error("Model returned no candidates")]
    EmptyResponse,

    #[error("Failed to read staged image: {0}")]
    Staging(#[from] std::io::Error),
}

/// Outcome of an extraction call
///
/// `reading` is `None` when the model answered with the fixed no-reading
/// sentence; `image_url` always references the hosted image.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub reading: Option<String>,
    pub image_url: String,
}

/// Seam between the upload workflow and the vision backend
#[async_trait]
pub trait MeterImageExtractor: Send + Sync {
    /// Upload the staged image and extract the displayed reading
    async fn extract(
        &self,
        image_path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<Extraction, ExtractionError>;
}

/// Gemini-backed extractor
pub struct GeminiExtractor {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiExtractor {
    pub fn new(api_key: String, model: String) -> Result<Self, ExtractionError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    /// Construct against an explicit endpoint (test servers, proxies)
    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
    ) -> Result<Self, ExtractionError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Two-step resumable upload to the Gemini File API
    async fn upload_file(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, ExtractionError> {
        let start_url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);

        let start_response = self
            .http_client
            .post(&start_url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: UploadFileMetadata { display_name },
            })
            .send()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        let status = start_response.status();
        if !status.is_success() {
            let error_text = start_response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api(status.as_u16(), error_text));
        }

        let upload_url = start_response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(ExtractionError::MissingUploadUrl)?;

        let finalize_response = self
            .http_client
            .post(&upload_url)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        let status = finalize_response.status();
        if !status.is_success() {
            let error_text = finalize_response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api(status.as_u16(), error_text));
        }

        let uploaded: FileUploadResponse = finalize_response
            .json()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        tracing::debug!(
            file = %uploaded.file.name,
            uri = %uploaded.file.uri,
            "Image uploaded to file API"
        );

        Ok(uploaded.file)
    }

    /// Ask the model for the reading on the uploaded image
    async fn generate_reading(
        &self,
        file: &UploadedFile,
        mime_type: &str,
    ) -> Result<String, ExtractionError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart {
                        text: None,
                        file_data: Some(FileData {
                            mime_type,
                            file_uri: &file.uri,
                        }),
                    },
                    RequestPart {
                        text: Some(EXTRACTION_PROMPT),
                        file_data: None,
                    },
                ],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api(status.as_u16(), error_text));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        first_candidate_text(&body).ok_or(ExtractionError::EmptyResponse)
    }
}

#[async_trait]
impl MeterImageExtractor for GeminiExtractor {
    async fn extract(
        &self,
        image_path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<Extraction, ExtractionError> {
        let bytes = tokio::fs::read(image_path).await?;

        let uploaded = self.upload_file(&bytes, mime_type, display_name).await?;
        let answer = self.generate_reading(&uploaded, mime_type).await?;

        let trimmed = answer.trim();
        let reading = if trimmed == NO_READING_SENTINEL {
            tracing::info!(display_name, "Model reported no readable value");
            None
        } else {
            Some(trimmed.to_string())
        };

        Ok(Extraction {
            reading,
            image_url: uploaded.uri,
        })
    }
}

/// Concatenated text of the first candidate, if any
fn first_candidate_text(response: &GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let content = candidate.content.as_ref()?;

    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Debug, Serialize)]
struct StartUploadRequest<'a> {
    file: UploadFileMetadata<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadFileMetadata<'a> {
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    name: String,
    uri: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}
