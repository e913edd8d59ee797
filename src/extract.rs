//! Document text extraction.
//!
//! Two back ends: a local PDF parser and the LlamaParse service (needs its own
//! API key). Both produce one plain-text string, pages concatenated in order.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use lopdf::Document;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::KeyFromEnv;
use crate::error::ExtractionError;

/// Shown in place of the context when a document yields no text.
pub const NO_CONTENT_SENTINEL: &str = "No content extracted from the document.";

#[async_trait]
pub trait DocumentExtractor: Send + Sync + Debug {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Run an extractor and degrade any failure to an empty string.
pub async fn extract_or_empty(extractor: &dyn DocumentExtractor, bytes: &[u8]) -> String {
    match extractor.extract(bytes).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Extraction failed, continuing with empty context");
            String::new()
        }
    }
}

/// Local PDF text extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Extract every page's text in page order, with no separator added.
    /// Pages whose text cannot be decoded are skipped.
    #[instrument(target = "quiz_forge::extract", skip(bytes), fields(len = bytes.len()))]
    pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::Load(e.to_string()))?;
        let pages = doc.get_pages();
        let mut text = String::new();
        let mut failures = Vec::new();

        for &page_num in pages.keys() {
            match doc.extract_text(&[page_num]) {
                Ok(content) => text.push_str(&content),
                Err(e) => {
                    warn!(page = page_num, error = %e, "Skipping unreadable page");
                    failures.push(e.to_string());
                }
            }
        }

        if text.trim().is_empty() {
            return match failures.into_iter().next() {
                Some(first) => Err(ExtractionError::Text(first)),
                None => Err(ExtractionError::NoContent),
            };
        }

        info!(pages = pages.len(), chars = text.len(), "Extracted PDF text");
        Ok(text)
    }
}

#[async_trait]
impl DocumentExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Self::extract_text(bytes)
    }
}

const LLAMA_PARSE_BASE_URL: &str = "https://api.cloud.llamaindex.ai/api/v1/parsing";

#[derive(Debug, Clone)]
pub struct LlamaParseConfig {
    pub api_key: String,
    pub base_url: String,
    pub file_name: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
    /// Per HTTP call; the whole job is bounded by `max_polls`.
    pub request_timeout: Duration,
}

impl Default for LlamaParseConfig {
    fn default() -> Self {
        Self {
            api_key: LlamaParseExtractor::find_key().unwrap_or_default(),
            base_url: LLAMA_PARSE_BASE_URL.to_string(),
            file_name: "document.pdf".to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: 90,
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobInfo {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct TextResult {
    #[serde(default)]
    text: String,
}

#[derive(Debug, PartialEq, Eq)]
enum JobState {
    Done,
    Waiting,
    Failed,
}

fn job_state(status: &str) -> JobState {
    match status.to_ascii_uppercase().as_str() {
        "SUCCESS" | "PARTIAL_SUCCESS" => JobState::Done,
        "PENDING" | "" => JobState::Waiting,
        _ => JobState::Failed,
    }
}

/// Remote extraction through the LlamaParse job API.
#[derive(Debug, Clone)]
pub struct LlamaParseExtractor {
    config: LlamaParseConfig,
    http: reqwest::Client,
}

impl KeyFromEnv for LlamaParseExtractor {
    const KEY_NAME: &'static str = "LLAMA_CLOUD_API_KEY";
}

impl Default for LlamaParseExtractor {
    fn default() -> Self {
        Self::new(LlamaParseConfig::default())
    }
}

fn service_error(e: reqwest::Error) -> ExtractionError {
    ExtractionError::Service(e.to_string())
}

impl LlamaParseExtractor {
    pub fn new(config: LlamaParseConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { config, http }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(LlamaParseConfig { api_key: api_key.into(), ..LlamaParseConfig::default() })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, ExtractionError> {
        let resp = self.http.get(url).bearer_auth(&self.config.api_key).send().await.map_err(service_error)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Service(format!("{status}: {body}")));
        }
        resp.json().await.map_err(service_error)
    }

    async fn upload(&self, bytes: &[u8]) -> Result<JobInfo, ExtractionError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(self.config.file_name.clone())
            .mime_str("application/pdf")
            .map_err(service_error)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self.http
            .post(format!("{}/upload", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(service_error)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Service(format!("{status}: {body}")));
        }
        resp.json().await.map_err(service_error)
    }
}

#[async_trait]
impl DocumentExtractor for LlamaParseExtractor {
    #[instrument(target = "quiz_forge::extract", skip(self, bytes), fields(len = bytes.len()))]
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ExtractionError::MissingCredential(Self::KEY_NAME));
        }
        if bytes.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let job = self.upload(bytes).await?;
        info!(job_id = %job.id, "Uploaded document to LlamaParse");

        let mut state = job_state(&job.status);
        let mut polls = 0;
        while state == JobState::Waiting {
            if polls >= self.config.max_polls {
                return Err(ExtractionError::JobTimeout { job_id: job.id, attempts: polls });
            }
            tokio::time::sleep(self.config.poll_interval).await;
            polls += 1;
            let polled: JobInfo = self.get_json(format!("{}/job/{}", self.config.base_url, job.id)).await?;
            debug!(job_id = %job.id, status = %polled.status, polls, "Polled parsing job");
            state = job_state(&polled.status);
            if state == JobState::Failed {
                return Err(ExtractionError::JobFailed { job_id: job.id, status: polled.status });
            }
        }
        if state == JobState::Failed {
            return Err(ExtractionError::JobFailed { job_id: job.id, status: job.status });
        }

        let result: TextResult = self
            .get_json(format!("{}/job/{}/result/text", self.config.base_url, job.id))
            .await?;
        if result.text.trim().is_empty() {
            return Err(ExtractionError::NoContent);
        }
        info!(chars = result.text.len(), "Extracted text with LlamaParse");
        Ok(result.text)
    }
}
