pub mod models;

use crate::config::KeyFromEnv;
use crate::core::{ChatRequest, LowLevelClient};
use crate::error::{AIError, OpenAIError};
use async_trait::async_trait;
use models::OpenAIModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<OpenAIMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct Choices {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Msg,
}

#[derive(Debug, Deserialize)]
struct Msg {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: OpenAIModel,
    pub max_tokens: u32,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: OpenAIClient::find_key().unwrap_or_default(),
            model: OpenAIModel::default(),
            max_tokens: 4096,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: crate::config::DEFAULT_TIMEOUT,
        }
    }
}

impl OpenAIConfig {
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: OpenAIModel) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct OpenAIClient {
    config: OpenAIConfig,
    http: reqwest::Client,
}

impl KeyFromEnv for OpenAIClient {
    const KEY_NAME: &'static str = "OPENAI_API_KEY";
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new(OpenAIConfig::default())
    }
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Self {
        info!(model = %config.model.id(), "Creating new OpenAI client");
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { config, http }
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn messages_body<'a>(&'a self, request: &ChatRequest) -> OpenAIRequest<'a> {
        let reasoning = self.config.model.is_reasoning();
        OpenAIRequest {
            model: self.config.model.id(),
            max_tokens: (!reasoning).then_some(self.config.max_tokens),
            max_completion_tokens: reasoning.then_some(self.config.max_tokens),
            temperature: self.config.model.accepts_temperature().then_some(request.temperature),
            messages: vec![
                OpenAIMessage { role: "system", content: request.system.clone() },
                OpenAIMessage { role: "user", content: request.user.clone() },
            ],
            response_format: ResponseFormat { format_type: "json_object" },
        }
    }
}

#[async_trait]
impl LowLevelClient for OpenAIClient {
    #[instrument(skip(self, request), fields(model = %self.config.model.id(), schema = request.schema_name))]
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        self.ensure_credentials()?;

        let body = self.messages_body(&request);
        debug!(user_len = request.user.len(), "Sending request to OpenAI API");
        let resp = self.http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send().await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                AIError::OpenAI(OpenAIError::Http(e.to_string()))
            })?;

        debug!(status = %resp.status(), "Received response from OpenAI API");
        if resp.status() == 401 {
            error!("OpenAI API authentication failed");
            return Err(AIError::OpenAI(OpenAIError::Authentication));
        }
        if resp.status() == 429 {
            warn!("OpenAI API rate limit exceeded");
            return Err(AIError::OpenAI(OpenAIError::RateLimit));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let txt = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %txt, "OpenAI API error");
            return Err(AIError::OpenAI(OpenAIError::Api(txt)));
        }

        let parsed: Choices = resp.json().await
            .map_err(|e| AIError::OpenAI(OpenAIError::Http(e.to_string())))?;
        let content = parsed.choices.into_iter().next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AIError::OpenAI(OpenAIError::Api("No choices".into())))?;

        info!(response_len = content.len(), "Successfully received OpenAI response");
        Ok(content)
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }

    fn ensure_credentials(&self) -> Result<(), AIError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AIError::OpenAI(OpenAIError::MissingCredential(Self::KEY_NAME)));
        }
        Ok(())
    }
}
