pub mod models;

use crate::config::KeyFromEnv;
use crate::core::{ChatRequest, LowLevelClient};
use crate::error::{AIError, DeepSeekError};
use async_trait::async_trait;
use models::DeepSeekModel;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

#[derive(Debug, Serialize)]
struct DeepSeekRequest<'a> {
    model: &'a str,
    messages: [DeepSeekMessage<'a>; 2],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<DeepSeekResponseFormat>,
}

#[derive(Debug, Serialize)]
struct DeepSeekMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct DeepSeekResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct DeepSeekResponse {
    choices: Vec<DeepSeekChoice>,
}

#[derive(Debug, Deserialize)]
struct DeepSeekChoice {
    message: DeepSeekResponseMessage,
}

#[derive(Debug, Deserialize)]
struct DeepSeekResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Configuration for DeepSeek client
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    pub api_key: String,
    pub model: DeepSeekModel,
    pub max_tokens: u32,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: DeepSeekClient::find_key().unwrap_or_default(),
            model: DeepSeekModel::default(),
            max_tokens: 4096,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: crate::config::DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeepSeekClient {
    config: DeepSeekConfig,
    client: Client,
}

impl KeyFromEnv for DeepSeekClient {
    const KEY_NAME: &'static str = "DEEPSEEK_API_KEY";
}

impl Default for DeepSeekClient {
    fn default() -> Self {
        Self::new(DeepSeekConfig::default())
    }
}

impl DeepSeekClient {
    pub fn new(config: DeepSeekConfig) -> Self {
        info!(model = %config.model.id(), "Creating new DeepSeek client");
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });
        Self { config, client }
    }

    pub fn config(&self) -> &DeepSeekConfig {
        &self.config
    }

    fn request_body<'a>(&'a self, request: &'a ChatRequest) -> DeepSeekRequest<'a> {
        let reasoner = self.config.model.is_reasoner();
        DeepSeekRequest {
            model: self.config.model.id(),
            messages: [
                DeepSeekMessage { role: "system", content: &request.system },
                DeepSeekMessage { role: "user", content: &request.user },
            ],
            max_tokens: self.config.max_tokens,
            temperature: (!reasoner).then_some(request.temperature),
            response_format: (!reasoner).then_some(DeepSeekResponseFormat { format_type: "json_object" }),
        }
    }
}

fn api_error(e: DeepSeekError) -> AIError {
    AIError::DeepSeek(e)
}

#[async_trait]
impl LowLevelClient for DeepSeekClient {
    #[instrument(skip(self, request), fields(model = %self.config.model.id(), schema = request.schema_name))]
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        self.ensure_credentials()?;

        let body = self.request_body(&request);
        debug!(user_len = request.user.len(), "Sending request to DeepSeek API");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                api_error(DeepSeekError::Http(e.to_string()))
            })?;

        let status = response.status();
        debug!(%status, "Received response from DeepSeek API");
        match status {
            StatusCode::UNAUTHORIZED => {
                error!("DeepSeek API authentication failed");
                return Err(api_error(DeepSeekError::Authentication));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("DeepSeek API rate limit exceeded");
                return Err(api_error(DeepSeekError::RateLimit));
            }
            s if !s.is_success() => {
                let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
                error!(%status, error = %text, "DeepSeek API error");
                return Err(api_error(DeepSeekError::Api(text)));
            }
            _ => {}
        }

        let parsed: DeepSeekResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse DeepSeek response JSON");
            api_error(DeepSeekError::Http(e.to_string()))
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| api_error(DeepSeekError::Api("Empty completion".to_string())))?;

        info!(response_len = content.len(), "Received DeepSeek completion");
        Ok(content)
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }

    fn ensure_credentials(&self) -> Result<(), AIError> {
        if self.config.api_key.trim().is_empty() {
            return Err(api_error(DeepSeekError::MissingCredential(Self::KEY_NAME)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(model: DeepSeekModel) -> DeepSeekClient {
        DeepSeekClient::new(DeepSeekConfig {
            api_key: "sk-test".to_string(),
            model,
            max_tokens: 256,
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn missing_key_is_reported_before_sending() {
        let client = DeepSeekClient::new(DeepSeekConfig {
            api_key: "  ".to_string(),
            ..client(DeepSeekModel::Chat).config().clone()
        });
        let err = client.ask_raw(ChatRequest::new("s", "u")).await.unwrap_err();
        assert!(err.is_missing_credential());
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn chat_body_uses_json_mode_and_temperature() {
        let client = client(DeepSeekModel::Chat);
        let request = ChatRequest::new("system text", "user text").with_temperature(1.0);
        let body = serde_json::to_value(client.request_body(&request)).unwrap();
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["messages"][0]["content"], "system text");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["temperature"], 1.0);
    }

    #[test]
    fn reasoner_body_drops_sampling_and_json_mode() {
        let client = client(DeepSeekModel::from_id("deepseek-reasoner"));
        let body = serde_json::to_value(client.request_body(&ChatRequest::new("s", "u"))).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("response_format").is_none());
        assert_eq!(DeepSeekModel::from_id("custom").id(), "custom");
    }
}
