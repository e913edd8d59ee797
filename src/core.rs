//! Core querying API: wraps a low-level model client with schema-aware prompting,
//! a bounded wait, and JSON extraction into a typed value.
//!
//! - `LowLevelClient` is the provider seam (OpenAI, DeepSeek, mock).
//! - `QueryResolver::query<T>()` appends JSON-schema guidance for `T`, calls the
//!   client under a timeout and returns the first JSON object that decodes as `T`.

use crate::error::{AIError, QueryResolverError};
use crate::json_utils::{extract_first, ExtractFailure};
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// One chat completion request: a role-setting system message plus the user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Name of the structure the caller expects back, for logs and provider hints.
    pub schema_name: &'static str,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.0,
            schema_name: "response",
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_schema_name(mut self, schema_name: &'static str) -> Self {
        self.schema_name = schema_name;
        self
    }
}

/// Low-level model client abstraction.
///
/// Implementors provide `ask_raw`, which executes a request and returns the raw
/// model text. Parsing and schema handling is performed by `QueryResolver`.
#[async_trait]
pub trait LowLevelClient: Send + Sync + Debug {
    /// The only method that implementations must provide
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError>;

    /// Clone this client into a boxed trait object
    fn clone_box(&self) -> Box<dyn LowLevelClient>;

    /// Check locally that the client can authenticate, without touching the network.
    fn ensure_credentials(&self) -> Result<(), AIError> {
        Ok(())
    }
}

// Implement Clone for Box<dyn LowLevelClient>
impl Clone for Box<dyn LowLevelClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl LowLevelClient for Box<dyn LowLevelClient> {
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        self.as_ref().ask_raw(request).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        self.as_ref().clone_box()
    }

    fn ensure_credentials(&self) -> Result<(), AIError> {
        self.as_ref().ensure_credentials()
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound on a single model call.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { timeout: crate::config::DEFAULT_TIMEOUT }
    }
}

/// Query resolver that wraps a LowLevelClient and provides the typed query method.
#[derive(Clone, Debug)]
pub struct QueryResolver<C: LowLevelClient> {
    client: C,
    config: ResolverConfig,
}

impl<C: LowLevelClient> QueryResolver<C> {
    pub fn new(client: C, config: ResolverConfig) -> Self {
        info!(timeout_secs = config.timeout.as_secs(), "Creating new QueryResolver");
        Self { client, config }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Call the model once and return the raw text, bounded by the configured timeout.
    #[instrument(target = "quiz_forge::resolver", skip(self, request), fields(schema = request.schema_name))]
    pub async fn ask(&self, request: ChatRequest) -> Result<String, QueryResolverError> {
        match tokio::time::timeout(self.config.timeout, self.client.ask_raw(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(timeout_secs = self.config.timeout.as_secs(), "Model call timed out");
                Err(QueryResolverError::Timeout(self.config.timeout))
            }
        }
    }

    /// Query with automatic JSON Schema guidance, decoding the first matching object as `T`.
    #[instrument(target = "quiz_forge::resolver", skip(self, request), fields(user_len = request.user.len()))]
    pub async fn query<T>(&self, request: ChatRequest) -> Result<T, QueryResolverError>
    where
        T: DeserializeOwned + JsonSchema + Send,
    {
        info!(schema = request.schema_name, "Starting query");
        let mut request = request;
        request.user = add_schema_guidance::<T>(request.user);

        let raw = self.ask(request).await?;
        debug!(response_len = raw.len(), "Received raw response");

        match extract_first::<T>(&raw) {
            Ok(value) => {
                info!("Query decoded successfully");
                Ok(value)
            }
            Err(ExtractFailure::NoJson) => {
                warn!("Response contained no JSON");
                Err(QueryResolverError::NoStructuredData(raw))
            }
            Err(ExtractFailure::Mismatch(e)) => {
                warn!(error = %e, "Response JSON did not match schema");
                Err(QueryResolverError::JsonDeserialization(e, raw))
            }
        }
    }
}

/// Add JSON schema guidance to a prompt
pub fn add_schema_guidance<T: JsonSchema>(prompt: String) -> String {
    let schema = schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nRespond with a single JSON object matching this schema:\n```json\n{}\n```",
        prompt, schema_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockClient, MockResponse};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    #[schemars(title = "Capital", description = "A capital city")]
    struct Capital {
        city: String,
    }

    #[test]
    fn schema_guidance_is_appended_after_prompt() {
        let prompt = add_schema_guidance::<Capital>("Name the capital of France.".to_string());
        assert!(prompt.starts_with("Name the capital of France."));
        assert!(prompt.contains("\"title\": \"Capital\""));
    }

    #[tokio::test]
    async fn query_sends_guided_prompt_and_decodes() {
        let (client, handle) = MockClient::with_responses(vec![MockResponse::Text(
            r#"Answer: {"city":"Paris"}"#.to_string(),
        )]);
        let resolver = QueryResolver::new(client, ResolverConfig::default());
        let capital: Capital = resolver.query(ChatRequest::new("sys", "Capital of France?")).await.unwrap();
        assert_eq!(capital, Capital { city: "Paris".into() });
        assert!(handle.last_request().unwrap().user.contains("Response Format"));
    }

    #[tokio::test]
    async fn client_errors_surface_as_ai_errors() {
        let (client, _handle) = MockClient::with_responses(vec![MockResponse::Failure("boom".into())]);
        let resolver = QueryResolver::new(client, ResolverConfig::default());
        let err = resolver.ask(ChatRequest::new("s", "u")).await.unwrap_err();
        assert!(matches!(err, QueryResolverError::Ai(AIError::Mock(_))));
    }
}
