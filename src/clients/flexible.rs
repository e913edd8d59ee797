use crate::core::{ChatRequest, LowLevelClient};
use crate::error::AIError;
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

/// Provider selection for the runtime-chosen client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientType {
    #[default]
    OpenAI,
    #[cfg(feature = "deepseek")]
    DeepSeek,
    Mock,
}

impl FromStr for ClientType {
    type Err = String;

    /// Parse client type from string (case insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            #[cfg(feature = "deepseek")]
            "deepseek" => Ok(Self::DeepSeek),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown client type: '{}'. Supported: openai, deepseek, mock", s)),
        }
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientType::OpenAI => write!(f, "OpenAI"),
            #[cfg(feature = "deepseek")]
            ClientType::DeepSeek => write!(f, "DeepSeek"),
            ClientType::Mock => write!(f, "Mock"),
        }
    }
}

/// Flexible client that wraps any LowLevelClient behind a cheap clone
#[derive(Debug, Clone)]
pub struct FlexibleClient {
    inner: Arc<dyn LowLevelClient>,
}

impl FlexibleClient {
    /// Create a new FlexibleClient wrapping the given client
    pub fn new(client: Box<dyn LowLevelClient>) -> Self {
        Self { inner: Arc::from(client) }
    }

    pub fn openai(config: super::openai::OpenAIConfig) -> Self {
        Self::new(Box::new(super::openai::OpenAIClient::new(config)))
    }

    #[cfg(feature = "deepseek")]
    pub fn deepseek(config: super::deepseek::DeepSeekConfig) -> Self {
        Self::new(Box::new(super::deepseek::DeepSeekClient::new(config)))
    }

    /// Create a FlexibleClient with a mock and return the handle for configuration
    pub fn mock() -> (Self, Arc<super::mock::MockHandle>) {
        let (mock_client, handle) = super::mock::MockClient::new();
        (Self::new(Box::new(mock_client)), handle)
    }

    /// Build the default-configured client of the given type.
    pub fn from_type(client_type: ClientType) -> Self {
        match client_type {
            ClientType::OpenAI => Self::openai(Default::default()),
            #[cfg(feature = "deepseek")]
            ClientType::DeepSeek => Self::deepseek(Default::default()),
            ClientType::Mock => Self::mock().0,
        }
    }
}

#[async_trait]
impl LowLevelClient for FlexibleClient {
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        self.inner.ask_raw(request).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }

    fn ensure_credentials(&self) -> Result<(), AIError> {
        self.inner.ensure_credentials()
    }
}
