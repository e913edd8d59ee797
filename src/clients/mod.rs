#[cfg(feature = "deepseek")]
pub mod deepseek;
pub mod flexible;
pub mod mock;
pub mod openai;

#[cfg(feature = "deepseek")]
pub use deepseek::{DeepSeekClient, DeepSeekConfig};
pub use flexible::{ClientType, FlexibleClient};
pub use mock::{MockClient, MockHandle, MockResponse};
pub use openai::{OpenAIClient, OpenAIConfig};
