pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::config::WidgetConfig;
use crate::models::chat::UpstreamMessage;
use self::openai::OpenAIChatClient;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Chat API returned status {0}")]
    Status(u16),
    #[error("Malformed chat response: {0}")]
    MalformedResponse(String),
    #[error("Chat request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Chat request cancelled")]
    Cancelled,
    #[error("Invalid chat client configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the full message list and returns the reply text of the first choice.
    async fn complete(&self, messages: &[UpstreamMessage]) -> Result<String, ChatError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &WidgetConfig) -> Result<Arc<dyn ChatClient>, ChatError> {
    Ok(Arc::new(OpenAIChatClient::from_config(config)?))
}
