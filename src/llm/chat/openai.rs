use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };

use super::{ ChatClient, ChatError };
use crate::config::WidgetConfig;
use crate::models::chat::{ ChatCompletionRequest, ChatCompletionResponse, UpstreamMessage };

/// Client for an OpenAI-compatible chat-completions endpoint, normally the
/// relay at `/api/chat`.
pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    api_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIChatClient {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        temperature: f32,
        max_tokens: u32
    ) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_|
                ChatError::InvalidConfig("API key contains invalid header characters".to_string())
            )?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            model,
            api_url,
            temperature,
            max_tokens,
        })
    }

    pub fn from_config(config: &WidgetConfig) -> Result<Self, ChatError> {
        Self::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.temperature,
            config.max_tokens
        )
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, messages: &[UpstreamMessage]) -> Result<String, ChatError> {
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!("Sending {} messages to {}", req.messages.len(), self.api_url);

        let response = self.http.post(&self.api_url).json(&req).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json
            ::from_str(&body)
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
        parsed
            .first_content()
            .map(str::to_owned)
            .ok_or_else(|| ChatError::MalformedResponse("response has no choices".to_string()))
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.api_url.clone()
    }
}
