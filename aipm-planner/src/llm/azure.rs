//! Azure OpenAI chat-completions client
//!
//! Speaks the Azure deployment-scoped wire format:
//! `POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
//! with the key in the `api-key` header.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{ChatClient, ChatRequest, LlmError};
use crate::config::LlmConfig;

/// Default timeout for provider requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature - varied but plausible plans beat determinism here
const TEMPERATURE: f64 = 0.7;

/// Bounded output length per completion
const MAX_TOKENS: u32 = 2000;

/// Long-lived Azure OpenAI client, configured once at startup and shared
/// by every request through `AppState`.
pub struct AzureOpenAiClient {
    http_client: Client,
    url: String,
}

impl AzureOpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut headers = header::HeaderMap::new();
        let mut api_key = header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| LlmError::Api {
                status: 0,
                message: "API key contains invalid header characters".to_string(),
            })?;
        api_key.set_sensitive(true);
        headers.insert("api-key", api_key);

        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint.trim_end_matches('/'),
            config.deployment,
            config.api_version
        );

        Ok(Self { http_client, url })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatClient for AzureOpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.user}));

        let body = serde_json::json!({
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        debug!(url = %self.url, "Sending chat completion request");
        let response = self.http_client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            debug!("Provider rate limited the request (429)");
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "Provider returned an error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(LlmError::Network)?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
