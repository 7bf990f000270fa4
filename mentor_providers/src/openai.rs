use std::time::Duration;

use async_trait::async_trait;
use mentor_core::{ChatMessage, ChatOptions, LLMProvider, LLMResponse, Usage};
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::retry::{RetryPolicy, retry_with_backoff};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenAIProvider {
    /// Build a provider whose HTTP requests give up after `timeout`.
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        info!("Creating OpenAIProvider");
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Request body for one chat call.
    #[must_use]
    pub fn request_body(messages: &[ChatMessage], options: &ChatOptions) -> serde_json::Value {
        json!({
            "model": options.model,
            "messages": messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        })
    }

    /// Pull the reply text and token usage out of a completion response.
    pub fn parse_response(response: &serde_json::Value) -> anyhow::Result<LLMResponse> {
        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?
            .to_string();

        let count = |field: &str, u: &serde_json::Map<String, serde_json::Value>| {
            u.get(field)
                .and_then(serde_json::Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };

        let usage = response["usage"].as_object().map(|u| Usage {
            prompt_tokens: count("prompt_tokens", u),
            completion_tokens: count("completion_tokens", u),
            total_tokens: count("total_tokens", u),
        });

        Ok(LLMResponse { content, usage })
    }

    /// Helper method to send a single request
    async fn try_send(&self, request: &serde_json::Value) -> anyhow::Result<LLMResponse> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        Self::parse_response(&response)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> anyhow::Result<LLMResponse> {
        let request = Self::request_body(messages, options);

        info!("Sending request to chat API: model={}", options.model);

        let response = retry_with_backoff(|| self.try_send(&request), &self.retry).await?;

        info!("Received response from chat API");
        Ok(response)
    }
}
