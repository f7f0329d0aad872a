use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::ProviderError,
    prompt::SYSTEM_PROMPT,
    provider::ProviderKind,
    providers::{SummaryProvider, error_message, non_empty_content},
    settings::Settings,
};

/// OpenAI-style chat completion endpoint (Gemini, OpenRouter, DeepSeek).
pub struct ChatCompletionProvider {
    kind: ProviderKind,
    http: reqwest::Client,
    api_url: Option<String>,
}

impl ChatCompletionProvider {
    pub fn new(kind: ProviderKind, http: reqwest::Client) -> Self {
        Self {
            kind,
            http,
            api_url: None,
        }
    }

    /// Overrides the endpoint from [`ProviderKind::config`].
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(self.kind.config().api_url)
    }
}

#[async_trait]
impl SummaryProvider for ChatCompletionProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(&self, settings: &Settings, prompt: &str) -> Result<String, ProviderError> {
        let resolved = settings.resolve(self.kind)?;
        debug!(provider = %self.kind, model = %resolved.model, "sending chat completion");

        let mut request = self
            .http
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", resolved.credential));

        if self.kind == ProviderKind::Openrouter {
            request = request
                .header("HTTP-Referer", "https://github.com/kuchmenko/skimmer")
                .header("X-Title", "skimmer");
        }

        let response = request
            .json(&serde_json::json!({
                "model": resolved.model,
                "messages": [
                    {
                        "role": "system",
                        "content": SYSTEM_PROMPT,
                    },
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": 0.3,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                reason: e.to_string(),
            })?;

        non_empty_content(payload["choices"][0]["message"]["content"].as_str(), &payload)
    }
}
