use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::{
    error::ProviderError,
    provider::ProviderKind,
    providers::{SummaryProvider, error_message, non_empty_content},
    settings::Settings,
};

/// A locally hosted Ollama server, `POST {base_url}/api/generate`.
pub struct LocalProvider {
    http: reqwest::Client,
}

impl LocalProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SummaryProvider for LocalProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn generate(&self, settings: &Settings, prompt: &str) -> Result<String, ProviderError> {
        let resolved = settings.resolve(ProviderKind::Local)?;
        let url = format!("{}/api/generate", resolved.credential);
        debug!(%url, model = %resolved.model, "sending local generate request");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "model": resolved.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::FORBIDDEN => return Err(ProviderError::LocalCors),
            StatusCode::NOT_FOUND => {
                return Err(ProviderError::LocalModelMissing {
                    model: resolved.model,
                });
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }
            _ => {}
        }

        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                reason: e.to_string(),
            })?;

        non_empty_content(payload["response"].as_str(), &payload)
    }
}
