pub mod chat;
pub mod local;

use std::sync::Arc;

use async_trait::async_trait;

pub use chat::ChatCompletionProvider;
pub use local::LocalProvider;

use crate::{error::ProviderError, provider::ProviderKind, settings::Settings};

/// One remote text-generation backend. Implementations resolve their own credentials from the
/// settings snapshot passed in for this attempt.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn generate(&self, settings: &Settings, prompt: &str) -> Result<String, ProviderError>;
}

/// HTTP providers in cascade order.
pub fn default_providers(http: &reqwest::Client) -> Vec<Arc<dyn SummaryProvider>> {
    ProviderKind::CASCADE_ORDER
        .iter()
        .map(|kind| -> Arc<dyn SummaryProvider> {
            match kind {
                ProviderKind::Local => Arc::new(LocalProvider::new(http.clone())),
                cloud => Arc::new(ChatCompletionProvider::new(*cloud, http.clone())),
            }
        })
        .collect()
}

/// Best message from a non-2xx body: a JSON error envelope if there is one, else the raw text.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let envelope = value["error"]["message"]
            .as_str()
            .or_else(|| value["error"].as_str())
            .or_else(|| value["message"].as_str());
        if let Some(message) = envelope {
            return message.to_string();
        }
    }

    let text = body.trim();
    if text.is_empty() {
        "empty response body".to_string()
    } else {
        text.to_string()
    }
}

/// Non-empty trimmed text, or an `InvalidResponse` naming the payload.
pub(crate) fn non_empty_content(
    content: Option<&str>,
    payload: &serde_json::Value,
) -> Result<String, ProviderError> {
    content
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::InvalidResponse {
            reason: format!("no content in {payload}"),
        })
}
