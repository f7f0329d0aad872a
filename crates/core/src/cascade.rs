//! Ordered, stop-on-success attempts across providers.
//!
//! The cascade holds no state between calls: providers, settings and the prompt are all passed in.
//! Settings are loaded again before every attempt.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ProviderError, ProviderFailure, SummaryError},
    events::{Notifier, PipelineEvent},
    prompt::{SAMPLE_INPUT, plain_prompt, structured_prompt},
    provider::ProviderKind,
    providers::SummaryProvider,
    settings::SettingsSource,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    /// 2-3 sentences of free text.
    Plain,
    /// SUMMARY / TAKEAWAYS / DISCLAIMER sections for the parser.
    Structured { has_transcript: bool },
}

impl GenerationMode {
    pub fn prompt(&self, input: &str) -> String {
        match self {
            GenerationMode::Plain => plain_prompt(input),
            GenerationMode::Structured { has_transcript } => {
                structured_prompt(input, *has_transcript)
            }
        }
    }
}

/// Raw text from the first provider that answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub provider: ProviderKind,
    /// Providers that failed before this one, in attempt order.
    pub failures: Vec<ProviderFailure>,
}

async fn attempt(
    provider: &dyn SummaryProvider,
    settings: &dyn SettingsSource,
    prompt: &str,
) -> Result<String, ProviderError> {
    let settings = settings.load().await?;
    provider.generate(&settings, prompt).await
}

/// Tries `providers` in order and returns the first success. Every failure, including a missing
/// credential, just advances to the next provider.
pub async fn generate_summary(
    providers: &[Arc<dyn SummaryProvider>],
    settings: &dyn SettingsSource,
    prompt: &str,
    notifier: &Notifier,
    request_id: Uuid,
) -> Result<Generated, SummaryError> {
    let mut failures = Vec::with_capacity(providers.len());

    for provider in providers {
        let kind = provider.kind();
        notifier.publish(PipelineEvent::ProviderAttempt {
            request_id,
            provider: kind,
        });

        match attempt(provider.as_ref(), settings, prompt).await {
            Ok(text) => {
                info!(provider = %kind, failed_before = failures.len(), "summary generated");
                return Ok(Generated {
                    text,
                    provider: kind,
                    failures,
                });
            }
            Err(e) => {
                warn!(provider = %kind, error = %e, "provider failed, trying next");
                notifier.publish(PipelineEvent::ProviderFailed {
                    request_id,
                    provider: kind,
                    error: e.to_string(),
                });
                failures.push(ProviderFailure {
                    provider: kind,
                    error: e.to_string(),
                });
            }
        }
    }

    Err(SummaryError::AllProvidersFailed(failures))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    NotConfigured,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderCheck {
    pub provider: ProviderKind,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the plain prompt on the sample input against every provider, regardless of cascade order.
pub async fn check_providers(
    providers: &[Arc<dyn SummaryProvider>],
    settings: &dyn SettingsSource,
) -> Vec<ProviderCheck> {
    let prompt = plain_prompt(SAMPLE_INPUT);
    let mut checks = Vec::with_capacity(providers.len());

    for provider in providers {
        let outcome = attempt(provider.as_ref(), settings, &prompt).await;
        checks.push(match outcome {
            Ok(summary) => ProviderCheck {
                provider: provider.kind(),
                status: CheckStatus::Ok,
                summary: Some(summary),
                error: None,
            },
            Err(e) => ProviderCheck {
                provider: provider.kind(),
                status: match e {
                    ProviderError::NotConfigured { .. } => CheckStatus::NotConfigured,
                    _ => CheckStatus::Failed,
                },
                summary: None,
                error: Some(e.to_string()),
            },
        });
    }

    checks
}
