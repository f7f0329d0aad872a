//! End-to-end summary requests: cache, extraction, cascade, parse, store.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    cache::{CacheStats, SummaryCache},
    cascade::{self, GenerationMode, ProviderCheck},
    error::{Result, SummaryError},
    events::{Notifier, PipelineEvent},
    parser,
    prompt::{metadata_input, prepare_transcript},
    provider::ProviderKind,
    providers::{SummaryProvider, default_providers},
    settings::{Settings, SettingsSource},
    store::KeyValueStore,
    transcript::YoutubeClient,
    types::{SummaryBody, SummaryResult, VideoId},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Result of the plain 2-3 sentence mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlainSummary {
    pub summary: String,
    pub provider: ProviderKind,
}

pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Facade for UI collaborators. Holds no per-request state.
pub struct Summarizer {
    youtube: YoutubeClient,
    cache: SummaryCache,
    providers: Vec<Arc<dyn SummaryProvider>>,
    settings: Arc<dyn SettingsSource>,
    notifier: Notifier,
}

impl Summarizer {
    pub fn new(
        http: reqwest::Client,
        settings: Arc<dyn SettingsSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            youtube: YoutubeClient::new(http.clone()),
            cache: SummaryCache::new(store),
            providers: default_providers(&http),
            settings,
            notifier: Notifier::default(),
        }
    }

    pub fn with_youtube(mut self, youtube: YoutubeClient) -> Self {
        self.youtube = youtube;
        self
    }

    pub fn with_cache(mut self, cache: SummaryCache) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the provider list. Order is attempt order.
    pub fn with_providers(mut self, providers: Vec<Arc<dyn SummaryProvider>>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    async fn current_settings(&self) -> Settings {
        self.settings.load().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load settings");
            Settings::default()
        })
    }

    /// Structured summary for `video_id`, served from cache when possible.
    pub async fn request_summary(&self, video_id: &VideoId) -> Result<SummaryResult> {
        let request_id = Uuid::new_v4();
        debug!(%video_id, %request_id, "summary requested");

        if let Some(mut cached) = self.cache.get(video_id).await {
            self.notifier.publish(PipelineEvent::CacheHit {
                request_id,
                video_id: video_id.clone(),
            });
            cached.from_cache = true;
            return Ok(cached);
        }

        match self.generate_fresh(video_id, request_id).await {
            Ok(result) => {
                self.cache.set(video_id, &result).await;
                self.notifier.publish(PipelineEvent::SummaryReady {
                    request_id,
                    video_id: video_id.clone(),
                    provider: result.provider,
                });
                Ok(result)
            }
            Err(e) => {
                self.notifier.publish(PipelineEvent::PipelineFailed {
                    request_id,
                    video_id: Some(video_id.clone()),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn generate_fresh(&self, video_id: &VideoId, request_id: Uuid) -> Result<SummaryResult> {
        if !self.current_settings().await.is_configured() {
            return Err(SummaryError::NotConfigured);
        }

        let (transcript, metadata) = tokio::join!(
            self.youtube.fetch_transcript(video_id),
            self.youtube.fetch_metadata(video_id)
        );

        self.notifier.publish(PipelineEvent::TranscriptFetched {
            request_id,
            video_id: video_id.clone(),
            available: transcript.available(),
            source: transcript.source(),
        });

        let (input, has_transcript) = match transcript.text() {
            Some(text) => (prepare_transcript(text), true),
            None => {
                info!(
                    %video_id,
                    reason = transcript.error().unwrap_or("unknown"),
                    "no transcript, summarizing from metadata"
                );
                (metadata_input(video_id, &metadata), false)
            }
        };

        let prompt = GenerationMode::Structured { has_transcript }.prompt(&input);
        let generated = cascade::generate_summary(
            &self.providers,
            self.settings.as_ref(),
            &prompt,
            &self.notifier,
            request_id,
        )
        .await?;

        let parsed = parser::parse(&generated.text, has_transcript);
        let summary = if parsed.summary.is_empty() {
            debug!(provider = %generated.provider, "response had no bullets, keeping it as text");
            SummaryBody::Text(parser::before_takeaways(&generated.text).to_string())
        } else {
            SummaryBody::Bullets(parsed.summary)
        };

        Ok(SummaryResult::new(
            summary,
            parsed.takeaways,
            parsed.disclaimer,
            generated.provider,
            metadata,
            parsed.has_transcript,
        ))
    }

    /// Plain-mode summary of arbitrary text. Not cached.
    pub async fn summarize_text(&self, text: &str) -> Result<PlainSummary> {
        if !self.current_settings().await.is_configured() {
            return Err(SummaryError::NotConfigured);
        }

        self.plain(&prepare_transcript(text), Uuid::new_v4()).await
    }

    /// Plain-mode summary of a video: transcript when there is one, metadata otherwise. Not cached.
    pub async fn request_plain_summary(&self, video_id: &VideoId) -> Result<PlainSummary> {
        let request_id = Uuid::new_v4();
        if !self.current_settings().await.is_configured() {
            return Err(SummaryError::NotConfigured);
        }

        let (transcript, metadata) = tokio::join!(
            self.youtube.fetch_transcript(video_id),
            self.youtube.fetch_metadata(video_id)
        );
        self.notifier.publish(PipelineEvent::TranscriptFetched {
            request_id,
            video_id: video_id.clone(),
            available: transcript.available(),
            source: transcript.source(),
        });

        let input = match transcript.text() {
            Some(text) => prepare_transcript(text),
            None => metadata_input(video_id, &metadata),
        };
        self.plain(&input, request_id).await
    }

    async fn plain(&self, input: &str, request_id: Uuid) -> Result<PlainSummary> {
        let prompt = GenerationMode::Plain.prompt(input);
        let generated = cascade::generate_summary(
            &self.providers,
            self.settings.as_ref(),
            &prompt,
            &self.notifier,
            request_id,
        )
        .await?;

        Ok(PlainSummary {
            summary: generated.text,
            provider: generated.provider,
        })
    }

    pub async fn clear_cache(&self) -> usize {
        self.cache.clear().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn delete_cached(&self, video_id: &VideoId) {
        self.cache.delete(video_id).await
    }

    pub async fn test_providers(&self) -> Vec<ProviderCheck> {
        cascade::check_providers(&self.providers, self.settings.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::ProviderError,
        settings::{FileSettings, LayeredSettings},
        store::MemoryStore,
    };

    struct EchoProvider {
        kind: ProviderKind,
        reply: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SummaryProvider for EchoProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn generate(&self, settings: &Settings, _prompt: &str) -> std::result::Result<String, ProviderError> {
            settings.resolve(self.kind)?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    fn offline_youtube() -> YoutubeClient {
        YoutubeClient::with_base_url(reqwest::Client::new(), "http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn unconfigured_settings_need_setup_without_network() {
        let summarizer = Summarizer::new(
            reqwest::Client::new(),
            Arc::new(Settings::default()),
            Arc::new(MemoryStore::new()),
        )
        .with_youtube(offline_youtube());

        let err = summarizer
            .request_summary(&VideoId::new("abc123"))
            .await
            .unwrap_err();
        assert!(err.needs_setup());
    }

    #[tokio::test]
    async fn unstructured_reply_is_kept_as_text() {
        let provider = Arc::new(EchoProvider {
            kind: ProviderKind::Deepseek,
            reply: "  Just a paragraph about the video. ",
            calls: AtomicUsize::new(0),
        });
        let settings = Settings {
            deepseek_api_key: Some("key".into()),
            ..Default::default()
        };
        let summarizer = Summarizer::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(MemoryStore::new()),
        )
        .with_youtube(offline_youtube())
        .with_providers(vec![provider.clone()]);

        let result = summarizer
            .request_summary(&VideoId::new("abc123"))
            .await
            .unwrap();

        assert_eq!(result.summary, vec!["Just a paragraph about the video."]);
        assert!(result.takeaways.is_empty());
        assert!(!result.has_transcript);
        assert_eq!(result.provider, ProviderKind::Deepseek);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn plain_mode_returns_raw_text_and_skips_cache() {
        let provider = Arc::new(EchoProvider {
            kind: ProviderKind::Gemini,
            reply: "Two sentences. Exactly.",
            calls: AtomicUsize::new(0),
        });
        let settings = Settings {
            gemini_api_key: Some("key".into()),
            ..Default::default()
        };
        let summarizer = Summarizer::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(MemoryStore::new()),
        )
        .with_providers(vec![provider]);

        let plain = summarizer.summarize_text("some transcript").await.unwrap();
        assert_eq!(
            plain,
            PlainSummary {
                summary: "Two sentences. Exactly.".into(),
                provider: ProviderKind::Gemini,
            }
        );
        assert_eq!(summarizer.cache_stats().await.total, 0);
    }

    #[tokio::test]
    async fn plain_video_summary_falls_back_to_metadata() {
        let provider = Arc::new(EchoProvider {
            kind: ProviderKind::Gemini,
            reply: "A short paragraph.",
            calls: AtomicUsize::new(0),
        });
        let settings = Settings {
            gemini_api_key: Some("key".into()),
            ..Default::default()
        };
        let summarizer = Summarizer::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(MemoryStore::new()),
        )
        .with_youtube(offline_youtube())
        .with_providers(vec![provider.clone()]);

        let plain = summarizer
            .request_plain_summary(&VideoId::new("abc123"))
            .await
            .unwrap();

        assert_eq!(plain.summary, "A short paragraph.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(summarizer.cache_stats().await.total, 0);
    }

    #[tokio::test]
    async fn takeaways_are_not_repeated_in_text_fallback() {
        let provider = Arc::new(EchoProvider {
            kind: ProviderKind::Gemini,
            reply: "An intro paragraph without bullets.\nTAKEAWAYS:\n1. First lesson\n2. Second lesson",
            calls: AtomicUsize::new(0),
        });
        let settings = Settings {
            gemini_api_key: Some("key".into()),
            ..Default::default()
        };
        let summarizer = Summarizer::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(MemoryStore::new()),
        )
        .with_youtube(offline_youtube())
        .with_providers(vec![provider]);

        let result = summarizer
            .request_summary(&VideoId::new("abc123"))
            .await
            .unwrap();

        assert_eq!(result.summary, vec!["An intro paragraph without bullets."]);
        assert_eq!(result.takeaways, vec!["First lesson", "Second lesson"]);
    }

    #[tokio::test]
    async fn corrupt_settings_file_does_not_mask_env_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let env = Settings {
            gemini_api_key: Some("env-key".into()),
            ..Default::default()
        };
        let settings = LayeredSettings::new(vec![
            Arc::new(FileSettings::new(&path)),
            Arc::new(env),
        ]);
        let provider = Arc::new(EchoProvider {
            kind: ProviderKind::Gemini,
            reply: "SUMMARY:\n- From the env key",
            calls: AtomicUsize::new(0),
        });
        let summarizer = Summarizer::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(MemoryStore::new()),
        )
        .with_youtube(offline_youtube())
        .with_providers(vec![provider.clone()]);

        let result = summarizer
            .request_summary(&VideoId::new("abc123"))
            .await
            .unwrap();

        assert_eq!(result.provider, ProviderKind::Gemini);
        assert_eq!(result.summary, vec!["From the env key"]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
