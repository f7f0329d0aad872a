//! Best-effort progress notifications for whoever is listening (a CLI spinner, a UI panel).
//!
//! Publishing never fails: with no subscriber the event is counted as unrouted and dropped.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::{
    provider::ProviderKind,
    types::{TranscriptSource, VideoId},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    CacheHit {
        request_id: Uuid,
        video_id: VideoId,
    },
    TranscriptFetched {
        request_id: Uuid,
        video_id: VideoId,
        available: bool,
        source: TranscriptSource,
    },
    ProviderAttempt {
        request_id: Uuid,
        provider: ProviderKind,
    },
    ProviderFailed {
        request_id: Uuid,
        provider: ProviderKind,
        error: String,
    },
    SummaryReady {
        request_id: Uuid,
        video_id: VideoId,
        provider: ProviderKind,
    },
    PipelineFailed {
        request_id: Uuid,
        video_id: Option<VideoId>,
        message: String,
    },
}

impl PipelineEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::CacheHit { .. } => "cache.hit",
            PipelineEvent::TranscriptFetched { .. } => "transcript.fetched",
            PipelineEvent::ProviderAttempt { .. } => "provider.attempt",
            PipelineEvent::ProviderFailed { .. } => "provider.failed",
            PipelineEvent::SummaryReady { .. } => "summary.ready",
            PipelineEvent::PipelineFailed { .. } => "pipeline.failed",
        }
    }

    pub fn request_id(&self) -> Uuid {
        match self {
            PipelineEvent::CacheHit { request_id, .. }
            | PipelineEvent::TranscriptFetched { request_id, .. }
            | PipelineEvent::ProviderAttempt { request_id, .. }
            | PipelineEvent::ProviderFailed { request_id, .. }
            | PipelineEvent::SummaryReady { request_id, .. }
            | PipelineEvent::PipelineFailed { request_id, .. } => *request_id,
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    tx: broadcast::Sender<PipelineEvent>,
    unrouted_publish_total: AtomicU64,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(NotifierInner {
                tx,
                unrouted_publish_total: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.inner.tx.subscribe()
    }

    pub fn publish(&self, event: PipelineEvent) {
        if let Err(broadcast::error::SendError(event)) = self.inner.tx.send(event) {
            self.inner
                .unrouted_publish_total
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                event_type = event.event_type(),
                request_id = %event.request_id(),
                "no listener for pipeline event"
            );
        }
    }

    pub fn unrouted_publish_total(&self) -> u64 {
        self.inner.unrouted_publish_total.load(Ordering::Relaxed)
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishing_without_listener_is_counted_not_failed() {
        let notifier = Notifier::default();
        notifier.publish(PipelineEvent::ProviderAttempt {
            request_id: Uuid::new_v4(),
            provider: ProviderKind::Gemini,
        });

        assert_eq!(notifier.unrouted_publish_total(), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();
        let request_id = Uuid::new_v4();

        notifier.publish(PipelineEvent::ProviderAttempt {
            request_id,
            provider: ProviderKind::Gemini,
        });
        notifier.publish(PipelineEvent::ProviderFailed {
            request_id,
            provider: ProviderKind::Gemini,
            error: "HTTP 500".into(),
        });

        assert_eq!(rx.recv().await.unwrap().event_type(), "provider.attempt");
        let failed = rx.recv().await.unwrap();
        assert_eq!(failed.event_type(), "provider.failed");
        assert_eq!(failed.request_id(), request_id);
        assert_eq!(notifier.unrouted_publish_total(), 0);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PipelineEvent::CacheHit {
            request_id: Uuid::nil(),
            video_id: VideoId::new("abc123"),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "cache_hit");
        assert_eq!(json["video_id"], "abc123");
    }
}
