//! Skimmer Core Library
//!
//! Transcript extraction for YouTube videos, a fallback cascade over AI providers, structured
//! response parsing and a TTL cache for finished summaries.

pub mod cache;
pub mod cascade;
pub mod error;
pub mod events;
pub mod format;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod settings;
pub mod store;
pub mod transcript;
pub mod types;

pub use cache::{CacheEntry, CacheStats, SummaryCache};
pub use cascade::{CheckStatus, GenerationMode, Generated, ProviderCheck, check_providers, generate_summary};
pub use error::{ProviderError, ProviderFailure, Result, SummaryError};
pub use events::{Notifier, PipelineEvent};
pub use format::{format_summary_readable, format_timestamp};
pub use parser::{ParsedSummary, parse};
pub use pipeline::{PlainSummary, Summarizer, build_http_client};
pub use provider::{ProviderConfig, ProviderKind};
pub use settings::{EnvSettings, FileSettings, LayeredSettings, Settings, SettingsSource};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use transcript::YoutubeClient;
pub use types::{
    SummaryBody, SummaryResult, TranscriptResult, TranscriptSource, VideoId, VideoMetadata,
};
