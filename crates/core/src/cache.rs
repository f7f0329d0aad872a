//! Summary cache with lazy, access-triggered expiry.
//!
//! Expired entries are never returned, but they are only removed when `get` touches them (or on
//! `clear`). Until then they show up in [`CacheStats::expired`].

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    store::KeyValueStore,
    types::{SummaryResult, VideoId},
};

pub const CACHE_KEY_PREFIX: &str = "summary_cache_";
pub const DEFAULT_TTL_HOURS: i64 = 168;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: SummaryResult,
    /// Epoch milliseconds.
    pub cached_at: i64,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

impl CacheEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

pub struct SummaryCache {
    store: Arc<dyn KeyValueStore>,
    clock: Clock,
}

impl SummaryCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn key(video_id: &VideoId) -> String {
        format!("{CACHE_KEY_PREFIX}{video_id}")
    }

    fn now_ms(&self) -> i64 {
        (self.clock)().timestamp_millis()
    }

    async fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        match self.store.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stored summary if present and unexpired. Expired entries are deleted on the way out.
    pub async fn get(&self, video_id: &VideoId) -> Option<SummaryResult> {
        let key = Self::key(video_id);

        let entry = match self.read_entry(&key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(%video_id, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(%video_id, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        if entry.is_expired(self.now_ms()) {
            debug!(%video_id, expires_at = entry.expires_at, "cache entry expired");
            if let Err(e) = self.store.remove(&key).await {
                warn!(%video_id, error = %e, "failed to purge expired cache entry");
            }
            return None;
        }

        debug!(%video_id, "cache hit");
        Some(entry.data)
    }

    pub async fn set(&self, video_id: &VideoId, data: &SummaryResult) {
        self.set_with_ttl(video_id, data, TimeDelta::hours(DEFAULT_TTL_HOURS))
            .await
    }

    pub async fn set_with_ttl(&self, video_id: &VideoId, data: &SummaryResult, ttl: TimeDelta) {
        let cached_at = self.now_ms();
        let entry = CacheEntry {
            data: data.clone(),
            cached_at,
            expires_at: cached_at + ttl.num_milliseconds(),
        };

        let result = match serde_json::to_value(&entry) {
            Ok(value) => self.store.set(&Self::key(video_id), value).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            warn!(%video_id, error = %e, "cache write failed");
        }
    }

    pub async fn delete(&self, video_id: &VideoId) {
        if let Err(e) = self.store.remove(&Self::key(video_id)).await {
            warn!(%video_id, error = %e, "cache delete failed");
        }
    }

    async fn owned_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(CACHE_KEY_PREFIX))
            .collect())
    }

    /// Removes every entry in the cache namespace and returns how many were removed.
    pub async fn clear(&self) -> usize {
        let keys = match self.owned_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "cache clear failed to list keys");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            match self.store.remove(&key).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(%key, error = %e, "cache clear failed to remove entry"),
            }
        }
        removed
    }

    /// Unreadable entries count as expired: they can never be served.
    pub async fn stats(&self) -> CacheStats {
        let keys = match self.owned_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "cache stats failed to list keys");
                return CacheStats::default();
            }
        };

        let now = self.now_ms();
        let mut stats = CacheStats::default();
        for key in keys {
            stats.total += 1;
            match self.read_entry(&key).await {
                Ok(Some(entry)) if !entry.is_expired(now) => stats.valid += 1,
                Ok(None) => stats.total -= 1,
                _ => stats.expired += 1,
            }
        }
        stats
    }
}
