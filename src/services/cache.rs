use redis::aio::ConnectionManager;
use std::time::Duration;
use thiserror::Error;

use crate::models::ScoredMatch;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("L1 invalidation rejected: {0}")]
    Invalidation(String),
}

/// Two-tier cache for ranked match lists
///
/// L1 is an in-process moka cache, L2 is redis shared across instances.
/// Both tiers expire entries after the same TTL. Entries are keyed per
/// attendee and event, and a profile change at an event drops every list
/// cached for that event.
pub struct CacheManager {
    redis: ConnectionManager,
    l1_cache: moka::future::Cache<String, Vec<ScoredMatch>>,
    ttl_secs: u64,
}

const SCAN_BATCH: usize = 200;

impl CacheManager {
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .support_invalidation_closures()
            .build();

        Ok(Self {
            redis,
            l1_cache,
            ttl_secs,
        })
    }

    /// Cached matches for `user_id` at `event_id` (L1 first, then L2)
    pub async fn get_matches(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<Vec<ScoredMatch>>, CacheError> {
        let key = CacheKey::matches(event_id, user_id);

        if let Some(matches) = self.l1_cache.get(&key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(Some(matches));
        }

        let mut conn = self.redis.clone();
        let value: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;

        match value {
            Some(json) => {
                tracing::trace!("L2 cache hit: {}", key);
                let matches: Vec<ScoredMatch> = serde_json::from_str(&json)?;
                self.l1_cache.insert(key, matches.clone()).await;
                Ok(Some(matches))
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Ok(None)
            }
        }
    }

    /// Store a ranked list in both tiers
    pub async fn put_matches(
        &self,
        event_id: &str,
        user_id: &str,
        matches: &[ScoredMatch],
    ) -> Result<(), CacheError> {
        let key = CacheKey::matches(event_id, user_id);
        let json = serde_json::to_string(matches)?;

        self.l1_cache.insert(key.clone(), matches.to_vec()).await;

        let mut conn = self.redis.clone();
        redis::cmd("SETEX")
            .arg(&key)
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<()>(&mut conn)
            .await?;

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Drop every list cached for an event
    pub async fn invalidate_event(&self, event_id: &str) -> Result<(), CacheError> {
        let prefix = CacheKey::event_prefix(event_id);

        let l1_prefix = prefix.clone();
        self.l1_cache
            .invalidate_entries_if(move |key, _| key.starts_with(&l1_prefix))
            .map_err(|e| CacheError::Invalidation(e.to_string()))?;

        // SCAN rather than KEYS so a large keyspace does not block redis
        let pattern = format!("{}*", prefix);
        let mut conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut removed = 0usize;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                removed += keys.len();
                redis::cmd("DEL")
                    .arg(keys)
                    .query_async::<()>(&mut conn)
                    .await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!("Invalidated {} cached match lists for event {}", removed, event_id);
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Ranked matches for one attendee at one event
    pub fn matches(event_id: &str, user_id: &str) -> String {
        format!("{}{}", Self::event_prefix(event_id), user_id)
    }

    /// Prefix shared by every match list cached for an event
    pub fn event_prefix(event_id: &str) -> String {
        format!("matches:{}:", event_id)
    }
}
