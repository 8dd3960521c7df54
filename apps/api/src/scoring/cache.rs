//! Result cache — keyed by (profile id, profile version, posting id).
//!
//! The profile version is embedded in the key, so a material profile edit
//! invalidates every prior analysis for that candidate as a natural cache
//! miss, without an invalidation sweep. TTL bounds staleness from
//! posting-side drift.
//!
//! A cache outage must never fail the pipeline: backend errors are logged
//! and reported as misses, and failed writes are dropped.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::analysis::CompatibilityAnalysis;

const KEY_PREFIX: &str = "analysis";

/// Default TTL: long (days), tunable via config.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn cache_key(profile_id: Uuid, profile_version: u64, posting_id: Uuid) -> String {
    format!("{KEY_PREFIX}:{profile_id}:{profile_version}:{posting_id}")
}

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(
        &self,
        profile_id: Uuid,
        profile_version: u64,
        posting_id: Uuid,
    ) -> Option<CompatibilityAnalysis>;

    async fn put(
        &self,
        profile_id: Uuid,
        profile_version: u64,
        posting_id: Uuid,
        analysis: &CompatibilityAnalysis,
        ttl: Duration,
    );

    async fn invalidate(&self, profile_id: Uuid, profile_version: u64, posting_id: Uuid);
}

// ── Redis backend ───────────────────────────────────────────────────────────

pub struct RedisResultCache {
    client: redis::Client,
}

impl RedisResultCache {
    /// Opens the client and verifies the connection with a PING.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResultCache for RedisResultCache {
    async fn get(
        &self,
        profile_id: Uuid,
        profile_version: u64,
        posting_id: Uuid,
    ) -> Option<CompatibilityAnalysis> {
        let key = cache_key(profile_id, profile_version, posting_id);
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "redis unavailable, treating as cache miss");
                return None;
            }
        };
        let json: Option<String> = match conn.get(&key).await {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %key, error = %e, "cache get failed, treating as miss");
                return None;
            }
        };
        json.and_then(|json| match serde_json::from_str(&json) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!(key = %key, error = %e, "cached entry is corrupt, treating as miss");
                None
            }
        })
    }

    async fn put(
        &self,
        profile_id: Uuid,
        profile_version: u64,
        posting_id: Uuid,
        analysis: &CompatibilityAnalysis,
        ttl: Duration,
    ) {
        let key = cache_key(profile_id, profile_version, posting_id);
        let json = match serde_json::to_string(analysis) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to serialize analysis for cache");
                return;
            }
        };
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<(), _> = conn.set_ex(&key, json, ttl.as_secs()).await;
                match result {
                    Ok(()) => debug!(key = %key, ttl_secs = ttl.as_secs(), "cached analysis"),
                    Err(e) => warn!(key = %key, error = %e, "cache put failed, dropping write"),
                }
            }
            Err(e) => warn!(error = %e, "redis unavailable, dropping cache write"),
        }
    }

    async fn invalidate(&self, profile_id: Uuid, profile_version: u64, posting_id: Uuid) {
        let key = cache_key(profile_id, profile_version, posting_id);
        if let Ok(mut conn) = self.client.get_multiplexed_async_connection().await {
            let _: Result<(), _> = conn.del(&key).await;
        }
    }
}

// ── In-process backend ──────────────────────────────────────────────────────

/// Map-backed cache honoring TTL via stored expiry instants. Used for
/// redis-less deployments and throughout the test suite.
#[derive(Default)]
pub struct MemoryResultCache {
    entries: RwLock<HashMap<String, (Instant, CompatibilityAnalysis)>>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(
        &self,
        profile_id: Uuid,
        profile_version: u64,
        posting_id: Uuid,
    ) -> Option<CompatibilityAnalysis> {
        let key = cache_key(profile_id, profile_version, posting_id);
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|(expires_at, _)| *expires_at > Instant::now())
            .map(|(_, analysis)| analysis.clone())
    }

    async fn put(
        &self,
        profile_id: Uuid,
        profile_version: u64,
        posting_id: Uuid,
        analysis: &CompatibilityAnalysis,
        ttl: Duration,
    ) {
        let key = cache_key(profile_id, profile_version, posting_id);
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key, (expires_at, analysis.clone()));
    }

    async fn invalidate(&self, profile_id: Uuid, profile_version: u64, posting_id: Uuid) {
        let key = cache_key(profile_id, profile_version, posting_id);
        self.entries.write().await.remove(&key);
    }
}
