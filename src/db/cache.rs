//! Best-effort key/value cache used to checkpoint simulation state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::error::CacheError;

/// Temporary key/value storage with per-entry TTL.
///
/// Every failure is soft from the simulation's point of view: callers log
/// and carry on with in-memory state.
#[async_trait]
pub trait Cache: Send + Sync {
    /// `Ok(None)` on a miss or an expired entry.
    async fn get_temporary(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Returns whether the value was stored.
    async fn set_temporary(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, CacheError>;
}

/// Process-local cache. Can be switched offline to exercise fallback paths.
#[derive(Debug, Default)]
pub struct MemoryCache {
    /// `None` expiry means the TTL overflowed the clock: kept until replaced.
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    offline: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose every call fails with `Unavailable`.
    pub fn offline() -> Self {
        let cache = Self::new();
        cache.set_offline(true);
        cache
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Store a raw value without TTL bookkeeping, e.g. to plant corrupt data.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.lock().insert(
            key.to_string(),
            (value.to_string(), Instant::now().checked_add(Duration::from_secs(3600))),
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get_temporary(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_online()?;
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set_temporary(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, CacheError> {
        self.check_online()?;
        let expires = Instant::now().checked_add(Duration::from_secs(ttl_secs));
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(true)
    }
}

/// Cache backed by the `cache_entries` table.
#[derive(Debug, Clone)]
pub struct PgCache {
    pool: PgPool,
}

impl PgCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Cache for PgCache {
    async fn get_temporary(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM cache_entries WHERE key = $1 AND expires_at > now()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set_temporary(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, CacheError> {
        let result = sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at)
             VALUES ($1, $2, now() + make_interval(secs => $3))
             ON CONFLICT (key) DO UPDATE
             SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(ttl_secs as f64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
