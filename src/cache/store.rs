//! Cache storage implementations.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Time-bounded key/value store for rendered documents.
#[async_trait]
pub trait DocumentCache: Send + Sync {
    async fn get(&self, key: CacheKey) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: CacheKey, document: String, ttl: Duration) -> Result<(), CacheError>;
    async fn invalidate(&self, key: CacheKey) -> Result<(), CacheError>;
}

struct CachedDocument {
    document: String,
    expires_at: Instant,
}

impl CachedDocument {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process store; entries expire `ttl` after they were written.
#[derive(Default)]
pub struct MemoryDocumentCache {
    entries: RwLock<HashMap<CacheKey, CachedDocument>>,
}

impl MemoryDocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentCache for MemoryDocumentCache {
    async fn get(&self, key: CacheKey) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(&key) {
                Some(entry) if entry.is_fresh(now) => return Ok(Some(entry.document.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // expired: drop it so the map does not hold stale documents
        let mut entries = rw_write(&self.entries, SOURCE, "get.expire");
        if entries.get(&key).is_some_and(|entry| !entry.is_fresh(now)) {
            entries.remove(&key);
        }
        Ok(None)
    }

    async fn set(&self, key: CacheKey, document: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Unavailable(format!("ttl {ttl:?} overflows the clock")))?;
        rw_write(&self.entries, SOURCE, "set").insert(
            key,
            CachedDocument {
                document,
                expires_at,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: CacheKey) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "invalidate").remove(&key);
        Ok(())
    }
}

/// Store that keeps nothing; every read misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCache;

#[async_trait]
impl DocumentCache for DisabledCache {
    async fn get(&self, _key: CacheKey) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: CacheKey, _document: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn invalidate(&self, _key: CacheKey) -> Result<(), CacheError> {
        Ok(())
    }
}
