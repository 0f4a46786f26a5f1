//! Cache configuration.

use std::sync::Arc;
use std::time::Duration;

use super::store::{DisabledCache, DocumentCache, MemoryDocumentCache};

const DEFAULT_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Keep rendered sitemaps between requests.
    pub enabled: bool,
    /// Lifetime of a cached document, counted from the write.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

impl From<&crate::config::SitemapSettings> for CacheConfig {
    fn from(settings: &crate::config::SitemapSettings) -> Self {
        Self {
            enabled: settings.cache_enabled,
            ttl: settings.cache_ttl,
        }
    }
}

impl CacheConfig {
    /// Store matching this configuration.
    pub fn build_store(&self) -> Arc<dyn DocumentCache> {
        if self.enabled {
            Arc::new(MemoryDocumentCache::new())
        } else {
            Arc::new(DisabledCache)
        }
    }
}
