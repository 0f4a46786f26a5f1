//! Sitemap document cache.
//!
//! One rendered document is kept under [`CacheKey::SITEMAP_XML`] for the
//! configured TTL. Configure it via `forum-sitemap.toml`:
//!
//! ```toml
//! [sitemap]
//! cache_enabled = true
//! cache_ttl_seconds = 3600
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::CacheKey;
pub use store::{CacheError, DisabledCache, DocumentCache, MemoryDocumentCache};
