//! Sitemap service shared by every transport.
//!
//! This service encapsulates dependency checking, cache handling and the
//! build pipeline, keeping the HTTP layer focused on request/response handling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::availability::AvailabilityGate;
use crate::application::builder::{ForumEngine, build_url_records};
use crate::application::clock::Clock;
use crate::application::repos::RepoError;
use crate::application::xml::render_sitemap;
use crate::cache::{CacheConfig, CacheKey, DocumentCache};

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Asgaros Forum is not active")]
    Unavailable,
    #[error("failed to read forum content: {0}")]
    Repo(#[from] RepoError),
}

/// Per-request options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapRequest {
    /// Drop the cached document and rebuild.
    pub bypass_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapOutcome {
    Cached,
    Built,
}

impl SitemapOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SitemapOutcome::Cached => "cached",
            SitemapOutcome::Built => "built",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SitemapDocument {
    pub xml: String,
    pub outcome: SitemapOutcome,
}

/// Service for producing the forum sitemap.
#[derive(Clone)]
pub struct SitemapService {
    engine: Option<ForumEngine>,
    gate: Arc<AvailabilityGate>,
    cache: Arc<dyn DocumentCache>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SitemapService {
    pub fn new(
        engine: Option<ForumEngine>,
        cache: Arc<dyn DocumentCache>,
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            gate: Arc::new(AvailabilityGate::default()),
            cache,
            ttl: config.ttl,
            clock,
        }
    }

    /// How long a failed availability probe is trusted before it is re-run.
    pub fn with_recheck_interval(mut self, recheck_after: Duration) -> Self {
        self.gate = Arc::new(AvailabilityGate::new(recheck_after));
        self
    }

    pub async fn is_available(&self) -> bool {
        self.ready_engine().await.is_some()
    }

    async fn ready_engine(&self) -> Option<&ForumEngine> {
        let engine = self.engine.as_ref()?;
        self.gate
            .check(engine.repo.as_ref())
            .await
            .then_some(engine)
    }

    /// Serve the sitemap, from cache when possible.
    pub async fn sitemap_xml(
        &self,
        request: SitemapRequest,
    ) -> Result<SitemapDocument, SitemapError> {
        let Some(engine) = self.ready_engine().await else {
            counter!("forum_sitemap_unavailable_total").increment(1);
            return Err(SitemapError::Unavailable);
        };

        let use_cache = !request.bypass_cache;
        if request.bypass_cache {
            counter!("forum_sitemap_cache_bypass_total").increment(1);
            if let Err(err) = self.cache.invalidate(CacheKey::SITEMAP_XML).await {
                warn!(
                    target = "forum_sitemap::cache",
                    key = %CacheKey::SITEMAP_XML,
                    error = %err,
                    "failed to invalidate cached sitemap"
                );
            }
        }

        if use_cache {
            match self.cache.get(CacheKey::SITEMAP_XML).await {
                Ok(Some(xml)) => {
                    counter!("forum_sitemap_cache_hit_total").increment(1);
                    debug!(target = "forum_sitemap::cache", "serving cached sitemap");
                    return Ok(SitemapDocument {
                        xml,
                        outcome: SitemapOutcome::Cached,
                    });
                }
                Ok(None) => {
                    counter!("forum_sitemap_cache_miss_total").increment(1);
                }
                Err(err) => {
                    counter!("forum_sitemap_cache_miss_total").increment(1);
                    warn!(
                        target = "forum_sitemap::cache",
                        key = %CacheKey::SITEMAP_XML,
                        error = %err,
                        "cache read failed; rebuilding"
                    );
                }
            }
        }

        let xml = self.render(engine).await?;

        // a bypassed request still refreshes the cache for later readers
        if let Err(err) = self
            .cache
            .set(CacheKey::SITEMAP_XML, xml.clone(), self.ttl)
            .await
        {
            warn!(
                target = "forum_sitemap::cache",
                key = %CacheKey::SITEMAP_XML,
                error = %err,
                "failed to store sitemap"
            );
        }

        Ok(SitemapDocument {
            xml,
            outcome: SitemapOutcome::Built,
        })
    }

    /// Build the document without touching the cache.
    pub async fn build_document(&self) -> Result<String, SitemapError> {
        let engine = self
            .ready_engine()
            .await
            .ok_or(SitemapError::Unavailable)?;
        self.render(engine).await
    }

    async fn render(&self, engine: &ForumEngine) -> Result<String, SitemapError> {
        let started = Instant::now();
        let records = build_url_records(engine, self.clock.today()).await?;
        let xml = render_sitemap(&records);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        counter!("forum_sitemap_build_total").increment(1);
        histogram!("forum_sitemap_build_ms").record(elapsed_ms);
        gauge!("forum_sitemap_url_count").set(records.len() as f64);
        info!(
            target = "forum_sitemap::build",
            urls = records.len(),
            bytes = xml.len(),
            elapsed_ms,
            "built forum sitemap"
        );
        Ok(xml)
    }
}
