#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use forum_sitemap::{
    application::{
        builder::ForumEngine,
        clock::FixedClock,
        links::{ForumOptions, PermalinkResolver},
        repos::{ForumRepo, RepoError},
        sitemap::SitemapService,
    },
    cache::{CacheConfig, DocumentCache, MemoryDocumentCache},
    domain::entities::{ForumRecord, PostRecord, TopicRecord},
    domain::types::ForumStatus,
    infra::http::{HttpState, SitemapRoutes, build_router},
};
use http_body_util::BodyExt;
use time::{Date, macros::date};
use tower::ServiceExt;

pub const TODAY: Date = date!(2025 - 06 - 15);
pub const HOME: &str = "https://forum.example/community/";

#[derive(Default, Clone)]
pub struct ForumData {
    pub forums: Vec<ForumRecord>,
    pub topics: Vec<TopicRecord>,
    pub posts: Vec<PostRecord>,
}

/// In-memory forum tables that count how often they are read.
#[derive(Default)]
pub struct MemoryForum {
    data: Mutex<ForumData>,
    tables_missing: AtomicBool,
    pub forum_queries: AtomicUsize,
}

impl MemoryForum {
    pub fn new(data: ForumData) -> Self {
        Self {
            data: Mutex::new(data),
            tables_missing: AtomicBool::new(false),
            forum_queries: AtomicUsize::new(0),
        }
    }

    pub fn replace(&self, data: ForumData) {
        *self.data.lock().unwrap() = data;
    }

    pub fn set_installed(&self, installed: bool) {
        self.tables_missing.store(!installed, Ordering::SeqCst);
    }

    pub fn queries(&self) -> usize {
        self.forum_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForumRepo for MemoryForum {
    async fn check_installed(&self) -> Result<(), RepoError> {
        if self.tables_missing.load(Ordering::SeqCst) {
            return Err(RepoError::NotInstalled("wp_forum_forums".to_string()));
        }
        Ok(())
    }

    async fn list_open_forums(&self) -> Result<Vec<ForumRecord>, RepoError> {
        self.forum_queries.fetch_add(1, Ordering::SeqCst);
        let mut forums: Vec<_> = self
            .data
            .lock()
            .unwrap()
            .forums
            .iter()
            .filter(|forum| forum.status.is_listed())
            .cloned()
            .collect();
        forums.sort_by_key(|forum| (forum.sort, forum.id));
        Ok(forums)
    }

    async fn list_approved_topics(&self) -> Result<Vec<TopicRecord>, RepoError> {
        let mut topics = self.data.lock().unwrap().topics.clone();
        topics.sort_by_key(|topic| topic.id);
        Ok(topics)
    }

    async fn list_topic_posts(&self, topic_id: i64) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts: Vec<_> = self
            .data
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|post| post.topic_id == topic_id)
            .cloned()
            .collect();
        posts.sort_by_key(|post| post.id);
        Ok(posts)
    }
}

pub fn forum(id: i64, sort: i64, slug: &str) -> ForumRecord {
    ForumRecord {
        id,
        status: ForumStatus::Normal,
        sort,
        slug: slug.to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryForum>,
    pub cache: Arc<MemoryDocumentCache>,
}

pub fn resolver(posts_per_page: u32) -> PermalinkResolver {
    PermalinkResolver::new(
        Some(HOME.to_string()),
        true,
        "forum",
        "topic",
        NonZeroU32::new(posts_per_page).unwrap(),
    )
}

pub fn app(data: ForumData) -> TestApp {
    let repo = Arc::new(MemoryForum::new(data));
    let engine = ForumEngine::new(
        repo.clone(),
        Arc::new(resolver(2)),
        ForumOptions {
            site_url: "https://forum.example/".to_string(),
            ..ForumOptions::default()
        },
    );
    build_app(Some(engine), repo)
}

pub fn unavailable_app() -> TestApp {
    build_app(None, Arc::new(MemoryForum::default()))
}

fn build_app(engine: Option<ForumEngine>, repo: Arc<MemoryForum>) -> TestApp {
    let cache = Arc::new(MemoryDocumentCache::new());
    let store: Arc<dyn DocumentCache> = cache.clone();
    let sitemap = SitemapService::new(
        engine,
        store,
        &CacheConfig::default(),
        Arc::new(FixedClock(TODAY)),
    )
    .with_recheck_interval(Duration::ZERO);
    let state = HttpState {
        sitemap: Arc::new(sitemap),
        db: None,
        routes: Arc::new(SitemapRoutes::default()),
    };
    TestApp {
        router: build_router(state),
        repo,
        cache,
    }
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}
