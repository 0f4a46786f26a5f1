//! Turns forum rows into the ordered list of sitemap URL records.

use std::sync::Arc;

use time::{Date, PrimitiveDateTime};
use tracing::debug;

use crate::application::links::{self, ForumOptions, LinkResolver};
use crate::application::repos::{ForumRepo, RepoError};
use crate::domain::sitemap::UrlRecord;
use crate::domain::types::{ChangeFreq, Priority};

/// Handle on a loaded forum engine: its tables, its link resolver and options.
#[derive(Clone)]
pub struct ForumEngine {
    pub repo: Arc<dyn ForumRepo>,
    pub links: Arc<dyn LinkResolver>,
    pub options: ForumOptions,
}

impl ForumEngine {
    pub fn new(
        repo: Arc<dyn ForumRepo>,
        links: Arc<dyn LinkResolver>,
        options: ForumOptions,
    ) -> Self {
        Self {
            repo,
            links,
            options,
        }
    }
}

/// Enumerate the forum and produce URL records in document order:
/// home, every listed forum, then each topic followed by its posts.
pub async fn build_url_records(
    engine: &ForumEngine,
    today: Date,
) -> Result<Vec<UrlRecord>, RepoError> {
    let resolver = engine.links.as_ref();
    let options = &engine.options;
    let home = links::home_link(resolver, options);

    let mut records = vec![UrlRecord::new(
        home.clone(),
        today,
        ChangeFreq::Hourly,
        Priority::HOME,
    )];

    let forums = engine.repo.list_open_forums().await?;
    debug!(
        target = "forum_sitemap::builder",
        forums = forums.len(),
        "loaded forums"
    );
    for forum in forums.iter().filter(|forum| forum.status.is_listed()) {
        records.push(UrlRecord::new(
            links::forum_link(resolver, options, &home, forum),
            today,
            ChangeFreq::Daily,
            Priority::FORUM,
        ));
    }

    let topics = engine.repo.list_approved_topics().await?;
    debug!(
        target = "forum_sitemap::builder",
        topics = topics.len(),
        "loaded topics"
    );
    for topic in &topics {
        let topic_lastmod = lastmod_or(topic.last_post_at, today);
        records.push(UrlRecord::new(
            links::topic_link(resolver, options, &home, topic),
            topic_lastmod,
            ChangeFreq::Weekly,
            Priority::TOPIC,
        ));

        let posts = engine.repo.list_topic_posts(topic.id).await?;
        for (position, post) in posts.iter().enumerate() {
            records.push(UrlRecord::new(
                links::post_link(resolver, &home, post, topic, position),
                lastmod_or(post.posted_at, topic_lastmod),
                ChangeFreq::Monthly,
                Priority::POST,
            ));
        }
    }

    Ok(records)
}

fn lastmod_or(timestamp: Option<PrimitiveDateTime>, fallback: Date) -> Date {
    timestamp.map(|value| value.date()).unwrap_or(fallback)
}
