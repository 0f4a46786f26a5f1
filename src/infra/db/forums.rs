use async_trait::async_trait;
use time::{PrimitiveDateTime, macros::datetime};
use tracing::warn;

use crate::{
    application::repos::{ForumRepo, RepoError},
    domain::{
        entities::{ForumRecord, PostRecord, TopicRecord},
        types::ForumStatus,
    },
    infra::error::InfraError,
};

use super::{MySqlRepositories, map_sqlx_error};

/// Written by the forum for "no date"; never a real post time.
const UNSET_DATETIME: PrimitiveDateTime = datetime!(1000-01-01 0:00);

/// Map the forum's "unset" sentinel (and anything older) to `None`.
pub fn normalize_timestamp(value: Option<PrimitiveDateTime>) -> Option<PrimitiveDateTime> {
    value.filter(|timestamp| *timestamp > UNSET_DATETIME)
}

#[derive(sqlx::FromRow)]
struct ForumRow {
    id: i64,
    sort: i64,
    forum_status: String,
    slug: String,
}

impl From<ForumRow> for ForumRecord {
    fn from(row: ForumRow) -> Self {
        let status = row.forum_status.parse().unwrap_or_else(|err| {
            warn!(
                target = "forum_sitemap::db",
                forum_id = row.id,
                error = %err,
                "unrecognised forum status; treating as normal"
            );
            ForumStatus::Normal
        });
        Self {
            id: row.id,
            status,
            sort: row.sort,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: i64,
    forum_id: i64,
    slug: String,
    last_post_at: Option<PrimitiveDateTime>,
}

impl From<TopicRow> for TopicRecord {
    fn from(row: TopicRow) -> Self {
        Self {
            id: row.id,
            forum_id: row.forum_id,
            slug: row.slug,
            last_post_at: normalize_timestamp(row.last_post_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    topic_id: i64,
    posted_at: Option<PrimitiveDateTime>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            topic_id: row.topic_id,
            posted_at: normalize_timestamp(row.posted_at),
        }
    }
}

#[async_trait]
impl ForumRepo for MySqlRepositories {
    async fn check_installed(&self) -> Result<(), RepoError> {
        self.probe_forum_tables().await.map_err(|err| match err {
            InfraError::MissingForumTables { table } => RepoError::NotInstalled(table),
            other => RepoError::from_persistence(other),
        })
    }

    async fn list_open_forums(&self) -> Result<Vec<ForumRecord>, RepoError> {
        let sql = format!(
            "SELECT CAST(id AS SIGNED) AS id, \
                    CAST(sort AS SIGNED) AS sort, \
                    forum_status, \
                    COALESCE(slug, '') AS slug \
             FROM `{}` \
             WHERE forum_status <> 'closed' \
             ORDER BY sort ASC, id ASC",
            self.tables().forums
        );

        let rows = sqlx::query_as::<_, ForumRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ForumRecord::from).collect())
    }

    async fn list_approved_topics(&self) -> Result<Vec<TopicRecord>, RepoError> {
        let tables = self.tables();
        let sql = format!(
            "SELECT CAST(t.id AS SIGNED) AS id, \
                    CAST(t.parent_id AS SIGNED) AS forum_id, \
                    COALESCE(t.slug, '') AS slug, \
                    (SELECT MAX(p.date) FROM `{posts}` p WHERE p.parent_id = t.id) AS last_post_at \
             FROM `{topics}` t \
             WHERE t.approved = 1 \
             ORDER BY t.id ASC",
            posts = tables.posts,
            topics = tables.topics,
        );

        let rows = sqlx::query_as::<_, TopicRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TopicRecord::from).collect())
    }

    async fn list_topic_posts(&self, topic_id: i64) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT CAST(id AS SIGNED) AS id, \
                    CAST(parent_id AS SIGNED) AS topic_id, \
                    date AS posted_at \
             FROM `{}` \
             WHERE parent_id = ? \
             ORDER BY id ASC",
            self.tables().posts
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(topic_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }
}
