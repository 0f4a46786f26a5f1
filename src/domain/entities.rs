//! Domain entities mirrored from the forum tables.

use serde::Serialize;
use time::PrimitiveDateTime;

use crate::domain::types::ForumStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForumRecord {
    pub id: i64,
    pub status: ForumStatus,
    pub sort: i64,
    pub slug: String,
}

/// An approved topic, annotated with the newest date among its posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicRecord {
    pub id: i64,
    pub forum_id: i64,
    pub slug: String,
    pub last_post_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub topic_id: i64,
    pub posted_at: Option<PrimitiveDateTime>,
}
