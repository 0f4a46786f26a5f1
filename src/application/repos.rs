//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ForumRecord, PostRecord, TopicRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
    #[error("forum table `{0}` is not installed")]
    NotInstalled(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Read-only access to the forum tables.
///
/// Implementations map the store's "unset" timestamps to `None`; callers never
/// see sentinel dates.
#[async_trait]
pub trait ForumRepo: Send + Sync {
    /// Confirm the forum tables exist. Stores without a schema always succeed.
    async fn check_installed(&self) -> Result<(), RepoError> {
        Ok(())
    }

    /// Forums whose status is not `closed`, ordered by `(sort, id)`.
    async fn list_open_forums(&self) -> Result<Vec<ForumRecord>, RepoError>;

    /// Approved topics ordered by id, each carrying the newest post date.
    async fn list_approved_topics(&self) -> Result<Vec<TopicRecord>, RepoError>;

    /// Posts of one topic ordered by id.
    async fn list_topic_posts(&self, topic_id: i64) -> Result<Vec<PostRecord>, RepoError>;
}
