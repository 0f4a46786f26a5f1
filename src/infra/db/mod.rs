//! MySQL-backed access to the Asgaros forum tables.

mod forums;
mod util;

pub use forums::normalize_timestamp;
pub use util::map_sqlx_error;

use std::sync::Arc;
use std::time::Duration;

use sqlx::{
    Row,
    mysql::{MySqlPool, MySqlPoolOptions},
    query,
};
use tracing::debug;

use crate::infra::error::InfraError;

const LAZY_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fully-qualified names of the three forum tables for one WordPress prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumTables {
    pub forums: String,
    pub topics: String,
    pub posts: String,
}

impl ForumTables {
    /// `prefix` must already be validated to `[A-Za-z0-9_]`.
    pub fn new(prefix: &str) -> Self {
        Self {
            forums: format!("{prefix}forum_forums"),
            topics: format!("{prefix}forum_topics"),
            posts: format!("{prefix}forum_posts"),
        }
    }

    fn all(&self) -> [&str; 3] {
        [&self.forums, &self.topics, &self.posts]
    }
}

#[derive(Clone)]
pub struct MySqlRepositories {
    pool: Arc<MySqlPool>,
    tables: ForumTables,
}

impl MySqlRepositories {
    pub fn new(pool: MySqlPool, tables: ForumTables) -> Self {
        Self {
            pool: Arc::new(pool),
            tables,
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn tables(&self) -> &ForumTables {
        &self.tables
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
        MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    /// Pool that opens connections on first use.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
        MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(LAZY_ACQUIRE_TIMEOUT)
            .connect_lazy(url)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Confirm the forum tables exist in the connected schema.
    pub async fn probe_forum_tables(&self) -> Result<(), InfraError> {
        let [forums, topics, posts] = self.tables.all();
        let rows = query(
            "SELECT CAST(table_name AS CHAR) AS name \
             FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name IN (?, ?, ?)",
        )
        .bind(forums)
        .bind(topics)
        .bind(posts)
        .fetch_all(self.pool())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

        let present = rows
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| InfraError::database(err.to_string()))?;
        debug!(
            target = "forum_sitemap::db",
            found = ?present,
            "probed forum tables"
        );

        match self
            .tables
            .all()
            .into_iter()
            .find(|table| !present.iter().any(|name| name.eq_ignore_ascii_case(table)))
        {
            Some(missing) => Err(InfraError::missing_forum_tables(missing)),
            None => Ok(()),
        }
    }
}
